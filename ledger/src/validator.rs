//! Stateful transaction validation.
//!
//! Stateless checks run first (`burst_transactions::validation`). What is
//! left here needs the ledger: wallet status, BRN availability, and the
//! provenance a send or split declares. Batch-level checks (holder, expiry,
//! taint, pending sweeps, conservation) are made by the TRST engine and
//! translated into [`RejectReason`]s by [`trst_rejection`].

use burst_brn::BrnError;
use burst_transactions::{BurnTx, RejectReason, Transaction};
use burst_trst::{TrstEngine, TrstError};
use burst_types::{TxHash, WalletState};

/// Verdict on a TRST engine failure.
#[derive(Debug)]
pub enum Verdict {
    Reject(RejectReason),
    /// The failure reveals inconsistent committed state.
    Invariant(String),
}

/// The sender of a burn must be Verified right now.
pub fn check_burner(tx: &BurnTx, status: WalletState) -> Result<(), RejectReason> {
    if status.can_burn() {
        Ok(())
    } else {
        Err(RejectReason::WalletNotVerified {
            wallet: tx.sender.clone(),
        })
    }
}

/// The origin a send or split declares must be the origin of the batch it
/// consumes. Unknown batches are reported here too.
pub fn check_provenance(tx: &Transaction, trst: &TrstEngine) -> Result<(), RejectReason> {
    let (link, declared) = match tx {
        Transaction::Send(send) => (send.link, send.origin),
        Transaction::Split(split) => (split.link, split.origin),
        Transaction::Burn(_) | Transaction::Merge(_) => return Ok(()),
    };
    let batch = trst
        .batch(&link)
        .ok_or(RejectReason::UnknownBatch { batch: link })?;
    if batch.origin != declared {
        return Err(RejectReason::ProvenanceMismatch {
            declared,
            actual: batch.origin,
        });
    }
    Ok(())
}

pub fn brn_rejection(err: BrnError, tx: &BurnTx) -> Verdict {
    match err {
        BrnError::InsufficientBalance { needed, available } => {
            Verdict::Reject(RejectReason::InsufficientBrn { needed, available })
        }
        BrnError::WalletNotVerified => Verdict::Reject(RejectReason::WalletNotVerified {
            wallet: tx.sender.clone(),
        }),
        BrnError::ZeroAmount => Verdict::Reject(RejectReason::Malformed {
            detail: err.to_string(),
        }),
        other => Verdict::Invariant(other.to_string()),
    }
}

pub fn trst_rejection(err: TrstError) -> Verdict {
    if err.is_invariant_violation() {
        return Verdict::Invariant(err.to_string());
    }
    let reason = match err {
        TrstError::UnknownBatch(batch) => RejectReason::UnknownBatch { batch },
        TrstError::NotHolder { batch, .. } => RejectReason::NotHolder { batch },
        TrstError::Expired(batch) => RejectReason::Expired { batch },
        TrstError::Revoked(batch) | TrstError::Tainted(batch) => RejectReason::Revoked { batch },
        TrstError::RevocationPending(batch) => RejectReason::RevocationPending { batch },
        TrstError::InsufficientBalance { needed, available } => {
            RejectReason::InsufficientTrst { needed, available }
        }
        TrstError::AmountMismatch { total, expected } => {
            RejectReason::AmountMismatch { total, expected }
        }
        other => RejectReason::Malformed {
            detail: other.to_string(),
        },
    };
    Verdict::Reject(reason)
}

/// Duplicate detection against the transaction store.
pub fn check_duplicate(hash: &TxHash, known: bool) -> Result<(), RejectReason> {
    if known {
        Err(RejectReason::Duplicate { hash: *hash })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burst_types::{Signature, Timestamp, WalletAddress};

    fn burn() -> BurnTx {
        BurnTx {
            hash: TxHash::new([1; 32]),
            sender: WalletAddress::new("brst_a"),
            receiver: WalletAddress::new("brst_b"),
            amount: 10,
            timestamp: Timestamp::new(1),
            signature: Signature::EMPTY,
        }
    }

    #[test]
    fn only_verified_wallets_burn() {
        assert!(check_burner(&burn(), WalletState::Verified).is_ok());
        for status in [
            WalletState::Unverified,
            WalletState::PendingVerification,
            WalletState::Deverified,
            WalletState::Revoked,
        ] {
            assert!(matches!(
                check_burner(&burn(), status),
                Err(RejectReason::WalletNotVerified { .. })
            ));
        }
    }

    #[test]
    fn trst_errors_split_into_rejections_and_invariants() {
        let h = TxHash::new([9; 32]);
        assert!(matches!(
            trst_rejection(TrstError::Expired(h)),
            Verdict::Reject(RejectReason::Expired { .. })
        ));
        assert!(matches!(
            trst_rejection(TrstError::Tainted(h)),
            Verdict::Reject(RejectReason::Revoked { .. })
        ));
        assert!(matches!(trst_rejection(TrstError::MergeCycle(h)), Verdict::Invariant(_)));
        assert!(matches!(trst_rejection(TrstError::Overflow), Verdict::Invariant(_)));
    }

    #[test]
    fn brn_shortfall_is_a_rejection() {
        assert!(matches!(
            brn_rejection(
                BrnError::InsufficientBalance {
                    needed: 5,
                    available: 2
                },
                &burn()
            ),
            Verdict::Reject(RejectReason::InsufficientBrn {
                needed: 5,
                available: 2
            })
        ));
        assert!(matches!(brn_rejection(BrnError::Overflow, &burn()), Verdict::Invariant(_)));
    }

    #[test]
    fn provenance_must_match_the_consumed_batch() {
        let mut trst = TrstEngine::new();
        let origin = TxHash::new([1; 32]);
        trst.mint(
            origin,
            &WalletAddress::new("brst_a"),
            WalletAddress::new("brst_b"),
            10,
            Timestamp::new(1),
        )
        .unwrap();
        let send = |declared: TxHash, link: TxHash| {
            Transaction::Send(burst_transactions::SendTx {
                hash: TxHash::new([2; 32]),
                sender: WalletAddress::new("brst_b"),
                receiver: WalletAddress::new("brst_c"),
                amount: 5,
                timestamp: Timestamp::new(2),
                link,
                origin: declared,
                signature: Signature::EMPTY,
            })
        };
        assert!(check_provenance(&send(origin, origin), &trst).is_ok());
        assert!(matches!(
            check_provenance(&send(TxHash::new([7; 32]), origin), &trst),
            Err(RejectReason::ProvenanceMismatch { .. })
        ));
        assert!(matches!(
            check_provenance(&send(origin, TxHash::new([8; 32])), &trst),
            Err(RejectReason::UnknownBatch { .. })
        ));
    }
}
