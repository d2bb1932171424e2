use burst_ledger::{Ledger, LedgerConfig, LedgerError, VerificationEvent};
use burst_transactions::{BurnTx, SendTx, Transaction};
use burst_types::{Signature, Timestamp, TxHash, WalletAddress, WalletState};
use proptest::prelude::*;

fn addr(name: &str) -> WalletAddress {
    WalletAddress::new(format!("brst_{name}"))
}

fn verified_ledger(wallet: &WalletAddress) -> Ledger {
    let mut ledger = Ledger::new(LedgerConfig {
        brn_rate: 1,
        trst_expiry_secs: 1_000_000_000,
        verify_signatures: false,
        ..LedgerConfig::default()
    });
    for status in [WalletState::PendingVerification, WalletState::Verified] {
        ledger
            .apply_verification(&VerificationEvent {
                wallet: wallet.clone(),
                new_status: status,
                timestamp: Timestamp::new(0),
            })
            .unwrap();
    }
    ledger
}

fn burn(from: &WalletAddress, to: &WalletAddress, amount: u128, at: u64) -> Transaction {
    Transaction::Burn(BurnTx {
        hash: TxHash::ZERO,
        sender: from.clone(),
        receiver: to.clone(),
        amount,
        timestamp: Timestamp::new(at),
        signature: Signature::EMPTY,
    })
    .sealed()
}

proptest! {
    /// Whatever is attempted, available = accrued − burned and never goes negative.
    #[test]
    fn brn_balance_is_accrual_minus_accepted_burns(
        attempts in prop::collection::vec((1u64..100, 1u128..200), 1..40)
    ) {
        let (a, b) = (addr("a"), addr("b"));
        let mut ledger = verified_ledger(&a);
        let mut t = 0u64;
        let mut burned = 0u128;
        for (delta, amount) in attempts {
            t += delta;
            let available = ledger.available_brn(&a, Timestamp::new(t));
            let result = ledger.submit(burn(&a, &b, amount, t), Timestamp::new(t));
            if amount <= available {
                prop_assert!(result.is_ok());
                burned += amount;
            } else {
                prop_assert!(
                    matches!(result, Err(LedgerError::Rejected(_))),
                    "unexpected result {:?}",
                    result
                );
            }
            prop_assert_eq!(
                ledger.available_brn(&a, Timestamp::new(t)),
                u128::from(t) - burned
            );
        }
        let minted: u128 = ledger.trst().batches().map(|batch| batch.amount).sum();
        prop_assert_eq!(minted, burned);
    }

    /// Peeling a burn apart with sends never creates or destroys TRST and
    /// never changes its origin.
    #[test]
    fn sends_conserve_supply_and_origin(
        total in 100u128..10_000,
        pieces in prop::collection::vec(1u128..500, 1..20)
    ) {
        let (a, b) = (addr("a"), addr("b"));
        let mut ledger = verified_ledger(&a);
        let start = total as u64;
        let t1 = ledger.submit(burn(&a, &b, total, start), Timestamp::new(start)).unwrap().hash;

        let mut current = t1;
        let mut remaining = total;
        for (i, piece) in pieces.into_iter().enumerate() {
            if remaining == 0 {
                break;
            }
            let amount = piece.min(remaining);
            let at = start + i as u64 + 1;
            let send = Transaction::Send(SendTx {
                hash: TxHash::ZERO,
                sender: b.clone(),
                receiver: addr(&format!("r{i}")),
                amount,
                timestamp: Timestamp::new(at),
                link: current,
                origin: t1,
                signature: Signature::EMPTY,
            })
            .sealed();
            let out = ledger.submit(send, Timestamp::new(at)).unwrap();
            remaining -= amount;
            if remaining > 0 {
                prop_assert_eq!(out.outputs.len(), 2);
                current = out.outputs[1];
            } else {
                prop_assert_eq!(out.outputs.len(), 1);
            }

            let live: Vec<_> = ledger.trst().batches().collect();
            prop_assert_eq!(live.iter().map(|batch| batch.amount).sum::<u128>(), total);
            prop_assert!(live.iter().all(|batch| batch.origin == t1));
            prop_assert!(live.iter().all(|batch| batch.tainted <= batch.amount));
        }
        prop_assert_eq!(ledger.trst_portfolio(&b, Timestamp::new(start)).transferable, remaining);
    }
}
