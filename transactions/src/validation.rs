//! Stateless transaction validation.
//!
//! Nothing here looks at balances, batches or wallet status; those checks
//! belong to the ledger. A transaction that passes here is well formed, inside
//! the clock-skew window, and signed by its sender.

use std::collections::HashSet;

use crate::error::TransactionError;
use crate::Transaction;
use burst_crypto::{public_key_of, validate_address};
use burst_types::{Timestamp, WalletAddress};

/// Run every stateless check in order: addresses, structure, clock skew,
/// then hash and signature when `verify_signatures` is set.
pub fn validate_transaction(
    tx: &Transaction,
    now: Timestamp,
    tolerance_secs: u64,
    verify_signatures: bool,
) -> Result<(), TransactionError> {
    if verify_signatures {
        check_address(tx.sender())?;
    }
    check_structure(tx)?;
    check_clock_skew(tx, now, tolerance_secs)?;
    if verify_signatures {
        verify_signature(tx)?;
    }
    Ok(())
}

fn check_address(address: &WalletAddress) -> Result<(), TransactionError> {
    if validate_address(address.as_str()) {
        Ok(())
    } else {
        Err(TransactionError::InvalidAddress(address.to_string()))
    }
}

/// Shape checks that need no state.
pub fn check_structure(tx: &Transaction) -> Result<(), TransactionError> {
    match tx {
        Transaction::Burn(burn) => {
            if burn.amount == 0 {
                return Err(TransactionError::ZeroAmount);
            }
            if burn.sender == burn.receiver {
                return Err(TransactionError::SelfTransfer);
            }
        }
        Transaction::Send(send) => {
            if send.amount == 0 {
                return Err(TransactionError::ZeroAmount);
            }
            if send.sender == send.receiver {
                return Err(TransactionError::SelfTransfer);
            }
            if send.link.is_zero() || send.origin.is_zero() {
                return Err(TransactionError::MissingLink);
            }
        }
        Transaction::Split(split) => {
            if split.outputs.len() < 2 {
                return Err(TransactionError::TooFewOutputs);
            }
            if split.outputs.iter().any(|o| o.amount == 0) {
                return Err(TransactionError::ZeroAmount);
            }
            if split.link.is_zero() || split.origin.is_zero() {
                return Err(TransactionError::MissingLink);
            }
        }
        Transaction::Merge(merge) => {
            if merge.inputs.len() < 2 {
                return Err(TransactionError::TooFewInputs);
            }
            let mut seen = HashSet::with_capacity(merge.inputs.len());
            for input in &merge.inputs {
                if input.is_zero() {
                    return Err(TransactionError::MissingLink);
                }
                if !seen.insert(input) {
                    return Err(TransactionError::DuplicateInput(*input));
                }
            }
        }
    }
    Ok(())
}

/// Reject timestamps further than `tolerance_secs` from the local clock,
/// in either direction.
pub fn check_clock_skew(
    tx: &Transaction,
    now: Timestamp,
    tolerance_secs: u64,
) -> Result<(), TransactionError> {
    let skew = tx.timestamp().abs_diff(now);
    if skew > tolerance_secs {
        return Err(TransactionError::ClockSkew {
            tx_secs: tx.timestamp().as_secs(),
            skew_secs: skew,
            tolerance_secs,
        });
    }
    Ok(())
}

/// The declared hash must match the contents, and the signature over it must
/// verify against the key encoded in the sender's address.
pub fn verify_signature(tx: &Transaction) -> Result<(), TransactionError> {
    let computed = tx.compute_hash();
    if computed != *tx.hash() {
        return Err(TransactionError::HashMismatch {
            declared: *tx.hash(),
            computed,
        });
    }
    let public = public_key_of(tx.sender())
        .ok_or_else(|| TransactionError::InvalidAddress(tx.sender().to_string()))?;
    if !burst_crypto::verify_signature(tx.hash().as_bytes(), tx.signature(), &public) {
        return Err(TransactionError::InvalidSignature { tx_hash: *tx.hash() });
    }
    Ok(())
}
