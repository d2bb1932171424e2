//! TRST-specific errors.

use burst_types::{TxHash, WalletAddress};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrstError {
    #[error("batch {0} is not in the live index")]
    UnknownBatch(TxHash),

    #[error("batch {batch} is held by {holder}, not {sender}")]
    NotHolder {
        batch: TxHash,
        holder: WalletAddress,
        sender: WalletAddress,
    },

    #[error("batch {0} has expired")]
    Expired(TxHash),

    #[error("batch {0} has been revoked")]
    Revoked(TxHash),

    #[error("batch {0} is partially revoked and cannot be merged")]
    Tainted(TxHash),

    #[error("batch {0} is awaiting a revocation sweep")]
    RevocationPending(TxHash),

    #[error("insufficient TRST: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("outputs ({total}) do not equal the consumed amount ({expected})")]
    AmountMismatch { total: u128, expected: u128 },

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("split requires at least 2 outputs")]
    TooFewOutputs,

    #[error("merge requires at least 2 distinct inputs")]
    TooFewInputs,

    #[error("batch {0} appears twice in one merge")]
    DuplicateInput(TxHash),

    #[error("batch {0} already exists in the live index")]
    DuplicateBatch(TxHash),

    #[error("merge {0} would introduce a cycle in the merger graph")]
    MergeCycle(TxHash),

    #[error("arithmetic overflow in TRST amounts")]
    Overflow,

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("revocation journal error: {0}")]
    Journal(String),
}

impl TrstError {
    /// Whether this error means committed state is inconsistent rather than a
    /// transaction being invalid.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateBatch(_) | Self::MergeCycle(_) | Self::Overflow | Self::Invariant(_)
        )
    }
}
