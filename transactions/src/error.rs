use burst_types::{TxHash, WalletAddress};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stateless validation failures.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("invalid signature on transaction {tx_hash}")]
    InvalidSignature { tx_hash: TxHash },

    #[error("declared hash {declared} does not match contents ({computed})")]
    HashMismatch { declared: TxHash, computed: TxHash },

    #[error("timestamp {tx_secs}s is {skew_secs}s from local clock, tolerance is {tolerance_secs}s")]
    ClockSkew {
        tx_secs: u64,
        skew_secs: u64,
        tolerance_secs: u64,
    },

    #[error("amount must be positive")]
    ZeroAmount,

    #[error("sender and receiver must differ")]
    SelfTransfer,

    #[error("split requires at least 2 outputs")]
    TooFewOutputs,

    #[error("merge requires at least 2 inputs")]
    TooFewInputs,

    #[error("merge lists input {0} more than once")]
    DuplicateInput(TxHash),

    #[error("transaction must reference a batch")]
    MissingLink,

    #[error("malformed address: {0}")]
    InvalidAddress(String),
}

/// Why the core refused a transaction. Nothing was applied, and the core never
/// retries.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    #[error("insufficient BRN: need {needed}, available {available}")]
    InsufficientBrn { needed: u128, available: u128 },

    #[error("insufficient TRST: need {needed}, available {available}")]
    InsufficientTrst { needed: u128, available: u128 },

    #[error("outputs total {total}, consumed amount is {expected}")]
    AmountMismatch { total: u128, expected: u128 },

    #[error("batch {batch} has expired")]
    Expired { batch: TxHash },

    #[error("batch {batch} is revoked or tainted")]
    Revoked { batch: TxHash },

    #[error("batch {batch} is awaiting a revocation sweep")]
    RevocationPending { batch: TxHash },

    #[error("bad signature")]
    BadSignature,

    #[error("timestamp outside the clock-skew window by {skew_secs}s")]
    ClockSkew { skew_secs: u64 },

    #[error("wallet {wallet} is not verified")]
    WalletNotVerified { wallet: WalletAddress },

    #[error("batch {batch} is not live")]
    UnknownBatch { batch: TxHash },

    #[error("batch {batch} is not held by the sender")]
    NotHolder { batch: TxHash },

    #[error("declared origin {declared} but batch origin is {actual}")]
    ProvenanceMismatch { declared: TxHash, actual: TxHash },

    #[error("malformed transaction: {detail}")]
    Malformed { detail: String },

    #[error("duplicate transaction {hash}")]
    Duplicate { hash: TxHash },
}

impl From<TransactionError> for RejectReason {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::InvalidSignature { .. } => Self::BadSignature,
            TransactionError::ClockSkew { skew_secs, .. } => Self::ClockSkew { skew_secs },
            other => Self::Malformed {
                detail: other.to_string(),
            },
        }
    }
}
