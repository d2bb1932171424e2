//! BRN-specific errors.

use burst_types::Timestamp;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrnError {
    #[error("insufficient BRN: need {needed}, available {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("wallet has never been verified, no BRN state")]
    WalletNotVerified,

    #[error("stake {0} not found")]
    StakeNotFound(u64),

    #[error("stake {0} lock expired before it was forfeited")]
    StakeLockExpired(u64),

    #[error("stake lock must expire after it is created (lock {lock}, now {now})")]
    InvalidLock { lock: Timestamp, now: Timestamp },

    #[error("arithmetic overflow in BRN computation")]
    Overflow,

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("accrual boundary {at} precedes the open period start {start}")]
    InvalidTimestamp { at: Timestamp, start: Timestamp },
}
