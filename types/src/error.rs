//! Top-level error type shared across crates.

use thiserror::Error;

/// Errors raised by the shared types themselves.
#[derive(Debug, Error)]
pub enum BurstError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("invalid hash: {0}")]
    InvalidHash(String),
}
