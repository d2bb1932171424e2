//! Wallet address type with `brst_` prefix.

use crate::error::BurstError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A BURST wallet address, always prefixed with `brst_`.
///
/// Derived from the wallet's public key via Blake2b checksum + base32 encoding
/// (see `burst_crypto::derive_address`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// The standard prefix for all BURST wallet addresses.
    pub const PREFIX: &'static str = "brst_";

    /// Create a new wallet address from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `brst_`. Use [`WalletAddress::parse`]
    /// for untrusted input.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "address must start with brst_");
        Self(s)
    }

    /// Parse an address from untrusted input.
    pub fn parse(raw: impl Into<String>) -> Result<Self, BurstError> {
        let s = raw.into();
        let addr = Self(s);
        if addr.is_valid() {
            Ok(addr)
        } else {
            Err(BurstError::InvalidAddress(addr.0))
        }
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this address is well-formed.
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::PREFIX.len()
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
