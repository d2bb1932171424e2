//! Genesis protocol parameters.
//!
//! The general equation: BURST is defined by `brn_rate` and `trst_expiry_secs`.
//! Normal money is the special case where `brn_rate = 0` and `trst_expiry_secs = u64::MAX`.
//! Both are democratically governable after genesis; the versioned history of
//! their values lives in `burst_governance::ParameterTable`.

use serde::{Deserialize, Serialize};

/// Raw units per whole BRN (and per whole TRST, minted 1:1).
pub const BRN_UNIT: u128 = 1_000_000_000_000_000_000;

/// Parameters in force at genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// BRN accrual rate: raw units per second per verified wallet.
    pub brn_rate: u128,

    /// TRST expiry period in seconds from the origin burn timestamp.
    /// Set to `u64::MAX` for "never expires" (normal money mode).
    pub trst_expiry_secs: u64,
}

impl ProtocolParams {
    /// 1 BRN per hour expressed as raw units per second (rounded up).
    pub const BRN_RATE_1_PER_HOUR: u128 = BRN_UNIT / 3600 + 1; // 277_777_777_777_778

    /// BURST UBI defaults: the intended configuration for the live network.
    pub fn burst_defaults() -> Self {
        Self {
            brn_rate: Self::BRN_RATE_1_PER_HOUR,
            trst_expiry_secs: 365 * 24 * 3600, // 1 year
        }
    }

    /// Ordinary money: no income, no expiry.
    pub fn normal_money() -> Self {
        Self {
            brn_rate: 0,
            trst_expiry_secs: u64::MAX,
        }
    }
}

/// Default is the BURST UBI configuration.
impl Default for ProtocolParams {
    fn default() -> Self {
        Self::burst_defaults()
    }
}
