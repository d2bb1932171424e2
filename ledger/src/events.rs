//! Typed inputs from the collaborators around the core.
//!
//! Verification, governance and staking outcomes arrive as events; the core
//! never reaches out to those systems. [`LedgerEvent`] is the union used by
//! event logs, one JSON object per line.
//!
//! Enums here are externally tagged (`{"verification": {...}}`). Internally
//! tagged enums buffer their content, which loses `u128` amounts above
//! `u64::MAX`.

use burst_brn::{StakeId, StakeKind};
use burst_transactions::Transaction;
use burst_types::{Timestamp, WalletAddress, WalletState};
use serde::{Deserialize, Serialize};

pub use burst_governance::ParamChange;

/// A wallet status change decided by the verification process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationEvent {
    pub wallet: WalletAddress,
    pub new_status: WalletState,
    pub timestamp: Timestamp,
}

/// A BRN stake lifecycle step decided by the verification process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeEvent {
    Lock {
        staker: WalletAddress,
        amount: u128,
        kind: StakeKind,
        lock_expires_at: Option<Timestamp>,
        timestamp: Timestamp,
    },
    Return {
        staker: WalletAddress,
        stake_id: StakeId,
        timestamp: Timestamp,
    },
    Forfeit {
        staker: WalletAddress,
        stake_id: StakeId,
        timestamp: Timestamp,
    },
}

impl StakeEvent {
    pub fn staker(&self) -> &WalletAddress {
        match self {
            Self::Lock { staker, .. } | Self::Return { staker, .. } | Self::Forfeit { staker, .. } => {
                staker
            }
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::Lock { timestamp, .. }
            | Self::Return { timestamp, .. }
            | Self::Forfeit { timestamp, .. } => *timestamp,
        }
    }
}

/// Any input the ledger consumes, in the order it must be applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    Transaction(Transaction),
    Verification(VerificationEvent),
    ParamChange(ParamChange),
    Stake(StakeEvent),
    /// Advance queued revocation sweeps by up to `budget` graph keys.
    RevocationStep { budget: usize, timestamp: Timestamp },
}

impl LedgerEvent {
    /// The instant the event takes effect. Replays use it as the clock.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::Transaction(tx) => tx.timestamp(),
            Self::Verification(event) => event.timestamp,
            Self::ParamChange(change) => change.effective_at,
            Self::Stake(stake) => stake.timestamp(),
            Self::RevocationStep { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_event_from_json() {
        let line = r#"{"verification":{"wallet":"brst_a","new_status":"Verified","timestamp":42}}"#;
        let event: LedgerEvent = serde_json::from_str(line).unwrap();
        assert_eq!(
            event,
            LedgerEvent::Verification(VerificationEvent {
                wallet: WalletAddress::new("brst_a"),
                new_status: WalletState::Verified,
                timestamp: Timestamp::new(42),
            })
        );
        assert_eq!(event.timestamp(), Timestamp::new(42));
    }

    #[test]
    fn param_change_from_json() {
        let line = r#"{"param_change":{"param":"brn_rate","new_value":340282366920938463463374607431768211455,"effective_at":100}}"#;
        let event: LedgerEvent = serde_json::from_str(line).unwrap();
        assert!(matches!(event, LedgerEvent::ParamChange(ref c) if c.new_value == u128::MAX));
    }

    #[test]
    fn stake_event_from_json() {
        let line = r#"{"stake":{"return":{"staker":"brst_a","stake_id":3,"timestamp":9}}}"#;
        let event: LedgerEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event.timestamp(), Timestamp::new(9));
    }
}
