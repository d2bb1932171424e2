//! The Parameter Table: versioned `r` and `e`.

use crate::error::GovernanceError;
use crate::params::{GovernableParam, ParamChange};
use crate::schedule::ParamSchedule;
use burst_types::{ProtocolParams, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterTable {
    brn_rate: ParamSchedule,
    trst_expiry: ParamSchedule,
}

impl ParameterTable {
    pub fn from_genesis(params: &ProtocolParams, genesis: Timestamp) -> Self {
        Self {
            brn_rate: ParamSchedule::new(params.brn_rate, genesis),
            trst_expiry: ParamSchedule::new(u128::from(params.trst_expiry_secs), genesis),
        }
    }

    /// Append an activated governance outcome.
    pub fn apply(&mut self, change: &ParamChange) -> Result<(), GovernanceError> {
        match change.param {
            GovernableParam::BrnRate => self.brn_rate.push(change.new_value, change.effective_at)?,
            GovernableParam::TrstExpirySecs => {
                if change.new_value > u128::from(u64::MAX) {
                    return Err(GovernanceError::ValueOutOfRange {
                        param: change.param.name(),
                        value: change.new_value,
                    });
                }
                self.trst_expiry.push(change.new_value, change.effective_at)?
            }
        }
        info!(
            param = change.param.name(),
            value = %change.new_value,
            effective_at = change.effective_at.as_secs(),
            "parameter change applied"
        );
        Ok(())
    }

    pub fn schedule(&self, param: GovernableParam) -> &ParamSchedule {
        match param {
            GovernableParam::BrnRate => &self.brn_rate,
            GovernableParam::TrstExpirySecs => &self.trst_expiry,
        }
    }

    pub fn brn_rate(&self) -> &ParamSchedule {
        &self.brn_rate
    }

    /// The expiry period currently in force, applied to every batch.
    pub fn current_expiry_secs(&self) -> u64 {
        to_secs(self.trst_expiry.current())
    }

    pub fn expiry_secs_at(&self, t: Timestamp) -> u64 {
        to_secs(self.trst_expiry.value_at(t))
    }
}

fn to_secs(v: u128) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_then_change() {
        let params = ProtocolParams {
            brn_rate: 10,
            trst_expiry_secs: 1_000,
        };
        let mut table = ParameterTable::from_genesis(&params, Timestamp::new(0));
        assert_eq!(table.current_expiry_secs(), 1_000);

        table
            .apply(&ParamChange {
                param: GovernableParam::TrstExpirySecs,
                new_value: 5_000,
                effective_at: Timestamp::new(100),
            })
            .unwrap();
        assert_eq!(table.current_expiry_secs(), 5_000);
        assert_eq!(table.expiry_secs_at(Timestamp::new(50)), 1_000);
        assert_eq!(table.brn_rate().current(), 10);
    }

    #[test]
    fn oversized_expiry_is_rejected() {
        let mut table = ParameterTable::from_genesis(&ProtocolParams::default(), Timestamp::EPOCH);
        let err = table
            .apply(&ParamChange {
                param: GovernableParam::TrstExpirySecs,
                new_value: u128::from(u64::MAX) + 1,
                effective_at: Timestamp::new(1),
            })
            .unwrap_err();
        assert!(matches!(err, GovernanceError::ValueOutOfRange { .. }));
    }

    #[test]
    fn normal_money_never_expires() {
        let table = ParameterTable::from_genesis(&ProtocolParams::normal_money(), Timestamp::EPOCH);
        assert_eq!(table.current_expiry_secs(), u64::MAX);
        assert_eq!(table.brn_rate().current(), 0);
    }
}
