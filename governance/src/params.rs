//! Parameters the accounting core reacts to, and the event that changes them.

use crate::error::GovernanceError;
use burst_types::Timestamp;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Protocol parameters that can be changed by governance vote and that the
/// accounting core consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernableParam {
    /// `r`: BRN accrual rate in raw units per second.
    BrnRate,
    /// `e`: TRST expiry period in seconds.
    TrstExpirySecs,
}

impl GovernableParam {
    /// Human-readable name of this parameter.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BrnRate => "brn_rate",
            Self::TrstExpirySecs => "trst_expiry_secs",
        }
    }
}

impl FromStr for GovernableParam {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "brn_rate" | "r" => Ok(Self::BrnRate),
            "trst_expiry_secs" | "e" => Ok(Self::TrstExpirySecs),
            other => Err(GovernanceError::UnknownParameter(other.to_string())),
        }
    }
}

/// An activated governance outcome: `param` takes `new_value` from `effective_at` on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamChange {
    pub param: GovernableParam,
    pub new_value: u128,
    pub effective_at: Timestamp,
}
