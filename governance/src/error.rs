use burst_types::Timestamp;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("unknown governable parameter: {0}")]
    UnknownParameter(String),

    #[error("parameter change effective at {effective_at} precedes the latest entry at {latest}")]
    EffectiveTimeRegression {
        effective_at: Timestamp,
        latest: Timestamp,
    },

    #[error("value {value} is out of range for {param}")]
    ValueOutOfRange { param: &'static str, value: u128 },
}
