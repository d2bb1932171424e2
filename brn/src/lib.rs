//! BRN (Burn): the birthright computation engine.
//!
//! BRN is a deterministic function of time, not a token on the ledger.
//! `BRN(w) = Σ(r_i × duration_i) − total_burned(w) − locked_stake(w)`
//!
//! The rate history is owned by the parameter table
//! ([`burst_governance::ParamSchedule`]); this crate intersects it with each
//! wallet's accrual periods. It handles:
//! - Balance computation from time and wallet state
//! - Recording burn operations (BRN → TRST minting)
//! - Staking, returning and forfeiting BRN for verification and challenges

pub mod engine;
pub mod error;
pub mod stake;
pub mod state;

pub use engine::BrnEngine;
pub use error::BrnError;
pub use stake::{Stake, StakeId, StakeKind};
pub use state::{accrued_checked, AccrualPeriod, BrnWalletState};
