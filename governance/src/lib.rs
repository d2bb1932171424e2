//! Governed protocol parameters as seen by the accounting core.
//!
//! Proposal, voting and tallying happen elsewhere; this crate only consumes
//! their outcome as [`ParamChange`] events and keeps every governed value as an
//! append-only sequence of `(value, effective_at)` entries. BRN accrual and
//! TRST expiry are pure functions over this table, so every node recomputes
//! the same answers without shared mutable state.

pub mod error;
pub mod params;
pub mod schedule;
pub mod table;

pub use error::GovernanceError;
pub use params::{GovernableParam, ParamChange};
pub use schedule::{ParamEntry, ParamSchedule, RateSegment};
pub use table::ParameterTable;
