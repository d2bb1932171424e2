//! The BURST ledger core.
//!
//! Every wallet has its own append-only chain of the transactions it signed.
//! Inputs arrive already ordered per account; the ledger validates each one
//! completely, then commits it against BRN balances, the TRST live index and
//! the merger graph. Fraud revocations run as budgeted sweeps in between.

pub mod account_chain;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod processor;
pub mod pruning;
pub mod snapshot;
pub mod validator;
pub mod wallet;

pub use account_chain::AccountChain;
pub use config::LedgerConfig;
pub use error::LedgerError;
pub use events::{LedgerEvent, ParamChange, StakeEvent, VerificationEvent};
pub use ledger::{Accepted, EventOutcome, Ledger, LedgerState};
pub use processor::LedgerProcessor;
pub use pruning::{LedgerPruner, PruneResult, PruningConfig};
pub use snapshot::LedgerSnapshot;
pub use wallet::{StatusEffect, WalletRecord};
