//! TRST (Trust): the transferable currency lifecycle engine.
//!
//! TRST is created when BRN is burned (1:1 ratio). Every live batch carries:
//! - `origin`: the founding burn (or the merge that founded its lineage)
//! - `link`: hash of the transaction that created it
//! - `constituent_origins`: how much of it descends from each burn
//!
//! This crate handles the live-batch index (mint, send, split, merge), the
//! **merger graph** (the forward index that makes revocation a one-time
//! traversal), bounded revocation sweeps with checkpointing, and expiry.

pub mod batch;
pub mod engine;
pub mod error;
pub mod expiry;
pub mod journal;
pub mod merger_graph;
pub mod revocation;

pub use batch::LiveBatch;
pub use engine::{BatchView, Portfolio, TransferContext, TransferOutcome, TrstEngine};
pub use error::TrstError;
pub use journal::{FileJournal, MemoryJournal, RevocationJournal};
pub use merger_graph::{MergeNode, MergeSource, MergerGraph};
pub use revocation::{BeginOutcome, RevocationEngine, RevocationToken, StepReport, Sweep};
