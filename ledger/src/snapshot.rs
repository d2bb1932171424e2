//! Ledger snapshots: the complete core state at a point in time.
//!
//! No storage engine is chosen here: a snapshot is a byte blob the host
//! writes wherever it likes. The state is encoded once with bincode and the
//! Blake2b-256 hash covers exactly those bytes, so integrity checks never
//! depend on map iteration order.

use burst_crypto::blake2b_256;
use burst_types::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::ledger::LedgerState;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Blake2b-256 of `state`.
    pub hash: [u8; 32],
    pub created_at: Timestamp,
    /// Snapshot version for compatibility.
    pub version: u32,
    pub transaction_count: u64,
    state: Vec<u8>,
}

impl LedgerSnapshot {
    pub(crate) fn capture(state: &LedgerState, created_at: Timestamp) -> Result<Self, LedgerError> {
        let bytes = bincode::serialize(state).map_err(|e| LedgerError::Snapshot(e.to_string()))?;
        Ok(Self {
            hash: blake2b_256(&bytes),
            created_at,
            version: SNAPSHOT_VERSION,
            transaction_count: state.transactions.len() as u64,
            state: bytes,
        })
    }

    /// Verify the snapshot hash matches the state bytes.
    pub fn verify(&self) -> bool {
        self.hash == blake2b_256(&self.state)
    }

    pub(crate) fn state(&self) -> Result<LedgerState, LedgerError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(LedgerError::Snapshot(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }
        if !self.verify() {
            return Err(LedgerError::Snapshot("hash does not match state".into()));
        }
        bincode::deserialize(&self.state).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }

    /// Serialize the snapshot to bytes (bincode).
    pub fn to_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        bincode::serialize(self).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }

    /// Deserialize a snapshot from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        bincode::deserialize(bytes).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }

    pub fn size_bytes(&self) -> usize {
        self.state.len()
    }
}
