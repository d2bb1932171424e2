//! Ledger pruning: drop dead TRST batches from the live index.
//!
//! Once a batch is non-transferable for good (expired past a grace age, or
//! fully revoked) nothing can consume it again. The transactions that created
//! it stay in the transaction store; only the live-index entry goes.

use burst_trst::{expiry, TrstEngine};
use burst_types::{Timestamp, TxHash};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Configuration for ledger pruning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruningConfig {
    /// Whether pruning is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// How long an expired batch stays visible after expiry (in seconds).
    #[serde(default = "default_max_expired_age")]
    pub max_expired_age_secs: u64,
    /// Whether to prune fully revoked batches.
    #[serde(default = "default_true")]
    pub prune_revoked: bool,
    /// Maximum number of batches removed per call.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_max_expired_age() -> u64 {
    30 * 24 * 3600 // 30 days
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    1000
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_expired_age_secs: default_max_expired_age(),
            prune_revoked: true,
            batch_size: default_batch_size(),
        }
    }
}

/// Result of a pruning operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PruneResult {
    pub expired_pruned: usize,
    pub revoked_pruned: usize,
    pub total_pruned: usize,
}

/// Decides which batches leave the live index.
pub struct LedgerPruner {
    config: PruningConfig,
}

impl LedgerPruner {
    pub fn new(config: PruningConfig) -> Self {
        Self { config }
    }

    /// Live batches eligible for pruning at `now`, sorted by id.
    ///
    /// Returns `(expired, revoked)`. A batch past its grace age is expired
    /// even if it is also tainted.
    pub fn candidates(
        &self,
        trst: &TrstEngine,
        now: Timestamp,
        expiry_secs: u64,
    ) -> (Vec<TxHash>, Vec<TxHash>) {
        let mut expired = Vec::new();
        let mut revoked = Vec::new();
        for batch in trst.batches() {
            let grace_end = expiry::expires_at(batch.expiry_source, expiry_secs)
                .saturating_add(self.config.max_expired_age_secs);
            if batch.is_expired(now, expiry_secs) && now > grace_end {
                expired.push(batch.id);
            } else if batch.is_fully_tainted() {
                revoked.push(batch.id);
            }
        }
        expired.sort();
        revoked.sort();
        (expired, revoked)
    }

    /// Pick at most `batch_size` ids, expired first.
    pub fn find_pruneable(&self, expired_hashes: &[TxHash], revoked_hashes: &[TxHash]) -> Vec<TxHash> {
        let mut to_prune = Vec::new();

        if !self.config.enabled {
            return to_prune;
        }

        to_prune.extend(expired_hashes.iter().take(self.config.batch_size).cloned());

        if self.config.prune_revoked {
            let remaining = self.config.batch_size.saturating_sub(to_prune.len());
            to_prune.extend(revoked_hashes.iter().take(remaining).cloned());
        }

        to_prune
    }

    /// Remove eligible batches from `trst`.
    pub fn prune(&self, trst: &mut TrstEngine, now: Timestamp, expiry_secs: u64) -> PruneResult {
        if !self.config.enabled {
            return PruneResult::default();
        }
        let (expired, revoked) = self.candidates(trst, now, expiry_secs);
        let pruneable = self.find_pruneable(&expired, &revoked);

        let expired_count = expired.len().min(pruneable.len());
        let mut removed: usize = 0;
        for id in &pruneable {
            if trst.remove(id).is_some() {
                removed += 1;
            }
        }
        let result = PruneResult {
            expired_pruned: expired_count,
            revoked_pruned: removed.saturating_sub(expired_count),
            total_pruned: removed,
        };
        if removed > 0 {
            info!(
                expired = result.expired_pruned,
                revoked = result.revoked_pruned,
                "pruned live batches"
            );
        }
        result
    }

    pub fn config(&self) -> &PruningConfig {
        &self.config
    }
}
