//! Revocation Engine.
//!
//! Revoking wallet `w` at `t_catch` adds every burn `w` made to the global
//! revoked-origin set, then walks the merger graph forward from those burns.
//! Each live batch whose origin is reached gets its cached taint recomputed as
//! the sum of its revoked constituents. Because the recomputation always reads
//! the global set, overlapping revocations compose and replays change nothing.
//!
//! Sweeps advance in bounded steps. While a sweep is queued, transfers touching
//! its origins fail fast instead of reading a stale cache.

use std::collections::{BTreeSet, VecDeque};

use burst_types::{Timestamp, TxHash, WalletAddress};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::batch::LiveBatch;
use crate::engine::TrstEngine;
use crate::error::TrstError;
use crate::journal::RevocationJournal;

/// Idempotency token of one revocation event.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RevocationToken {
    pub wallet: WalletAddress,
    pub t_catch: Timestamp,
}

/// Progress of one revocation through the merger graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sweep {
    pub token: RevocationToken,
    /// The revoked wallet's burns.
    pub origins: BTreeSet<TxHash>,
    frontier: VecDeque<TxHash>,
    visited: BTreeSet<TxHash>,
    pub batches_retainted: u64,
}

impl Sweep {
    pub fn keys_visited(&self) -> usize {
        self.visited.len()
    }

    pub fn is_done(&self) -> bool {
        self.frontier.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BeginOutcome {
    /// Queued a sweep over this many burns (zero-burn revocations complete at once).
    Started { origins: usize },
    AlreadyApplied,
    AlreadyPending,
}

/// What one call to [`RevocationEngine::step`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    pub keys_visited: usize,
    pub batches_retainted: usize,
    pub completed: Vec<RevocationToken>,
    /// Whether sweeps remain queued.
    pub pending: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationEngine {
    revoked_origins: BTreeSet<TxHash>,
    applied: BTreeSet<RevocationToken>,
    queue: VecDeque<Sweep>,
}

impl RevocationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoked_origins(&self) -> &BTreeSet<TxHash> {
        &self.revoked_origins
    }

    pub fn is_applied(&self, token: &RevocationToken) -> bool {
        self.applied.contains(token)
    }

    pub fn is_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Sweep> {
        self.queue.iter()
    }

    /// Whether a queued sweep may still change `batch`'s taint.
    pub fn blocks(&self, batch: &LiveBatch) -> bool {
        self.queue
            .iter()
            .any(|sweep| batch.touches_any(sweep.origins.iter()))
    }

    /// Start revoking `wallet`. Idempotent per `(wallet, t_catch)`.
    pub fn begin(
        &mut self,
        wallet: &WalletAddress,
        t_catch: Timestamp,
        trst: &TrstEngine,
    ) -> BeginOutcome {
        let token = RevocationToken {
            wallet: wallet.clone(),
            t_catch,
        };
        if self.applied.contains(&token) {
            debug!(wallet = %wallet, t_catch = t_catch.as_secs(), "revocation replay ignored");
            return BeginOutcome::AlreadyApplied;
        }
        if self.queue.iter().any(|s| s.token == token) {
            return BeginOutcome::AlreadyPending;
        }

        let origins = trst.burns_of(wallet);
        let count = origins.len();
        self.revoked_origins.extend(origins.iter().copied());
        info!(wallet = %wallet, t_catch = t_catch.as_secs(), origins = count, "revocation started");
        if origins.is_empty() {
            self.applied.insert(token);
            return BeginOutcome::Started { origins: 0 };
        }
        self.queue.push_back(Sweep {
            token,
            frontier: origins.iter().copied().collect(),
            origins,
            visited: BTreeSet::new(),
            batches_retainted: 0,
        });
        BeginOutcome::Started { origins: count }
    }

    /// Visit at most `budget` graph keys across the queued sweeps.
    ///
    /// Fails with an invariant violation if a recomputation would lower a
    /// batch's taint, which only happens if the index and the revoked set
    /// disagree.
    pub fn step(&mut self, trst: &mut TrstEngine, budget: usize) -> Result<StepReport, TrstError> {
        let mut report = StepReport::default();
        while report.keys_visited < budget {
            let Some(sweep) = self.queue.front_mut() else {
                break;
            };
            match sweep.frontier.pop_front() {
                Some(key) => {
                    if !sweep.visited.insert(key) {
                        continue;
                    }
                    report.keys_visited += 1;
                    for id in trst.batches_with_origin(&key) {
                        if let Some((before, after)) = trst.retaint(&id, &self.revoked_origins) {
                            if after < before {
                                error!(batch = %id, before = %before, after = %after, "revocation lowered taint");
                                return Err(TrstError::Invariant(format!(
                                    "taint of batch {id} fell from {before} to {after}"
                                )));
                            }
                            sweep.batches_retainted += 1;
                            report.batches_retainted += 1;
                        }
                    }
                    for merge in trst.merger_graph().merges_of(&key) {
                        if !sweep.visited.contains(merge) {
                            sweep.frontier.push_back(*merge);
                        }
                    }
                }
                None => {
                    self.complete_front(&mut report);
                }
            }
        }
        // A sweep whose frontier just emptied completes without spending budget.
        while self.queue.front().is_some_and(Sweep::is_done) {
            self.complete_front(&mut report);
        }
        report.pending = self.is_pending();
        debug!(
            keys = report.keys_visited,
            batches = report.batches_retainted,
            pending = report.pending,
            "revocation step"
        );
        Ok(report)
    }

    fn complete_front(&mut self, report: &mut StepReport) {
        if let Some(done) = self.queue.pop_front() {
            info!(
                wallet = %done.token.wallet,
                t_catch = done.token.t_catch.as_secs(),
                keys = done.keys_visited(),
                batches = done.batches_retainted,
                "revocation complete"
            );
            report.completed.push(done.token.clone());
            self.applied.insert(done.token);
        }
    }

    /// [`step`](Self::step), then checkpoint to `journal`. The journal is
    /// cleared once nothing is pending.
    pub fn step_journaled(
        &mut self,
        trst: &mut TrstEngine,
        budget: usize,
        journal: &mut dyn RevocationJournal,
    ) -> Result<StepReport, TrstError> {
        let report = self.step(trst, budget)?;
        if report.pending {
            journal.save(self)?;
        } else {
            journal.clear()?;
        }
        Ok(report)
    }

    /// Run every queued sweep to completion.
    pub fn run_to_completion(&mut self, trst: &mut TrstEngine) -> Result<StepReport, TrstError> {
        self.step(trst, usize::MAX)
    }

    /// Reload the last checkpoint after a restart, if any.
    pub fn resume(journal: &dyn RevocationJournal) -> Result<Option<Self>, TrstError> {
        let restored = journal.load()?;
        if let Some(engine) = &restored {
            info!(pending = engine.queue.len(), "revocation checkpoint restored");
        }
        Ok(restored)
    }

    /// Recompute every live batch's taint from the revoked-origin set.
    ///
    /// Needed when this engine is newer than the index it is paired with,
    /// e.g. a checkpoint resumed over an older snapshot. Returns the number
    /// of batches whose taint changed.
    pub fn reconcile(&self, trst: &mut TrstEngine) -> Result<usize, TrstError> {
        let ids: Vec<TxHash> = trst.batches().map(|b| b.id).collect();
        let mut changed = 0;
        for id in ids {
            if let Some((before, after)) = trst.retaint(&id, &self.revoked_origins) {
                if after < before {
                    return Err(TrstError::Invariant(format!(
                        "taint of batch {id} fell from {before} to {after}"
                    )));
                }
                if after != before {
                    changed += 1;
                }
            }
        }
        if changed > 0 {
            info!(batches = changed, "taint reconciled with revoked origins");
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TransferContext;
    use crate::journal::MemoryJournal;
    use std::collections::BTreeMap;

    fn addr(name: &str) -> WalletAddress {
        WalletAddress::new(format!("brst_{name}"))
    }

    fn h(n: u8) -> TxHash {
        TxHash::new([n; 32])
    }

    fn ts(s: u64) -> Timestamp {
        Timestamp::new(s)
    }

    /// A (burner "a") → 60 to C via T1, D burns 30 to C via T4, C merges into M1.
    fn merged_fixture() -> (TrstEngine, RevocationEngine) {
        let mut trst = TrstEngine::new();
        let rev = RevocationEngine::new();
        trst.mint(h(1), &addr("a"), addr("c"), 60, ts(0)).unwrap();
        trst.mint(h(4), &addr("d"), addr("c"), 30, ts(5)).unwrap();
        let ctx = TransferContext {
            now: ts(10),
            expiry_secs: 1_000,
            revocation: &rev,
        };
        trst.merge(&ctx, h(10), &addr("c"), &[h(1), h(4)]).unwrap();
        (trst, rev)
    }

    #[test]
    fn merged_batch_is_tainted_proportionally() {
        let (mut trst, mut rev) = merged_fixture();
        assert_eq!(
            rev.begin(&addr("a"), ts(20), &trst),
            BeginOutcome::Started { origins: 1 }
        );
        let report = rev.run_to_completion(&mut trst).unwrap();
        assert!(!report.pending);
        assert_eq!(report.completed.len(), 1);

        let m = trst.batch(&h(10)).unwrap();
        assert_eq!(m.tainted, 60);
        assert!((m.tainted_fraction() - 60.0 / 90.0).abs() < 1e-12);
        let p = trst.portfolio(&addr("c"), ts(30), 1_000);
        assert_eq!((p.revoked, p.transferable), (60, 30));
    }

    #[test]
    fn replay_is_a_no_op() {
        let (mut trst, mut rev) = merged_fixture();
        rev.begin(&addr("a"), ts(20), &trst);
        rev.run_to_completion(&mut trst).unwrap();
        let before = trst.batch(&h(10)).cloned();

        assert_eq!(rev.begin(&addr("a"), ts(20), &trst), BeginOutcome::AlreadyApplied);
        let report = rev.run_to_completion(&mut trst).unwrap();
        assert_eq!(report, StepReport::default());
        assert_eq!(trst.batch(&h(10)).cloned(), before);
    }

    #[test]
    fn overlapping_revocations_compose() {
        let (mut trst, mut rev) = merged_fixture();
        rev.begin(&addr("a"), ts(20), &trst);
        rev.begin(&addr("d"), ts(21), &trst);
        rev.run_to_completion(&mut trst).unwrap();
        let m = trst.batch(&h(10)).unwrap();
        assert_eq!(m.tainted, 90);
        assert!(m.is_fully_tainted());
    }

    #[test]
    fn bounded_steps_block_touching_transfers_until_done() {
        let (mut trst, mut rev) = merged_fixture();
        rev.begin(&addr("a"), ts(20), &trst);

        // One key per step: the burn, then the merge.
        let first = rev.step(&mut trst, 1).unwrap();
        assert_eq!(first.keys_visited, 1);
        assert!(first.pending);
        {
            let ctx = TransferContext {
                now: ts(21),
                expiry_secs: 1_000,
                revocation: &rev,
            };
            let err = trst
                .send(&ctx, h(30), &addr("c"), &h(10), addr("e"), 1)
                .unwrap_err();
            assert!(matches!(err, TrstError::RevocationPending(_)));
        }

        let second = rev.step(&mut trst, 1).unwrap();
        assert!(!second.pending);
        assert_eq!(second.completed.len(), 1);
        assert_eq!(trst.batch(&h(10)).unwrap().tainted, 60);
    }

    #[test]
    fn partially_tainted_send_keeps_revoked_residue() {
        let (mut trst, mut rev) = merged_fixture();
        rev.begin(&addr("a"), ts(20), &trst);
        rev.run_to_completion(&mut trst).unwrap();

        let ctx = TransferContext {
            now: ts(30),
            expiry_secs: 1_000,
            revocation: &rev,
        };
        assert!(matches!(
            trst.send(&ctx, h(31), &addr("c"), &h(10), addr("e"), 31),
            Err(TrstError::InsufficientBalance { available: 30, .. })
        ));
        let out = trst
            .send(&ctx, h(31), &addr("c"), &h(10), addr("e"), 30)
            .unwrap();
        let residue = trst.batch(&out.residue.unwrap()).unwrap();
        assert_eq!(residue.amount, 60);
        assert!(residue.is_fully_tainted());
        assert_eq!(residue.holder, addr("c"));
        let sent = trst.batch(&h(31)).unwrap();
        assert_eq!(sent.constituent_origins, BTreeMap::from([(h(4), 30)]));
        assert_eq!(sent.tainted, 0);
    }

    #[test]
    fn revoking_a_wallet_without_burns_completes_at_once() {
        let (trst, mut rev) = merged_fixture();
        assert_eq!(
            rev.begin(&addr("nobody"), ts(20), &trst),
            BeginOutcome::Started { origins: 0 }
        );
        assert!(!rev.is_pending());
        assert!(rev.is_applied(&RevocationToken {
            wallet: addr("nobody"),
            t_catch: ts(20),
        }));
    }

    #[test]
    fn resume_from_checkpoint_finishes_the_sweep() {
        let (mut trst, mut rev) = merged_fixture();
        let mut journal = MemoryJournal::new();
        rev.begin(&addr("a"), ts(20), &trst);
        rev.step_journaled(&mut trst, 1, &mut journal).unwrap();

        let mut restored = RevocationEngine::resume(&journal).unwrap().unwrap();
        assert_eq!(restored, rev);
        let report = restored
            .step_journaled(&mut trst, 16, &mut journal)
            .unwrap();
        assert!(!report.pending);
        assert!(journal.load().unwrap().is_none());
        assert_eq!(trst.batch(&h(10)).unwrap().tainted, 60);
    }

    #[test]
    fn reconcile_catches_up_an_older_index() {
        let (mut trst, mut rev) = merged_fixture();
        let stale = trst.clone();
        rev.begin(&addr("a"), ts(20), &trst);
        rev.run_to_completion(&mut trst).unwrap();

        let mut restored = stale;
        assert_eq!(restored.batch(&h(10)).unwrap().tainted, 0);
        assert_eq!(rev.reconcile(&mut restored).unwrap(), 1);
        assert_eq!(restored.batch(&h(10)).unwrap().tainted, 60);
        assert_eq!(rev.reconcile(&mut restored).unwrap(), 0);
    }
}
