//! The Merger Graph: a forward index for proactive revocation.
//!
//! Normal transaction chains are backward-linked (holder → link → origin).
//! The merger graph is the **inverse**: origin → [merges containing it] →
//! [merges of merges]. A merge's own hash is the origin of its output, so the
//! downstream step is the same lookup again.
//!
//! Without it every transfer would walk its ancestry to check for revoked
//! origins. With it, revocation is a one-time forward traversal at catch time
//! and every later transfer reads a cached value.

use burst_types::{Timestamp, TxHash};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::error::TrstError;

/// A merge operation as recorded in the graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeNode {
    pub merge_tx: TxHash,
    /// Input origins consumed by this merge, with the amount drawn from each.
    pub sources: Vec<MergeSource>,
    pub total_amount: u128,
    pub expiry_source: Timestamp,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSource {
    pub origin: TxHash,
    pub amount: u128,
}

/// Hash-keyed index with no live references between nodes.
///
/// ```text
/// origin (burn) → {merge, …} → {merge of merges, …} → live batches
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MergerGraph {
    origin_to_merges: HashMap<TxHash, Vec<TxHash>>,
    merge_nodes: HashMap<TxHash, MergeNode>,
}

impl MergerGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `node` can be recorded without creating a cycle.
    ///
    /// Edges only ever point from already-recorded keys to a new merge hash,
    /// so rejecting a repeated hash (or a merge listing itself as a source)
    /// keeps the graph acyclic.
    pub fn check_merge(&self, node: &MergeNode) -> Result<(), TrstError> {
        if self.merge_nodes.contains_key(&node.merge_tx)
            || self.origin_to_merges.contains_key(&node.merge_tx)
            || node.sources.iter().any(|s| s.origin == node.merge_tx)
        {
            return Err(TrstError::MergeCycle(node.merge_tx));
        }
        Ok(())
    }

    /// Record a merge: append its hash under every distinct source origin.
    pub fn record_merge(&mut self, node: MergeNode) -> Result<(), TrstError> {
        self.check_merge(&node)?;
        let merge_tx = node.merge_tx;
        let distinct: BTreeSet<TxHash> = node.sources.iter().map(|s| s.origin).collect();
        for origin in distinct {
            self.origin_to_merges.entry(origin).or_default().push(merge_tx);
        }
        self.merge_nodes.insert(merge_tx, node);
        Ok(())
    }

    /// Merges that consumed TRST whose batch origin was `origin`.
    pub fn merges_of(&self, origin: &TxHash) -> &[TxHash] {
        self.origin_to_merges
            .get(origin)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn node(&self, merge_tx: &TxHash) -> Option<&MergeNode> {
        self.merge_nodes.get(merge_tx)
    }

    pub fn merge_count(&self) -> usize {
        self.merge_nodes.len()
    }

    /// Every key reachable from `roots`, roots included, in BFS order.
    pub fn reachable<'a>(&self, roots: impl IntoIterator<Item = &'a TxHash>) -> Vec<TxHash> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<TxHash> = VecDeque::new();
        let mut order = Vec::new();
        for root in roots {
            if seen.insert(*root) {
                queue.push_back(*root);
            }
        }
        while let Some(key) = queue.pop_front() {
            order.push(key);
            for merge in self.merges_of(&key) {
                if seen.insert(*merge) {
                    queue.push_back(*merge);
                }
            }
        }
        order
    }
}
