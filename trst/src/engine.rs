//! Core TRST lifecycle engine: the live-batch index.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use burst_crypto::derive_output_id;
use burst_types::{Timestamp, TrstState, TxHash, WalletAddress};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::batch::{apportion, LiveBatch};
use crate::error::TrstError;
use crate::merger_graph::{MergeNode, MergeSource, MergerGraph};
use crate::revocation::RevocationEngine;

/// What a transfer is evaluated against.
#[derive(Clone, Copy, Debug)]
pub struct TransferContext<'a> {
    pub now: Timestamp,
    /// The expiry period currently in force.
    pub expiry_secs: u64,
    pub revocation: &'a RevocationEngine,
}

/// Batches consumed and created by one committed transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferOutcome {
    pub consumed: Vec<LiveBatch>,
    /// Output ids in output order.
    pub outputs: Vec<TxHash>,
    /// Revoked remainder kept by the sender when the input was partially tainted.
    pub residue: Option<TxHash>,
}

/// A holder's batches with balances by state.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Portfolio {
    pub transferable: u128,
    pub expired: u128,
    pub revoked: u128,
    /// Demurrage-adjusted value of the transferable share.
    pub effective: u128,
    pub batches: Vec<BatchView>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchView {
    pub batch: LiveBatch,
    pub state: TrstState,
}

/// The TRST engine. Owns the live index and the merger graph.
///
/// Indexed three ways: by id, by holder (portfolios) and by origin (revocation
/// reaches batches through the origins the graph traversal visits).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrstEngine {
    batches: HashMap<TxHash, LiveBatch>,
    by_holder: HashMap<WalletAddress, BTreeSet<TxHash>>,
    by_origin: HashMap<TxHash, BTreeSet<TxHash>>,
    /// Burn hashes per burning wallet; the root set of a revocation.
    wallet_origins: HashMap<WalletAddress, BTreeSet<TxHash>>,
    merger_graph: MergerGraph,
}

impl TrstEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch(&self, id: &TxHash) -> Option<&LiveBatch> {
        self.batches.get(id)
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn batches(&self) -> impl Iterator<Item = &LiveBatch> {
        self.batches.values()
    }

    pub fn merger_graph(&self) -> &MergerGraph {
        &self.merger_graph
    }

    /// Every burn `wallet` has made.
    pub fn burns_of(&self, wallet: &WalletAddress) -> BTreeSet<TxHash> {
        self.wallet_origins.get(wallet).cloned().unwrap_or_default()
    }

    pub fn batches_with_origin(&self, origin: &TxHash) -> Vec<TxHash> {
        self.by_origin
            .get(origin)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn holder_batches(&self, holder: &WalletAddress) -> Vec<&LiveBatch> {
        self.by_holder
            .get(holder)
            .map(|ids| ids.iter().filter_map(|id| self.batches.get(id)).collect())
            .unwrap_or_default()
    }

    fn insert(&mut self, batch: LiveBatch) {
        self.by_holder
            .entry(batch.holder.clone())
            .or_default()
            .insert(batch.id);
        self.by_origin.entry(batch.origin).or_default().insert(batch.id);
        self.batches.insert(batch.id, batch);
    }

    /// Remove a batch from every index.
    pub fn remove(&mut self, id: &TxHash) -> Option<LiveBatch> {
        let batch = self.batches.remove(id)?;
        if let Some(ids) = self.by_holder.get_mut(&batch.holder) {
            ids.remove(id);
            if ids.is_empty() {
                self.by_holder.remove(&batch.holder);
            }
        }
        if let Some(ids) = self.by_origin.get_mut(&batch.origin) {
            ids.remove(id);
            if ids.is_empty() {
                self.by_origin.remove(&batch.origin);
            }
        }
        Some(batch)
    }

    /// Whether `mint` would accept a batch for `burn_hash` of `amount`.
    pub fn check_mint(&self, burn_hash: &TxHash, amount: u128) -> Result<(), TrstError> {
        if amount == 0 {
            return Err(TrstError::ZeroAmount);
        }
        if self.batches.contains_key(burn_hash) || self.by_origin.contains_key(burn_hash) {
            return Err(TrstError::DuplicateBatch(*burn_hash));
        }
        Ok(())
    }

    /// Mint fresh TRST from a burn. The receiver's batch is founded by the burn.
    pub fn mint(
        &mut self,
        burn_hash: TxHash,
        burner: &WalletAddress,
        receiver: WalletAddress,
        amount: u128,
        timestamp: Timestamp,
    ) -> Result<&LiveBatch, TrstError> {
        self.check_mint(&burn_hash, amount)?;
        self.wallet_origins
            .entry(burner.clone())
            .or_default()
            .insert(burn_hash);
        self.insert(LiveBatch {
            id: burn_hash,
            holder: receiver,
            amount,
            origin: burn_hash,
            expiry_source: timestamp,
            link: burn_hash,
            tainted: 0,
            constituent_origins: BTreeMap::from([(burn_hash, amount)]),
            created_at: timestamp,
        });
        debug!(batch = %burn_hash, %amount, "TRST minted");
        self.batches.get(&burn_hash).ok_or(TrstError::UnknownBatch(burn_hash))
    }

    /// Checks shared by every transfer input.
    fn check_spendable(
        &self,
        ctx: &TransferContext<'_>,
        id: &TxHash,
        sender: &WalletAddress,
    ) -> Result<&LiveBatch, TrstError> {
        let batch = self.batches.get(id).ok_or(TrstError::UnknownBatch(*id))?;
        if &batch.holder != sender {
            return Err(TrstError::NotHolder {
                batch: *id,
                holder: batch.holder.clone(),
                sender: sender.clone(),
            });
        }
        if batch.is_fully_tainted() {
            return Err(TrstError::Revoked(*id));
        }
        if batch.is_expired(ctx.now, ctx.expiry_secs) {
            return Err(TrstError::Expired(*id));
        }
        if ctx.revocation.blocks(batch) {
            return Err(TrstError::RevocationPending(*id));
        }
        Ok(batch)
    }

    /// Send `amount` of the input's clean share to `receiver`; the rest of the
    /// clean share returns to the sender as change (output 1).
    pub fn send(
        &mut self,
        ctx: &TransferContext<'_>,
        tx_hash: TxHash,
        sender: &WalletAddress,
        input: &TxHash,
        receiver: WalletAddress,
        amount: u128,
    ) -> Result<TransferOutcome, TrstError> {
        if amount == 0 {
            return Err(TrstError::ZeroAmount);
        }
        let clean = self.check_spendable(ctx, input, sender)?.clean_amount();
        if amount > clean {
            return Err(TrstError::InsufficientBalance {
                needed: amount,
                available: clean,
            });
        }
        let mut outputs = vec![(receiver, amount)];
        if clean > amount {
            outputs.push((sender.clone(), clean - amount));
        }
        self.transfer_outputs(ctx, tx_hash, sender, input, outputs)
    }

    /// Split the input's clean share across several outputs.
    pub fn split(
        &mut self,
        ctx: &TransferContext<'_>,
        tx_hash: TxHash,
        sender: &WalletAddress,
        input: &TxHash,
        outputs: &[(WalletAddress, u128)],
    ) -> Result<TransferOutcome, TrstError> {
        if outputs.len() < 2 {
            return Err(TrstError::TooFewOutputs);
        }
        if outputs.iter().any(|(_, a)| *a == 0) {
            return Err(TrstError::ZeroAmount);
        }
        self.transfer_outputs(ctx, tx_hash, sender, input, outputs.to_vec())
    }

    fn transfer_outputs(
        &mut self,
        ctx: &TransferContext<'_>,
        tx_hash: TxHash,
        sender: &WalletAddress,
        input: &TxHash,
        outputs: Vec<(WalletAddress, u128)>,
    ) -> Result<TransferOutcome, TrstError> {
        let parent = self.check_spendable(ctx, input, sender)?;
        let clean = parent.clean_amount();
        let total = outputs
            .iter()
            .try_fold(0u128, |acc, (_, a)| acc.checked_add(*a))
            .ok_or(TrstError::Overflow)?;
        if total != clean {
            return Err(TrstError::AmountMismatch {
                total,
                expected: clean,
            });
        }

        let revoked = ctx.revocation.revoked_origins();
        let (tainted_parts, clean_parts): (BTreeMap<TxHash, u128>, BTreeMap<TxHash, u128>) = parent
            .constituent_origins
            .iter()
            .map(|(o, a)| (*o, *a))
            .partition(|(o, _)| revoked.contains(o));
        let clean_sum = clean_parts
            .values()
            .try_fold(0u128, |acc, a| acc.checked_add(*a))
            .ok_or(TrstError::Overflow)?;
        if clean_sum != clean {
            return Err(TrstError::Invariant(format!(
                "batch {input}: cached taint {} disagrees with revoked constituents",
                parent.tainted
            )));
        }

        let amounts: Vec<u128> = outputs.iter().map(|(_, a)| *a).collect();
        let shares = apportion(&clean_parts, clean, &amounts);
        let mut created = Vec::with_capacity(outputs.len() + 1);
        for (index, ((holder, amount), share)) in outputs.into_iter().zip(shares).enumerate() {
            created.push(LiveBatch {
                id: derive_output_id(&tx_hash, index as u32),
                holder,
                amount,
                origin: parent.origin,
                expiry_source: parent.expiry_source,
                link: tx_hash,
                tainted: 0,
                constituent_origins: share,
                created_at: ctx.now,
            });
        }
        let residue = if parent.tainted > 0 {
            let id = derive_output_id(&tx_hash, created.len() as u32);
            created.push(LiveBatch {
                id,
                holder: sender.clone(),
                amount: parent.tainted,
                origin: parent.origin,
                expiry_source: parent.expiry_source,
                link: tx_hash,
                tainted: parent.tainted,
                constituent_origins: tainted_parts,
                created_at: ctx.now,
            });
            Some(id)
        } else {
            None
        };
        if let Some(clash) = created.iter().find(|b| self.batches.contains_key(&b.id)) {
            return Err(TrstError::DuplicateBatch(clash.id));
        }

        let outputs = created
            .iter()
            .map(|b| b.id)
            .filter(|id| Some(*id) != residue)
            .collect();
        let consumed = self.remove(input).ok_or(TrstError::UnknownBatch(*input))?;
        for batch in created {
            self.insert(batch);
        }
        debug!(tx = %tx_hash, input = %input, amount = %total, "TRST transferred");
        Ok(TransferOutcome {
            consumed: vec![consumed],
            outputs,
            residue,
        })
    }

    /// Merge several clean batches held by `sender` into one batch.
    ///
    /// The output founds a new lineage (`origin` = merge hash), expires with
    /// its earliest input, and every distinct input origin gains a forward
    /// edge to the merge in the merger graph.
    pub fn merge(
        &mut self,
        ctx: &TransferContext<'_>,
        tx_hash: TxHash,
        sender: &WalletAddress,
        inputs: &[TxHash],
    ) -> Result<TransferOutcome, TrstError> {
        let mut distinct = BTreeSet::new();
        for id in inputs {
            if !distinct.insert(*id) {
                return Err(TrstError::DuplicateInput(*id));
            }
        }
        if distinct.len() < 2 {
            return Err(TrstError::TooFewInputs);
        }

        let mut total: u128 = 0;
        let mut expiry_source: Option<Timestamp> = None;
        let mut constituents: BTreeMap<TxHash, u128> = BTreeMap::new();
        let mut sources: BTreeMap<TxHash, u128> = BTreeMap::new();
        for id in inputs {
            let batch = self.check_spendable(ctx, id, sender)?;
            if batch.tainted > 0 {
                return Err(TrstError::Tainted(*id));
            }
            total = total.checked_add(batch.amount).ok_or(TrstError::Overflow)?;
            expiry_source = Some(match expiry_source {
                Some(t) => t.min(batch.expiry_source),
                None => batch.expiry_source,
            });
            for (origin, amount) in &batch.constituent_origins {
                let slot = constituents.entry(*origin).or_insert(0);
                *slot = slot.checked_add(*amount).ok_or(TrstError::Overflow)?;
            }
            let slot = sources.entry(batch.origin).or_insert(0);
            *slot = slot.checked_add(batch.amount).ok_or(TrstError::Overflow)?;
        }
        let expiry_source = expiry_source.ok_or(TrstError::TooFewInputs)?;

        let node = MergeNode {
            merge_tx: tx_hash,
            sources: sources
                .into_iter()
                .map(|(origin, amount)| MergeSource { origin, amount })
                .collect(),
            total_amount: total,
            expiry_source,
            timestamp: ctx.now,
        };
        self.merger_graph.check_merge(&node)?;
        if self.batches.contains_key(&tx_hash) {
            return Err(TrstError::DuplicateBatch(tx_hash));
        }

        let mut consumed = Vec::with_capacity(inputs.len());
        for id in inputs {
            consumed.push(self.remove(id).ok_or(TrstError::UnknownBatch(*id))?);
        }
        self.merger_graph.record_merge(node)?;
        self.insert(LiveBatch {
            id: tx_hash,
            holder: sender.clone(),
            amount: total,
            origin: tx_hash,
            expiry_source,
            link: tx_hash,
            tainted: 0,
            constituent_origins: constituents,
            created_at: ctx.now,
        });
        debug!(tx = %tx_hash, inputs = inputs.len(), amount = %total, "TRST merged");
        Ok(TransferOutcome {
            consumed,
            outputs: vec![tx_hash],
            residue: None,
        })
    }

    /// Recompute a batch's cached taint from the global revoked-origin set.
    ///
    /// Returns `(previous, current)`. The result is clipped to `[0, amount]`.
    pub fn retaint(
        &mut self,
        id: &TxHash,
        revoked: &BTreeSet<TxHash>,
    ) -> Option<(u128, u128)> {
        let batch = self.batches.get_mut(id)?;
        let tainted = batch
            .constituent_origins
            .iter()
            .filter(|(o, _)| revoked.contains(*o))
            .fold(0u128, |acc, (_, a)| acc.saturating_add(*a))
            .min(batch.amount);
        let previous = batch.tainted;
        batch.tainted = tainted;
        Some((previous, tainted))
    }

    /// Balances and batches of `holder` at `now` under expiry period `expiry_secs`.
    pub fn portfolio(&self, holder: &WalletAddress, now: Timestamp, expiry_secs: u64) -> Portfolio {
        let mut p = Portfolio::default();
        for batch in self.holder_batches(holder) {
            let state = batch.state(now, expiry_secs);
            match state {
                TrstState::Revoked => p.revoked = p.revoked.saturating_add(batch.amount),
                TrstState::Expired => {
                    p.revoked = p.revoked.saturating_add(batch.tainted);
                    p.expired = p.expired.saturating_add(batch.clean_amount());
                }
                TrstState::Active => {
                    p.revoked = p.revoked.saturating_add(batch.tainted);
                    p.transferable = p.transferable.saturating_add(batch.clean_amount());
                    p.effective = p
                        .effective
                        .saturating_add(batch.effective_value(now, expiry_secs));
                }
            }
            p.batches.push(BatchView {
                batch: batch.clone(),
                state,
            });
        }
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(name: &str) -> WalletAddress {
        WalletAddress::new(format!("brst_{name}"))
    }

    fn h(n: u8) -> TxHash {
        TxHash::new([n; 32])
    }

    fn ctx(revocation: &RevocationEngine, now: u64) -> TransferContext<'_> {
        TransferContext {
            now: Timestamp::new(now),
            expiry_secs: 1_000,
            revocation,
        }
    }

    #[test]
    fn send_keeps_origin_and_returns_change() {
        let mut trst = TrstEngine::new();
        let rev = RevocationEngine::new();
        trst.mint(h(1), &addr("a"), addr("b"), 100, Timestamp::new(0))
            .unwrap();

        let out = trst
            .send(&ctx(&rev, 10), h(2), &addr("b"), &h(1), addr("c"), 60)
            .unwrap();
        assert_eq!(out.outputs, vec![h(2), derive_output_id(&h(2), 1)]);
        assert!(out.residue.is_none());
        assert!(trst.batch(&h(1)).is_none());

        let to_c = trst.batch(&h(2)).unwrap();
        let change = trst.batch(&derive_output_id(&h(2), 1)).unwrap();
        assert_eq!((to_c.amount, &to_c.holder), (60, &addr("c")));
        assert_eq!((change.amount, &change.holder), (40, &addr("b")));
        for b in [to_c, change] {
            assert_eq!(b.origin, h(1));
            assert_eq!(b.link, h(2));
            assert_eq!(b.expiry_source, Timestamp::new(0));
            assert_eq!(b.constituent_origins, BTreeMap::from([(h(1), b.amount)]));
        }
    }

    #[test]
    fn full_send_has_no_change() {
        let mut trst = TrstEngine::new();
        let rev = RevocationEngine::new();
        trst.mint(h(1), &addr("a"), addr("b"), 100, Timestamp::new(0))
            .unwrap();
        let out = trst
            .send(&ctx(&rev, 10), h(2), &addr("b"), &h(1), addr("c"), 100)
            .unwrap();
        assert_eq!(out.outputs, vec![h(2)]);
        assert!(trst.holder_batches(&addr("b")).is_empty());
    }

    #[test]
    fn merge_takes_earliest_expiry_and_unions_constituents() {
        let mut trst = TrstEngine::new();
        let rev = RevocationEngine::new();
        trst.mint(h(1), &addr("a"), addr("c"), 60, Timestamp::new(5))
            .unwrap();
        trst.mint(h(4), &addr("d"), addr("c"), 30, Timestamp::new(50))
            .unwrap();

        trst.merge(&ctx(&rev, 60), h(10), &addr("c"), &[h(4), h(1)])
            .unwrap();
        let m = trst.batch(&h(10)).unwrap();
        assert_eq!(m.amount, 90);
        assert_eq!(m.origin, h(10));
        assert_eq!(m.expiry_source, Timestamp::new(5));
        assert_eq!(
            m.constituent_origins,
            BTreeMap::from([(h(1), 60), (h(4), 30)])
        );
        assert_eq!(trst.merger_graph().merges_of(&h(1)), &[h(10)]);
        assert_eq!(trst.merger_graph().merges_of(&h(4)), &[h(10)]);
    }

    #[test]
    fn split_of_merged_batch_scales_constituents() {
        let mut trst = TrstEngine::new();
        let rev = RevocationEngine::new();
        trst.mint(h(1), &addr("a"), addr("c"), 60, Timestamp::new(0))
            .unwrap();
        trst.mint(h(4), &addr("d"), addr("c"), 30, Timestamp::new(0))
            .unwrap();
        trst.merge(&ctx(&rev, 1), h(10), &addr("c"), &[h(1), h(4)])
            .unwrap();

        let out = trst
            .split(
                &ctx(&rev, 2),
                h(11),
                &addr("c"),
                &h(10),
                &[(addr("x"), 45), (addr("y"), 30), (addr("z"), 15)],
            )
            .unwrap();
        assert_eq!(out.outputs.len(), 3);
        let x = trst.batch(&out.outputs[0]).unwrap();
        assert_eq!(x.constituent_origins, BTreeMap::from([(h(1), 30), (h(4), 15)]));
        let total: u128 = out
            .outputs
            .iter()
            .map(|id| trst.batch(id).unwrap().amount)
            .sum();
        assert_eq!(total, 90);
        for id in &out.outputs {
            let b = trst.batch(id).unwrap();
            assert_eq!(b.constituent_origins.values().sum::<u128>(), b.amount);
            assert_eq!(b.origin, h(10));
        }
    }

    #[test]
    fn transfer_rejections() {
        let mut trst = TrstEngine::new();
        let rev = RevocationEngine::new();
        trst.mint(h(1), &addr("a"), addr("b"), 100, Timestamp::new(0))
            .unwrap();
        trst.mint(h(2), &addr("a"), addr("b"), 10, Timestamp::new(0))
            .unwrap();
        let c = ctx(&rev, 10);

        assert!(matches!(
            trst.send(&c, h(9), &addr("x"), &h(1), addr("c"), 1),
            Err(TrstError::NotHolder { .. })
        ));
        assert!(matches!(
            trst.send(&c, h(9), &addr("b"), &h(1), addr("c"), 101),
            Err(TrstError::InsufficientBalance { .. })
        ));
        assert!(matches!(
            trst.send(&c, h(9), &addr("b"), &h(7), addr("c"), 1),
            Err(TrstError::UnknownBatch(_))
        ));
        assert!(matches!(
            trst.split(&c, h(9), &addr("b"), &h(1), &[(addr("c"), 50), (addr("d"), 49)]),
            Err(TrstError::AmountMismatch { total: 99, expected: 100 })
        ));
        assert!(matches!(
            trst.merge(&c, h(9), &addr("b"), &[h(1), h(1)]),
            Err(TrstError::DuplicateInput(_))
        ));
        assert!(matches!(
            trst.merge(&c, h(9), &addr("b"), &[h(1)]),
            Err(TrstError::TooFewInputs)
        ));
        let late = TransferContext {
            now: Timestamp::new(1_001),
            ..c
        };
        assert!(matches!(
            trst.send(&late, h(9), &addr("b"), &h(1), addr("c"), 1),
            Err(TrstError::Expired(_))
        ));
        // Nothing was mutated by the rejected attempts.
        assert_eq!(trst.len(), 2);
        assert_eq!(trst.merger_graph().merge_count(), 0);
    }

    #[test]
    fn duplicate_burn_is_refused() {
        let mut trst = TrstEngine::new();
        trst.mint(h(1), &addr("a"), addr("b"), 100, Timestamp::new(0))
            .unwrap();
        assert!(matches!(
            trst.mint(h(1), &addr("a"), addr("b"), 100, Timestamp::new(0)),
            Err(TrstError::DuplicateBatch(_))
        ));
        assert_eq!(trst.burns_of(&addr("a")).len(), 1);
    }

    #[test]
    fn check_mint_matches_what_mint_refuses() {
        let mut trst = TrstEngine::new();
        let rev = RevocationEngine::new();
        assert!(trst.check_mint(&h(1), 100).is_ok());
        assert!(matches!(trst.check_mint(&h(1), 0), Err(TrstError::ZeroAmount)));
        trst.mint(h(1), &addr("a"), addr("b"), 100, Timestamp::new(0))
            .unwrap();
        trst.send(&ctx(&rev, 10), h(2), &addr("b"), &h(1), addr("c"), 60)
            .unwrap();

        // T1 is gone from the live set but still an origin.
        assert!(trst.batch(&h(1)).is_none());
        assert!(matches!(trst.check_mint(&h(1), 5), Err(TrstError::DuplicateBatch(_))));
        let change = derive_output_id(&h(2), 1);
        assert!(matches!(trst.check_mint(&change, 5), Err(TrstError::DuplicateBatch(_))));
        assert!(trst.burns_of(&addr("c")).is_empty());
    }

    #[test]
    fn portfolio_splits_balances_by_state() {
        let mut trst = TrstEngine::new();
        trst.mint(h(1), &addr("a"), addr("b"), 100, Timestamp::new(0))
            .unwrap();
        trst.mint(h(2), &addr("a"), addr("b"), 40, Timestamp::new(900))
            .unwrap();

        let p = trst.portfolio(&addr("b"), Timestamp::new(1_100), 1_000);
        assert_eq!(p.expired, 100);
        assert_eq!(p.transferable, 40);
        assert_eq!(p.revoked, 0);
        // 800 of 1000 seconds left on the live batch.
        assert_eq!(p.effective, 32);
        assert_eq!(p.batches.len(), 2);
    }
}
