//! The ledger core.
//!
//! Owns every piece of committed state and applies inputs one at a time:
//! transactions, verification events, parameter changes and stake events.
//! Each input is validated completely before anything is mutated, so a
//! rejected input leaves no trace.

use std::collections::{BTreeSet, HashMap};

use burst_brn::{BrnEngine, StakeId};
use burst_governance::ParameterTable;
use burst_transactions::{
    validate_transaction, BurnTx, MergeTx, Method, RejectReason, SendTx, SplitTx, Transaction,
};
use burst_trst::{
    BeginOutcome, FileJournal, MemoryJournal, Portfolio, RevocationEngine, RevocationJournal,
    StepReport, TransferContext, TransferOutcome, TrstEngine,
};
use burst_types::{Timestamp, TxHash, WalletAddress, WalletState};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::account_chain::AccountChain;
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::events::{LedgerEvent, ParamChange, StakeEvent, VerificationEvent};
use crate::pruning::{LedgerPruner, PruneResult};
use crate::snapshot::LedgerSnapshot;
use crate::validator::{self, Verdict};
use crate::wallet::{StatusEffect, WalletRecord};

/// Everything a snapshot captures.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerState {
    pub(crate) params: ParameterTable,
    pub(crate) brn: BrnEngine,
    pub(crate) trst: TrstEngine,
    pub(crate) revocation: RevocationEngine,
    pub(crate) wallets: HashMap<WalletAddress, WalletRecord>,
    pub(crate) transactions: HashMap<TxHash, Transaction>,
    pub(crate) chains: HashMap<WalletAddress, AccountChain>,
    pub(crate) halted: BTreeSet<WalletAddress>,
}

impl LedgerState {
    pub fn genesis(config: &LedgerConfig) -> Self {
        Self {
            params: ParameterTable::from_genesis(&config.protocol_params(), config.genesis()),
            brn: BrnEngine::new(),
            trst: TrstEngine::new(),
            revocation: RevocationEngine::new(),
            wallets: HashMap::new(),
            transactions: HashMap::new(),
            chains: HashMap::new(),
            halted: BTreeSet::new(),
        }
    }
}

/// A committed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Accepted {
    pub hash: TxHash,
    pub method: Method,
    /// Batches created, in output order. A burn creates one batch, its own hash.
    pub outputs: Vec<TxHash>,
    /// Revoked remainder kept by the sender of a partially tainted batch.
    pub residue: Option<TxHash>,
}

/// What applying a [`LedgerEvent`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    Committed(Accepted),
    StatusChanged(WalletState),
    ParamChanged,
    StakeLocked(StakeId),
    StakeResolved(StakeId),
    RevocationStepped(StepReport),
}

pub struct Ledger {
    state: LedgerState,
    config: LedgerConfig,
    journal: Box<dyn RevocationJournal>,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("transactions", &self.state.transactions.len())
            .field("live_batches", &self.state.trst.len())
            .field("halted", &self.state.halted)
            .finish()
    }
}

fn journal_for(config: &LedgerConfig) -> Box<dyn RevocationJournal> {
    match &config.journal_path {
        Some(path) => Box::new(FileJournal::new(path)),
        None => Box::new(MemoryJournal::new()),
    }
}

impl Ledger {
    /// A ledger at genesis, journaling where `config` says.
    pub fn new(config: LedgerConfig) -> Self {
        let journal = journal_for(&config);
        Self::with_journal(config, journal)
    }

    pub fn with_journal(config: LedgerConfig, journal: Box<dyn RevocationJournal>) -> Self {
        Self {
            state: LedgerState::genesis(&config),
            config,
            journal,
        }
    }

    /// Rebuild a ledger from a snapshot.
    ///
    /// A revocation checkpoint left in the journal is at least as new as the
    /// snapshot, so it replaces the snapshot's revocation state and every live
    /// batch's taint is recomputed against it.
    pub fn restore(snapshot: &LedgerSnapshot, config: LedgerConfig) -> Result<Self, LedgerError> {
        let journal = journal_for(&config);
        Self::restore_with_journal(snapshot, config, journal)
    }

    pub fn restore_with_journal(
        snapshot: &LedgerSnapshot,
        config: LedgerConfig,
        journal: Box<dyn RevocationJournal>,
    ) -> Result<Self, LedgerError> {
        let mut state = snapshot.state()?;
        if let Some(revocation) =
            RevocationEngine::resume(journal.as_ref()).map_err(LedgerError::Revocation)?
        {
            revocation
                .reconcile(&mut state.trst)
                .map_err(LedgerError::Revocation)?;
            state.revocation = revocation;
        }
        info!(
            transactions = state.transactions.len(),
            wallets = state.wallets.len(),
            pending_revocations = state.revocation.pending().count(),
            "ledger restored"
        );
        Ok(Self {
            state,
            config,
            journal,
        })
    }

    pub fn snapshot(&self, created_at: Timestamp) -> Result<LedgerSnapshot, LedgerError> {
        LedgerSnapshot::capture(&self.state, created_at)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn params(&self) -> &ParameterTable {
        &self.state.params
    }

    pub fn brn(&self) -> &BrnEngine {
        &self.state.brn
    }

    pub fn trst(&self) -> &TrstEngine {
        &self.state.trst
    }

    pub fn revocation(&self) -> &RevocationEngine {
        &self.state.revocation
    }

    pub fn wallet(&self, address: &WalletAddress) -> Option<&WalletRecord> {
        self.state.wallets.get(address)
    }

    /// Every wallet the ledger has seen, in no particular order.
    pub fn wallets(&self) -> impl Iterator<Item = &WalletRecord> {
        self.state.wallets.values()
    }

    /// Status of `address`; wallets never seen are Unverified.
    pub fn status(&self, address: &WalletAddress) -> WalletState {
        self.wallet(address)
            .map_or(WalletState::Unverified, |w| w.status)
    }

    pub fn chain(&self, address: &WalletAddress) -> Option<&AccountChain> {
        self.state.chains.get(address)
    }

    pub fn transaction(&self, hash: &TxHash) -> Option<&Transaction> {
        self.state.transactions.get(hash)
    }

    pub fn transaction_count(&self) -> usize {
        self.state.transactions.len()
    }

    pub fn is_halted(&self, address: &WalletAddress) -> bool {
        self.state.halted.contains(address)
    }

    pub fn halted(&self) -> impl Iterator<Item = &WalletAddress> {
        self.state.halted.iter()
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Spendable BRN of `wallet` at `at`. Reads 0 on arithmetic overflow.
    pub fn available_brn(&self, wallet: &WalletAddress, at: Timestamp) -> u128 {
        self.state.brn.available(wallet, self.state.params.brn_rate(), at)
    }

    pub fn available_brn_checked(&self, wallet: &WalletAddress, at: Timestamp) -> Result<u128, LedgerError> {
        Ok(self
            .state
            .brn
            .available_checked(wallet, self.state.params.brn_rate(), at)?)
    }

    /// Balances of `wallet` at `at` under the expiry period in force at `at`.
    pub fn trst_portfolio(&self, wallet: &WalletAddress, at: Timestamp) -> Portfolio {
        self.state
            .trst
            .portfolio(wallet, at, self.state.params.expiry_secs_at(at))
    }

    // ── Transactions ───────────────────────────────────────────────────

    /// Validate and commit one transaction.
    ///
    /// `now` is the local clock, used only for the skew window. Everything
    /// else is evaluated at the transaction's own timestamp so every replica
    /// reaches the same verdict.
    pub fn submit(&mut self, tx: Transaction, now: Timestamp) -> Result<Accepted, LedgerError> {
        let hash = *tx.hash();
        let sender = tx.sender().clone();
        if self.state.halted.contains(&sender) {
            return Err(LedgerError::AccountHalted(sender));
        }
        if let Some(receiver) = receivers(&tx)
            .into_iter()
            .find(|receiver| self.state.halted.contains(*receiver))
        {
            return Err(LedgerError::AccountHalted(receiver.clone()));
        }
        if let Err(reason) = self.precheck(&tx, now) {
            return Err(self.reject(&tx, reason));
        }

        let committed = match &tx {
            Transaction::Burn(burn) => self.commit_burn(burn),
            Transaction::Send(send) => self.commit_send(send),
            Transaction::Split(split) => self.commit_split(split),
            Transaction::Merge(merge) => self.commit_merge(merge),
        };
        let accepted = match committed {
            Ok(accepted) => accepted,
            Err(Verdict::Reject(reason)) => return Err(self.reject(&tx, reason)),
            Err(Verdict::Invariant(detail)) => {
                let mut accounts = vec![sender];
                for receiver in receivers(&tx) {
                    if !accounts.contains(receiver) {
                        accounts.push(receiver.clone());
                    }
                }
                return Err(self.halt(accounts, detail));
            }
        };

        for receiver in receivers(&tx) {
            self.touch_wallet(receiver);
        }
        self.touch_wallet(&sender);
        self.state
            .chains
            .entry(sender.clone())
            .or_insert_with(|| AccountChain::new(sender.clone()))
            .append(hash);
        self.state.transactions.insert(hash, tx);
        debug!(
            tx = %hash,
            method = accepted.method.as_str(),
            sender = %sender,
            outputs = accepted.outputs.len(),
            "transaction committed"
        );
        Ok(accepted)
    }

    /// Checks that need no mutation: duplicates, stateless validation and
    /// declared provenance.
    fn precheck(&self, tx: &Transaction, now: Timestamp) -> Result<(), RejectReason> {
        validator::check_duplicate(tx.hash(), self.state.transactions.contains_key(tx.hash()))?;
        validate_transaction(
            tx,
            now,
            self.config.clock_skew_tolerance_secs,
            self.config.verify_signatures,
        )?;
        validator::check_provenance(tx, &self.state.trst)
    }

    fn reject(&self, tx: &Transaction, reason: RejectReason) -> LedgerError {
        warn!(
            tx = %tx.hash(),
            method = tx.method().as_str(),
            sender = %tx.sender(),
            %reason,
            "transaction rejected"
        );
        LedgerError::Rejected(reason)
    }

    fn halt(&mut self, accounts: Vec<WalletAddress>, detail: String) -> LedgerError {
        error!(accounts = ?accounts, %detail, "invariant violation, halting accounts");
        self.state.halted.extend(accounts.iter().cloned());
        LedgerError::InvariantViolation { accounts, detail }
    }

    fn touch_wallet(&mut self, address: &WalletAddress) {
        self.state
            .wallets
            .entry(address.clone())
            .or_insert_with(|| WalletRecord::new(address.clone()));
    }

    fn commit_burn(&mut self, tx: &BurnTx) -> Result<Accepted, Verdict> {
        validator::check_burner(tx, self.status(&tx.sender)).map_err(Verdict::Reject)?;
        // A refused mint must not debit BRN.
        self.state
            .trst
            .check_mint(&tx.hash, tx.amount)
            .map_err(validator::trst_rejection)?;
        self.state
            .brn
            .record_burn(&tx.sender, tx.amount, self.state.params.brn_rate(), tx.timestamp)
            .map_err(|e| validator::brn_rejection(e, tx))?;
        self.state
            .trst
            .mint(tx.hash, &tx.sender, tx.receiver.clone(), tx.amount, tx.timestamp)
            .map_err(validator::trst_rejection)?;
        Ok(Accepted {
            hash: tx.hash,
            method: Method::Burn,
            outputs: vec![tx.hash],
            residue: None,
        })
    }

    fn commit_send(&mut self, tx: &SendTx) -> Result<Accepted, Verdict> {
        let LedgerState {
            params,
            trst,
            revocation,
            ..
        } = &mut self.state;
        let ctx = TransferContext {
            now: tx.timestamp,
            expiry_secs: params.expiry_secs_at(tx.timestamp),
            revocation: &*revocation,
        };
        let outcome = trst
            .send(&ctx, tx.hash, &tx.sender, &tx.link, tx.receiver.clone(), tx.amount)
            .map_err(validator::trst_rejection)?;
        Ok(accepted(tx.hash, Method::Send, outcome))
    }

    fn commit_split(&mut self, tx: &SplitTx) -> Result<Accepted, Verdict> {
        let outputs: Vec<(WalletAddress, u128)> = tx
            .outputs
            .iter()
            .map(|o| (o.receiver.clone(), o.amount))
            .collect();
        let LedgerState {
            params,
            trst,
            revocation,
            ..
        } = &mut self.state;
        let ctx = TransferContext {
            now: tx.timestamp,
            expiry_secs: params.expiry_secs_at(tx.timestamp),
            revocation: &*revocation,
        };
        let outcome = trst
            .split(&ctx, tx.hash, &tx.sender, &tx.link, &outputs)
            .map_err(validator::trst_rejection)?;
        Ok(accepted(tx.hash, Method::Split, outcome))
    }

    fn commit_merge(&mut self, tx: &MergeTx) -> Result<Accepted, Verdict> {
        let LedgerState {
            params,
            trst,
            revocation,
            ..
        } = &mut self.state;
        let ctx = TransferContext {
            now: tx.timestamp,
            expiry_secs: params.expiry_secs_at(tx.timestamp),
            revocation: &*revocation,
        };
        let outcome = trst
            .merge(&ctx, tx.hash, &tx.sender, &tx.inputs)
            .map_err(validator::trst_rejection)?;
        Ok(accepted(tx.hash, Method::Merge, outcome))
    }

    // ── Collaborator events ────────────────────────────────────────────

    /// Apply a status change from the verification process.
    ///
    /// Revocation queues a sweep over the wallet's burns and checkpoints it;
    /// the sweep itself advances through [`Ledger::step_revocations`].
    pub fn apply_verification(&mut self, event: &VerificationEvent) -> Result<(), LedgerError> {
        let record = self
            .state
            .wallets
            .get(&event.wallet)
            .cloned()
            .unwrap_or_else(|| WalletRecord::new(event.wallet.clone()));
        let effect = record.check_transition(event.new_status)?;

        match effect {
            StatusEffect::StartAccrual => self.state.brn.start_accrual(&event.wallet, event.timestamp)?,
            StatusEffect::StopAccrual | StatusEffect::Revoke => {
                self.state.brn.stop_accrual(&event.wallet, event.timestamp)?
            }
            StatusEffect::None => {}
        }
        let mut record = record;
        record.transition(event.new_status, event.timestamp)?;
        self.state.wallets.insert(event.wallet.clone(), record);
        info!(
            wallet = %event.wallet,
            status = ?event.new_status,
            at = event.timestamp.as_secs(),
            "wallet status changed"
        );

        if effect == StatusEffect::Revoke {
            let outcome = self
                .state
                .revocation
                .begin(&event.wallet, event.timestamp, &self.state.trst);
            if outcome != BeginOutcome::AlreadyApplied && self.state.revocation.is_pending() {
                // The status change stands; the next journaled step checkpoints.
                if let Err(e) = self.journal.save(&self.state.revocation) {
                    error!(wallet = %event.wallet, error = %e, "failed to checkpoint revocation sweep");
                }
            }
        }
        Ok(())
    }

    /// Append a governance outcome to the parameter table.
    pub fn apply_param_change(&mut self, change: &ParamChange) -> Result<(), LedgerError> {
        Ok(self.state.params.apply(change)?)
    }

    /// Apply a stake lifecycle step. Returns the stake's id.
    pub fn apply_stake_event(&mut self, event: &StakeEvent) -> Result<StakeId, LedgerError> {
        if self.state.halted.contains(event.staker()) {
            return Err(LedgerError::AccountHalted(event.staker().clone()));
        }
        let id = match event {
            StakeEvent::Lock {
                staker,
                amount,
                kind,
                lock_expires_at,
                timestamp,
            } => self.state.brn.stake(
                staker,
                *amount,
                kind.clone(),
                *lock_expires_at,
                self.state.params.brn_rate(),
                *timestamp,
            )?,
            StakeEvent::Return {
                staker, stake_id, ..
            } => self.state.brn.return_stake(staker, *stake_id)?.id,
            StakeEvent::Forfeit {
                staker,
                stake_id,
                timestamp,
            } => self.state.brn.forfeit_stake(staker, *stake_id, *timestamp)?.id,
        };
        debug!(staker = %event.staker(), stake = id, "stake event applied");
        Ok(id)
    }

    /// Apply any input. `now` is the local clock for transactions.
    pub fn apply_event(&mut self, event: &LedgerEvent, now: Timestamp) -> Result<EventOutcome, LedgerError> {
        match event {
            LedgerEvent::Transaction(tx) => self.submit(tx.clone(), now).map(EventOutcome::Committed),
            LedgerEvent::Verification(v) => {
                self.apply_verification(v)?;
                Ok(EventOutcome::StatusChanged(v.new_status))
            }
            LedgerEvent::ParamChange(change) => {
                self.apply_param_change(change)?;
                Ok(EventOutcome::ParamChanged)
            }
            LedgerEvent::Stake(stake) => {
                let id = self.apply_stake_event(stake)?;
                Ok(match stake {
                    StakeEvent::Lock { .. } => EventOutcome::StakeLocked(id),
                    StakeEvent::Return { .. } | StakeEvent::Forfeit { .. } => {
                        EventOutcome::StakeResolved(id)
                    }
                })
            }
            LedgerEvent::RevocationStep { budget, .. } => {
                self.step_revocations(*budget).map(EventOutcome::RevocationStepped)
            }
        }
    }

    // ── Revocation ─────────────────────────────────────────────────────

    /// Advance queued sweeps by at most `budget` graph keys and checkpoint.
    pub fn step_revocations(&mut self, budget: usize) -> Result<StepReport, LedgerError> {
        let LedgerState {
            trst, revocation, ..
        } = &mut self.state;
        let front = revocation.pending().next().map(|s| s.token.wallet.clone());
        match revocation.step_journaled(trst, budget, self.journal.as_mut()) {
            Ok(report) => Ok(report),
            Err(err) if err.is_invariant_violation() => {
                let accounts = front.into_iter().collect();
                Err(self.halt(accounts, err.to_string()))
            }
            Err(err) => {
                error!(error = %err, "revocation step failed");
                Err(LedgerError::Revocation(err))
            }
        }
    }

    /// One step with the configured budget.
    pub fn drive_revocations(&mut self) -> Result<StepReport, LedgerError> {
        self.step_revocations(self.config.revocation_step_budget)
    }

    /// Step until nothing is pending, merging the reports.
    pub fn run_revocations(&mut self) -> Result<StepReport, LedgerError> {
        let mut total = StepReport::default();
        loop {
            let report = self.drive_revocations()?;
            total.keys_visited += report.keys_visited;
            total.batches_retainted += report.batches_retainted;
            total.completed.extend(report.completed);
            total.pending = report.pending;
            if !report.pending {
                return Ok(total);
            }
        }
    }

    // ── Maintenance ────────────────────────────────────────────────────

    /// Drop dead batches from the live index per the pruning config.
    pub fn prune(&mut self, now: Timestamp) -> PruneResult {
        let pruner = LedgerPruner::new(self.config.pruning.clone());
        let expiry_secs = self.state.params.expiry_secs_at(now);
        pruner.prune(&mut self.state.trst, now, expiry_secs)
    }
}

fn accepted(hash: TxHash, method: Method, outcome: TransferOutcome) -> Accepted {
    Accepted {
        hash,
        method,
        outputs: outcome.outputs,
        residue: outcome.residue,
    }
}

fn receivers(tx: &Transaction) -> Vec<&WalletAddress> {
    match tx {
        Transaction::Burn(burn) => vec![&burn.receiver],
        Transaction::Send(send) => vec![&send.receiver],
        Transaction::Split(split) => split.outputs.iter().map(|o| &o.receiver).collect(),
        Transaction::Merge(_) => Vec::new(),
    }
}
