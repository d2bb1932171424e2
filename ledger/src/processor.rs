//! Per-account serialized processing on tokio.
//!
//! Submissions for different accounts may be in flight together; those for
//! the same account are serialized by an account lock, so each account's
//! stream is applied in arrival order. Commits go through one ledger mutex,
//! which makes a transfer's sender removal and receiver insertion atomic.
//! Queued revocation sweeps advance one budgeted step after each commit.

use std::collections::HashMap;
use std::sync::Arc;

use burst_transactions::Transaction;
use burst_types::{Timestamp, WalletAddress};
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::ledger::{Accepted, EventOutcome, Ledger};

pub struct LedgerProcessor {
    ledger: Arc<Mutex<Ledger>>,
    /// Per-account mutexes
    account_locks: Arc<Mutex<HashMap<WalletAddress, Arc<Mutex<()>>>>>,
}

impl LedgerProcessor {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            account_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Shared handle for queries.
    pub fn ledger(&self) -> Arc<Mutex<Ledger>> {
        Arc::clone(&self.ledger)
    }

    /// Get or create a lock for a specific account.
    async fn account_lock(&self, account: &WalletAddress) -> Arc<Mutex<()>> {
        let mut locks = self.account_locks.lock().await;
        locks
            .entry(account.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Submit a transaction behind its sender's account lock.
    pub async fn submit(&self, tx: Transaction, now: Timestamp) -> Result<Accepted, LedgerError> {
        let lock = self.account_lock(tx.sender()).await;
        let _account_guard = lock.lock().await;

        let mut ledger = self.ledger.lock().await;
        let accepted = ledger.submit(tx, now)?;
        Self::advance_revocations(&mut ledger);
        Ok(accepted)
    }

    /// Apply any event. Transactions and stake events take the account lock
    /// of the wallet they act for.
    pub async fn apply(&self, event: LedgerEvent, now: Timestamp) -> Result<EventOutcome, LedgerError> {
        let account = match &event {
            LedgerEvent::Transaction(tx) => Some(tx.sender().clone()),
            LedgerEvent::Verification(v) => Some(v.wallet.clone()),
            LedgerEvent::Stake(stake) => Some(stake.staker().clone()),
            LedgerEvent::ParamChange(_) | LedgerEvent::RevocationStep { .. } => None,
        };
        let lock = match &account {
            Some(account) => Some(self.account_lock(account).await),
            None => None,
        };
        let _account_guard = match &lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        let mut ledger = self.ledger.lock().await;
        let outcome = ledger.apply_event(&event, now)?;
        if matches!(outcome, EventOutcome::Committed(_)) {
            Self::advance_revocations(&mut ledger);
        }
        Ok(outcome)
    }

    fn advance_revocations(ledger: &mut Ledger) {
        if !ledger.revocation().is_pending() {
            return;
        }
        // The commit already happened; a failed step stays queued and is
        // retried after the next commit.
        if let Err(err) = ledger.drive_revocations() {
            warn!(error = %err, "revocation step after commit failed");
        }
    }

    /// Run queued revocation sweeps to completion.
    pub async fn drain_revocations(&self) -> Result<(), LedgerError> {
        let mut ledger = self.ledger.lock().await;
        ledger.run_revocations().map(|_| ())
    }

    /// Get the number of accounts with a lock entry.
    pub async fn active_accounts(&self) -> usize {
        let locks = self.account_locks.lock().await;
        locks.len()
    }

    /// Clean up locks for accounts no longer being processed.
    pub async fn cleanup(&self) {
        let mut locks = self.account_locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}
