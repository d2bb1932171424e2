//! Counters and the final per-wallet report.

use std::fmt;

use burst_ledger::{EventOutcome, Ledger};
use burst_types::{Timestamp, WalletState};
use burst_utils::format_duration;
use serde::Serialize;

/// What happened to the events of one replay.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    pub events: usize,
    pub transactions: usize,
    pub verifications: usize,
    pub param_changes: usize,
    pub stake_events: usize,
    pub revocation_steps: usize,
    pub rejected: usize,
    pub failed: usize,
    pub first: Option<Timestamp>,
    pub last: Option<Timestamp>,
}

impl ReplayStats {
    pub fn observe(&mut self, at: Timestamp) {
        self.events += 1;
        self.first = Some(self.first.map_or(at, |t| t.min(at)));
        self.last = Some(self.last.map_or(at, |t| t.max(at)));
    }

    pub fn record(&mut self, outcome: &EventOutcome) {
        match outcome {
            EventOutcome::Committed(_) => self.transactions += 1,
            EventOutcome::StatusChanged(_) => self.verifications += 1,
            EventOutcome::ParamChanged => self.param_changes += 1,
            EventOutcome::StakeLocked(_) | EventOutcome::StakeResolved(_) => {
                self.stake_events += 1
            }
            EventOutcome::RevocationStepped(_) => self.revocation_steps += 1,
        }
    }

    /// Seconds between the earliest and latest event.
    pub fn span_secs(&self) -> u64 {
        match (self.first, self.last) {
            (Some(first), Some(last)) => first.elapsed_since(last),
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletReport {
    pub address: String,
    pub status: WalletState,
    pub halted: bool,
    pub available_brn: u128,
    pub transferable: u128,
    pub expired: u128,
    pub revoked: u128,
    pub effective: u128,
    pub batches: usize,
    pub chain_length: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub stats: ReplayStats,
    pub evaluated_at: Timestamp,
    pub live_batches: usize,
    pub merges: usize,
    pub pruned: usize,
    pub wallets: Vec<WalletReport>,
}

impl Report {
    pub fn build(stats: ReplayStats, ledger: &Ledger, at: Timestamp, pruned: usize) -> Self {
        let mut wallets: Vec<WalletReport> = ledger
            .wallets()
            .map(|record| {
                let address = &record.address;
                let portfolio = ledger.trst_portfolio(address, at);
                WalletReport {
                    address: address.to_string(),
                    status: record.status,
                    halted: ledger.is_halted(address),
                    available_brn: ledger.available_brn(address, at),
                    transferable: portfolio.transferable,
                    expired: portfolio.expired,
                    revoked: portfolio.revoked,
                    effective: portfolio.effective,
                    batches: portfolio.batches.len(),
                    chain_length: ledger.chain(address).map_or(0, |c| c.len()),
                }
            })
            .collect();
        wallets.sort_by(|a, b| a.address.cmp(&b.address));
        Self {
            stats,
            evaluated_at: at,
            live_batches: ledger.trst().len(),
            merges: ledger.trst().merger_graph().merge_count(),
            pruned,
            wallets,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        writeln!(
            f,
            "replayed {} events over {} ({} transactions, {} rejected, {} failed)",
            s.events,
            format_duration(s.span_secs()),
            s.transactions,
            s.rejected,
            s.failed
        )?;
        writeln!(
            f,
            "evaluated at {}: {} live batches, {} merges, {} pruned",
            self.evaluated_at.as_secs(),
            self.live_batches,
            self.merges,
            self.pruned
        )?;
        for w in &self.wallets {
            writeln!(
                f,
                "{} {:?}{} brn={} trst: transferable={} expired={} revoked={} effective={} ({} batches)",
                w.address,
                w.status,
                if w.halted { " HALTED" } else { "" },
                w.available_brn,
                w.transferable,
                w.expired,
                w.revoked,
                w.effective,
                w.batches
            )?;
        }
        Ok(())
    }
}
