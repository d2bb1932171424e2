//! Per-wallet BRN state.

use crate::error::BrnError;
use crate::stake::{Stake, StakeId};
use burst_governance::ParamSchedule;
use burst_types::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An interval during which a wallet was Verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualPeriod {
    pub start: Timestamp,
    /// `None` while the wallet is still Verified.
    pub end: Option<Timestamp>,
}

/// Total accrual of `periods` up to `now` under the rate history `rates`.
///
/// Each period is split at every rate-change timestamp it spans, so a change
/// at `t_change` only affects accrual after `t_change`. Returns `None` on
/// overflow. O(p × k) for p periods and k rate entries.
pub fn accrued_checked(
    periods: &[AccrualPeriod],
    rates: &ParamSchedule,
    now: Timestamp,
) -> Option<u128> {
    let mut total: u128 = 0;
    for period in periods {
        let end = period.end.map_or(now, |e| e.min(now));
        for seg in rates.segments(period.start, end) {
            let part = seg.value.checked_mul(u128::from(seg.duration_secs()))?;
            total = total.checked_add(part)?;
        }
    }
    Some(total)
}

/// BRN state for a single wallet.
///
/// Only per-wallet data lives here (accrual periods, burned, stakes). The rate
/// history is global and shared.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrnWalletState {
    /// Verified intervals, oldest first. Only the last may be open.
    pub periods: Vec<AccrualPeriod>,

    /// Total BRN ever burned by this wallet (cumulative, never decreases).
    pub total_burned: u128,

    /// Unresolved stakes by id.
    pub stakes: BTreeMap<StakeId, Stake>,
}

impl BrnWalletState {
    /// State for a wallet that became Verified at `verified_at`.
    pub fn new(verified_at: Timestamp) -> Self {
        Self {
            periods: vec![AccrualPeriod {
                start: verified_at,
                end: None,
            }],
            total_burned: 0,
            stakes: BTreeMap::new(),
        }
    }

    /// When the wallet was first verified.
    pub fn verified_at(&self) -> Option<Timestamp> {
        self.periods.first().map(|p| p.start)
    }

    pub fn accrual_active(&self) -> bool {
        self.periods.last().is_some_and(|p| p.end.is_none())
    }

    /// Sum of stakes still locked at `now`.
    pub fn locked_checked(&self, now: Timestamp) -> Option<u128> {
        self.stakes
            .values()
            .filter(|s| s.is_locked(now))
            .try_fold(0u128, |acc, s| acc.checked_add(s.amount))
    }

    pub fn accrued_checked(&self, rates: &ParamSchedule, now: Timestamp) -> Option<u128> {
        accrued_checked(&self.periods, rates, now)
    }

    /// `accrued − total_burned − locked`, floored at zero, or `None` if the
    /// accrual or the locked sum overflows.
    ///
    /// The floor matters when asking about an instant before later burns: the
    /// wallet had less accrued then than it has burned since.
    pub fn available_balance_checked(&self, rates: &ParamSchedule, now: Timestamp) -> Option<u128> {
        let accrued = self.accrued_checked(rates, now)?;
        let locked = self.locked_checked(now)?;
        Some(accrued.saturating_sub(self.total_burned).saturating_sub(locked))
    }

    /// Compute available balance, returning 0 on overflow.
    pub fn available_balance(&self, rates: &ParamSchedule, now: Timestamp) -> u128 {
        self.available_balance_checked(rates, now).unwrap_or(0)
    }

    /// Close the open accrual period (de-verification or revocation).
    /// A no-op if accrual is already stopped.
    pub fn stop_accrual(&mut self, at: Timestamp) -> Result<(), BrnError> {
        if let Some(open) = self.periods.last_mut().filter(|p| p.end.is_none()) {
            if at < open.start {
                return Err(BrnError::InvalidTimestamp {
                    at,
                    start: open.start,
                });
            }
            open.end = Some(at);
        }
        Ok(())
    }

    /// Open a new accrual period (re-verification). Earlier periods keep their
    /// accrual. A no-op if accrual is already active.
    pub fn resume_accrual(&mut self, at: Timestamp) -> Result<(), BrnError> {
        if self.accrual_active() {
            return Ok(());
        }
        if let Some(last_end) = self.periods.last().and_then(|p| p.end) {
            if at < last_end {
                return Err(BrnError::InvalidTimestamp { at, start: last_end });
            }
        }
        self.periods.push(AccrualPeriod {
            start: at,
            end: None,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stake::StakeKind;
    use burst_types::WalletAddress;

    fn ts(s: u64) -> Timestamp {
        Timestamp::new(s)
    }

    fn flat(rate: u128) -> ParamSchedule {
        ParamSchedule::new(rate, ts(0))
    }

    fn stake(id: StakeId, amount: u128, lock: Option<u64>) -> Stake {
        Stake {
            id,
            staker: WalletAddress::new("brst_staker"),
            amount,
            kind: StakeKind::Challenge {
                target_wallet: WalletAddress::new("brst_target"),
            },
            created_at: ts(0),
            lock_expires_at: lock.map(ts),
        }
    }

    #[test]
    fn wallet_verified_after_genesis() {
        let state = BrnWalletState::new(ts(500));
        // Only 500s of accrual at rate 50
        assert_eq!(state.available_balance(&flat(50), ts(1000)), 25_000);
    }

    #[test]
    fn period_spans_partial_segments() {
        let mut rates = ParamSchedule::new(10, ts(0));
        rates.push(20, ts(100)).unwrap();
        rates.push(30, ts(200)).unwrap();

        // 50s at 10 + 100s at 20 + 50s at 30
        let state = BrnWalletState::new(ts(50));
        assert_eq!(state.accrued_checked(&rates, ts(250)), Some(4000));
    }

    #[test]
    fn zero_elapsed_returns_zero() {
        let state = BrnWalletState::new(ts(500));
        assert_eq!(state.available_balance(&flat(100), ts(500)), 0);
        // A query before verification also reads zero.
        assert_eq!(state.available_balance(&flat(100), ts(100)), 0);
    }

    #[test]
    fn checked_returns_none_on_overflow() {
        let state = BrnWalletState::new(ts(0));
        assert!(state.accrued_checked(&flat(u128::MAX), ts(2)).is_none());
        assert_eq!(state.available_balance(&flat(u128::MAX), ts(2)), 0);
    }

    #[test]
    fn balance_after_burn_and_stake() {
        let mut state = BrnWalletState::new(ts(0));
        state.total_burned = 5000;
        state.stakes.insert(1, stake(1, 3000, None));
        // 10000 - 5000 - 3000
        assert_eq!(state.available_balance(&flat(100), ts(100)), 2000);
    }

    #[test]
    fn balance_before_later_burns_floors_at_zero() {
        let mut state = BrnWalletState::new(ts(0));
        state.total_burned = 5000;
        assert_eq!(state.available_balance_checked(&flat(100), ts(10)), Some(0));
    }

    #[test]
    fn expired_lock_stops_counting() {
        let mut state = BrnWalletState::new(ts(0));
        state.stakes.insert(1, stake(1, 3000, Some(50)));
        assert_eq!(state.available_balance(&flat(100), ts(49)), 4900 - 3000);
        assert_eq!(state.available_balance(&flat(100), ts(50)), 5000);
    }

    #[test]
    fn overdrawn_reads_zero() {
        let mut state = BrnWalletState::new(ts(0));
        state.total_burned = 999_999;
        assert_eq!(state.available_balance(&flat(1), ts(10)), 0);
    }

    #[test]
    fn stop_accrual_caps_balance() {
        let mut state = BrnWalletState::new(ts(0));
        state.stop_accrual(ts(50)).unwrap();
        assert!(!state.accrual_active());
        assert_eq!(state.available_balance(&flat(100), ts(1000)), 5000);
    }

    #[test]
    fn reverification_keeps_earlier_accrual() {
        let mut state = BrnWalletState::new(ts(0));
        state.total_burned = 5000;
        state.stop_accrual(ts(50)).unwrap();
        state.resume_accrual(ts(100)).unwrap();

        assert!(state.accrual_active());
        assert_eq!(state.verified_at(), Some(ts(0)));
        // 100×50 + 100×(200−100) − 5000
        assert_eq!(state.available_balance(&flat(100), ts(200)), 10_000);
    }

    #[test]
    fn stop_before_start_is_rejected() {
        let mut state = BrnWalletState::new(ts(100));
        assert!(state.stop_accrual(ts(99)).is_err());
        assert!(state.accrual_active());
    }
}
