//! Core BRN computation engine.

use crate::error::BrnError;
use crate::stake::{Stake, StakeId, StakeKind};
use crate::state::BrnWalletState;
use burst_governance::ParamSchedule;
use burst_types::{Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// The BRN engine: balances, burns and stakes.
///
/// The rate history is passed in on every call; a governance rate change is
/// an O(1) append to that history and never iterates wallets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BrnEngine {
    next_stake_id: StakeId,
    wallets: HashMap<WalletAddress, BrnWalletState>,
}

impl BrnEngine {
    pub fn new() -> Self {
        Self {
            next_stake_id: 1,
            wallets: HashMap::new(),
        }
    }

    pub fn wallet(&self, address: &WalletAddress) -> Option<&BrnWalletState> {
        self.wallets.get(address)
    }

    fn wallet_mut(&mut self, address: &WalletAddress) -> Result<&mut BrnWalletState, BrnError> {
        self.wallets
            .get_mut(address)
            .ok_or(BrnError::WalletNotVerified)
    }

    /// Start (or resume) accrual for a wallet that became Verified at `at`.
    pub fn start_accrual(&mut self, address: &WalletAddress, at: Timestamp) -> Result<(), BrnError> {
        match self.wallets.get_mut(address) {
            Some(state) => state.resume_accrual(at)?,
            None => {
                self.wallets
                    .insert(address.clone(), BrnWalletState::new(at));
            }
        }
        debug!(wallet = %address, at = at.as_secs(), "BRN accrual started");
        Ok(())
    }

    /// Stop accrual (de-verification or revocation). Unknown wallets never accrued.
    pub fn stop_accrual(&mut self, address: &WalletAddress, at: Timestamp) -> Result<(), BrnError> {
        if let Some(state) = self.wallets.get_mut(address) {
            state.stop_accrual(at)?;
            debug!(wallet = %address, at = at.as_secs(), "BRN accrual stopped");
        }
        Ok(())
    }

    /// Compute the available BRN balance with checked arithmetic.
    ///
    /// All values are deterministic integers: rates are `u128` raw units per
    /// second, timestamps are `u64` whole seconds. A wallet never verified has 0.
    pub fn available_checked(
        &self,
        address: &WalletAddress,
        rates: &ParamSchedule,
        now: Timestamp,
    ) -> Result<u128, BrnError> {
        match self.wallets.get(address) {
            Some(state) => state
                .available_balance_checked(rates, now)
                .ok_or(BrnError::Overflow),
            None => Ok(0),
        }
    }

    /// Available BRN, reading 0 on overflow.
    pub fn available(&self, address: &WalletAddress, rates: &ParamSchedule, now: Timestamp) -> u128 {
        self.available_checked(address, rates, now).unwrap_or(0)
    }

    /// Record a BRN burn (consuming BRN to mint TRST).
    pub fn record_burn(
        &mut self,
        address: &WalletAddress,
        amount: u128,
        rates: &ParamSchedule,
        now: Timestamp,
    ) -> Result<(), BrnError> {
        if amount == 0 {
            return Err(BrnError::ZeroAmount);
        }
        let state = self.wallet_mut(address)?;
        let available = state
            .available_balance_checked(rates, now)
            .ok_or(BrnError::Overflow)?;
        if available < amount {
            return Err(BrnError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        state.total_burned = state
            .total_burned
            .checked_add(amount)
            .ok_or(BrnError::Overflow)?;
        Ok(())
    }

    /// Lock BRN as a stake (for verification or challenge).
    pub fn stake(
        &mut self,
        staker: &WalletAddress,
        amount: u128,
        kind: StakeKind,
        lock_expires_at: Option<Timestamp>,
        rates: &ParamSchedule,
        now: Timestamp,
    ) -> Result<StakeId, BrnError> {
        if amount == 0 {
            return Err(BrnError::ZeroAmount);
        }
        if let Some(lock) = lock_expires_at.filter(|lock| *lock <= now) {
            return Err(BrnError::InvalidLock { lock, now });
        }
        let id = self.next_stake_id;
        let next = id.checked_add(1).ok_or(BrnError::Overflow)?;
        let state = self.wallet_mut(staker)?;
        let available = state
            .available_balance_checked(rates, now)
            .ok_or(BrnError::Overflow)?;
        if available < amount {
            return Err(BrnError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        state.stakes.insert(
            id,
            Stake {
                id,
                staker: staker.clone(),
                amount,
                kind,
                created_at: now,
                lock_expires_at,
            },
        );
        self.next_stake_id = next;
        debug!(wallet = %staker, stake = id, %amount, "BRN staked");
        Ok(id)
    }

    /// Return a stake (successful outcome; the BRN is unlocked).
    pub fn return_stake(&mut self, staker: &WalletAddress, id: StakeId) -> Result<Stake, BrnError> {
        let state = self.wallet_mut(staker)?;
        state.stakes.remove(&id).ok_or(BrnError::StakeNotFound(id))
    }

    /// Forfeit a stake (BRN is lost: counted as burned).
    ///
    /// A stake whose lock already expired was spendable and may have been
    /// burned, so forfeiting it is refused.
    pub fn forfeit_stake(
        &mut self,
        staker: &WalletAddress,
        id: StakeId,
        now: Timestamp,
    ) -> Result<Stake, BrnError> {
        let state = self.wallet_mut(staker)?;
        let stake = state.stakes.get(&id).ok_or(BrnError::StakeNotFound(id))?;
        if !stake.is_locked(now) {
            return Err(BrnError::StakeLockExpired(id));
        }
        let burned = state
            .total_burned
            .checked_add(stake.amount)
            .ok_or(BrnError::Overflow)?;
        state.total_burned = burned;
        state.stakes.remove(&id).ok_or(BrnError::StakeNotFound(id))
    }
}

impl Default for BrnEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_address(n: u8) -> WalletAddress {
        WalletAddress::new(format!("brst_{:0>60}", n))
    }

    fn ts(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    fn verified_engine(addr: &WalletAddress, at: u64) -> BrnEngine {
        let mut engine = BrnEngine::new();
        engine.start_accrual(addr, ts(at)).unwrap();
        engine
    }

    fn challenge() -> StakeKind {
        StakeKind::Challenge {
            target_wallet: test_address(99),
        }
    }

    #[test]
    fn test_balance_computation_at_different_times() {
        let rates = ParamSchedule::new(10, ts(0));
        let addr = test_address(1);
        let engine = verified_engine(&addr, 1000);

        assert_eq!(engine.available(&addr, &rates, ts(1000)), 0);
        assert_eq!(engine.available(&addr, &rates, ts(1100)), 1000);
        assert_eq!(engine.available(&addr, &rates, ts(2000)), 10000);
        assert_eq!(engine.available(&test_address(2), &rates, ts(2000)), 0);
    }

    #[test]
    fn test_burn_reduces_available_balance() {
        let rates = ParamSchedule::new(10, ts(0));
        let addr = test_address(1);
        let mut engine = verified_engine(&addr, 1000);
        let now = ts(1100);

        engine.record_burn(&addr, 300, &rates, now).unwrap();
        assert_eq!(engine.available(&addr, &rates, now), 700);
        engine.record_burn(&addr, 200, &rates, now).unwrap();
        assert_eq!(engine.available(&addr, &rates, now), 500);
        assert_eq!(engine.wallet(&addr).unwrap().total_burned, 500);
    }

    #[test]
    fn test_insufficient_balance_burn_returns_error() {
        let rates = ParamSchedule::new(10, ts(0));
        let addr = test_address(1);
        let mut engine = verified_engine(&addr, 1000);

        match engine.record_burn(&addr, 1500, &rates, ts(1100)).unwrap_err() {
            BrnError::InsufficientBalance { needed, available } => {
                assert_eq!(needed, 1500);
                assert_eq!(available, 1000);
            }
            other => panic!("expected InsufficientBalance, got {other:?}"),
        }
        assert_eq!(engine.wallet(&addr).unwrap().total_burned, 0);
    }

    #[test]
    fn test_zero_burn_and_unknown_wallet() {
        let rates = ParamSchedule::new(10, ts(0));
        let addr = test_address(1);
        let mut engine = verified_engine(&addr, 0);
        assert!(matches!(
            engine.record_burn(&addr, 0, &rates, ts(10)),
            Err(BrnError::ZeroAmount)
        ));
        assert!(matches!(
            engine.record_burn(&test_address(7), 1, &rates, ts(10)),
            Err(BrnError::WalletNotVerified)
        ));
    }

    #[test]
    fn test_return_stake_unlocks_brn() {
        let rates = ParamSchedule::new(10, ts(0));
        let addr = test_address(1);
        let mut engine = verified_engine(&addr, 1000);
        let now = ts(1100);

        let id = engine
            .stake(&addr, 400, challenge(), None, &rates, now)
            .unwrap();
        assert_eq!(engine.available(&addr, &rates, now), 600);
        let stake = engine.return_stake(&addr, id).unwrap();
        assert_eq!(stake.amount, 400);
        assert_eq!(engine.available(&addr, &rates, now), 1000);
        assert!(matches!(
            engine.return_stake(&addr, id),
            Err(BrnError::StakeNotFound(_))
        ));
    }

    #[test]
    fn test_forfeit_stake_converts_to_burned() {
        let rates = ParamSchedule::new(10, ts(0));
        let addr = test_address(1);
        let mut engine = verified_engine(&addr, 1000);
        let now = ts(1100);

        let id = engine
            .stake(&addr, 400, challenge(), Some(ts(5000)), &rates, now)
            .unwrap();
        engine.forfeit_stake(&addr, id, now).unwrap();
        assert_eq!(engine.available(&addr, &rates, now), 600);
        let state = engine.wallet(&addr).unwrap();
        assert_eq!(state.total_burned, 400);
        assert!(state.stakes.is_empty());
    }

    #[test]
    fn test_forfeit_after_lock_expiry_is_refused() {
        let rates = ParamSchedule::new(10, ts(0));
        let addr = test_address(1);
        let mut engine = verified_engine(&addr, 0);

        let id = engine
            .stake(&addr, 400, challenge(), Some(ts(200)), &rates, ts(100))
            .unwrap();
        assert!(matches!(
            engine.forfeit_stake(&addr, id, ts(200)),
            Err(BrnError::StakeLockExpired(_))
        ));
        assert!(matches!(
            engine.stake(&addr, 1, challenge(), Some(ts(100)), &rates, ts(100)),
            Err(BrnError::InvalidLock { .. })
        ));
    }

    #[test]
    fn test_rate_change_preserves_old_accrual() {
        let mut rates = ParamSchedule::new(10, ts(0));
        let addr = test_address(1);
        let engine = verified_engine(&addr, 1000);
        assert_eq!(engine.available(&addr, &rates, ts(1100)), 1000);

        rates.push(20, ts(1100)).unwrap();
        // 100s × 10 + 50s × 20
        assert_eq!(engine.available(&addr, &rates, ts(1150)), 2000);
    }

    #[test]
    fn test_deverification_freezes_then_reverification_resumes() {
        let rates = ParamSchedule::new(10, ts(0));
        let addr = test_address(1);
        let mut engine = verified_engine(&addr, 1000);

        engine.stop_accrual(&addr, ts(1500)).unwrap();
        assert_eq!(engine.available(&addr, &rates, ts(2000)), 5000);

        engine.start_accrual(&addr, ts(3000)).unwrap();
        assert_eq!(engine.available(&addr, &rates, ts(3100)), 6000);
    }
}
