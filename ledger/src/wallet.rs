//! Wallet status state machine.
//!
//! Status changes arrive only as verification events. The allowed moves are
//! those of [`WalletState::can_transition_to`]; anything else is refused
//! without touching the record.

use burst_types::{Timestamp, WalletAddress, WalletState};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// What the ledger must do after a status change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusEffect {
    StartAccrual,
    StopAccrual,
    /// Stop accrual and revoke every burn the wallet made.
    Revoke,
    None,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub address: WalletAddress,
    pub status: WalletState,
    /// Most recent verification. Kept across de-verification.
    pub verified_at: Option<Timestamp>,
    pub status_changed_at: Option<Timestamp>,
}

impl WalletRecord {
    /// A wallet first referenced by a transaction or event.
    pub fn new(address: WalletAddress) -> Self {
        Self {
            address,
            status: WalletState::Unverified,
            verified_at: None,
            status_changed_at: None,
        }
    }

    /// Check a move to `next` without applying it.
    pub fn check_transition(&self, next: WalletState) -> Result<StatusEffect, LedgerError> {
        if !self.status.can_transition_to(next) {
            return Err(LedgerError::InvalidStatusTransition {
                wallet: self.address.clone(),
                from: self.status,
                to: next,
            });
        }
        Ok(match next {
            WalletState::Verified => StatusEffect::StartAccrual,
            WalletState::Deverified => StatusEffect::StopAccrual,
            WalletState::Revoked => StatusEffect::Revoke,
            WalletState::Unverified | WalletState::PendingVerification => StatusEffect::None,
        })
    }

    /// Move to `next` at `at`.
    pub fn transition(&mut self, next: WalletState, at: Timestamp) -> Result<StatusEffect, LedgerError> {
        let effect = self.check_transition(next)?;
        if next == WalletState::Verified {
            self.verified_at = Some(at);
        }
        self.status = next;
        self.status_changed_at = Some(at);
        Ok(effect)
    }
}
