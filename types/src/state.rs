//! State enums for wallets and TRST batches.

use serde::{Deserialize, Serialize};

/// The verification status of a wallet.
///
/// Transitions are driven only by the external verification process:
///
/// ```text
/// Unverified → PendingVerification → Verified → Deverified → PendingVerification → …
///                      │                  │
///                      └→ Unverified      └→ Revoked (terminal)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WalletState {
    /// Wallet exists but has never been verified.
    Unverified,
    /// Verification is in progress.
    PendingVerification,
    /// Wallet has been verified as a unique human; BRN accrues.
    Verified,
    /// Previously verified, now unverified (voluntary or inactivity).
    /// Accrual stops; already-issued TRST is unaffected.
    Deverified,
    /// Wallet was found fraudulent; all originated TRST is revoked.
    Revoked,
}

impl WalletState {
    /// Whether BRN accrual is active.
    pub fn accrues_brn(&self) -> bool {
        matches!(self, Self::Verified)
    }

    /// Whether this wallet may burn BRN into TRST.
    pub fn can_burn(&self) -> bool {
        matches!(self, Self::Verified)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Revoked)
    }

    /// Whether the verification process may move a wallet from `self` to `next`.
    pub fn can_transition_to(&self, next: WalletState) -> bool {
        use WalletState::*;
        matches!(
            (self, next),
            (Unverified, PendingVerification)
                | (PendingVerification, Verified)
                | (PendingVerification, Unverified)
                | (Verified, Deverified)
                | (Verified, Revoked)
                | (Deverified, PendingVerification)
                | (Deverified, Revoked)
        )
    }
}

/// The state of a TRST batch as seen by a portfolio query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrstState {
    /// Active and transferable.
    Active,
    /// Expired: non-transferable but visible as a permanent record.
    Expired,
    /// Revoked: descended from a fraudulent wallet; non-transferable.
    Revoked,
}

impl TrstState {
    /// Whether TRST in this state can be transferred.
    pub fn is_transferable(&self) -> bool {
        matches!(self, Self::Active)
    }
}
