//! BRN staking for verification voting and challenges.

use burst_types::{Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

/// Unique identifier for an active stake.
pub type StakeId = u64;

/// What kind of action this BRN is staked for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakeKind {
    /// Staked as a verifier voting on a wallet's humanity.
    Verification { target_wallet: WalletAddress },
    /// Staked as a challenger contesting another wallet.
    Challenge { target_wallet: WalletAddress },
}

/// An unresolved BRN stake.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    pub id: StakeId,
    pub staker: WalletAddress,
    pub amount: u128,
    pub kind: StakeKind,
    pub created_at: Timestamp,
    /// After this instant the stake no longer locks BRN. `None` locks until resolved.
    pub lock_expires_at: Option<Timestamp>,
}

impl Stake {
    /// Whether the stake still counts against availability at `now`.
    pub fn is_locked(&self, now: Timestamp) -> bool {
        match self.lock_expires_at {
            Some(expiry) => now < expiry,
            None => true,
        }
    }
}
