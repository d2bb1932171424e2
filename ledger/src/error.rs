use burst_brn::BrnError;
use burst_governance::GovernanceError;
use burst_transactions::RejectReason;
use burst_trst::TrstError;
use burst_types::{WalletAddress, WalletState};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The transaction was refused and nothing was applied.
    #[error("rejected: {0}")]
    Rejected(#[from] RejectReason),

    /// Committed state is inconsistent. The named accounts are halted.
    #[error("invariant violation on {accounts:?}: {detail}")]
    InvariantViolation {
        accounts: Vec<WalletAddress>,
        detail: String,
    },

    #[error("account {0} is halted after an invariant violation")]
    AccountHalted(WalletAddress),

    #[error("wallet {wallet} cannot move from {from:?} to {to:?}")]
    InvalidStatusTransition {
        wallet: WalletAddress,
        from: WalletState,
        to: WalletState,
    },

    #[error("governance: {0}")]
    Governance(#[from] GovernanceError),

    #[error("BRN: {0}")]
    Brn(#[from] BrnError),

    /// A revocation sweep could not be advanced or checkpointed. It stays
    /// queued and resumes from the journal.
    #[error("revocation propagation failed: {0}")]
    Revocation(#[source] TrstError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl LedgerError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}
