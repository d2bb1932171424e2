//! Per-account append-only chain of committed transactions.

use burst_types::{TxHash, WalletAddress};
use serde::{Deserialize, Serialize};

/// The committed transactions one account signed, in commit order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountChain {
    pub account: WalletAddress,
    hashes: Vec<TxHash>,
}

impl AccountChain {
    pub fn new(account: WalletAddress) -> Self {
        Self {
            account,
            hashes: Vec::new(),
        }
    }

    /// Hash of the most recent transaction, if any.
    pub fn head(&self) -> Option<&TxHash> {
        self.hashes.last()
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn hashes(&self) -> &[TxHash] {
        &self.hashes
    }

    /// Append a committed transaction, updating the head.
    pub fn append(&mut self, hash: TxHash) {
        self.hashes.push(hash);
    }
}
