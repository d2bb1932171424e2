//! Merge transaction: combine multiple TRST batches into one.

use burst_types::{Signature, Timestamp, TxHash, WalletAddress};
use serde::{Deserialize, Serialize};

/// A TRST merge transaction.
///
/// Combines batches (potentially from different origins) into one whose origin
/// is this transaction's hash. The merged batch expires with its earliest input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeTx {
    pub hash: TxHash,
    pub sender: WalletAddress,
    pub timestamp: Timestamp,
    /// Ids of the batches being merged.
    pub inputs: Vec<TxHash>,
    pub signature: Signature,
}
