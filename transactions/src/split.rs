//! Split transaction: divide TRST into multiple batches.

use burst_types::{Signature, Timestamp, TxHash, WalletAddress};
use serde::{Deserialize, Serialize};

/// One recipient and amount of a split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitOutput {
    pub receiver: WalletAddress,
    pub amount: u128,
}

/// A TRST split transaction.
///
/// All outputs keep the parent's `origin`. Output amounts must sum to the
/// transferable amount of the parent batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitTx {
    pub hash: TxHash,
    pub sender: WalletAddress,
    pub timestamp: Timestamp,
    /// Id of the batch being split.
    pub link: TxHash,
    /// Origin of the batch being split.
    pub origin: TxHash,
    pub outputs: Vec<SplitOutput>,
    pub signature: Signature,
}
