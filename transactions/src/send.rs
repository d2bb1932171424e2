//! Send transaction: transfer TRST between wallets.

use burst_types::{Signature, Timestamp, TxHash, WalletAddress};
use serde::{Deserialize, Serialize};

/// A TRST send transaction.
///
/// `link` names the batch being spent; `origin` is the sender's claim about
/// that batch's origin and must match it. Unspent clean TRST returns to the
/// sender as change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendTx {
    pub hash: TxHash,
    pub sender: WalletAddress,
    pub receiver: WalletAddress,
    pub amount: u128,
    pub timestamp: Timestamp,
    /// Id of the batch this send consumes.
    pub link: TxHash,
    /// Origin of the consumed batch.
    pub origin: TxHash,
    pub signature: Signature,
}
