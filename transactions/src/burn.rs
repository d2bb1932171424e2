//! Burn transaction: consumer burns BRN → provider receives TRST.

use burst_types::{Signature, Timestamp, TxHash, WalletAddress};
use serde::{Deserialize, Serialize};

/// A burn transaction. The consumer destroys BRN; the provider receives fresh TRST.
///
/// The burn founds a new origin: its hash is both `origin` and `link` of the
/// minted batch, and its timestamp starts the batch's expiry clock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnTx {
    pub hash: TxHash,
    pub sender: WalletAddress,
    pub receiver: WalletAddress,
    pub amount: u128,
    pub timestamp: Timestamp,
    pub signature: Signature,
}
