//! BURST transaction records and their stateless validation.
//!
//! Transaction types:
//! - **Burn**: Consumer burns BRN → provider receives TRST
//! - **Send**: Transfer TRST between wallets (change returns to the sender)
//! - **Split**: Divide TRST into several batches
//! - **Merge**: Combine several TRST batches into one
//!
//! Records are immutable once hashed and signed. The hash covers the
//! canonical signing payload, and the signature covers the hash.

pub mod burn;
pub mod error;
pub mod merge;
pub mod send;
pub mod split;
pub mod validation;

pub use burn::BurnTx;
pub use error::{RejectReason, TransactionError};
pub use merge::MergeTx;
pub use send::SendTx;
pub use split::{SplitOutput, SplitTx};
pub use validation::validate_transaction;

use burst_crypto::{hash_transaction, sign_message};
use burst_types::{PrivateKey, Signature, Timestamp, TxHash, WalletAddress};
use serde::{Deserialize, Serialize};

/// Which operation a transaction performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Burn,
    Send,
    Split,
    Merge,
}

impl Method {
    fn tag(self) -> u8 {
        match self {
            Self::Burn => 0,
            Self::Send => 1,
            Self::Split => 2,
            Self::Merge => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Burn => "burn",
            Self::Send => "send",
            Self::Split => "split",
            Self::Merge => "merge",
        }
    }
}

/// The unified transaction enum.
///
/// Externally tagged so that compact binary formats can decode it:
/// `{"burn": {...}}` in JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transaction {
    Burn(BurnTx),
    Send(SendTx),
    Split(SplitTx),
    Merge(MergeTx),
}

impl Transaction {
    pub fn method(&self) -> Method {
        match self {
            Self::Burn(_) => Method::Burn,
            Self::Send(_) => Method::Send,
            Self::Split(_) => Method::Split,
            Self::Merge(_) => Method::Merge,
        }
    }

    pub fn hash(&self) -> &TxHash {
        match self {
            Self::Burn(tx) => &tx.hash,
            Self::Send(tx) => &tx.hash,
            Self::Split(tx) => &tx.hash,
            Self::Merge(tx) => &tx.hash,
        }
    }

    /// The signer, whose account chain this transaction extends.
    pub fn sender(&self) -> &WalletAddress {
        match self {
            Self::Burn(tx) => &tx.sender,
            Self::Send(tx) => &tx.sender,
            Self::Split(tx) => &tx.sender,
            Self::Merge(tx) => &tx.sender,
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::Burn(tx) => tx.timestamp,
            Self::Send(tx) => tx.timestamp,
            Self::Split(tx) => tx.timestamp,
            Self::Merge(tx) => tx.timestamp,
        }
    }

    pub fn signature(&self) -> &Signature {
        match self {
            Self::Burn(tx) => &tx.signature,
            Self::Send(tx) => &tx.signature,
            Self::Split(tx) => &tx.signature,
            Self::Merge(tx) => &tx.signature,
        }
    }

    /// The founding origin this transaction declares. Burns and merges found
    /// their own; sends and splits carry their input batch's.
    pub fn origin(&self) -> TxHash {
        match self {
            Self::Burn(tx) => tx.hash,
            Self::Send(tx) => tx.origin,
            Self::Split(tx) => tx.origin,
            Self::Merge(tx) => tx.hash,
        }
    }

    /// Batches consumed. A burn's link is itself.
    pub fn links(&self) -> Vec<TxHash> {
        match self {
            Self::Burn(tx) => vec![tx.hash],
            Self::Send(tx) => vec![tx.link],
            Self::Split(tx) => vec![tx.link],
            Self::Merge(tx) => tx.inputs.clone(),
        }
    }

    /// Total amount moved or minted.
    pub fn amount(&self) -> u128 {
        match self {
            Self::Burn(tx) => tx.amount,
            Self::Send(tx) => tx.amount,
            Self::Split(tx) => tx
                .outputs
                .iter()
                .fold(0u128, |acc, o| acc.saturating_add(o.amount)),
            Self::Merge(_) => 0,
        }
    }

    /// Canonical bytes covered by the hash.
    ///
    /// Format: `method_tag || sender || timestamp_be || body`, where addresses
    /// are length-prefixed (u16 BE) and amounts are u128 BE.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(128);
        data.push(self.method().tag());
        put_address(&mut data, self.sender());
        data.extend_from_slice(&self.timestamp().as_secs().to_be_bytes());
        match self {
            Self::Burn(tx) => {
                put_address(&mut data, &tx.receiver);
                data.extend_from_slice(&tx.amount.to_be_bytes());
            }
            Self::Send(tx) => {
                put_address(&mut data, &tx.receiver);
                data.extend_from_slice(&tx.amount.to_be_bytes());
                data.extend_from_slice(tx.link.as_bytes());
                data.extend_from_slice(tx.origin.as_bytes());
            }
            Self::Split(tx) => {
                data.extend_from_slice(tx.link.as_bytes());
                data.extend_from_slice(tx.origin.as_bytes());
                data.extend_from_slice(&(tx.outputs.len() as u32).to_be_bytes());
                for output in &tx.outputs {
                    put_address(&mut data, &output.receiver);
                    data.extend_from_slice(&output.amount.to_be_bytes());
                }
            }
            Self::Merge(tx) => {
                data.extend_from_slice(&(tx.inputs.len() as u32).to_be_bytes());
                for input in &tx.inputs {
                    data.extend_from_slice(input.as_bytes());
                }
            }
        }
        data
    }

    /// Hash of the signing payload.
    pub fn compute_hash(&self) -> TxHash {
        hash_transaction(&self.signing_bytes())
    }

    fn set_hash_and_signature(&mut self, hash: TxHash, signature: Signature) {
        match self {
            Self::Burn(tx) => (tx.hash, tx.signature) = (hash, signature),
            Self::Send(tx) => (tx.hash, tx.signature) = (hash, signature),
            Self::Split(tx) => (tx.hash, tx.signature) = (hash, signature),
            Self::Merge(tx) => (tx.hash, tx.signature) = (hash, signature),
        }
    }

    /// Fill in the hash and sign it with the sender's key.
    pub fn signed(mut self, key: &PrivateKey) -> Self {
        let hash = self.compute_hash();
        let signature = sign_message(hash.as_bytes(), key);
        self.set_hash_and_signature(hash, signature);
        self
    }

    /// Fill in the hash only. The signature stays empty and will not verify.
    pub fn sealed(mut self) -> Self {
        let hash = self.compute_hash();
        self.set_hash_and_signature(hash, Signature::EMPTY);
        self
    }
}

fn put_address(data: &mut Vec<u8>, address: &WalletAddress) {
    let bytes = address.as_str().as_bytes();
    data.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
    data.extend_from_slice(bytes);
}
