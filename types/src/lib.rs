//! Fundamental types for the BURST accounting core.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, hashes, timestamps, keys, genesis parameters, and state enums.

pub mod address;
pub mod error;
pub mod hash;
pub mod keys;
pub mod params;
pub mod state;
pub mod time;

pub use address::WalletAddress;
pub use error::BurstError;
pub use hash::TxHash;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use params::{ProtocolParams, BRN_UNIT};
pub use state::{TrstState, WalletState};
pub use time::Timestamp;
