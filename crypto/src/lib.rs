//! Cryptographic primitives for the BURST accounting core.
//!
//! - **Ed25519** for transaction signing and signature verification
//! - **Blake2b** for transaction hashes and derived batch identifiers
//! - Address derivation with `brst_` prefix and base32 encoding, so a
//!   sender's public key can be recovered from its address alone

pub mod address;
pub mod hash;
pub mod keys;
pub mod sign;

pub use address::{decode_address, derive_address, public_key_of, validate_address};
pub use hash::{blake2b_256, blake2b_256_multi, derive_output_id, hash_transaction};
pub use keys::{generate_keypair, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};
