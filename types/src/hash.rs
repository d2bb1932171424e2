//! Transaction hash type.
//!
//! Every transaction, live batch, and merger graph node is identified by a
//! 32-byte Blake2b hash. Hashes are stable IDs: the ledger never holds live
//! object references between records.

use crate::error::BurstError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A 32-byte transaction hash.
/// Serialized as lowercase hex in human-readable formats, raw bytes otherwise.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Parse a 64-character lowercase or uppercase hex string.
    pub fn from_hex(s: &str) -> Result<Self, BurstError> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out)
            .map_err(|e| BurstError::InvalidHash(format!("{s}: {e}")))?;
        Ok(Self(out))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(self.0))
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::from_hex(&s).map_err(D::Error::custom)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(Self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_display_parses_back() {
        let h = TxHash::new([0xab; 32]);
        let parsed = TxHash::from_hex(&h.to_string()).unwrap();
        assert_eq!(parsed, h);
    }

    #[test]
    fn json_uses_hex_and_bincode_uses_bytes() {
        let h = TxHash::new([0x01; 32]);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
        assert_eq!(serde_json::from_str::<TxHash>(&json).unwrap(), h);
        let bytes = bincode::serialize(&h).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(bincode::deserialize::<TxHash>(&bytes).unwrap(), h);
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(TxHash::from_hex("abc").is_err());
        assert!(TxHash::from_hex(&"zz".repeat(32)).is_err());
    }
}
