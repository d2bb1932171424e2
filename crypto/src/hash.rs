//! Blake2b hashing for transactions and live-batch identifiers.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use burst_types::TxHash;

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    blake2b_256_multi(&[data])
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Hash a transaction's canonical signing payload to produce its `TxHash`.
pub fn hash_transaction(tx_bytes: &[u8]) -> TxHash {
    TxHash::new(blake2b_256(tx_bytes))
}

/// Identifier of output `index` of the transaction `tx_hash`.
///
/// Output 0 is addressed by the transaction hash itself, so a burn's batch,
/// a send's receiver batch and a merge's output all share their creating
/// transaction's hash. Further outputs (send change, split legs) get
/// `blake2b(tx_hash ‖ index_be)`.
pub fn derive_output_id(tx_hash: &TxHash, index: u32) -> TxHash {
    if index == 0 {
        return *tx_hash;
    }
    TxHash::new(blake2b_256_multi(&[
        tx_hash.as_bytes(),
        &index.to_be_bytes(),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake2b_deterministic() {
        assert_eq!(blake2b_256(b"hello burst"), blake2b_256(b"hello burst"));
        assert_ne!(blake2b_256(b"hello"), blake2b_256(b"world"));
    }

    #[test]
    fn blake2b_multi_equivalent() {
        let single = blake2b_256(b"helloworld");
        let multi = blake2b_256_multi(&[b"hello", b"world"]);
        assert_eq!(single, multi);
    }

    #[test]
    fn output_zero_is_the_tx_hash() {
        let h = hash_transaction(b"tx");
        assert_eq!(derive_output_id(&h, 0), h);
    }

    #[test]
    fn outputs_are_distinct() {
        let h = hash_transaction(b"tx");
        let a = derive_output_id(&h, 1);
        let b = derive_output_id(&h, 2);
        assert_ne!(a, h);
        assert_ne!(a, b);
        assert_eq!(a, derive_output_id(&h, 1));
    }
}
