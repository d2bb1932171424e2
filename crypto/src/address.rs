//! Wallet address derivation from public keys.
//!
//! Address format: `brst_` + base32(public_key, 52 chars) + base32(checksum, 8 chars)
//!
//! Checksum: first 5 bytes of Blake2b-256(public_key).
//! Base32 alphabet: `13456789abcdefghijkmnopqrstuwxyz` (Nano-style, avoids ambiguous chars).

use burst_types::{PublicKey, WalletAddress};

const ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";
const PUBKEY_CHARS: usize = 52;
const CHECKSUM_CHARS: usize = 8;

fn symbol_value(c: u8) -> Option<u8> {
    ALPHABET.iter().position(|&a| a == c).map(|p| p as u8)
}

/// Encode bytes as base32, padding the final symbol with zero bits.
fn encode_base32(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 8).div_ceil(5));
    let mut acc: u16 = 0;
    let mut bits = 0u32;
    for &byte in bytes {
        acc = (acc << 8) | byte as u16;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((acc >> bits) & 0x1f) as usize] as char);
        }
        acc &= (1 << bits) - 1;
    }
    if bits > 0 {
        out.push(ALPHABET[((acc << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

/// Decode exactly `N` bytes from a base32 string. Trailing pad bits are ignored.
fn decode_base32<const N: usize>(s: &str) -> Option<[u8; N]> {
    let mut out = [0u8; N];
    let mut filled = 0;
    let mut acc: u16 = 0;
    let mut bits = 0u32;
    for c in s.bytes() {
        acc = (acc << 5) | symbol_value(c)? as u16;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            if filled < N {
                out[filled] = (acc >> bits) as u8;
                filled += 1;
            }
            acc &= (1 << bits) - 1;
        }
    }
    (filled == N).then_some(out)
}

fn checksum(public_key: &[u8; 32]) -> [u8; 5] {
    let hash = crate::blake2b_256(public_key);
    [hash[0], hash[1], hash[2], hash[3], hash[4]]
}

/// Derive a `brst_`-prefixed wallet address from a public key.
pub fn derive_address(public_key: &PublicKey) -> WalletAddress {
    WalletAddress::new(format!(
        "{}{}{}",
        WalletAddress::PREFIX,
        encode_base32(public_key.as_bytes()),
        encode_base32(&checksum(public_key.as_bytes()))
    ))
}

/// Extract the public key bytes from a valid BURST address.
///
/// Returns `None` if the address is malformed or has an invalid checksum.
pub fn decode_address(address: &str) -> Option<[u8; 32]> {
    let encoded = address.strip_prefix(WalletAddress::PREFIX)?;
    if encoded.len() != PUBKEY_CHARS + CHECKSUM_CHARS {
        return None;
    }
    let (key_part, sum_part) = encoded.split_at(PUBKEY_CHARS);
    let key: [u8; 32] = decode_base32(key_part)?;
    let sum: [u8; 5] = decode_base32(sum_part)?;
    (sum == checksum(&key)).then_some(key)
}

/// The public key a wallet address commits to, used to verify its signatures.
pub fn public_key_of(address: &WalletAddress) -> Option<PublicKey> {
    decode_address(address.as_str()).map(PublicKey)
}

/// Validate that an address string is well-formed and its checksum is correct.
pub fn validate_address(address: &str) -> bool {
    decode_address(address).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{generate_keypair, keypair_from_seed};

    #[test]
    fn derive_and_decode() {
        let kp = generate_keypair();
        let addr = derive_address(&kp.public);
        assert!(addr.as_str().starts_with("brst_"));
        assert_eq!(addr.as_str().len(), 65);
        assert_eq!(public_key_of(&addr), Some(kp.public));
    }

    #[test]
    fn derive_is_deterministic() {
        let kp = keypair_from_seed(&[7u8; 32]);
        assert_eq!(derive_address(&kp.public), derive_address(&kp.public));
    }

    #[test]
    fn invalid_checksum_rejected() {
        let kp = keypair_from_seed(&[9u8; 32]);
        let mut bad = derive_address(&kp.public).as_str().to_string();
        let last = bad.pop().unwrap();
        bad.push(if last == '1' { '3' } else { '1' });
        assert!(!validate_address(&bad));
    }

    #[test]
    fn wrong_prefix_or_length_rejected() {
        assert!(!validate_address("brst_tooshort"));
        assert!(!validate_address("brst_"));
        assert!(public_key_of(&WalletAddress::new("brst_alice")).is_none());
    }

    #[test]
    fn base32_roundtrip() {
        let data = [0xDE, 0xAD, 0xBE, 0xEF, 0x42];
        let decoded: [u8; 5] = decode_base32(&encode_base32(&data)).unwrap();
        assert_eq!(decoded, data);
    }
}
