//! Package Family Name derivation (§4.E steps 1–5).
//!
//! The encoder produces the lowercase 13-character identifier the
//! algorithm describes. Casing it for an actual `Installer` record is
//! the Package Parser's job (SPEC_FULL.md §3: the engine uppercases
//! `package_family_name` at that boundary); keeping this function's
//! output lowercase lets tests check the algorithm itself against the
//! wording of the spec.

use crate::hash::sha256_digest;

const ALPHABET: &[u8; 32] = b"0123456789abcdefghjkmnpqrstvwxyz";

/// Encode a publisher's first 8 hash bytes into the 13-character
/// Crockford-like identifier (§4.E steps 3–4).
fn encode_13(hash_prefix: [u8; 8]) -> String {
    // 64 bits of hash plus one appended `0` bit, read off 5 bits at a
    // time, MSB-first, yielding thirteen groups (13 * 5 = 65).
    let mut bits = [false; 65];
    for (byte_index, byte) in hash_prefix.iter().enumerate() {
        for bit_index in 0..8 {
            bits[byte_index * 8 + bit_index] = (byte >> (7 - bit_index)) & 1 == 1;
        }
    }
    // bits[64] stays false: the appended bit.

    let mut out = String::with_capacity(13);
    for group in bits.chunks(5) {
        let mut value = 0u8;
        for &bit in group {
            value = (value << 1) | (bit as u8);
        }
        out.push(ALPHABET[value as usize] as char);
    }
    out
}

/// Derive `<Name>_<13-char-id>` from a package identity's `Name` and
/// `Publisher` attributes.
pub fn package_family_name(name: &str, publisher: &str) -> String {
    let utf16le: Vec<u8> = publisher.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect();
    let digest = sha256_digest(&utf16le);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    format!("{name}_{}", encode_13(prefix))
}
