//! SHA-256 hashing helpers shared by the downloader and the MSIX
//! inspector's signature/package-family-name derivation.

use sha2::{Digest, Sha256};

/// Hex-encode `bytes` in upper case, matching the casing the schema's
/// `InstallerSha256`/`SignatureSha256` fields are validated against
/// (§I4: 64 uppercase hex characters).
pub fn sha256_hex_upper(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02X}"));
    }
    out
}

/// Raw SHA-256 digest bytes, for callers that need to operate on the
/// digest itself (the package-family-name encoder takes the first 8
/// bytes, §4.E step 2).
pub fn sha256_digest(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}
