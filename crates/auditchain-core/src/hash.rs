//! Hash chain engine: SHA-256 over `previous_hash || canonical bytes`.
//!
//! The digest is a pure function of its two inputs. Nothing ambient (clock,
//! process state, backend) is mixed in, so any holder of the stored fields
//! can recompute it.

use sha2::{Digest, Sha256};
use std::fmt;

/// The `previous_hash` of the first event in a log.
pub const GENESIS_PREVIOUS_HASH: &str = "";

/// A 32-byte SHA-256 chain digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainHash(pub [u8; 32]);

impl ChainHash {
    /// Compute the SHA-256 hash of data.
    pub fn digest(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex, the form stored on events.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hex digest.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }
}

impl fmt::Debug for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainHash({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for ChainHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for ChainHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Compute an event digest from its predecessor's hash and its canonical bytes.
pub fn compute_hash(previous_hash: &str, canonical: &[u8]) -> ChainHash {
    let mut hasher = Sha256::new();
    hasher.update(previous_hash.as_bytes());
    hasher.update(canonical);
    ChainHash(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_digest_is_known_vector() {
        assert_eq!(
            ChainHash::digest(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_compute_hash_is_concatenation() {
        let joined = ChainHash::digest(b"abcdef");
        assert_eq!(compute_hash("abc", b"def"), joined);
    }

    #[test]
    fn test_previous_hash_changes_digest() {
        let a = compute_hash(GENESIS_PREVIOUS_HASH, b"payload");
        let b = compute_hash("00", b"payload");
        assert_ne!(a, b);
    }

    #[test]
    fn test_hex_roundtrip() {
        let h = ChainHash::digest(b"roundtrip");
        assert_eq!(ChainHash::from_hex(&h.to_hex()), Some(h));
        assert_eq!(ChainHash::from_hex("zz"), None);
        assert_eq!(ChainHash::from_hex("abcd"), None);
    }
}
