//! Identity Hashing
//!
//! Deterministic hashing of match identity fields into persisted lookup keys.
//! Keys derived here are stored alongside every match, so the byte layout
//! fed to the hasher must never change.

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type IdentityHash = [u8; 32];

/// Domain separator for match identity keys.
pub const MATCH_KEY_DOMAIN: &[u8] = b"GGP_SPECTATOR_MATCH_KEY_V1";

/// Deterministic hasher for identity fields.
///
/// Wraps SHA-256 with length-prefixed string updates so that adjacent
/// fields cannot be re-split into a colliding layout
/// (`"ab" + "c"` hashes differently from `"a" + "bc"`).
pub struct IdentityHasher {
    hasher: Sha256,
}

impl IdentityHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for match identity keys.
    pub fn for_match_key() -> Self {
        Self::new(MATCH_KEY_DOMAIN)
    }

    /// Update with a length-prefixed UTF-8 string.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u64(value.len() as u64);
        self.hasher.update(value.as_bytes());
    }

    /// Update with a u64 value (big-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_be_bytes());
    }

    /// Update with an i64 value (big-endian).
    #[inline]
    pub fn update_i64(&mut self, value: i64) {
        self.hasher.update(value.to_be_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.hasher.update([value as u8]);
    }

    /// Update with an optional string: presence flag, then the value.
    #[inline]
    pub fn update_opt_str(&mut self, value: Option<&str>) {
        self.update_bool(value.is_some());
        if let Some(value) = value {
            self.update_str(value);
        }
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> IdentityHash {
        self.hasher.finalize().into()
    }

    /// Finalize and return the hash as lowercase hex.
    pub fn finalize_hex(self) -> String {
        hex::encode(self.finalize())
    }
}

// =============================================================================
// TESTS
// =============================================================================
