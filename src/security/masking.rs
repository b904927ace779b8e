//! Deterministic one-way masking of sensitive fields.
//!
//! `ip` and `device_id` are replaced by their SHA-256 digest before a record
//! leaves the transformer. The digest is stable for equal inputs, so masked
//! values can still be grouped and joined on.

use sha2::{Digest, Sha256};

/// Length of a masked value: SHA-256 as lowercase hex.
pub const MASKED_DIGEST_LEN: usize = 64;

/// Mask a value by hashing it with SHA-256.
///
/// Never fails, including for the empty string.
pub fn mask_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check whether a string has the shape of a masked value.
pub fn is_masked_digest(s: &str) -> bool {
    s.len() == MASKED_DIGEST_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
