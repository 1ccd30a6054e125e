//! Hashing primitives
//!
//! Domain-separated SHA-256, used to fingerprint form structure so that a
//! response can tell whether the form changed since it was bound.

use sha2::{Digest, Sha256};

/// Create a domain-separated hash using SHA-256
///
/// # Arguments
///
/// * `domain` - Domain prefix (e.g., "FORMKIT_FORM_FIELDS")
/// * `data` - Data to hash
///
/// # Returns
///
/// A 32-byte hash with domain separation
pub fn secure_hash(domain: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();

    hasher.update(domain.as_bytes());
    // Length byte keeps "AB"+"C" and "A"+"BC" apart
    hasher.update([domain.len() as u8]);
    hasher.update(data);

    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hex-encoded domain-separated hash
pub fn fingerprint(domain: &str, data: &[u8]) -> String {
    hex::encode(secure_hash(domain, data))
}
