//! Query normalization and fingerprinting.

use sha2::{Digest, Sha256};

/// Normalize a query for use as a cache entity: lower-cased and trimmed.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Compute the fingerprint of a query.
///
/// The query is normalized first, so `"Boşanma "` and `"boşanma"` share a
/// fingerprint.
pub fn query_fingerprint(query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_query(query).as_bytes());
    hex::encode(hasher.finalize())
}
