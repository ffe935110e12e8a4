//! Bearer-token check for the scrape endpoint.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Compare two secrets without leaking their length or content through timing.
///
/// Both sides are hashed to SHA-256 first so the comparison always runs over
/// 32 bytes.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let ha = Sha256::digest(a);
    let hb = Sha256::digest(b);
    ha.ct_eq(&hb).into()
}

/// Check an `Authorization` header value against the expected bearer token.
pub fn bearer_matches(header: Option<&str>, token: &[u8]) -> bool {
    header
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|presented| constant_time_eq(presented.trim().as_bytes(), token))
        .unwrap_or(false)
}
