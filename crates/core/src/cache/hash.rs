//! Request-addressed cache key generation.

use sha2::{Digest, Sha256};

use crate::Request;

/// Compute the cache key for a method/URL pair.
pub fn compute_entry_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cache key for a request descriptor.
pub fn request_key(request: &Request) -> String {
    compute_entry_key(&request.method, request.url.as_str())
}
