//! SHA-256 helpers for the hash chain.
//!
//! Record hash pre-image layout (bytes, in order):
//!   1. prev_hash as UTF-8 bytes (64 ASCII hex chars; empty for the first record)
//!   2. `|` `ascii(index)` `|` — the literal separators and decimal index
//!   3. canonical JSON of the event
//!
//! Every byte range that contributes to a record's hash is listed explicitly
//! so nothing is accidentally omitted.

use sha2::{Digest, Sha256};

/// SHA-256 over the concatenation of `parts`, as a lowercase hex string.
pub fn hash_bytes(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

/// Compute the chain hash for one record.
///
/// `prev_hash` is the hex string of the previous record's hash (empty for
/// index 1) and `payload` is the canonical encoding of the event.
pub fn record_hash(prev_hash: &str, index: u64, payload: &[u8]) -> String {
    let position = format!("|{index}|");
    hash_bytes(&[prev_hash.as_bytes(), position.as_bytes(), payload])
}
