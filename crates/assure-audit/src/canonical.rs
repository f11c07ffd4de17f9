//! Canonical JSON encoding used as the hash pre-image.
//!
//! The chain's security rests on this being a *canonical* encoder: two
//! semantically-equal values must encode to identical bytes, and two
//! different values must encode differently.  Key ordering is the principal
//! threat, so mappings are not encoded as JSON objects at all — they become
//! flat `[k1, v1, k2, v2, …]` arrays with keys sorted by raw byte order.
//! No encoder that reorders object keys or reformats whitespace can change
//! the result.
//!
//! Numbers keep their original lexical form (serde_json is compiled with
//! `arbitrary_precision`), so a payload value like `3.1400` or a 30-digit
//! integer survives a log round-trip byte-for-byte.  serde_json never
//! HTML-escapes and `to_vec` emits no trailing whitespace, so no stripping
//! pass is needed.

use serde::Serialize;
use serde_json::Value;

use assure_contracts::{AssureError, AssureResult, Event};

use crate::hash::hash_bytes;

/// Encode `value` as deterministic canonical JSON bytes.
///
/// Returns `AssureError::Canonicalization` when the value cannot be
/// represented as JSON (e.g. a map with non-string keys).
pub fn stable_json<T: Serialize>(value: &T) -> AssureResult<Vec<u8>> {
    let raw = serde_json::to_value(value).map_err(|e| AssureError::Canonicalization {
        reason: e.to_string(),
    })?;
    serde_json::to_vec(&normalize(&raw)).map_err(|e| AssureError::Canonicalization {
        reason: e.to_string(),
    })
}

/// Derive a content-addressed identifier for an event: the lowercase hex
/// SHA-256 of its canonical bytes.
///
/// Used at ingest when the producer did not assign an `id`.
pub fn event_id(event: &Event) -> AssureResult<String> {
    let payload = stable_json(event)?;
    Ok(hash_bytes(&[&payload]))
}

/// Rewrite a JSON value into its canonical shape.
///
/// Objects become alternating key/value arrays ordered by byte-wise key
/// comparison; arrays keep their order, recursively rewritten; scalars pass
/// through unchanged.
fn normalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            let mut out = Vec::with_capacity(keys.len() * 2);
            for key in keys {
                out.push(Value::String(key.clone()));
                out.push(normalize(&map[key.as_str()]));
            }
            Value::Array(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        scalar => scalar.clone(),
    }
}
