//! Event and log-record types.
//!
//! `Event` is the raw unit of ingest.  `Record` wraps one event with its
//! position in the hash chain; `RootRecord` commits a contiguous batch of
//! records to a Merkle root.  Both record types are written to disk as
//! single-line JSON and are immutable once written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw application event as submitted by a producer.
///
/// `payload` is free-form JSON supplied by the producer.  Number values keep
/// their original lexical form end to end (serde_json is compiled with
/// `arbitrary_precision`), which the canonical encoding depends on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Event {
    /// Producer-assigned identifier.  When empty at ingest, the service
    /// derives one from the canonical hash of the event itself.
    #[serde(default)]
    pub id: String,

    /// Event category, e.g. `"trade"`.  Required and non-empty at ingest.
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Producer system that emitted the event.
    #[serde(default)]
    pub source: String,

    /// When the event happened, per the producer.  `None` when the producer
    /// did not say; ingest fills it with the wall clock.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    /// Free-form producer payload.
    #[serde(default)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

/// One tamper-evident log entry wrapping an [`Event`].
///
/// Invariants on disk: `index` increases by exactly 1 per record starting at
/// 1, `prev_hash` equals the previous record's `hash` (empty for the first
/// record), and `hash` commits to `prev_hash`, `index`, and the canonical
/// bytes of `event`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Position in the chain, starting at 1.
    pub index: u64,

    /// Ingest-assigned wall-clock time (UTC).
    pub timestamp: DateTime<Utc>,

    /// The ingested event, verbatim.
    pub event: Event,

    /// Hex SHA-256 of the previous record, or `""` for index 1.
    pub prev_hash: String,

    /// Hex SHA-256 of this record's chain pre-image.
    pub hash: String,
}

/// A Merkle commitment over a contiguous, completed batch of records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootRecord {
    /// Index of the first record in the batch.
    pub from_index: u64,

    /// Index of the last record in the batch.
    pub to_index: u64,

    /// Hex-encoded binary Merkle root over the batch's record hashes.
    pub root_hash: String,

    /// Wall-clock time (UTC) the root was sealed.
    pub created_at: DateTime<Utc>,
}
