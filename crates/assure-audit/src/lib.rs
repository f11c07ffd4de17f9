//! # assure-audit
//!
//! Immutable, append-only, SHA-256 hash-chained event log with periodic
//! Merkle commitments for the assurance service.
//!
//! ## Overview
//!
//! Every ingested event is wrapped in a `Record` that links to the previous
//! record via its chain hash.  Every `batch_size` records, the store seals a
//! `RootRecord` committing the batch to a binary Merkle root.  Tampering
//! with any byte of either log is detected by [`verify`], which replays the
//! files offline and re-derives every hash and every root.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use assure_audit::{verify, Store};
//!
//! let store = Store::open("./data", 100)?;
//! let (record, sealed_root) = store.append(event)?;
//!
//! let report = verify(store.events_path(), store.roots_path(), 100);
//! assert!(report.ok);
//! ```

pub mod canonical;
pub mod hash;
pub mod merkle;
pub mod store;
pub mod verify;

pub use canonical::{event_id, stable_json};
pub use hash::{hash_bytes, record_hash};
pub use merkle::merkle_root;
pub use store::Store;
pub use verify::verify;

// ── Tests ─────────────────────────────────────────────────────────────────────
