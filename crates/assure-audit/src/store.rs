//! Single-writer, append-only hash-chain store.
//!
//! The store owns two newline-delimited JSON files under its data directory:
//! `events.log` (one `Record` per line) and `roots.log` (one `RootRecord`
//! per line).  All mutation goes through `append()`, which holds a mutex
//! across hash computation, the file writes, and the in-memory state
//! advance.  Releasing the lock between the disk write and the state update
//! would let two appenders compute the same `prev_hash` and fork the chain,
//! so the write stays inside the critical section.
//!
//! Read-only consumers (the offline verifier, the aggregator, event
//! listings) open the files independently and never take this mutex; they
//! rely on line-granular append atomicity to observe either a complete
//! record or nothing.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use assure_contracts::{AssureError, AssureResult, Event, Record, RootRecord};

use crate::canonical::stable_json;
use crate::hash::record_hash;
use crate::merkle::merkle_root;

const EVENTS_FILE: &str = "events.log";
const ROOTS_FILE: &str = "roots.log";
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_BATCH_SIZE: usize = 100;

// ── Internal mutable state ────────────────────────────────────────────────────

/// The chain state rebuilt from disk at startup and advanced on every append.
#[derive(Default)]
struct ChainState {
    /// Index of the last record on disk (0 when the log is empty).
    last_index: u64,

    /// Hash of the last record on disk (empty when the log is empty).
    last_hash: String,

    /// Hashes of records committed to the events log but not yet sealed
    /// into a `RootRecord`, in append order.
    batch_hashes: Vec<String>,

    /// Index of the first record in the open batch (0 when the batch is empty).
    batch_start: u64,
}

// ── Public store ──────────────────────────────────────────────────────────────

/// The append-only tamper-evident log.
///
/// # Thread safety
///
/// `append()` and `current_batch_root()` acquire an internal mutex; the
/// store can be shared across threads behind an `Arc` without additional
/// synchronization.
pub struct Store {
    events_path: PathBuf,
    roots_path: PathBuf,
    batch_size: usize,
    state: Mutex<ChainState>,
}

impl Store {
    /// Open (or create) the store under `data_dir` and rebuild the chain
    /// state from disk.
    ///
    /// An empty `data_dir` falls back to `./data`; a `batch_size` of 0 falls
    /// back to 100.  A fresh directory with no log files is a valid empty
    /// store.  Fails with `AssureError::Decode` when an existing events log
    /// holds a line that does not parse — an unreadable log means the chain
    /// state cannot be trusted.
    pub fn open(data_dir: impl AsRef<Path>, batch_size: usize) -> AssureResult<Self> {
        let dir = data_dir.as_ref();
        let dir = if dir.as_os_str().is_empty() {
            Path::new(DEFAULT_DATA_DIR)
        } else {
            dir
        };
        let batch_size = if batch_size == 0 { DEFAULT_BATCH_SIZE } else { batch_size };

        fs::create_dir_all(dir)?;

        let store = Self {
            events_path: dir.join(EVENTS_FILE),
            roots_path: dir.join(ROOTS_FILE),
            batch_size,
            state: Mutex::new(ChainState::default()),
        };
        store.load_state()?;

        let state = store.state.lock().expect("chain state lock poisoned");
        info!(
            data_dir = %dir.display(),
            batch_size,
            last_index = state.last_index,
            pending = state.batch_hashes.len(),
            "audit store opened"
        );
        drop(state);

        Ok(store)
    }

    /// Append one event to the chain.
    ///
    /// Assigns the next index, computes the chain hash over the canonical
    /// event bytes, and writes the record as a single JSON line.  When the
    /// append completes the open batch, seals it: a `RootRecord` is written
    /// to the roots log and returned alongside the record.
    ///
    /// A canonicalization failure aborts before any I/O.  A failed events-log
    /// write leaves the in-memory state unchanged.  A failed roots-log write
    /// is surfaced after the record is already durable; the pending batch is
    /// reset as if sealed and recovery re-derives it from the events log.
    pub fn append(&self, mut event: Event) -> AssureResult<(Record, Option<RootRecord>)> {
        let mut state = self.state.lock().expect("chain state lock poisoned");

        if event.timestamp.is_none() {
            event.timestamp = Some(Utc::now());
        }

        let index = state.last_index + 1;
        let payload = stable_json(&event)?;
        let hash = record_hash(&state.last_hash, index, &payload);

        let record = Record {
            index,
            timestamp: Utc::now(),
            event,
            prev_hash: state.last_hash.clone(),
            hash: hash.clone(),
        };

        append_json_line(&self.events_path, &record)?;

        state.last_index = index;
        state.last_hash = hash.clone();
        if state.batch_hashes.is_empty() {
            state.batch_start = index;
        }
        state.batch_hashes.push(hash);

        let mut sealed = None;
        if state.batch_hashes.len() >= self.batch_size {
            let root = RootRecord {
                from_index: state.batch_start,
                to_index: index,
                root_hash: merkle_root(&state.batch_hashes),
                created_at: Utc::now(),
            };
            state.batch_hashes.clear();
            state.batch_start = 0;

            append_json_line(&self.roots_path, &root)?;
            debug!(
                from_index = root.from_index,
                to_index = root.to_index,
                root_hash = %root.root_hash,
                "batch sealed"
            );
            sealed = Some(root);
        }

        Ok((record, sealed))
    }

    /// The final `RootRecord`, read from the roots log (not from memory).
    pub fn last_root(&self) -> AssureResult<Option<RootRecord>> {
        read_last_root(&self.roots_path)
    }

    /// Merkle root over the currently open (unsealed) batch; empty when the
    /// batch is empty.
    pub fn current_batch_root(&self) -> String {
        let state = self.state.lock().expect("chain state lock poisoned");
        merkle_root(&state.batch_hashes)
    }

    /// Path of the events log.
    pub fn events_path(&self) -> &Path {
        &self.events_path
    }

    /// Path of the roots log.
    pub fn roots_path(&self) -> &Path {
        &self.roots_path
    }

    /// The deployment-fixed batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Rebuild `last_index`, `last_hash`, and the open batch from disk.
    ///
    /// The roots log tells us the last sealed index; every events-log record
    /// past it belongs to the open batch.  A crash between an event append
    /// and its root append leaves exactly this situation, and the batch is
    /// sealed once the next appends complete it.
    fn load_state(&self) -> AssureResult<()> {
        let last_completed = read_last_root(&self.roots_path)?
            .map(|root| root.to_index)
            .unwrap_or(0);

        let file = open_log(&self.events_path)?;
        let mut state = self.state.lock().expect("chain state lock poisoned");

        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let record: Record =
                serde_json::from_str(&line).map_err(|e| AssureError::Decode {
                    reason: e.to_string(),
                })?;
            state.last_index = record.index;
            state.last_hash = record.hash.clone();
            if record.index > last_completed {
                if state.batch_hashes.is_empty() {
                    state.batch_start = record.index;
                }
                state.batch_hashes.push(record.hash);
            }
        }
        Ok(())
    }
}

// ── File helpers ──────────────────────────────────────────────────────────────

/// Open a log file for reading, creating it when missing so that a fresh
/// data directory behaves as a valid empty log.
///
/// Read-only consumers (the verifier, the aggregator, event listings) use
/// this to observe a live store without taking its mutex.
pub fn open_log(path: &Path) -> AssureResult<File> {
    Ok(OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)?)
}

/// Append `value` as one JSON line in a single write.
///
/// The whole line (including the trailing newline) goes through one
/// `write_all` on an `O_APPEND` handle, which is what gives readers
/// line-granular atomicity.
///
/// # Panics
///
/// Panics if `value` cannot be serialized to JSON — which cannot happen for
/// the well-formed record types written here.
fn append_json_line<T: Serialize>(path: &Path, value: &T) -> AssureResult<()> {
    let mut line = serde_json::to_vec(value).expect("log records must always serialize to JSON");
    line.push(b'\n');

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(&line)?;
    Ok(())
}

/// Read the last `RootRecord` in the roots log, if any.
pub(crate) fn read_last_root(path: &Path) -> AssureResult<Option<RootRecord>> {
    let file = open_log(path)?;
    let mut last = None;
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let root: RootRecord = serde_json::from_str(&line).map_err(|e| AssureError::Decode {
            reason: e.to_string(),
        })?;
        last = Some(root);
    }
    Ok(last)
}
