//! Offline replay verification of the audit logs.
//!
//! The verifier operates only on files — it never touches store memory and
//! takes no lock, so it can run against a live store or a copied-off pair of
//! logs.  Verification is accumulative, not fail-fast: every problem found
//! is recorded and the replay continues, so one report enumerates the full
//! damage footprint.

use std::io::{BufRead, BufReader};
use std::path::Path;

use assure_contracts::{AssureError, AssureResult, Record, RootRecord, VerifyReport};

use crate::canonical::stable_json;
use crate::hash::record_hash;
use crate::merkle::merkle_root;
use crate::store::open_log;

/// Replay the events log, re-deriving every chain hash and every batch root,
/// and compare against what is on disk.
///
/// Checks, per record: index continuity, `prev_hash` linkage, and the
/// recomputed record hash.  Every `batch_size` records, the recomputed
/// Merkle root is compared against the next `RootRecord`; events running
/// past the roots log produce a "missing root record" error.  A trailing
/// partial batch is not compared against anything — by construction no root
/// exists for it yet.
pub fn verify(events_path: &Path, roots_path: &Path, batch_size: usize) -> VerifyReport {
    let mut report = VerifyReport::default();

    let file = match open_log(events_path) {
        Ok(file) => file,
        Err(e) => {
            report.record_error(format!("open events: {e}"));
            return report;
        }
    };
    let roots = match read_roots(roots_path) {
        Ok(roots) => roots,
        Err(e) => {
            report.record_error(format!("read roots: {e}"));
            return report;
        }
    };

    let mut root_cursor = 0usize;
    let mut current_batch: Vec<String> = Vec::new();
    let mut expected_prev = String::new();
    let mut expected_index = 0u64;

    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                report.record_error(format!("scan: {e}"));
                break;
            }
        };
        if line.is_empty() {
            continue;
        }
        let record: Record = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(e) => {
                report.record_error(format!("decode record: {e}"));
                continue;
            }
        };

        expected_index += 1;
        if record.index != expected_index {
            report.record_error(format!("index mismatch at {}", record.index));
        }
        if record.prev_hash != expected_prev {
            report.record_error(format!("prev_hash mismatch at {}", record.index));
        }

        let payload = match stable_json(&record.event) {
            Ok(payload) => payload,
            Err(e) => {
                report.record_error(format!("canonical encoding: {e}"));
                continue;
            }
        };
        let computed = record_hash(&record.prev_hash, record.index, &payload);
        if computed != record.hash {
            report.record_error(format!("hash mismatch at {}", record.index));
        }

        expected_prev = record.hash.clone();
        report.total = record.index;
        report.last_index = record.index;
        report.last_hash = record.hash.clone();

        current_batch.push(record.hash);
        if batch_size > 0 && current_batch.len() == batch_size {
            if root_cursor >= roots.len() {
                report.record_error("missing root record");
                current_batch.clear();
                continue;
            }
            let computed_root = merkle_root(&current_batch);
            if roots[root_cursor].root_hash != computed_root {
                report.record_error(format!("root mismatch for batch ending {}", record.index));
            }
            report.roots_checked += 1;
            root_cursor += 1;
            current_batch.clear();
        }
    }

    report
}

/// Read every `RootRecord` from the roots log, in order.
fn read_roots(path: &Path) -> AssureResult<Vec<RootRecord>> {
    let file = open_log(path)?;
    let mut out = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let root: RootRecord = serde_json::from_str(&line).map_err(|e| AssureError::Decode {
            reason: e.to_string(),
        })?;
        out.push(root);
    }
    Ok(out)
}
