//! Verification report produced by a full offline replay of the logs.

use serde::{Deserialize, Serialize};

/// The outcome of replaying the events and roots logs end to end.
///
/// Verification is accumulative: every problem found is appended to
/// `errors` and the replay continues, so one report enumerates the full
/// damage footprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyReport {
    /// True when no problem of any kind was found.
    pub ok: bool,

    /// Index of the last record seen; equals the record count on a healthy log.
    pub total: u64,

    /// Index of the last record seen.
    pub last_index: u64,

    /// Hash of the last record seen.
    pub last_hash: String,

    /// Number of batch roots recomputed and compared against the roots log.
    pub roots_checked: u32,

    /// Human-readable descriptions of every problem found, in log order.
    pub errors: Vec<String>,
}

impl Default for VerifyReport {
    fn default() -> Self {
        Self {
            ok: true,
            total: 0,
            last_index: 0,
            last_hash: String::new(),
            roots_checked: 0,
            errors: Vec::new(),
        }
    }
}

impl VerifyReport {
    /// Record one problem and mark the report as failed.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.ok = false;
        self.errors.push(message.into());
    }
}
