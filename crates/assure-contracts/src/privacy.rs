//! Privacy-preserving aggregate summary types.

use serde::{Deserialize, Serialize};

/// One surviving per-token entry in a privacy summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCount {
    /// The token key extracted from event payloads.
    pub mint: String,

    /// The raw occurrence count inside the window.  Always `>= k` — entries
    /// below the threshold are suppressed before this struct is built.
    pub count: u64,

    /// `count` plus Laplace noise with scale `1/epsilon`.
    pub noised: f64,

    /// The query window, in hours, the count was taken over.
    pub window_hours: i64,
}

/// A k-anonymous, differentially-private summary over windowed token counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSummary {
    /// Surviving entries, sorted by `noised` descending.
    pub items: Vec<TokenCount>,

    /// Number of input keys suppressed for having `count < k`.
    pub redacted_count: u64,

    /// Sum of all input counts, suppressed or not.
    pub total_seen: u64,

    /// The k-anonymity threshold that was applied.
    pub k: u64,

    /// The differential-privacy epsilon that was applied.
    pub epsilon: f64,
}
