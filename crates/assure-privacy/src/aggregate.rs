//! Windowed token counting and privacy-preserving summarization.
//!
//! `token_counts` scans the events log offline (no store lock) and tallies
//! trade events per token key inside a time window.  `summarize` then makes
//! the counts safe to publish: keys seen fewer than `k` times are suppressed
//! entirely (k-anonymity), and every surviving count is perturbed with
//! Laplace noise of scale `1/epsilon` (epsilon-differential privacy over
//! count queries of sensitivity 1).

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use assure_audit::store::open_log;
use assure_contracts::{AssureError, AssureResult, Record, TokenCount, TokenSummary};

/// Epsilon applied when the caller passes a non-positive value.
const DEFAULT_EPSILON: f64 = 0.7;

/// Payload member names probed, in order, for the token key.
const MINT_KEYS: [&str; 3] = ["mint", "tokenMint", "token_address"];

/// Tally per-token occurrences of trade events newer than `now - window`.
///
/// Records are skipped when their event type is not `"trade"`, or when the
/// event carries a timestamp older than the cutoff (events without a
/// timestamp are never filtered by time).  The result is ordered by key so
/// downstream noise draws are deterministic under a fixed seed.
pub fn token_counts(events_path: &Path, window: Duration) -> AssureResult<BTreeMap<String, u64>> {
    let cutoff = Utc::now() - window;
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();

    let file = open_log(events_path)?;
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(&line).map_err(|e| AssureError::Decode {
            reason: e.to_string(),
        })?;
        if record.event.kind != "trade" {
            continue;
        }
        if let Some(ts) = record.event.timestamp {
            if ts < cutoff {
                continue;
            }
        }
        match extract_mint(&record.event.payload) {
            Some(mint) if !mint.is_empty() => *counts.entry(mint).or_insert(0) += 1,
            _ => {}
        }
    }

    debug!(keys = counts.len(), "token counts aggregated");
    Ok(counts)
}

/// Apply k-suppression and Laplace noise to raw counts.
///
/// `k` is clamped to at least 1 — and `k = 1` means *no suppression* (every
/// key appears at least once by construction); it is honored as given, never
/// silently raised.  A non-positive `epsilon` falls back to 0.7.  With
/// `seed = 0` the noise source is nondeterministic (wall-clock nanoseconds);
/// any other seed makes the summary a pure function of its inputs.
pub fn summarize(
    counts: &BTreeMap<String, u64>,
    k: u64,
    epsilon: f64,
    seed: u64,
    window_hours: i64,
) -> TokenSummary {
    let k = k.max(1);
    let epsilon = if epsilon <= 0.0 { DEFAULT_EPSILON } else { epsilon };

    let mut rng = if seed == 0 {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        StdRng::seed_from_u64(nanos)
    } else {
        StdRng::seed_from_u64(seed)
    };

    let mut redacted = 0u64;
    let mut items = Vec::with_capacity(counts.len());
    for (mint, &count) in counts {
        if count < k {
            redacted += 1;
            continue;
        }
        let noise = laplace(&mut rng, 1.0 / epsilon);
        items.push(TokenCount {
            mint: mint.clone(),
            count,
            noised: count as f64 + noise,
            window_hours,
        });
    }

    items.sort_by(|a, b| b.noised.total_cmp(&a.noised));

    TokenSummary {
        items,
        redacted_count: redacted,
        total_seen: counts.values().sum(),
        k,
        epsilon,
    }
}

/// Probe the payload for the first present token key.
///
/// A present string value wins immediately (trimmed, possibly to empty — an
/// empty key means "no usable key", not "try the next name"); a present
/// non-string value falls through to the next name.
fn extract_mint(payload: &serde_json::Map<String, serde_json::Value>) -> Option<String> {
    for key in MINT_KEYS {
        if let Some(value) = payload.get(key) {
            if let Some(s) = value.as_str() {
                return Some(s.trim().to_string());
            }
        }
    }
    None
}

/// Draw one sample from Laplace(0, `scale`) via inverse transform sampling.
///
/// Non-positive scales clamp to zero noise.
fn laplace(rng: &mut StdRng, scale: f64) -> f64 {
    if scale <= 0.0 {
        return 0.0;
    }
    let v = rng.gen::<f64>() - 0.5;
    let sign = if v < 0.0 { -1.0 } else { 1.0 };
    -scale * sign * (1.0 - 2.0 * v.abs()).ln()
}
