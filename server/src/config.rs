//! Environment-driven configuration for the assurance server.
//!
//! Every knob reads from an `ASSURE_*` variable with a sensible default.
//! Malformed values are configuration errors surfaced through `main`'s
//! error path, not process aborts.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use assure_contracts::{AssureError, AssureResult};

/// Runtime configuration for the server binary.
///
/// | Variable | Default | Meaning |
/// |---|---|---|
/// | `ASSURE_PORT` | 9010 | Listen port |
/// | `ASSURE_DATA_DIR` | `./data` | Directory holding the two logs |
/// | `ASSURE_SHARED_SECRET` | *(empty)* | HMAC ingest secret; empty disables signing |
/// | `ASSURE_BATCH_SIZE` | 100 | Records per Merkle commitment |
/// | `ASSURE_K_ANON` | 5 | Default k-anonymity threshold |
/// | `ASSURE_DP_EPS` | 0.7 | Default differential-privacy epsilon |
/// | `ASSURE_DP_SEED` | 0 | Noise seed; 0 means nondeterministic |
/// | `ASSURE_POLICY_PATH` | `./policies/policy.toml` | Policy rule file |
/// | `ASSURE_READ_TIMEOUT` | 5 | Request read timeout, seconds |
/// | `ASSURE_WRITE_TIMEOUT` | 5 | Request write timeout, seconds |
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub shared_secret: String,
    pub batch_size: usize,
    pub k_anonymity: u64,
    pub dp_epsilon: f64,
    pub dp_seed: u64,
    pub policy_path: String,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 9010,
            data_dir: "./data".to_string(),
            shared_secret: String::new(),
            batch_size: 100,
            k_anonymity: 5,
            dp_epsilon: 0.7,
            dp_seed: 0,
            policy_path: "./policies/policy.toml".to_string(),
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    /// Load configuration from the environment and apply the clamps.
    pub fn from_env() -> AssureResult<Self> {
        let defaults = Self::default();
        let config = Self {
            port: parse_env("ASSURE_PORT", defaults.port)?,
            data_dir: env_or("ASSURE_DATA_DIR", &defaults.data_dir),
            shared_secret: env_or("ASSURE_SHARED_SECRET", ""),
            batch_size: parse_env("ASSURE_BATCH_SIZE", defaults.batch_size)?,
            k_anonymity: parse_env("ASSURE_K_ANON", defaults.k_anonymity)?,
            dp_epsilon: parse_env("ASSURE_DP_EPS", defaults.dp_epsilon)?,
            dp_seed: parse_env("ASSURE_DP_SEED", defaults.dp_seed)?,
            policy_path: env_or("ASSURE_POLICY_PATH", &defaults.policy_path),
            read_timeout: Duration::from_secs(parse_env("ASSURE_READ_TIMEOUT", 5u64)?),
            write_timeout: Duration::from_secs(parse_env("ASSURE_WRITE_TIMEOUT", 5u64)?),
        };
        Ok(config.clamped())
    }

    /// Apply the defaulting clamps to out-of-range values.
    ///
    /// `k_anonymity <= 1` raises to 2 here — at the configuration layer
    /// only.  The aggregator itself honors `k = 1` ("no suppression") when a
    /// query asks for it explicitly.
    pub fn clamped(mut self) -> Self {
        if self.data_dir.is_empty() {
            self.data_dir = "./data".to_string();
        }
        if self.batch_size == 0 {
            self.batch_size = 100;
        }
        if self.k_anonymity <= 1 {
            self.k_anonymity = 2;
        }
        if self.dp_epsilon <= 0.0 {
            self.dp_epsilon = 0.7;
        }
        self
    }
}

fn env_or(key: &str, default: &str) -> String {
    match env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

fn parse_env<T: FromStr + Copy>(key: &str, default: T) -> AssureResult<T> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => {
            value.parse::<T>().map_err(|_| AssureError::Config {
                reason: format!("invalid {key}={value:?}"),
            })
        }
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.port, 9010);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.k_anonymity, 5);
        assert_eq!(config.dp_epsilon, 0.7);
        assert!(config.shared_secret.is_empty());
    }

    /// k of 0 or 1 at the config layer raises to 2; the aggregate query
    /// string can still reach k = 1.
    #[test]
    fn low_k_is_raised_to_two() {
        for k in [0, 1] {
            let config = Config {
                k_anonymity: k,
                ..Config::default()
            }
            .clamped();
            assert_eq!(config.k_anonymity, 2);
        }

        let untouched = Config {
            k_anonymity: 7,
            ..Config::default()
        }
        .clamped();
        assert_eq!(untouched.k_anonymity, 7);
    }

    #[test]
    fn zero_values_fall_back() {
        let config = Config {
            data_dir: String::new(),
            batch_size: 0,
            dp_epsilon: 0.0,
            ..Config::default()
        }
        .clamped();
        assert_eq!(config.data_dir, "./data");
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.dp_epsilon, 0.7);
    }
}
