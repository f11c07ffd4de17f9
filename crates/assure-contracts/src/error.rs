//! Error types shared across the assurance service.
//!
//! All fallible operations in the workspace return `AssureResult<T>`.
//! Variants carry enough context to produce actionable log lines; chain
//! integrity problems found by the offline verifier are *not* errors — they
//! are accumulated into a `VerifyReport` instead.

use thiserror::Error;

/// The unified error type for the assurance service.
#[derive(Debug, Error)]
pub enum AssureError {
    /// A value could not be losslessly rendered as canonical JSON.
    ///
    /// Fatal for the append that produced it; nothing is written.
    #[error("canonical encoding failed: {reason}")]
    Canonicalization { reason: String },

    /// An underlying file operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A log line could not be decoded during store recovery.
    ///
    /// Startup fails hard on this — an unreadable events log means the
    /// in-memory chain state cannot be trusted.
    #[error("decode record: {reason}")]
    Decode { reason: String },

    /// A configuration value is missing or malformed.
    #[error("configuration error: {reason}")]
    Config { reason: String },
}

/// Convenience alias used throughout the workspace.
pub type AssureResult<T> = Result<T, AssureError>;
