//! # assure-privacy
//!
//! Privacy-preserving aggregates over the assurance service's event log:
//! per-token counts inside a time window, published only after k-anonymity
//! suppression and Laplace perturbation.

pub mod aggregate;

pub use aggregate::{summarize, token_counts};
