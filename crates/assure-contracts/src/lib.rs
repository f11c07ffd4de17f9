//! # assure-contracts
//!
//! Shared types and error contracts for the assurance service.
//!
//! All crates in the workspace import from here.  No business logic lives in
//! this crate — only data definitions and error types.

pub mod error;
pub mod event;
pub mod policy;
pub mod privacy;
pub mod report;

pub use error::{AssureError, AssureResult};
pub use event::{Event, Record, RootRecord};
pub use policy::{PolicyDecision, PolicyInput, Subject};
pub use privacy::{TokenCount, TokenSummary};
pub use report::VerifyReport;
