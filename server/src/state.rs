//! Shared application state handed to every request handler.

use assure_audit::Store;
use assure_policy::PolicyEngine;

use crate::config::Config;

/// Everything the handlers need, shared behind an `Arc`.
///
/// The store serializes its own writes internally; the policy engine and
/// configuration are read-only after startup.
pub struct AppState {
    pub store: Store,
    pub policy: PolicyEngine,
    pub config: Config,
}
