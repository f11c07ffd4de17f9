//! Router assembly and shared middleware.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Maximum accepted request body, matching the ingest contract.
const MAX_BODY_BYTES: usize = 1 << 20;

/// Build the service router over shared state.
///
/// The configured read/write timeouts collapse into a single request-level
/// deadline, taking the larger of the two.
pub fn create_router(state: Arc<AppState>) -> Router {
    let timeout = state.config.read_timeout.max(state.config.write_timeout);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/events", post(handlers::ingest_event))
        .route("/audit/root/latest", get(handlers::latest_root))
        .route("/audit/verify", get(handlers::verify_audit))
        .route("/audit/events", get(handlers::list_events))
        .route("/policy/check", post(handlers::policy_check))
        .route("/privacy/tokens", get(handlers::privacy_tokens))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
