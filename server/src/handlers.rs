//! Request handlers for the assurance service routes.
//!
//! Every response is a JSON envelope with an `ok` flag.  Malformed or
//! unauthenticated input maps to 4xx, write failures to 5xx, and a failed
//! verification replay to 409 — the report itself still comes back so the
//! caller sees the full error list.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use assure_audit::{event_id, verify};
use assure_contracts::{Event, PolicyInput};
use assure_privacy::{summarize, token_counts};

use crate::auth::{verify_signature, SIGNATURE_HEADER};
use crate::readers::read_last_events;
use crate::state::AppState;

type Reply = (StatusCode, Json<Value>);

fn error_reply(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({ "ok": false, "error": message })))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// `POST /events` — authenticated ingest.
///
/// When a shared secret is configured the raw body must carry a valid
/// `X-Assurance-Signature` header.  The event must have a non-empty type;
/// a missing timestamp is stamped with the wall clock and a missing id is
/// derived from the canonical event hash.
pub async fn ingest_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Reply {
    if !state.config.shared_secret.is_empty() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !verify_signature(&body, signature, &state.config.shared_secret) {
            return error_reply(StatusCode::UNAUTHORIZED, "invalid signature");
        }
    }

    let mut event: Event = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(_) => return error_reply(StatusCode::BAD_REQUEST, "invalid json"),
    };
    if event.kind.is_empty() {
        return error_reply(StatusCode::BAD_REQUEST, "event type required");
    }
    if event.timestamp.is_none() {
        event.timestamp = Some(Utc::now());
    }
    if event.id.is_empty() {
        if let Ok(id) = event_id(&event) {
            event.id = id;
        }
    }

    match state.store.append(event) {
        Ok((record, root)) => {
            let mut payload = json!({ "ok": true, "record": record });
            if let Some(root) = root {
                payload["root"] = json!(root);
            }
            (StatusCode::OK, Json(payload))
        }
        Err(e) => {
            error!(error = %e, "event append failed");
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, "append failed")
        }
    }
}

/// `GET /audit/root/latest` — the last sealed root plus the open batch root.
pub async fn latest_root(State(state): State<Arc<AppState>>) -> Reply {
    match state.store.last_root() {
        Ok(last) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "last_root": last,
                "current_root": state.store.current_batch_root(),
                "batch_size": state.store.batch_size(),
                "k_anonymity": state.config.k_anonymity,
                "dp_epsilon": state.config.dp_epsilon,
                "server_time_utc": Utc::now(),
            })),
        ),
        Err(e) => {
            error!(error = %e, "root read failed");
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, "root read failed")
        }
    }
}

/// `GET /audit/verify` — full offline replay; 409 when the report fails.
pub async fn verify_audit(State(state): State<Arc<AppState>>) -> Reply {
    let report = verify(
        state.store.events_path(),
        state.store.roots_path(),
        state.store.batch_size(),
    );
    let status = if report.ok {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };
    (status, Json(json!({ "ok": report.ok, "report": report })))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    limit: Option<usize>,
}

/// `GET /audit/events` — the last N records, oldest first.
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Reply {
    let limit = query
        .limit
        .filter(|l| *l > 0 && *l <= 500)
        .unwrap_or(100);

    match read_last_events(state.store.events_path(), limit) {
        Ok(items) => (StatusCode::OK, Json(json!({ "ok": true, "items": items }))),
        Err(e) => {
            error!(error = %e, "event read failed");
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, "event read failed")
        }
    }
}

/// `POST /policy/check` — evaluate a policy input against the rule file.
pub async fn policy_check(State(state): State<Arc<AppState>>, body: Bytes) -> Reply {
    let input: PolicyInput = match serde_json::from_slice(&body) {
        Ok(input) => input,
        Err(_) => return error_reply(StatusCode::BAD_REQUEST, "invalid json"),
    };
    let decision = state.policy.evaluate(&input);
    (StatusCode::OK, Json(json!({ "ok": true, "decision": decision })))
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    window_hours: Option<i64>,
    k: Option<u64>,
    epsilon: Option<f64>,
    seed: Option<u64>,
}

/// `GET /privacy/tokens` — k-anonymous, noised token summary.
///
/// Query parameters override the configured defaults; `k = 1` is honored as
/// "no suppression" when asked for explicitly.
pub async fn privacy_tokens(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
) -> Reply {
    let window_hours = query
        .window_hours
        .filter(|h| *h > 0 && *h <= 168)
        .unwrap_or(24);
    let k = query.k.filter(|k| *k > 0).unwrap_or(state.config.k_anonymity);
    let epsilon = query
        .epsilon
        .filter(|e| *e > 0.0)
        .unwrap_or(state.config.dp_epsilon);
    let seed = query.seed.unwrap_or(state.config.dp_seed);

    let counts = match token_counts(state.store.events_path(), Duration::hours(window_hours)) {
        Ok(counts) => counts,
        Err(e) => {
            error!(error = %e, "aggregate failed");
            return error_reply(StatusCode::INTERNAL_SERVER_ERROR, "aggregate failed");
        }
    };
    let summary = summarize(&counts, k, epsilon, seed, window_hours);
    (StatusCode::OK, Json(json!({ "ok": true, "summary": summary })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use assure_audit::Store;
    use assure_policy::PolicyEngine;

    use crate::auth::sign;
    use crate::config::Config;
    use crate::routes::create_router;

    const TEST_POLICY: &str = r#"
        [[rules]]
        id = "allow-backend-ingest"
        effect = "allow"
        actions = ["audit.ingest"]
        resources = ["trade"]
        roles = ["backend"]
    "#;

    /// Build a router over a fresh store; batch size 2 so roots seal quickly.
    fn test_app(secret: &str) -> (Router, TempDir) {
        let dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: dir.path().display().to_string(),
            shared_secret: secret.to_string(),
            batch_size: 2,
            dp_seed: 42,
            ..Config::default()
        };
        let store = Store::open(dir.path(), config.batch_size).unwrap();
        let policy = PolicyEngine::from_toml_str(TEST_POLICY).unwrap();
        let state = Arc::new(AppState { store, policy, config });
        (create_router(state), dir)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _dir) = test_app("");
        let (status, body) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
    }

    #[tokio::test]
    async fn ingest_assigns_index_and_id() {
        let (app, _dir) = test_app("");

        let (status, body) = send(
            &app,
            post("/events", r#"{"type":"trade","payload":{"mint":"M"}}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["record"]["index"], json!(1));
        assert_eq!(body["record"]["prev_hash"], json!(""));
        assert_eq!(
            body["record"]["event"]["id"].as_str().unwrap().len(),
            64,
            "missing id must be derived from the canonical hash"
        );
        assert!(body.get("root").is_none());

        // The second append completes the batch and returns the sealed root.
        let (_, body) = send(
            &app,
            post("/events", r#"{"type":"trade","payload":{"mint":"M"}}"#),
        )
        .await;
        assert_eq!(body["record"]["index"], json!(2));
        assert_eq!(body["root"]["from_index"], json!(1));
        assert_eq!(body["root"]["to_index"], json!(2));
    }

    #[tokio::test]
    async fn ingest_rejects_missing_type_and_bad_json() {
        let (app, _dir) = test_app("");

        let (status, body) = send(&app, post("/events", r#"{"payload":{}}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], json!("event type required"));

        let (status, _) = send(&app, post("/events", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ingest_enforces_signature_when_secret_is_set() {
        let (app, _dir) = test_app("topsecret");
        let payload = r#"{"type":"trade","payload":{"mint":"M"}}"#;

        // No header at all.
        let (status, _) = send(&app, post("/events", payload)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Wrong signature.
        let request = Request::post("/events")
            .header(SIGNATURE_HEADER, sign(payload.as_bytes(), "wrong"))
            .body(Body::from(payload))
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Correct signature.
        let request = Request::post("/events")
            .header(SIGNATURE_HEADER, sign(payload.as_bytes(), "topsecret"))
            .body(Body::from(payload))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
    }

    #[tokio::test]
    async fn verify_route_reports_clean_log() {
        let (app, _dir) = test_app("");
        for _ in 0..3 {
            send(&app, post("/events", r#"{"type":"trade","payload":{}}"#)).await;
        }

        let (status, body) = send(&app, get("/audit/verify")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
        assert_eq!(body["report"]["total"], json!(3));
        assert_eq!(body["report"]["roots_checked"], json!(1));
    }

    #[tokio::test]
    async fn latest_root_exposes_batch_state() {
        let (app, _dir) = test_app("");
        for _ in 0..3 {
            send(&app, post("/events", r#"{"type":"trade","payload":{}}"#)).await;
        }

        let (status, body) = send(&app, get("/audit/root/latest")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["last_root"]["to_index"], json!(2));
        assert_ne!(body["current_root"], json!(""), "one record is pending");
        assert_eq!(body["batch_size"], json!(2));
    }

    #[tokio::test]
    async fn list_events_honors_limit() {
        let (app, _dir) = test_app("");
        for _ in 0..5 {
            send(&app, post("/events", r#"{"type":"trade","payload":{}}"#)).await;
        }

        let (status, body) = send(&app, get("/audit/events?limit=2")).await;
        assert_eq!(status, StatusCode::OK);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["index"], json!(5));
    }

    #[tokio::test]
    async fn policy_check_evaluates_rules() {
        let (app, _dir) = test_app("");

        let (status, body) = send(
            &app,
            post(
                "/policy/check",
                r#"{"subject":{"id":"svc","roles":["backend"]},"action":"audit.ingest","resource":"trade"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["decision"]["allow"], json!(true));

        let (_, body) = send(
            &app,
            post(
                "/policy/check",
                r#"{"subject":{"id":"svc","roles":["user"]},"action":"audit.ingest","resource":"trade"}"#,
            ),
        )
        .await;
        assert_eq!(body["decision"]["allow"], json!(false));
        assert_eq!(body["decision"]["default_deny"], json!(true));
    }

    #[tokio::test]
    async fn privacy_tokens_suppresses_below_k() {
        let (app, _dir) = test_app("");
        for _ in 0..3 {
            send(&app, post("/events", r#"{"type":"trade","payload":{"mint":"BIG"}}"#)).await;
        }
        send(&app, post("/events", r#"{"type":"trade","payload":{"mint":"RARE"}}"#)).await;

        let (status, body) = send(&app, get("/privacy/tokens?k=2&seed=7")).await;
        assert_eq!(status, StatusCode::OK);
        let summary = &body["summary"];
        assert_eq!(summary["redacted_count"], json!(1));
        assert_eq!(summary["total_seen"], json!(4));
        let items = summary["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["mint"], json!("BIG"));
        assert_eq!(items[0]["count"], json!(3));
    }
}
