//! Assurance service HTTP server.
//!
//! Wires the hash-chain store, policy engine, and privacy aggregator behind
//! an axum router.  Configuration comes from `ASSURE_*` environment
//! variables; see `config.rs` for the full table.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use assure_audit::Store;
use assure_contracts::AssureResult;
use assure_policy::PolicyEngine;

mod auth;
mod config;
mod handlers;
mod readers;
mod routes;
mod state;

use config::Config;
use routes::create_router;
use state::AppState;

#[tokio::main]
async fn main() {
    // Structured logging; set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    if let Err(e) = run().await {
        eprintln!("assure-server failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> AssureResult<()> {
    let config = Config::from_env()?;

    let store = Store::open(&config.data_dir, config.batch_size)?;
    let policy = PolicyEngine::from_file(Path::new(&config.policy_path))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(AppState { store, policy, config });
    let router = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "assurance service listening");
    axum::serve(listener, router).await?;

    Ok(())
}
