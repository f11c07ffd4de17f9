//! assurectl — offline audit verification.
//!
//! Replays the events and roots logs from a data directory, re-deriving
//! every chain hash and every Merkle root, without touching the server.
//!
//! Usage:
//!   assurectl verify --data ./data --batch 100
//!
//! Exits 0 and prints `OK: <total> events, last index=<i>` when the logs
//! verify clean; exits 2 and prints the accumulated error list otherwise.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use assure_audit::verify;

// ── CLI definition ────────────────────────────────────────────────────────────

/// Auditor tooling for the assurance service's tamper-evident log.
#[derive(Parser)]
#[command(
    name = "assurectl",
    about = "Offline verification of the assurance audit log"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay both logs and re-derive every hash and Merkle root.
    Verify {
        /// Data directory holding events.log and roots.log.
        #[arg(long, default_value = "./data")]
        data: PathBuf,

        /// Merkle batch size the store was deployed with.
        #[arg(long, default_value_t = 100)]
        batch: usize,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Verify { data, batch } => {
            let report = verify(&data.join("events.log"), &data.join("roots.log"), batch);
            if report.ok {
                println!("OK: {} events, last index={}", report.total, report.last_index);
            } else {
                println!("FAIL: {:?}", report.errors);
                std::process::exit(2);
            }
        }
    }
}
