//! # regscope CLI (`regs`)
//!
//! The `regs` binary drives the pipeline: database initialization, full
//! ingestion runs, per-title metric reports, database stats, and the
//! read-only HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! regs --config ./config/regscope.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `regs init` | Create the SQLite database and run schema migrations |
//! | `regs ingest` | Run a full ingestion: catalogs, hierarchy, all title texts |
//! | `regs metrics <number>` | Latest-run aggregate metrics for a title |
//! | `regs history <number>` | Full snapshot history for a title |
//! | `regs stats` | Database overview |
//! | `regs serve` | Start the read-only HTTP API |

mod aggregate;
mod chunk;
mod config;
mod db;
mod flatten;
mod hierarchy;
mod ingest;
mod metrics;
mod migrate;
mod models;
mod report;
mod server;
mod source;
mod stats;
mod store;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

/// regscope — regulatory corpus ingestion and linguistic metrics.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file with database, source, ingest, aggregation, and server settings.
#[derive(Parser)]
#[command(
    name = "regs",
    about = "regscope — regulatory corpus ingestion and linguistic metrics pipeline",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/regscope.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables (agencies,
    /// titles, title_agency, snapshots). Idempotent — running it multiple
    /// times is safe.
    Init,

    /// Run a full ingestion.
    ///
    /// Fetches the titles and agencies catalogs, rebuilds the agency
    /// hierarchy and title associations, then fetches, flattens, chunks,
    /// and snapshots every title's full text in bounded-concurrency
    /// batches. Each run appends a new snapshot set per title.
    Ingest {
        /// Maximum number of titles to process (catalog order).
        #[arg(long)]
        limit: Option<usize>,

        /// Override the configured batch size (titles fetched concurrently).
        #[arg(long)]
        batch_size: Option<usize>,

        /// Override the configured maximum characters per chunk.
        #[arg(long)]
        chunk_chars: Option<usize>,
    },

    /// Show the latest-run aggregate metrics for a title.
    Metrics {
        /// Title number.
        number: i64,
    },

    /// Show the full snapshot history for a title.
    History {
        /// Title number.
        number: i64,
    },

    /// Show database statistics.
    Stats,

    /// Start the read-only HTTP API server.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest {
            limit,
            batch_size,
            chunk_chars,
        } => {
            if let Some(batch_size) = batch_size {
                anyhow::ensure!(batch_size > 0, "--batch-size must be > 0");
                cfg.ingest.batch_size = batch_size;
            }
            if let Some(chunk_chars) = chunk_chars {
                anyhow::ensure!(chunk_chars > 0, "--chunk-chars must be > 0");
                cfg.ingest.chunk_chars = chunk_chars;
            }
            migrate::run_migrations(&cfg).await?;
            let source = Arc::new(source::EcfrClient::new(&cfg.source)?);
            let summary = ingest::run_ingest(&cfg, source, limit).await?;
            if summary.titles_failed > 0 {
                eprintln!(
                    "{} of {} titles failed this run; they will be retried on the next full run",
                    summary.titles_failed, summary.titles_total
                );
            }
        }
        Commands::Metrics { number } => {
            report::run_metrics(&cfg, number).await?;
        }
        Commands::History { number } => {
            report::run_history(&cfg, number).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
