//! Admin Bot
//!
//! Out-of-band process that periodically reads BuggyBank's support messages
//! with admin privileges. It shares only the SQLite file with the web server.

use bank_server::{BankResult, Database};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub mod reviewer;
pub use reviewer::{looks_like_script, ReviewSummary, ReviewedTicket, Reviewer, ReviewerConfig, RunStats};


#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Database connection URL (same file the web server uses)
    #[arg(long, default_value = "sqlite:./buggybank.db")]
    pub database_url: String,

    /// Seconds between review cycles
    #[arg(long, default_value_t = 30)]
    pub interval: u64,

    /// Lower bound of the per-message reading delay, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub min_delay_ms: u64,

    /// Upper bound of the per-message reading delay, in milliseconds
    #[arg(long, default_value_t = 3000)]
    pub max_delay_ms: u64,

    /// Verbose logging
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    pub fn reviewer_config(&self) -> ReviewerConfig {
        ReviewerConfig {
            interval: Duration::from_secs(self.interval),
            min_delay: Duration::from_millis(self.min_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

/// Connect to the store and review until `cancel` fires.
///
/// The store is migrated but not seeded; the web server owns the seed data.
pub async fn run_bot(args: Args, cancel: CancellationToken) -> BankResult<RunStats> {
    // Logging should be initialized by the caller (main or test)
    tracing::info!("Starting admin bot...");
    tracing::info!("  Database: {}", args.database_url);
    tracing::info!("  Interval: {}s", args.interval);

    let db = Arc::new(Database::connect(&args.database_url).await?);
    let reviewer = Reviewer::new(db, args.reviewer_config());
    Ok(reviewer.run(cancel).await)
}
