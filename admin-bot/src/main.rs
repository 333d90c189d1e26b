//! Admin Bot Entry Point

use admin_bot::{run_bot, Args};
use bank_server::{init_logging, LoggingConfig};
use clap::Parser;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut logging = LoggingConfig::default();
    if args.debug {
        logging = logging.with_debug();
    }
    init_logging(&logging)?;

    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received, stopping admin bot...");
            signal.cancel();
        }
    });

    let stats = run_bot(args, cancel).await?;
    tracing::info!(
        cycles = stats.cycles,
        failed = stats.failed_cycles,
        "Admin bot exited"
    );

    Ok(())
}
