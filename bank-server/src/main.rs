use bank_server::{init_logging, BankConfig, BankServer, LoggingConfig};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// BuggyBank - deliberately vulnerable online banking for security training
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Interface to listen on
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// HTTP port
    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Database connection URL
    #[arg(long, default_value = "sqlite:./buggybank.db")]
    database_url: String,

    /// Directory uploaded documents are written to
    #[arg(long, default_value = "uploads")]
    upload_dir: PathBuf,

    /// Directory holding help topics (<topic>.txt)
    #[arg(long, default_value = "help")]
    help_dir: PathBuf,

    /// Verbose logging
    #[arg(long)]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Also write logs to this file (rotated daily)
    #[arg(long)]
    log_file: Option<String>,
}

impl Args {
    fn into_config(self) -> BankConfig {
        let mut logging = LoggingConfig {
            json_format: self.json_logs,
            log_file: self.log_file,
            ..LoggingConfig::default()
        };
        if self.debug {
            logging = logging.with_debug();
        }

        BankConfig {
            host: self.host,
            port: self.port,
            database_url: self.database_url,
            upload_dir: self.upload_dir,
            help_dir: self.help_dir,
            logging,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Args::parse().into_config();
    init_logging(&config.logging)?;

    println!("🏦 BuggyBank starting...");
    println!("⚠️  This application is intentionally vulnerable. Do not expose it.");
    println!("🌐 http://{}:{}", config.host, config.port);
    println!("💾 Database: {}", config.database_url);
    println!();

    let shutdown = CancellationToken::new();
    let server = BankServer::new(config);

    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, shutting down");
            signal.cancel();
        }
    });

    server.start_with_shutdown(shutdown).await?;
    Ok(())
}
