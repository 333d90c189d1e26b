use axum::extract::FromRef;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub mod database;
pub mod error;
pub mod files;
pub mod http;
pub mod logging;
pub mod pages;
pub mod reports;
pub mod session;
pub mod transfer;

pub use database::Database;
pub use error::{AppError, BankError, BankResult};
pub use logging::{init_logging, LoggingConfig};
pub use reports::{generate_admin_report, ReportEntry};
pub use session::{CurrentSession, SessionData, SessionStore};

#[derive(Debug, Clone)]
pub struct BankConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Where `/upload-document` writes files
    pub upload_dir: PathBuf,
    /// Where `/help` looks for `<topic>.txt`
    pub help_dir: PathBuf,
    pub logging: LoggingConfig,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: "sqlite:./buggybank.db".to_string(),
            upload_dir: PathBuf::from("uploads"),
            help_dir: PathBuf::from("help"),
            logging: LoggingConfig::default(),
        }
    }
}

impl BankConfig {
    pub fn bind_addr(&self) -> BankResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| BankError::Config(format!("Invalid listen address: {}", e)))
    }
}

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub sessions: SessionStore,
    pub config: Arc<BankConfig>,
}

impl AppState {
    pub fn new(db: Database, config: BankConfig) -> Self {
        Self {
            db: Arc::new(db),
            sessions: SessionStore::new(),
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

pub struct BankServer {
    config: BankConfig,
}

impl BankServer {
    pub fn new(config: BankConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    /// Serve until the process is killed.
    pub async fn start(&self) -> BankResult<()> {
        self.start_with_shutdown(CancellationToken::new()).await
    }

    /// Serve until `shutdown` is cancelled, then drain in-flight requests.
    pub async fn start_with_shutdown(&self, shutdown: CancellationToken) -> BankResult<()> {
        let db = Database::new(&self.config.database_url).await?;
        let addr = self.config.bind_addr()?;
        let app = http::router(AppState::new(db, self.config.clone()));

        let listener = TcpListener::bind(addr).await?;
        info!("🏦 BuggyBank listening on http://{}", addr);
        info!("💾 Database: {}", self.config.database_url);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await?;

        info!("BuggyBank stopped");
        Ok(())
    }
}
