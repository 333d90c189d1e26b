use bank_common::{Row, SqlValue};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row as _, Sqlite, TypeInfo, ValueRef};
use std::str::FromStr;
use tracing::info;

use crate::error::BankResult;

mod accounts;
mod audit;
mod documents;
mod support;
mod transactions;

/// Accounts created on every startup (`INSERT OR IGNORE`, so restarts keep edits).
const SEED_ACCOUNTS: &[(&str, &str, &str, f64, &str)] = &[
    ("admin", "admin123", "admin@buggybank.com", 10000.0, "System Administrator"),
    ("john", "password123", "john@example.com", 1500.0, "Regular user"),
    ("alice", "password123", "alice@example.com", 2000.0, "Another user"),
    ("bob", "password123", "bob@example.com", 800.0, "Test user"),
];

/// Handle to the bank's SQLite store.
///
/// There is no application-level locking: request handlers and the admin bot
/// share the pool and rely on SQLite's own concurrency.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open, migrate and seed the store.
    pub async fn new(database_url: &str) -> BankResult<Self> {
        let db = Self::connect(database_url).await?;
        db.seed().await?;
        info!("✓ Database initialized and seeded at {}", database_url);
        Ok(db)
    }

    /// Open and migrate the store without touching its contents.
    pub async fn connect(database_url: &str) -> BankResult<Self> {
        // Dangling account references must be storable, so FK enforcement stays off
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(false);

        // Every connection to `:memory:` is its own database; pin the pool to one.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options.journal_mode(SqliteJournalMode::Wal))
                .await?
        };

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn seed(&self) -> BankResult<()> {
        for (username, password, email, balance, bio) in SEED_ACCOUNTS {
            self.try_raw_query(
                "INSERT OR IGNORE INTO users (username, password, email, balance, bio) VALUES (?, ?, ?, ?, ?)",
                &[
                    (*username).into(),
                    (*password).into(),
                    (*email).into(),
                    (*balance).into(),
                    (*bio).into(),
                ],
            )
            .await?;
        }
        Ok(())
    }

    // ============================================================================
    // RAW QUERY EXECUTOR
    // ============================================================================

    /// Execute caller-supplied SQL and return every produced row.
    ///
    /// With `params`, values are bound positionally to `?` placeholders.
    /// Without them the text runs verbatim, including stacked statements.
    /// Each call auto-commits, and a transaction the text leaves open is
    /// committed before the connection goes back to the pool. Any failure yields an empty result and is not
    /// logged, so "no rows" and "broken query" look the same to the caller.
    pub async fn raw_query(&self, text: &str, params: &[SqlValue]) -> Vec<Row> {
        self.try_raw_query(text, params).await.unwrap_or_default()
    }

    /// Same as [`Database::raw_query`] but surfaces the failure.
    pub async fn try_raw_query(&self, text: &str, params: &[SqlValue]) -> BankResult<Vec<Row>> {
        let mut query = sqlx::query(text);
        for param in params {
            query = match param {
                SqlValue::Null => query.bind(None::<String>),
                SqlValue::Integer(v) => query.bind(*v),
                SqlValue::Real(v) => query.bind(*v),
                SqlValue::Text(s) => query.bind(s.clone()),
                SqlValue::Blob(b) => query.bind(b.clone()),
            };
        }

        let mut conn = self.pool.acquire().await?;
        let result = query.fetch_all(&mut *conn).await;
        // Fails harmlessly when no transaction is active
        let _ = sqlx::query("COMMIT").execute(&mut *conn).await;

        Ok(result?.iter().map(decode_row).collect())
    }
}

fn decode_row(row: &SqliteRow) -> Row {
    (0..row.len()).map(|index| decode_cell(row, index)).collect()
}

/// Decode by the runtime storage class, not the declared column type.
fn decode_cell(row: &SqliteRow, index: usize) -> SqlValue {
    let storage_class = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return SqlValue::Null,
        Ok(raw) => raw.type_info().name().to_string(),
        Err(_) => return SqlValue::Null,
    };

    let decoded = match storage_class.as_str() {
        "INTEGER" | "BOOLEAN" => row.try_get::<i64, _>(index).map(SqlValue::Integer),
        "REAL" | "NUMERIC" => row.try_get::<f64, _>(index).map(SqlValue::Real),
        "BLOB" => row.try_get::<Vec<u8>, _>(index).map(SqlValue::Blob),
        _ => row.try_get::<String, _>(index).map(SqlValue::Text),
    };
    decoded.unwrap_or(SqlValue::Null)
}
