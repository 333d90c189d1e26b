//! Typed views over raw result rows
//!
//! Conversions are positional and lenient: the executor hands back whatever
//! the query text produced (including `UNION` payloads), so a missing or
//! oddly typed column degrades to a default instead of failing. Only the
//! identifier column is mandatory.

use serde::{Deserialize, Serialize};

use crate::value::{cell, SqlValue};

/// A bank user. Column order follows `SELECT * FROM users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    /// Stored and compared in plaintext
    pub password: String,
    pub email: Option<String>,
    pub balance: f64,
    /// Displayed as text, and executed as SQL by the admin report
    pub bio: Option<String>,
    /// Vestigial column, never written
    pub session_id: Option<String>,
    pub created_at: Option<String>,
}

impl Account {
    pub fn from_row(row: &[SqlValue]) -> Option<Self> {
        let id = cell(row, 0).as_i64()?;
        Some(Self {
            id,
            username: cell(row, 1).as_text().unwrap_or_default(),
            password: cell(row, 2).as_text().unwrap_or_default(),
            email: cell(row, 3).as_text(),
            balance: cell(row, 4).as_f64().unwrap_or(0.0),
            bio: cell(row, 5).as_text(),
            session_id: cell(row, 6).as_text(),
            created_at: cell(row, 7).as_text(),
        })
    }
}

/// Column names of `SELECT * FROM transactions`, in order. Transfer rows are
/// kept raw so whatever a query returns reaches the page or the JSON body.
pub const TRANSFER_COLUMNS: [&str; 6] = [
    "id",
    "from_user_id",
    "to_user_id",
    "amount",
    "message",
    "created_at",
];

/// A message sent to support, later viewed by the admin bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportTicket {
    pub id: i64,
    pub user_id: Option<i64>,
    pub message: String,
    pub created_at: Option<String>,
}

impl SupportTicket {
    pub fn from_row(row: &[SqlValue]) -> Option<Self> {
        Some(Self {
            id: cell(row, 0).as_i64()?,
            user_id: cell(row, 1).as_i64(),
            message: cell(row, 2).as_text().unwrap_or_default(),
            created_at: cell(row, 3).as_text(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub action: String,
    pub user_id: Option<i64>,
    pub details: Option<String>,
    pub created_at: Option<String>,
}

impl AuditEntry {
    pub fn from_row(row: &[SqlValue]) -> Option<Self> {
        Some(Self {
            id: cell(row, 0).as_i64()?,
            action: cell(row, 1).as_text().unwrap_or_default(),
            user_id: cell(row, 2).as_i64(),
            details: cell(row, 3).as_text(),
            created_at: cell(row, 4).as_text(),
        })
    }
}

/// An uploaded file as recorded at upload time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: i64,
    pub user_id: Option<i64>,
    /// Client-supplied name, unchanged
    pub filename: String,
    pub path: String,
    pub size: Option<i64>,
    pub created_at: Option<String>,
}

impl StoredDocument {
    pub fn from_row(row: &[SqlValue]) -> Option<Self> {
        Some(Self {
            id: cell(row, 0).as_i64()?,
            user_id: cell(row, 1).as_i64(),
            filename: cell(row, 2).as_text().unwrap_or_default(),
            path: cell(row, 3).as_text().unwrap_or_default(),
            size: cell(row, 4).as_i64(),
            created_at: cell(row, 5).as_text(),
        })
    }
}
