//! Admin user report
//!
//! Generating the report replays every stored biography through the query
//! executor before listing it. A bio written earlier as plain profile text
//! therefore runs as SQL here, on every view, with results and errors dropped.

use bank_common::value::cell;
use serde::Serialize;

use crate::Database;

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub user_id: Option<i64>,
    pub username: String,
    pub bio: Option<String>,
}

pub async fn generate_admin_report(db: &Database) -> Vec<ReportEntry> {
    let users = db.raw_query("SELECT id, username, bio FROM users", &[]).await;

    let mut entries = Vec::with_capacity(users.len());
    for row in &users {
        let bio = cell(row, 2).as_text();

        if let Some(stored) = bio.as_deref().filter(|text| !text.is_empty()) {
            db.raw_query(stored, &[]).await;
        }

        entries.push(ReportEntry {
            user_id: cell(row, 0).as_i64(),
            username: cell(row, 1).as_text().unwrap_or_default(),
            bio,
        });
    }

    tracing::debug!(accounts = entries.len(), "Admin report generated");
    entries
}
