use bank_common::SupportTicket;

use crate::error::BankResult;
use crate::Database;

const SELECT_TICKETS: &str =
    "SELECT id, user_id, message, created_at FROM support_messages ORDER BY created_at DESC, id DESC";

impl Database {
    // ============================================================================
    // SUPPORT MESSAGES
    // ============================================================================

    /// Parameterized insert; the body itself is stored untouched.
    pub async fn create_support_message(&self, user_id: i64, message: &str) {
        self.raw_query(
            "INSERT INTO support_messages (user_id, message) VALUES (?, ?)",
            &[user_id.into(), message.into()],
        )
        .await;
    }

    /// Newest first. No access control.
    pub async fn get_support_messages(&self) -> Vec<SupportTicket> {
        self.try_support_messages().await.unwrap_or_default()
    }

    /// Newest first, surfacing store failures (used by the admin bot).
    pub async fn try_support_messages(&self) -> BankResult<Vec<SupportTicket>> {
        let rows = self.try_raw_query(SELECT_TICKETS, &[]).await?;
        Ok(rows
            .iter()
            .filter_map(|row| SupportTicket::from_row(row))
            .collect())
    }
}
