use bank_common::Row;

use crate::Database;

impl Database {
    // ============================================================================
    // TRANSACTION READS
    // ============================================================================

    /// Transfers where `user_id` is either side. The id is interpolated and
    /// never checked against the caller's session. Rows come back untyped, in
    /// `TRANSFER_COLUMNS` order for an honest query.
    pub async fn get_transactions(&self, user_id: &str) -> Vec<Row> {
        let query = format!(
            "SELECT * FROM transactions WHERE from_user_id = {} OR to_user_id = {}",
            user_id, user_id
        );
        self.raw_query(&query, &[]).await
    }

    pub async fn get_all_transactions(&self) -> Vec<Row> {
        self.raw_query(
            "SELECT * FROM transactions ORDER BY created_at DESC, id DESC",
            &[],
        )
        .await
    }
}
