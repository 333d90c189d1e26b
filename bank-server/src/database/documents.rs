use bank_common::StoredDocument;

use crate::Database;

const SELECT_DOCUMENT: &str =
    "SELECT id, user_id, filename, path, size, created_at FROM documents WHERE id = ?";

impl Database {
    // ============================================================================
    // DOCUMENTS
    // ============================================================================

    /// Record an upload and return its id.
    pub async fn record_document(&self, user_id: i64, filename: &str, path: &str, size: i64) -> Option<i64> {
        self.raw_query(
            "INSERT INTO documents (user_id, filename, path, size) VALUES (?, ?, ?, ?) RETURNING id",
            &[user_id.into(), filename.into(), path.into(), size.into()],
        )
        .await
        .first()
        .and_then(|row| row.first())
        .and_then(|id| id.as_i64())
    }

    /// Look a document up by id, whoever uploaded it.
    pub async fn get_document(&self, id: &str) -> Option<StoredDocument> {
        let rows = self.raw_query(SELECT_DOCUMENT, &[id.into()]).await;
        rows.first().and_then(|row| StoredDocument::from_row(row))
    }
}
