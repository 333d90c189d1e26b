use bank_common::{AuditEntry, SqlValue};

use crate::Database;

impl Database {
    // ============================================================================
    // ADMIN AUDIT LOG
    // ============================================================================

    /// Append an audit entry. Bound parameters, no validation.
    pub async fn log_action(&self, action: &str, user_id: Option<i64>, details: Option<&str>) {
        self.raw_query(
            "INSERT INTO admin_audit (action, user_id, details) VALUES (?, ?, ?)",
            &[action.into(), user_id.into(), SqlValue::from(details)],
        )
        .await;
    }

    pub async fn get_audit_logs(&self) -> Vec<AuditEntry> {
        self.raw_query(
            "SELECT * FROM admin_audit ORDER BY created_at DESC, id DESC",
            &[],
        )
        .await
        .iter()
        .filter_map(|row| AuditEntry::from_row(row))
        .collect()
    }
}
