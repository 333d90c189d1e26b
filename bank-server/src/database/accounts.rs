use bank_common::{Account, Row};

use crate::Database;

impl Database {
    // ============================================================================
    // ACCOUNT OPERATIONS
    // ============================================================================
    //
    // Every lookup here interpolates caller input straight into the SQL text.

    /// Credential check. Both inputs are spliced into the query, so a
    /// tautology such as `' OR '1'='1` matches the first account.
    pub async fn authenticate(&self, username: &str, password: &str) -> Option<Account> {
        let query = format!(
            "SELECT * FROM users WHERE username = '{}' AND password = '{}'",
            username, password
        );
        let rows = self.raw_query(&query, &[]).await;
        rows.first().and_then(|row| Account::from_row(row))
    }

    /// Create an account. Returns whether the insert went through; the
    /// registration page reports that back to the user.
    pub async fn register(&self, username: &str, password: &str, email: &str) -> bool {
        let query = format!(
            "INSERT INTO users (username, password, email) VALUES ('{}', '{}', '{}')",
            username, password, email
        );
        self.try_raw_query(&query, &[]).await.is_ok()
    }

    /// `user_id` is text on purpose: it arrives from URLs and sessions alike.
    pub async fn get_user_by_id(&self, user_id: &str) -> Option<Account> {
        let query = format!("SELECT * FROM users WHERE id = {}", user_id);
        let rows = self.raw_query(&query, &[]).await;
        rows.first().and_then(|row| Account::from_row(row))
    }

    pub async fn find_by_username(&self, username: &str) -> Option<Account> {
        let query = format!("SELECT * FROM users WHERE username = '{}'", username);
        let rows = self.raw_query(&query, &[]).await;
        rows.first().and_then(|row| Account::from_row(row))
    }

    /// Store a biography. The text is later executed by the admin report.
    pub async fn update_bio(&self, user_id: i64, bio: &str) {
        let query = format!("UPDATE users SET bio = '{}' WHERE id = {}", bio, user_id);
        self.raw_query(&query, &[]).await;
    }

    pub async fn get_user_bio(&self, user_id: i64) -> Option<String> {
        let query = format!("SELECT bio FROM users WHERE id = {}", user_id);
        let rows = self.raw_query(&query, &[]).await;
        rows.first().and_then(|row| row.first()).and_then(|cell| cell.as_text())
    }

    /// Legacy profile editor: rename and change address in one interpolated update.
    pub async fn update_profile_legacy(&self, user_id: i64, name: &str, email: &str) {
        let query = format!(
            "UPDATE users SET username = '{}', email = '{}' WHERE id = {}",
            name, email, user_id
        );
        self.raw_query(&query, &[]).await;
    }

    /// `(id, username, email)` of up to 50 accounts whose username or email
    /// contains `term`. The term is spliced into both `LIKE` patterns.
    pub async fn search_users(&self, term: &str) -> Vec<Row> {
        let mut query = "SELECT id, username, email FROM users".to_string();
        if !term.is_empty() {
            query.push_str(&format!(
                " WHERE username LIKE '%{}%' OR email LIKE '%{}%'",
                term, term
            ));
        }
        query.push_str(" LIMIT 50");
        self.raw_query(&query, &[]).await
    }

    /// `(id, username, email, balance)` for every account.
    pub async fn list_user_summaries(&self) -> Vec<Row> {
        self.raw_query("SELECT id, username, email, balance FROM users", &[])
            .await
    }
}
