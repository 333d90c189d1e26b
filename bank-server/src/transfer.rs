//! Transfer engine
//!
//! Three independent writes, each committed on its own: the transfer record,
//! the debit, the credit. Nothing checks the amount's sign, the source
//! balance, or whether source and destination are the same account.

use bank_common::SqlValue;

use crate::Database;

/// Move `amount` from `from` to `to`.
///
/// `from` and `to` are bound as parameters for the record but spliced into
/// the balance updates as text, so whatever the caller passed (a number, a
/// string, `NULL`) ends up in the SQL.
pub async fn transfer(db: &Database, from: &SqlValue, to: &SqlValue, amount: f64, message: &str) {
    db.raw_query(
        "INSERT INTO transactions (from_user_id, to_user_id, amount, message) VALUES (?, ?, ?, ?)",
        &[from.clone(), to.clone(), amount.into(), message.into()],
    )
    .await;

    db.raw_query(
        &format!("UPDATE users SET balance = balance - {} WHERE id = {}", amount, from),
        &[],
    )
    .await;

    db.raw_query(
        &format!("UPDATE users SET balance = balance + {} WHERE id = {}", amount, to),
        &[],
    )
    .await;

    tracing::debug!(%from, %to, amount, "Transfer recorded");
}
