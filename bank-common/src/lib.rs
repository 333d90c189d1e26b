//! Shared data model for BuggyBank
//!
//! Both the web server and the admin bot read the same SQLite file. This crate
//! holds the types they agree on:
//! - `SqlValue` / `Row` - raw result tuples as returned by the query executor
//! - `Account`, `SupportTicket`, `AuditEntry`, `StoredDocument` - typed views of rows
//! - `TRANSFER_COLUMNS` - names for transfer rows, which stay raw

pub mod model;
pub mod value;

pub use model::{Account, AuditEntry, StoredDocument, SupportTicket, TRANSFER_COLUMNS};
pub use value::{row_object, Row, SqlValue};
