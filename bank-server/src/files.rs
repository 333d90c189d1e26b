//! Help topics and document uploads
//!
//! Both put client-supplied names under a base directory with no
//! normalization, so `../` segments escape it. Upload names may also be
//! absolute paths.

use std::path::{Path, PathBuf};

use crate::error::BankResult;

pub const HELP_NOT_FOUND: &str = "Help topic not found.";
pub const DEFAULT_HELP_TOPIC: &str = "welcome";

/// Read `<help_dir>/<topic>.txt`. Any failure becomes the generic not-found text.
pub async fn load_help_topic(help_dir: &Path, topic: &str) -> String {
    let path = PathBuf::from(format!("{}/{}.txt", help_dir.display(), topic));
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(topic, "Help topic unreadable: {}", e);
            HELP_NOT_FOUND.to_string()
        }
    }
}

/// Write an uploaded document under `upload_dir` using the client's filename.
/// Any extension and content type is accepted.
pub async fn save_upload(upload_dir: &Path, filename: &str, contents: &[u8]) -> BankResult<PathBuf> {
    tokio::fs::create_dir_all(upload_dir).await?;
    let path = upload_dir.join(filename);
    tokio::fs::write(&path, contents).await?;

    tracing::info!(filename, bytes = contents.len(), "Document stored");
    Ok(path)
}
