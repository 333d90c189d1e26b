//! Error types for the bank server

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use crate::pages;

/// Internal error type. Never rendered to clients.
#[derive(Debug, Error)]
pub enum BankError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

pub type BankResult<T> = Result<T, BankError>;

/// What a failing handler shows the client: a fixed page, nothing more.
#[derive(Debug)]
pub enum AppError {
    /// Generic 500 page
    Internal,
    /// `401 {"error": "Unauthorized"}` for the JSON endpoints
    Unauthorized,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, pages::server_error()).into_response()
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "Unauthorized" })),
            )
                .into_response(),
        }
    }
}

impl From<BankError> for AppError {
    fn from(err: BankError) -> Self {
        tracing::error!("Request failed: {}", err);
        AppError::Internal
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        tracing::warn!("Malformed upload: {}", err);
        AppError::Internal
    }
}
