//! Crate-wide error type.
//!
//! Every fallible operation in the store, the scrapers and the route layer
//! returns [`AppError`]. Route handlers return it directly; the
//! [`IntoResponse`] impl turns it into the raw plain-text error response the
//! browser sees.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;
use uuid::Uuid;

/// Errors raised while scraping, storing or serving articles and notes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to fetch page: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("invalid {entity}: {reason}")]
    Validation {
        entity: &'static str,
        reason: String,
    },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("store lock poisoned")]
    Poisoned,
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AppError {
    pub fn validation(entity: &'static str, reason: impl Into<String>) -> Self {
        AppError::Validation {
            entity,
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        (status, self.to_string()).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
