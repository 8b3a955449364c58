//! Error types for agora-api
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation, plus the mapping onto HTTP status codes. Every error
//! response carries a stable machine-readable kind and a human-readable
//! message; database and internal failures stay opaque to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Main error type for agora-api
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid credential
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated but not the vote's principal, or wrong role
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed id or direction outside {1, -1}
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Thread or comment being voted on does not exist
    #[error("Target not found: {0}")]
    TargetNotFound(String),

    /// Vote row vanished between decide and apply
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness race on vote creation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using agora-api Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<agora_common::Error> for Error {
    fn from(err: agora_common::Error) -> Self {
        match err {
            agora_common::Error::Unauthenticated(msg) => Error::Unauthenticated(msg),
            agora_common::Error::Forbidden(msg) => Error::Forbidden(msg),
            agora_common::Error::InvalidInput(msg) => Error::InvalidInput(msg),
            agora_common::Error::NotFound(msg) => Error::NotFound(msg),
            agora_common::Error::Database(e) => Error::Database(e),
            other => Error::Internal(other.to_string()),
        }
    }
}

/// JSON body for all error responses
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl Error {
    fn kind(&self) -> &'static str {
        match self {
            Error::Unauthenticated(_) => "unauthenticated",
            Error::Forbidden(_) => "forbidden",
            Error::InvalidInput(_) => "invalid_input",
            Error::TargetNotFound(_) => "target_not_found",
            Error::NotFound(_) => "not_found",
            Error::Conflict(_) => "conflict",
            Error::Database(_) | Error::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::TargetNotFound(_) | Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Database(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side faults are logged in full but surfaced opaquely
        let message = match &self {
            Error::Database(e) => {
                error!("Database error: {}", e);
                "Internal server error".to_string()
            }
            Error::Internal(msg) => {
                error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            Error::Unauthenticated(msg)
            | Error::Forbidden(msg)
            | Error::InvalidInput(msg)
            | Error::TargetNotFound(msg)
            | Error::NotFound(msg)
            | Error::Conflict(msg) => msg.clone(),
        };

        (
            status,
            Json(ErrorBody {
                error: self.kind(),
                message,
            }),
        )
            .into_response()
    }
}
