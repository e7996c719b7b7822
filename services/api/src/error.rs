//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service.
//!
//! Every handler failure is rendered to the client as a JSON body of the shape
//! `{ "message": "..." }` with an appropriate HTTP status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::config::ConfigError;
use lessonflow_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error from the underlying database driver.
    #[error("Database Error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request carried no usable bearer credential.
    #[error("Unauthorized Access!")]
    Unauthenticated,

    /// The caller is authenticated but lacks the required role.
    #[error("Forbidden")]
    Forbidden,

    /// The caller tried to read premium content without a premium role.
    #[error("Access denied. Upgrade to premium.")]
    UpgradeRequired,

    /// The requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A store or external gateway call failed. The string is the
    /// client-facing message; the underlying cause is logged where it occurred.
    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    /// Logs the underlying cause and wraps it into a generic upstream failure
    /// carrying only the client-facing message.
    pub fn upstream(message: &str, cause: impl std::fmt::Debug) -> Self {
        error!("{}: {:?}", message, cause);
        ApiError::Upstream(message.to_string())
    }

    /// Like [`ApiError::upstream`], but lets a store's not-found pass
    /// through as a 404 instead of burying it in a generic 500.
    pub fn from_store(err: PortError, message: &str) -> Self {
        match err {
            PortError::NotFound(m) => ApiError::NotFound(m),
            other => ApiError::upstream(message, other),
        }
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(message) => ApiError::NotFound(message),
            PortError::Unauthorized => ApiError::Unauthenticated,
            PortError::Unexpected(message) => ApiError::Upstream(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden | ApiError::UpgradeRequired => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Config(_)
            | ApiError::Database(_)
            | ApiError::Io(_)
            | ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "message": self.to_string() }));
        (status, body).into_response()
    }
}
