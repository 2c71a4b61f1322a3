//! Error types for Leafling
//!
//! **[LFL-ERR-010]** Internal errors propagate as [`Error`]; API handlers
//! convert everything into [`ApiError`], whose responses carry a stable
//! `{ "error": { "code", "message" } }` body. Identification failures keep
//! their advisory text so the UI can show the category-specific message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::recognition_client::IdentifyError;

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Internal error types
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409), e.g. submit while an identification is in flight
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Upstream identification failure, mapped per category
    #[error("Identification failed: {0}")]
    Identify(#[from] IdentifyError),

    /// Common error
    #[error("{0}")]
    Common(#[from] Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Identify(ref err) => {
                let (status, code) = classify_identify(err);
                (status, code, err.advisory().to_string())
            }
            ApiError::Common(Error::NotFound(msg)) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Common(Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
            }
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Status/code mapping for the identification failure taxonomy
///
/// **[LFL-ERR-020]** Every category stays recoverable client-side; the
/// status only steers the UI's advisory rendering.
fn classify_identify(err: &IdentifyError) -> (StatusCode, &'static str) {
    match err {
        IdentifyError::NoMatch => (StatusCode::NOT_FOUND, "NO_MATCH"),
        IdentifyError::Network(_) => (StatusCode::BAD_GATEWAY, "NETWORK"),
        IdentifyError::NotConfigured => (StatusCode::SERVICE_UNAVAILABLE, "NOT_CONFIGURED"),
        IdentifyError::Unauthorized => (StatusCode::BAD_GATEWAY, "UPSTREAM_AUTH"),
        IdentifyError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        IdentifyError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_TIMEOUT"),
        IdentifyError::QuotaExceeded => (StatusCode::PAYMENT_REQUIRED, "QUOTA_EXCEEDED"),
        IdentifyError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_UNAVAILABLE"),
        IdentifyError::Parse(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_PARSE"),
        IdentifyError::Api(_, _) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
    }
}

/// Result type for API handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_error_status_mapping() {
        assert_eq!(
            classify_identify(&IdentifyError::RateLimited).0,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            classify_identify(&IdentifyError::Timeout).0,
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            classify_identify(&IdentifyError::QuotaExceeded).0,
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            classify_identify(&IdentifyError::NotConfigured).0,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
