//! Error types for the dependency cache
//!
//! Provides unified error handling using thiserror. Everything the cache
//! layer raises is absorbed at the cache boundary; only the HTTP adapter
//! turns these into responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache layer and its HTTP adapter.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backing store unreachable or timed out
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Stored record could not be decoded (missing payload or bad version)
    #[error("Malformed entry: {0}")]
    MalformedEntry(String),

    /// Tracker used outside of an active tracking window
    #[error("Caller misuse: {0}")]
    CallerMisuse(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::MalformedEntry(_)
            | CacheError::CallerMisuse(_)
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let resp = CacheError::InvalidRequest("bad".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = CacheError::StoreUnavailable("down".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_error_display() {
        let err = CacheError::MalformedEntry("missing data field".to_string());
        assert_eq!(err.to_string(), "Malformed entry: missing data field");
    }
}
