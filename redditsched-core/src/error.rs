//! Core error types for `RedditSched`.
//!
//! Three layers of failure are distinguished:
//!
//! - [`TransportError`]: what the HTTP layer reports (a non-2xx response or
//!   no response at all)
//! - [`ClassifiedError`]: the normalized shape callers and the UI consume,
//!   produced only by [`crate::classify`]
//! - [`AuthenticationRequiredError`]: the session can no longer be recovered

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Field-level validation messages keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

// ============================================================================
// Core Error
// ============================================================================

/// Core error type for `RedditSched` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data from API response.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

// ============================================================================
// Transport Error
// ============================================================================

/// Raw failure reported by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("Request failed with status code {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, `Value::Null` when empty or not JSON.
        body: Value,
    },

    /// The connection was aborted before a response arrived (timeout).
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The server could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// Any other request failure without a response.
    #[error("Request error: {0}")]
    Other(String),
}

impl TransportError {
    /// Creates a status error.
    pub fn status(status: u16, body: Value) -> Self {
        Self::Status { status, body }
    }

    /// Returns the HTTP status, if a response was received.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the response body, if a response was received.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

// ============================================================================
// Error Code
// ============================================================================

/// Classification taxonomy for API failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// HTTP 400.
    BadRequest,
    /// HTTP 422 carrying field errors.
    ValidationError,
    /// HTTP 401.
    AuthenticationError,
    /// HTTP 403.
    AuthorizationError,
    /// HTTP 404.
    NotFound,
    /// HTTP 429.
    RateLimitExceeded,
    /// HTTP 5xx.
    ServerError,
    /// Connection aborted before a response.
    TimeoutError,
    /// Server unreachable.
    NetworkError,
    /// Anything else.
    UnknownError,
}

impl ErrorCode {
    /// Returns the wire name of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::AuthenticationError => "AUTHENTICATION_ERROR",
            Self::AuthorizationError => "AUTHORIZATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::ServerError => "SERVER_ERROR",
            Self::TimeoutError => "TIMEOUT_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Returns the message used when the response carries none.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::BadRequest => "Bad request",
            Self::ValidationError => "Validation failed",
            Self::AuthenticationError => "Authentication required",
            Self::AuthorizationError => "Access forbidden",
            Self::NotFound => "Resource not found",
            Self::RateLimitExceeded => "Too many requests - please try again later",
            Self::ServerError => "Server error - please try again later",
            Self::TimeoutError => "Request timeout - please check your connection",
            Self::NetworkError => "Network error - please check your connection",
            Self::UnknownError => "An unexpected error occurred",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Classified Error
// ============================================================================

/// Normalized API error.
///
/// Only [`crate::classify`] constructs these from live failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ClassifiedError {
    /// Human-readable message.
    pub message: String,
    /// Error kind.
    pub code: ErrorCode,
    /// HTTP status, when a response was received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Response body or transport details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
    /// Per-field validation messages (VALIDATION_ERROR only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
}

impl ClassifiedError {
    /// Returns true for failures worth retrying: network, timeout, or 5xx.
    pub fn is_transient(&self) -> bool {
        matches!(self.code, ErrorCode::NetworkError | ErrorCode::TimeoutError)
            || self.status.is_some_and(|s| s >= 500)
    }

    /// Returns true if the server rejected the session (401 or 403).
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status, Some(401 | 403))
            || matches!(
                self.code,
                ErrorCode::AuthenticationError | ErrorCode::AuthorizationError
            )
    }
}

// ============================================================================
// Authentication Required
// ============================================================================

/// The session is no longer valid and the user must log in again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AuthenticationRequiredError {
    message: String,
}

impl AuthenticationRequiredError {
    /// Creates the error with a custom message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Raised when a token refresh fails.
    pub fn session_expired() -> Self {
        Self::new("Session expired - please log in again")
    }

    /// Returns the message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Default for AuthenticationRequiredError {
    fn default() -> Self {
        Self::new("Authentication required - please log in again")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_wire_names() {
        let json = serde_json::to_string(&ErrorCode::RateLimitExceeded).unwrap();
        assert_eq!(json, r#""RATE_LIMIT_EXCEEDED""#);

        let code: ErrorCode = serde_json::from_str(r#""VALIDATION_ERROR""#).unwrap();
        assert_eq!(code, ErrorCode::ValidationError);
        assert_eq!(code.to_string(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_transient_classification() {
        let mut err = ClassifiedError {
            message: "x".to_string(),
            code: ErrorCode::NetworkError,
            status: None,
            details: None,
            field_errors: None,
        };
        assert!(err.is_transient());

        err.code = ErrorCode::ServerError;
        err.status = Some(503);
        assert!(err.is_transient());

        err.code = ErrorCode::BadRequest;
        err.status = Some(400);
        assert!(!err.is_transient());
    }

    #[test]
    fn test_auth_failure_detection() {
        let err = ClassifiedError {
            message: "Access forbidden".to_string(),
            code: ErrorCode::AuthorizationError,
            status: Some(403),
            details: None,
            field_errors: None,
        };
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_authentication_required_messages() {
        assert_eq!(
            AuthenticationRequiredError::default().to_string(),
            "Authentication required - please log in again"
        );
        assert_eq!(
            AuthenticationRequiredError::session_expired().message(),
            "Session expired - please log in again"
        );
    }

    #[test]
    fn test_transport_error_accessors() {
        let err = TransportError::status(404, serde_json::json!({"detail": "nope"}));
        assert_eq!(err.http_status(), Some(404));
        assert!(err.body().is_some());

        let err = TransportError::Network("refused".to_string());
        assert_eq!(err.http_status(), None);
        assert!(err.body().is_none());
    }
}
