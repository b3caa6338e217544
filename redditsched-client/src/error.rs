//! Client error types.

use redditsched_core::{
    AuthenticationRequiredError, ClassifiedError, ErrorCode, TransportError, classify,
};
use thiserror::Error;

// ============================================================================
// API Error
// ============================================================================

/// Error type for API calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Raw failure from the HTTP layer, before classification.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Failure normalized by [`classify`].
    #[error(transparent)]
    Classified(#[from] ClassifiedError),

    /// The session can no longer be used; the user has to log in again.
    #[error(transparent)]
    AuthenticationRequired(#[from] AuthenticationRequiredError),

    /// The server answered 2xx with a body we could not decode.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),

    /// The call was cancelled before it completed.
    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Returns the classified error, if this is one.
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            ApiError::Classified(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the classification code.
    ///
    /// Raw transport errors are classified on the fly.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ApiError::Classified(e) => Some(e.code),
            ApiError::Transport(e) => Some(classify(e).code),
            _ => None,
        }
    }

    /// Returns the HTTP status, if a response was received.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ApiError::Classified(e) => e.status,
            ApiError::Transport(e) => e.http_status(),
            _ => None,
        }
    }

    /// Returns true if the session must be torn down: an explicit
    /// authentication requirement or a 401/403 response.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            ApiError::AuthenticationRequired(_) => true,
            ApiError::Classified(e) => matches!(e.status, Some(401 | 403)),
            ApiError::Transport(e) => matches!(e.http_status(), Some(401 | 403)),
            _ => false,
        }
    }

    /// Returns true if the call was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}
