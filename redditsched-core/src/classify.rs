//! Classification of raw transport failures.
//!
//! [`classify`] is pure and total: every [`TransportError`] maps to exactly
//! one [`ClassifiedError`], checked in this order:
//!
//! | status | code |
//! |---|---|
//! | 400 | `BAD_REQUEST` |
//! | 422 with `field_errors` | `VALIDATION_ERROR` |
//! | 401 | `AUTHENTICATION_ERROR` |
//! | 403 | `AUTHORIZATION_ERROR` |
//! | 404 | `NOT_FOUND` |
//! | 429 | `RATE_LIMIT_EXCEEDED` |
//! | >= 500 | `SERVER_ERROR` |
//! | none, timed out | `TIMEOUT_ERROR` |
//! | none, unreachable | `NETWORK_ERROR` |
//! | anything else | `UNKNOWN_ERROR` |

use serde_json::{Map, Value};

use crate::error::{ClassifiedError, ErrorCode, FieldErrors, TransportError};

/// Maps a raw transport failure into the application error taxonomy.
pub fn classify(error: &TransportError) -> ClassifiedError {
    match error {
        TransportError::Status { status, body } => classify_status(*status, body),
        TransportError::Timeout(msg) => without_response(ErrorCode::TimeoutError, msg),
        TransportError::Network(msg) => without_response(ErrorCode::NetworkError, msg),
        TransportError::Other(msg) => ClassifiedError {
            message: if msg.is_empty() {
                ErrorCode::UnknownError.default_message().to_string()
            } else {
                msg.clone()
            },
            code: ErrorCode::UnknownError,
            status: None,
            details: Some(original_error(msg)),
            field_errors: None,
        },
    }
}

fn classify_status(status: u16, body: &Value) -> ClassifiedError {
    let field_errors = body
        .get("field_errors")
        .filter(|v| !v.is_null())
        .map(parse_field_errors);

    let code = match status {
        400 => ErrorCode::BadRequest,
        422 if field_errors.is_some() => ErrorCode::ValidationError,
        401 => ErrorCode::AuthenticationError,
        403 => ErrorCode::AuthorizationError,
        404 => ErrorCode::NotFound,
        429 => ErrorCode::RateLimitExceeded,
        s if s >= 500 => ErrorCode::ServerError,
        _ => ErrorCode::UnknownError,
    };

    let message = body_message(body).unwrap_or_else(|| {
        if code == ErrorCode::UnknownError {
            format!("Request failed with status code {status}")
        } else {
            code.default_message().to_string()
        }
    });

    ClassifiedError {
        message,
        code,
        status: Some(status),
        details: body.as_object().cloned(),
        field_errors: if code == ErrorCode::ValidationError {
            field_errors
        } else {
            None
        },
    }
}

fn without_response(code: ErrorCode, msg: &str) -> ClassifiedError {
    ClassifiedError {
        message: code.default_message().to_string(),
        code,
        status: None,
        details: Some(original_error(msg)),
        field_errors: None,
    }
}

fn original_error(msg: &str) -> Map<String, Value> {
    let mut details = Map::new();
    details.insert("originalError".to_string(), Value::String(msg.to_string()));
    details
}

/// Picks `error`, then `message`, from a JSON object body.
fn body_message(body: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .filter_map(|key| body.get(*key))
        .find_map(|v| v.as_str().filter(|s| !s.is_empty()))
        .map(str::to_string)
}

/// Accepts `{"field": ["msg", ...]}` as well as `{"field": "msg"}`.
fn parse_field_errors(value: &Value) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let Some(map) = value.as_object() else {
        return errors;
    };

    for (field, messages) in map {
        let list = match messages {
            Value::Array(items) => items
                .iter()
                .map(|m| m.as_str().map_or_else(|| m.to_string(), str::to_string))
                .collect(),
            Value::String(s) => vec![s.clone()],
            other => vec![other.to_string()],
        };
        errors.insert(field.clone(), list);
    }

    errors
}

// ============================================================================
// Tests
// ============================================================================
