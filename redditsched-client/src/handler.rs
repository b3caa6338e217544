//! Cross-cutting API error handling.
//!
//! [`ApiErrorHandler::handle_api_call`] runs a call and turns its outcome
//! into user notifications. Authentication failures end the session instead
//! of showing an error.

use std::future::Future;
use std::sync::Arc;

use redditsched_core::{ErrorCode, FieldErrors};
use redditsched_store::Session;
use tracing::{error, warn};

use crate::error::ApiError;

/// Fallback description for errors without a message.
const GENERIC_DESCRIPTION: &str = "Please try again later.";

/// Receives user-facing notifications.
pub trait Notifier: Send + Sync {
    /// A call succeeded and has something to say.
    fn success(&self, message: &str);

    /// A call failed.
    fn error(&self, message: &str, description: &str);

    /// A validation failure listed problems per field.
    fn field_errors(&self, errors: &FieldErrors) {
        for (field, messages) in errors {
            for message in messages {
                self.error(&format!("{field}: {message}"), "");
            }
        }
    }

    /// The session ended; the user has to log in again.
    fn session_expired(&self);
}

/// Options for one [`ApiErrorHandler::handle_api_call`].
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// What the call was doing, e.g. `"creating post"`.
    pub context: Option<String>,
    /// Shown on success.
    pub success_message: Option<String>,
    /// Shown on failure instead of the generated message.
    pub error_message: Option<String>,
}

impl CallOptions {
    /// Options with a context.
    pub fn context(context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
            ..Self::default()
        }
    }

    /// Sets the success message.
    #[must_use]
    pub fn success(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    /// Sets the failure message.
    #[must_use]
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    fn failure_message(&self) -> String {
        match (&self.error_message, &self.context) {
            (Some(message), _) => message.clone(),
            (None, Some(context)) => format!("An error occurred while {context}"),
            (None, None) => "An error occurred".to_string(),
        }
    }
}

/// Routes call outcomes to the session and a [`Notifier`].
#[derive(Clone)]
pub struct ApiErrorHandler {
    session: Arc<Session>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for ApiErrorHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiErrorHandler")
            .field("session", &self.session.state())
            .finish_non_exhaustive()
    }
}

impl ApiErrorHandler {
    /// Creates a handler.
    pub fn new(session: Arc<Session>, notifier: Arc<dyn Notifier>) -> Self {
        Self { session, notifier }
    }

    /// Handles an error.
    ///
    /// Returns true if it was an authentication failure, in which case the
    /// session has been logged out.
    pub fn handle_error(&self, err: &ApiError, context: Option<&str>) -> bool {
        let context = context.unwrap_or("API");
        if err.is_auth_failure() {
            warn!(context, error = %err, "Authentication error, logging out");
            self.session.logout_user();
            self.notifier.session_expired();
            return true;
        }
        error!(context, error = %err, code = ?err.code(), "API call failed");
        false
    }

    /// Runs `call`, reporting the outcome. Returns `None` on failure.
    pub async fn handle_api_call<F, Fut, T>(&self, call: F, options: CallOptions) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match call().await {
            Ok(value) => {
                if let Some(message) = &options.success_message {
                    self.notifier.success(message);
                }
                Some(value)
            }
            Err(err) => {
                if !self.handle_error(&err, options.context.as_deref()) {
                    let description = if err.to_string().is_empty() {
                        GENERIC_DESCRIPTION.to_string()
                    } else {
                        err.to_string()
                    };
                    self.notifier.error(&options.failure_message(), &description);

                    if let Some(classified) = err.classified()
                        && classified.code == ErrorCode::ValidationError
                        && let Some(fields) = &classified.field_errors
                    {
                        self.notifier.field_errors(fields);
                    }
                }
                None
            }
        }
    }
}
