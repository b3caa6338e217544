//! Bearer attachment and refresh-and-replay.
//!
//! [`AuthMiddleware`] wraps a [`Transport`]:
//!
//! 1. Outgoing requests get `Authorization: Bearer <access>` when an access
//!    token is stored.
//! 2. A 401 on a request that has not been replayed yet triggers one token
//!    refresh through the bare transport, then a single replay with the new
//!    token. The replay's outcome is the outcome of the call.
//! 3. If there is no refresh token or the refresh fails, both tokens are
//!    cleared and the call fails with [`AuthenticationRequiredError`].
//!
//! Concurrent 401s each refresh on their own.

use redditsched_core::{AuthenticationRequiredError, TokenRefreshResponse};
use redditsched_store::TokenStore;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::error::ApiError;
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Path of the token refresh endpoint.
pub const REFRESH_PATH: &str = "/api/users/auth/token/refresh/";

/// Transport wrapper that authenticates requests.
#[derive(Debug)]
pub struct AuthMiddleware<T> {
    transport: T,
    tokens: TokenStore,
}

impl<T: Transport> AuthMiddleware<T> {
    /// Wraps `transport`, reading credentials from `tokens`.
    pub fn new(transport: T, tokens: TokenStore) -> Self {
        Self { transport, tokens }
    }

    /// Returns the token store.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Returns the wrapped transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `request` and returns its 2xx response.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Transport`] for non-2xx responses and transport failures
    /// - [`ApiError::AuthenticationRequired`] when a 401 could not be
    ///   recovered by refreshing
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        if let Some(access) = self.tokens.access_token() {
            request.set_bearer(&access);
        }

        let response = self.transport.send(&request).await?;

        if response.status == 401 && request.refresh_on_unauthorized() && !request.is_retried() {
            request.mark_retried();
            debug!("Access token rejected, refreshing");

            let access = self.refresh_access_token().await?;
            request.set_bearer(&access);

            let replay = self.transport.send(&request).await?;
            debug!(status = replay.status, "Replayed after refresh");
            return Ok(replay.error_for_status()?);
        }

        Ok(response.error_for_status()?)
    }

    /// Exchanges the refresh token for a new access token and stores it.
    ///
    /// Any failure clears both tokens.
    async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let Some(refresh) = self.tokens.refresh_token() else {
            warn!("No refresh token available, ending session");
            self.tokens.clear_tokens();
            return Err(AuthenticationRequiredError::default().into());
        };

        let request = ApiRequest::post(REFRESH_PATH)
            .with_body(json!({ "refresh": refresh }))
            .without_refresh();

        let refreshed = match self.transport.send(&request).await {
            Ok(response) if response.is_success() => response
                .json::<TokenRefreshResponse>()
                .ok()
                .filter(|r| !r.access.is_empty()),
            Ok(response) => {
                warn!(status = response.status, "Token refresh rejected");
                None
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                None
            }
        };

        match refreshed {
            Some(TokenRefreshResponse { access }) => {
                self.tokens.set_access_token(&access);
                info!("Access token refreshed");
                Ok(access)
            }
            None => {
                self.tokens.clear_tokens();
                Err(AuthenticationRequiredError::session_expired().into())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
