//! Domain API functions.
//!
//! [`ApiClient`] maps each endpoint of the scheduling API onto a typed
//! method. Idempotent reads go through [`with_retry`]; writes and credential
//! calls go through [`with_error_handling`] only, so a failed write is never
//! submitted twice.

use redditsched_core::{
    AuthenticationRequiredError, CronConversion, DashboardData, LoginCredentials, LoginResponse,
    RedditAccount, RedditLoginUrl, ScheduledPost, ScheduledPostData, ScheduledPostUpdate,
    SignupData, SignupResponse, SubmittedPost, TokenRefreshResponse, UserDetails, UserResponse,
};
use redditsched_store::{Settings, TokenStore};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::auth::{AuthMiddleware, REFRESH_PATH};
use crate::error::ApiError;
use crate::retry::{RetryConfig, with_error_handling, with_retry};
use crate::transport::{ApiRequest, ReqwestTransport, Transport};

// ============================================================================
// Endpoints
// ============================================================================

/// Endpoint paths, relative to the API base URL.
pub mod paths {
    /// Obtain a token pair.
    pub const TOKEN: &str = "/api/users/auth/token/";
    /// Create an account.
    pub const REGISTER: &str = "/api/users/auth/register/";
    /// Exchange a refresh token.
    pub const REFRESH: &str = super::REFRESH_PATH;
    /// Verify an access token.
    pub const VERIFY: &str = "/api/users/auth/token/verify/";
    /// Dashboard summary.
    pub const DASHBOARD: &str = "/api/reddit/dashboard/";
    /// Scheduled post collection.
    pub const POSTS: &str = "/api/reddit/posts/";
    /// Submission collection.
    pub const SUBMISSIONS: &str = "/api/reddit/submissions/";
    /// Reddit OAuth start URL.
    pub const REDDIT_LOGIN_URL: &str = "/api/reddit/user/reddit-login-url/";
    /// Linked accounts.
    pub const ACCOUNTS: &str = "/api/reddit/user/accounts/";
    /// Unlink an account.
    pub const UNLINK: &str = "/api/reddit/user/unlink/";
    /// Natural language to cron.
    pub const CONVERT_CRON: &str = "/api/reddit/convert-cron/";

    /// A single scheduled post.
    pub fn post(id: i64) -> String {
        format!("{POSTS}{id}/")
    }

    /// Submissions of one scheduled post.
    pub fn post_submissions(id: i64) -> String {
        format!("{POSTS}{id}/submissions/")
    }

    /// A single submission.
    pub fn submission(id: i64) -> String {
        format!("{SUBMISSIONS}{id}/")
    }
}

/// A collection that may come back bare or paginated.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Page { results: Vec<T> },
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Page { results } => results,
            Listing::Plain(items) => items,
        }
    }
}

// ============================================================================
// API Client
// ============================================================================

/// Typed client for the scheduling API.
#[derive(Debug)]
pub struct ApiClient<T = ReqwestTransport> {
    http: AuthMiddleware<T>,
    retry: RetryConfig,
}

impl ApiClient<ReqwestTransport> {
    /// Creates a client for `base_url` with default timeout and retries.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn new(base_url: &str, tokens: TokenStore) -> Result<Self, ApiError> {
        Ok(Self::with_transport(ReqwestTransport::new(base_url)?, tokens))
    }

    /// Creates a client configured from `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base URL is invalid.
    pub fn from_settings(settings: &Settings, tokens: TokenStore) -> Result<Self, ApiError> {
        let transport =
            ReqwestTransport::with_timeout(&settings.api_base_url, settings.request_timeout())?;
        Ok(Self::with_transport(transport, tokens).with_retry_config(RetryConfig::from(settings)))
    }
}

impl<T: Transport> ApiClient<T> {
    /// Creates a client over an arbitrary transport.
    pub fn with_transport(transport: T, tokens: TokenStore) -> Self {
        Self {
            http: AuthMiddleware::new(transport, tokens),
            retry: RetryConfig::default(),
        }
    }

    /// Sets the retry policy for reads.
    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the token store.
    pub fn tokens(&self) -> &TokenStore {
        self.http.tokens()
    }

    /// Returns the retry policy.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    // ========================================================================
    // Plumbing
    // ========================================================================

    async fn send<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, ApiError> {
        self.http.execute(request).await?.json()
    }

    async fn send_no_content(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.http.execute(request).await.map(|_| ())
    }

    /// Idempotent GET with retries.
    async fn read<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        with_retry(|| self.send(ApiRequest::get(path)), &self.retry).await
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    /// Logs in and stores the returned token pair.
    ///
    /// # Errors
    ///
    /// Bad credentials surface as a classified `AUTHENTICATION_ERROR`.
    #[instrument(skip_all, fields(username = ?credentials.username, email = ?credentials.email))]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse, ApiError> {
        let request = ApiRequest::post(paths::TOKEN).json(credentials)?.without_refresh();
        let response: LoginResponse = with_error_handling(|| self.send(request)).await?;

        if !response.access.is_empty() && !response.refresh.is_empty() {
            self.tokens().set_tokens(&response.access, &response.refresh);
        }
        info!("Logged in");
        Ok(response)
    }

    /// Registers a new user. Does not log in.
    ///
    /// # Errors
    ///
    /// Field problems surface as a classified error with field messages.
    #[instrument(skip_all, fields(username = %data.username))]
    pub async fn signup(&self, data: &SignupData) -> Result<SignupResponse, ApiError> {
        let request = ApiRequest::post(paths::REGISTER).json(data)?.without_refresh();
        with_error_handling(|| self.send(request)).await
    }

    /// Forgets the stored tokens. No request is made.
    pub fn logout(&self) {
        self.tokens().clear_tokens();
        info!("Logged out");
    }

    /// Exchanges the stored refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthenticationRequired`] if no refresh token is
    /// stored.
    #[instrument(skip_all)]
    pub async fn refresh_token(&self) -> Result<TokenRefreshResponse, ApiError> {
        let Some(refresh) = self.tokens().refresh_token() else {
            return Err(AuthenticationRequiredError::new("No refresh token available").into());
        };

        let request = ApiRequest::post(paths::REFRESH)
            .with_body(json!({ "refresh": refresh }))
            .without_refresh();
        let response: TokenRefreshResponse = with_error_handling(|| self.send(request)).await?;

        if !response.access.is_empty() {
            self.tokens().set_access_token(&response.access);
        }
        Ok(response)
    }

    /// Verifies the stored access token and loads the user if possible.
    ///
    /// A verified token whose dashboard cannot be loaded still counts as
    /// authenticated, without user details.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::AuthenticationRequired`] if no access token is
    /// stored, or the classified verification failure.
    #[instrument(skip_all)]
    pub async fn get_user(&self) -> Result<UserResponse, ApiError> {
        let Some(token) = self.tokens().access_token() else {
            return Err(AuthenticationRequiredError::new("No access token found").into());
        };

        let request = ApiRequest::post(paths::VERIFY)
            .with_body(json!({ "token": token }))
            .without_refresh();
        with_error_handling(|| self.send_no_content(request)).await?;

        let user = match self.send::<DashboardData>(ApiRequest::get(paths::DASHBOARD)).await {
            Ok(dashboard) => Some(UserDetails {
                username: dashboard.user.username,
                ..UserDetails::default()
            }),
            Err(e) => {
                debug!(error = %e, "Token verified but dashboard unavailable");
                None
            }
        };

        Ok(UserResponse {
            authenticated: true,
            user,
        })
    }

    // ========================================================================
    // Dashboard
    // ========================================================================

    /// Loads the dashboard summary.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after retries.
    pub async fn get_dashboard_data(&self) -> Result<DashboardData, ApiError> {
        self.read(paths::DASHBOARD).await
    }

    // ========================================================================
    // Scheduled Posts
    // ========================================================================

    /// Lists scheduled posts.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after retries.
    pub async fn get_scheduled_posts(&self) -> Result<Vec<ScheduledPost>, ApiError> {
        self.read::<Listing<ScheduledPost>>(paths::POSTS)
            .await
            .map(Listing::into_vec)
    }

    /// Loads one scheduled post.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after retries.
    pub async fn get_scheduled_post(&self, id: i64) -> Result<ScheduledPost, ApiError> {
        self.read(&paths::post(id)).await
    }

    /// Creates a scheduled post.
    ///
    /// # Errors
    ///
    /// Returns the classified failure; validation problems carry field
    /// messages.
    #[instrument(skip_all, fields(subreddit = %data.subreddit, account = data.reddit_account))]
    pub async fn create_scheduled_post(
        &self,
        data: &ScheduledPostData,
    ) -> Result<ScheduledPost, ApiError> {
        let request = ApiRequest::post(paths::POSTS).json(data)?;
        let post: ScheduledPost = with_error_handling(|| self.send(request)).await?;
        info!(post_id = post.id, "Scheduled post created");
        Ok(post)
    }

    /// Partially updates a scheduled post.
    ///
    /// # Errors
    ///
    /// Returns the classified failure.
    #[instrument(skip(self, update))]
    pub async fn update_scheduled_post(
        &self,
        id: i64,
        update: &ScheduledPostUpdate,
    ) -> Result<ScheduledPost, ApiError> {
        let request = ApiRequest::patch(paths::post(id)).json(update)?;
        with_error_handling(|| self.send(request)).await
    }

    /// Deletes a scheduled post.
    ///
    /// # Errors
    ///
    /// Returns the classified failure.
    #[instrument(skip(self))]
    pub async fn delete_scheduled_post(&self, id: i64) -> Result<(), ApiError> {
        let request = ApiRequest::delete(paths::post(id));
        with_error_handling(|| self.send_no_content(request)).await?;
        info!(post_id = id, "Scheduled post deleted");
        Ok(())
    }

    // ========================================================================
    // Submissions
    // ========================================================================

    /// Lists submissions, all of them or those of one scheduled post.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after retries.
    pub async fn get_submitted_posts(
        &self,
        scheduled_post_id: Option<i64>,
    ) -> Result<Vec<SubmittedPost>, ApiError> {
        let path = match scheduled_post_id {
            Some(id) => paths::post_submissions(id),
            None => paths::SUBMISSIONS.to_string(),
        };
        self.read::<Listing<SubmittedPost>>(&path)
            .await
            .map(Listing::into_vec)
    }

    /// Loads one submission.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after retries.
    pub async fn get_submitted_post(&self, id: i64) -> Result<SubmittedPost, ApiError> {
        self.read(&paths::submission(id)).await
    }

    // ========================================================================
    // Reddit Accounts
    // ========================================================================

    /// Returns the URL that starts linking a Reddit account.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after retries.
    pub async fn get_reddit_login_url(&self) -> Result<String, ApiError> {
        self.read::<RedditLoginUrl>(paths::REDDIT_LOGIN_URL)
            .await
            .map(|r| r.login_url)
    }

    /// Lists linked Reddit accounts.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after retries.
    pub async fn get_reddit_accounts(&self) -> Result<Vec<RedditAccount>, ApiError> {
        self.read::<Listing<RedditAccount>>(paths::ACCOUNTS)
            .await
            .map(Listing::into_vec)
    }

    /// Unlinks a Reddit account.
    ///
    /// # Errors
    ///
    /// Returns the classified failure.
    #[instrument(skip(self))]
    pub async fn unlink_reddit_account(&self, account_id: i64) -> Result<(), ApiError> {
        let request =
            ApiRequest::delete(paths::UNLINK).with_body(json!({ "reddit_account_id": account_id }));
        with_error_handling(|| self.send_no_content(request)).await?;
        info!(account_id, "Reddit account unlinked");
        Ok(())
    }

    // ========================================================================
    // Cron
    // ========================================================================

    /// Converts natural-language schedule text to a cron expression.
    ///
    /// # Errors
    ///
    /// Returns the classified failure.
    #[instrument(skip(self))]
    pub async fn convert_text_to_cron(&self, schedule_text: &str) -> Result<CronConversion, ApiError> {
        let request =
            ApiRequest::post(paths::CONVERT_CRON).with_body(json!({ "schedule_text": schedule_text }));
        with_error_handling(|| self.send(request)).await
    }
}

// ============================================================================
// Tests
// ============================================================================
