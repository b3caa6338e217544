//! HTTP transport.
//!
//! A [`Transport`] sends one [`ApiRequest`] and reports the response for
//! every status code. Only failures where no response arrived are errors.

use async_trait::async_trait;
use redditsched_core::TransportError;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::ApiError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent string for `RedditSched`.
const USER_AGENT: &str = concat!("RedditSched/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Request / Response
// ============================================================================

/// A request relative to the API base URL.
#[derive(Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path including leading slash, e.g. `/api/reddit/posts/`.
    pub path: String,
    /// JSON body.
    pub body: Option<Value>,
    authorization: Option<HeaderValue>,
    refresh_on_unauthorized: bool,
    retried: bool,
}

impl std::fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("authorized", &self.authorization.is_some())
            .field("retried", &self.retried)
            .finish_non_exhaustive()
    }
}

impl ApiRequest {
    /// Creates a request.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            authorization: None,
            refresh_on_unauthorized: true,
            retried: false,
        }
    }

    /// Creates a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Creates a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Creates a PATCH request.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Creates a DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attaches a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] if `body` cannot be serialized.
    pub fn json<B: serde::Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value =
            serde_json::to_value(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Attaches an already-built JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Disables the refresh-and-replay on 401 for this request.
    #[must_use]
    pub fn without_refresh(mut self) -> Self {
        self.refresh_on_unauthorized = false;
        self
    }

    /// Sets `Authorization: Bearer <token>`.
    ///
    /// A token that is not a valid header value is dropped with a warning.
    pub fn set_bearer(&mut self, token: &str) {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                self.authorization = Some(value);
            }
            Err(_) => {
                warn!("Access token is not a valid header value, sending unauthenticated");
                self.authorization = None;
            }
        }
    }

    /// Returns the Authorization header value, if set.
    pub fn authorization(&self) -> Option<&HeaderValue> {
        self.authorization.as_ref()
    }

    /// Returns true if a 401 may trigger a token refresh.
    pub fn refresh_on_unauthorized(&self) -> bool {
        self.refresh_on_unauthorized
    }

    /// Returns true once the request has been replayed after a refresh.
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }
}

/// A response of any status.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Decoded body: JSON if possible, a string otherwise, `Null` if empty.
    pub body: Value,
}

impl ApiResponse {
    /// Creates a response.
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Returns true for 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Converts a non-2xx response into [`TransportError::Status`].
    ///
    /// # Errors
    ///
    /// Returns the status error for any non-success status.
    pub fn error_for_status(self) -> Result<Self, TransportError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TransportError::status(self.status, self.body))
        }
    }

    /// Decodes the body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidResponse`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        serde_json::from_value(self.body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

/// Parses a raw response body.
pub(crate) fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Sends requests to the API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` once.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] only when no response was received.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        (**self).send(request).await
    }
}

// ============================================================================
// Reqwest Transport
// ============================================================================

/// [`Transport`] over `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Creates a transport with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute http(s) URL or the
    /// client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Creates a transport with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute http(s) URL or the
    /// client cannot be built.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid base URL '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidRequest(format!(
                "unsupported URL scheme '{}'",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self {
            inner: client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self
            .inner
            .request(request.method.clone(), self.url_for(&request.path));
        if let Some(auth) = request.authorization() {
            builder = builder.header(AUTHORIZATION, auth.clone());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!("Sending request");
        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(map_reqwest_error)?;
        debug!(status, "Response received");

        Ok(ApiResponse::new(status, parse_body(&text)))
    }
}

/// Maps a `reqwest` failure onto the transport taxonomy.
fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    let message = err.to_string();
    if err.is_timeout() {
        TransportError::Timeout(message)
    } else if err.is_connect() || err.is_request() {
        TransportError::Network(message)
    } else {
        TransportError::Other(message)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_body("<html>oops</html>"), json!("<html>oops</html>"));
    }

    #[test]
    fn test_error_for_status() {
        assert!(ApiResponse::new(204, Value::Null).error_for_status().is_ok());

        let err = ApiResponse::new(500, json!({"error": "boom"}))
            .error_for_status()
            .unwrap_err();
        assert_eq!(err.http_status(), Some(500));
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(ReqwestTransport::new("not a url").is_err());
        assert!(ReqwestTransport::new("ftp://example.com").is_err());
        assert_eq!(
            ReqwestTransport::new("http://localhost:8000/").unwrap().base_url(),
            "http://localhost:8000"
        );
    }

    #[test]
    fn test_request_debug_hides_token() {
        let mut request = ApiRequest::get("/x");
        request.set_bearer("secret-token");
        assert!(!format!("{request:?}").contains("secret-token"));
        assert!(request.authorization().is_some());
    }

    #[tokio::test]
    async fn test_send_reports_all_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/reddit/convert-cron/"))
            .and(header("Authorization", "Bearer abc"))
            .and(body_json(json!({"schedule_text": "daily"})))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({"error": "bad"})))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(&server.uri()).unwrap();
        let mut request = ApiRequest::post("/api/reddit/convert-cron/")
            .json(&json!({"schedule_text": "daily"}))
            .unwrap();
        request.set_bearer("abc");

        let response = transport.send(&request).await.unwrap();
        assert_eq!(response.status, 422);
        assert_eq!(response.body, json!({"error": "bad"}));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Port 1 is reserved and nothing listens there.
        let transport = ReqwestTransport::new("http://127.0.0.1:1").unwrap();
        let err = transport.send(&ApiRequest::get("/")).await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }

    #[tokio::test]
    async fn test_slow_response_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let transport =
            ReqwestTransport::with_timeout(&server.uri(), Duration::from_millis(50)).unwrap();
        let err = transport.send(&ApiRequest::get("/slow")).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
    }
}
