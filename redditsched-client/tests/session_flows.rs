//! End-to-end client flows against a mock API server.
//!
//! Covers login, bearer attachment, silent token refresh, session teardown
//! and read retries over the real reqwest transport.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use redditsched_client::{ApiClient, ApiError, ApiErrorHandler, CallOptions, Notifier, RetryConfig};
use redditsched_core::{ErrorCode, LoginCredentials};
use redditsched_store::{AccountSelection, AccountStore, Session, SessionState, TokenStore};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Test Setup
// ============================================================================

fn client(server: &MockServer, tokens: TokenStore) -> ApiClient {
    ApiClient::new(&server.uri(), tokens)
        .expect("valid base URL")
        .with_retry_config(RetryConfig::new(3, Duration::from_millis(5)))
}

fn dashboard_body() -> Value {
    json!({
        "user": {"username": "alice", "is_authenticated": true},
        "reddit_accounts": {
            "is_linked": true,
            "count": 2,
            "accounts": [
                {"id": 11, "reddit_username": "alice_main", "reddit_account_status": "active"},
                {"id": 12, "reddit_username": "alice_alt", "reddit_account_status": "suspended"}
            ]
        },
        "links": {"reddit_login": "/api/reddit/user/reddit-login-url/"}
    })
}

#[derive(Default)]
struct Events(Mutex<Vec<String>>);

impl Notifier for Events {
    fn success(&self, message: &str) {
        self.0.lock().unwrap().push(format!("success: {message}"));
    }

    fn error(&self, message: &str, _description: &str) {
        self.0.lock().unwrap().push(format!("error: {message}"));
    }

    fn session_expired(&self) {
        self.0.lock().unwrap().push("session_expired".to_string());
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn login_then_dashboard_carries_bearer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/users/auth/token/"))
        .and(body_json(json!({"username": "alice", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A", "refresh": "R"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/reddit/dashboard/"))
        .and(header("Authorization", "Bearer A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard_body()))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = TokenStore::in_memory();
    let api = client(&server, tokens.clone());
    let session = Session::new(tokens.clone());
    assert_eq!(session.state(), SessionState::Anonymous);

    api.login(&LoginCredentials::with_username("alice", "pw"))
        .await
        .unwrap();
    session.login_user();

    assert_eq!(tokens.access_token().as_deref(), Some("A"));
    assert_eq!(tokens.refresh_token().as_deref(), Some("R"));

    let dashboard = api.get_dashboard_data().await.unwrap();
    assert_eq!(dashboard.user.username, "alice");
    assert_eq!(dashboard.reddit_accounts.count, 2);
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn expired_access_token_is_refreshed_silently() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reddit/posts/"))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/users/auth/token/refresh/"))
        .and(body_json(json!({"refresh": "R1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A2"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/reddit/posts/"))
        .and(header("Authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "reddit_account": 11, "subreddit": "rust", "title": "Hi", "selftext": "",
             "status": "active"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = TokenStore::in_memory();
    tokens.set_tokens("A1", "R1");
    let api = client(&server, tokens.clone());

    let posts = api.get_scheduled_posts().await.unwrap();

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].subreddit, "rust");
    assert_eq!(tokens.access_token().as_deref(), Some("A2"));
    assert_eq!(tokens.refresh_token().as_deref(), Some("R1"));
}

#[tokio::test]
async fn missing_refresh_token_ends_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reddit/dashboard/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/users/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "never"})))
        .expect(0)
        .mount(&server)
        .await;

    let tokens = TokenStore::in_memory();
    tokens.set_access_token("A1");
    let api = client(&server, tokens.clone());

    let err = api.get_dashboard_data().await.unwrap_err();

    assert!(matches!(err, ApiError::AuthenticationRequired(_)));
    assert_eq!(tokens.access_token(), None);
    assert_eq!(tokens.refresh_token(), None);
}

#[tokio::test]
async fn rejected_refresh_logs_out_through_handler() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reddit/user/accounts/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/users/auth/token/refresh/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Token is blacklisted"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tokens = TokenStore::in_memory();
    tokens.set_tokens("A1", "R1");
    let session = Arc::new(Session::new(tokens.clone()));
    let events = Arc::new(Events::default());
    let handler = ApiErrorHandler::new(session.clone(), events.clone());
    let api = client(&server, tokens.clone());

    let accounts = handler
        .handle_api_call(
            || api.get_reddit_accounts(),
            CallOptions::context("loading accounts"),
        )
        .await;

    assert!(accounts.is_none());
    assert_eq!(session.state(), SessionState::Anonymous);
    assert!(!tokens.has_valid_tokens());
    assert_eq!(*events.0.lock().unwrap(), vec!["session_expired".to_string()]);
}

#[tokio::test]
async fn server_errors_are_retried_for_reads_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reddit/submissions/"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "Maintenance"})))
        .expect(4)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/reddit/convert-cron/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, TokenStore::in_memory());

    let err = api.get_submitted_posts(None).await.unwrap_err();
    let classified = err.classified().unwrap();
    assert_eq!(classified.code, ErrorCode::ServerError);
    assert_eq!(classified.message, "Maintenance");

    let err = api.convert_text_to_cron("every day at noon").await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ServerError));
}

#[tokio::test]
async fn bad_credentials_do_not_trigger_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/users/auth/token/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": "No active account found with the given credentials"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/users/auth/token/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = client(&server, TokenStore::in_memory());

    let err = api
        .login(&LoginCredentials::with_email("alice@example.com", "nope"))
        .await
        .unwrap_err();

    let classified = err.classified().unwrap();
    assert_eq!(classified.code, ErrorCode::AuthenticationError);
    assert_eq!(
        classified.message,
        "No active account found with the given credentials"
    );
}

#[tokio::test]
async fn dashboard_accounts_drive_selection() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reddit/dashboard/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard_body()))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/reddit/user/unlink/"))
        .and(body_json(json!({"reddit_account_id": 12})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Unlinked"})))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = TokenStore::in_memory();
    tokens.set_tokens("A", "R");
    let api = client(&server, tokens);

    let accounts = AccountStore::in_memory();
    accounts.set_selected_account_id(12);
    let selection = AccountSelection::with_debounce(accounts.clone(), Duration::from_millis(20));

    let dashboard = api.get_dashboard_data().await.unwrap();
    selection.initialize(dashboard.accounts());
    assert_eq!(selection.selected_account_id(), Some(12));

    api.unlink_reddit_account(12).await.unwrap();
    selection.remove_account(12);

    assert_eq!(selection.selected_account_id(), Some(11));
    assert_eq!(accounts.selected_account_id(), Some(11));
}
