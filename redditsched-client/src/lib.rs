// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `RedditSched` Client
//!
//! Authenticated HTTP access to the `RedditSched` scheduling API.
//!
//! ## Request Path
//!
//! Every call travels the same chain:
//!
//! - [`api::ApiClient`] - One typed method per endpoint
//! - [`retry`] - Classification ([`with_error_handling`]), retries for reads
//!   ([`with_retry`]), opt-in cancellation ([`with_cancellation`])
//! - [`auth::AuthMiddleware`] - Bearer attachment and refresh-and-replay
//! - [`transport::Transport`] - One HTTP exchange ([`ReqwestTransport`])
//!
//! Outcomes are reported to the user through [`handler::ApiErrorHandler`],
//! which ends the [`redditsched_store::Session`] on authentication failures.
//!
//! ## Example
//!
//! ```ignore
//! use redditsched_client::ApiClient;
//! use redditsched_core::LoginCredentials;
//! use redditsched_store::TokenStore;
//!
//! let api = ApiClient::new("http://127.0.0.1:8000", TokenStore::in_memory())?;
//! api.login(&LoginCredentials::with_username("alice", "secret")).await?;
//!
//! for post in api.get_scheduled_posts().await? {
//!     println!("{} -> r/{}", post.title, post.subreddit);
//! }
//! ```

pub mod api;
pub mod auth;
pub mod error;
pub mod handler;
pub mod retry;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, paths};
pub use auth::{AuthMiddleware, REFRESH_PATH};
pub use error::ApiError;
pub use handler::{ApiErrorHandler, CallOptions, Notifier};
pub use retry::{RetryCondition, RetryConfig, with_cancellation, with_error_handling, with_retry};
pub use transport::{ApiRequest, ApiResponse, DEFAULT_TIMEOUT, ReqwestTransport, Transport};

pub use tokio_util::sync::CancellationToken;
