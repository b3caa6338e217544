// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `RedditSched` Core
//!
//! Core types, models, and error classification for the `RedditSched` client.
//!
//! This crate provides the foundational abstractions used across all other
//! `RedditSched` crates, including:
//!
//! - Domain models (linked accounts, scheduled posts, submissions, dashboard)
//! - Authentication payloads
//! - The application error taxonomy
//! - Pure classification of raw transport failures
//!
//! ## Key Types
//!
//! ### Models
//! - [`RedditAccount`] - A Reddit account linked to the user
//! - [`ScheduledPost`] - A post scheduled for (possibly recurring) submission
//! - [`SubmittedPost`] - A single submission of a scheduled post
//! - [`DashboardData`] - Aggregate dashboard payload
//!
//! ### Errors
//! - [`TransportError`] - Raw failure from the HTTP layer
//! - [`ClassifiedError`] - Normalized error produced by [`classify`]
//! - [`ErrorCode`] - Classification taxonomy
//! - [`AuthenticationRequiredError`] - The session is no longer valid

pub mod classify;
pub mod error;
pub mod models;

pub use classify::classify;
pub use error::{
    AuthenticationRequiredError, ClassifiedError, CoreError, ErrorCode, FieldErrors,
    TransportError,
};

pub use models::{
    // Accounts
    AccountStatus,
    RedditAccount,
    RedditLoginUrl,
    // Auth
    LoginCredentials,
    LoginResponse,
    SignupData,
    SignupResponse,
    TokenRefreshResponse,
    UserDetails,
    UserResponse,
    // Posts
    CronConversion,
    PostStatus,
    ScheduledPost,
    ScheduledPostData,
    ScheduledPostUpdate,
    SubmittedPost,
    // Dashboard
    DashboardAccount,
    DashboardAccounts,
    DashboardData,
    DashboardLinks,
    DashboardUser,
    PostOverview,
};
