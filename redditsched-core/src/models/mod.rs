//! Domain models for `RedditSched`.
//!
//! These mirror the payloads of the scheduling REST API. Optional fields are
//! tolerant of omission so that older or newer servers still decode.
//!
//! ## Submodules
//!
//! - [`account`] - Linked Reddit accounts
//! - [`auth`] - Login, signup, and token payloads
//! - [`post`] - Scheduled and submitted posts
//! - [`dashboard`] - Aggregate dashboard payload

mod account;
mod auth;
mod dashboard;
mod post;

pub use account::{AccountStatus, RedditAccount, RedditLoginUrl};
pub use auth::{
    LoginCredentials, LoginResponse, SignupData, SignupResponse, TokenRefreshResponse,
    UserDetails, UserResponse,
};
pub use dashboard::{
    DashboardAccount, DashboardAccounts, DashboardData, DashboardLinks, DashboardUser,
    PostOverview,
};
pub use post::{
    CronConversion, PostStatus, ScheduledPost, ScheduledPostData, ScheduledPostUpdate,
    SubmittedPost,
};
