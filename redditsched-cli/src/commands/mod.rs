//! CLI command implementations.

pub mod accounts;
pub mod auth;
pub mod config;
pub mod context;
pub mod cron;
pub mod dashboard;
pub mod posts;
pub mod submissions;

/// A failure the notifier has already shown to the user.
#[derive(Debug)]
pub struct Reported {
    /// The session is gone; the user has to log in again.
    pub auth_required: bool,
}

impl std::fmt::Display for Reported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.auth_required {
            write!(f, "authentication required")
        } else {
            write!(f, "request failed")
        }
    }
}

impl std::error::Error for Reported {}
