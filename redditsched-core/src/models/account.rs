//! Linked Reddit account types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Account Status
// ============================================================================

/// Standing of a linked Reddit account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Account can post.
    #[default]
    Active,
    /// Suspended by Reddit.
    Suspended,
    /// Shadow banned.
    ShadowBanned,
    /// Banned.
    Banned,
    /// Unrecognized status from a newer server.
    #[serde(other)]
    Unknown,
}

impl AccountStatus {
    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Suspended => "Suspended",
            Self::ShadowBanned => "Shadow Banned",
            Self::Banned => "Banned",
            Self::Unknown => "Unknown",
        }
    }

    /// Returns true if posts can be submitted through this account.
    pub fn can_post(&self) -> bool {
        matches!(self, Self::Active)
    }
}

// ============================================================================
// Reddit Account
// ============================================================================

/// A Reddit account linked to the current user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedditAccount {
    /// Server-side identifier.
    pub id: i64,
    /// Owning user (string representation).
    #[serde(default)]
    pub user: Option<String>,
    /// Reddit username.
    pub reddit_username: String,
    /// Account standing.
    #[serde(default)]
    pub reddit_account_status: AccountStatus,
    /// When the account was linked.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RedditAccount {
    /// Creates an account with only the identifying fields set.
    pub fn new(id: i64, reddit_username: impl Into<String>) -> Self {
        Self {
            id,
            user: None,
            reddit_username: reddit_username.into(),
            reddit_account_status: AccountStatus::Active,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Response of the Reddit OAuth link endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedditLoginUrl {
    /// URL the user must visit to authorize the app on Reddit.
    pub login_url: String,
}
