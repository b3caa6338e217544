//! Dashboard payload.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::account::{AccountStatus, RedditAccount};
use super::post::{PostStatus, ScheduledPost};

/// Aggregate dashboard data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    /// Current user.
    pub user: DashboardUser,
    /// Linked accounts summary.
    #[serde(default)]
    pub reddit_accounts: DashboardAccounts,
    /// Related links.
    #[serde(default)]
    pub links: Option<DashboardLinks>,
}

/// User section of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardUser {
    /// Username.
    pub username: String,
    /// Always true for a successful dashboard fetch.
    #[serde(default)]
    pub is_authenticated: bool,
}

/// Linked accounts section of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DashboardAccounts {
    /// Whether any account is linked.
    #[serde(default)]
    pub is_linked: bool,
    /// The linked accounts.
    #[serde(default)]
    pub accounts: Vec<DashboardAccount>,
    /// Number of linked accounts.
    #[serde(default)]
    pub count: usize,
}

/// Account entry on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardAccount {
    /// Server-side identifier.
    pub id: i64,
    /// Reddit username.
    pub reddit_username: String,
    /// Account standing.
    #[serde(default)]
    pub reddit_account_status: AccountStatus,
    /// When the account was linked.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<DashboardAccount> for RedditAccount {
    fn from(account: DashboardAccount) -> Self {
        Self {
            id: account.id,
            user: None,
            reddit_username: account.reddit_username,
            reddit_account_status: account.reddit_account_status,
            created_at: account.created_at,
            updated_at: None,
        }
    }
}

/// Links section of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DashboardLinks {
    /// Server path that starts the Reddit login flow.
    #[serde(default)]
    pub reddit_login: Option<String>,
}

impl DashboardData {
    /// Returns the linked accounts as [`RedditAccount`] values.
    pub fn accounts(&self) -> Vec<RedditAccount> {
        self.reddit_accounts
            .accounts
            .iter()
            .cloned()
            .map(RedditAccount::from)
            .collect()
    }
}

// ============================================================================
// Post Overview
// ============================================================================

/// Summary counts over a set of scheduled posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PostOverview {
    /// All posts.
    pub total: usize,
    /// Posts with status `active`.
    pub active: usize,
    /// Posts whose last submission failed.
    pub errors: usize,
    /// Posts created in the calendar month of `now`.
    pub this_month: usize,
    /// Completed posts as a rounded percentage of all posts; 0 when empty.
    pub success_rate: u32,
}

impl PostOverview {
    /// Computes the overview, judging "this month" in the time zone of `now`.
    pub fn compute<Tz: TimeZone>(posts: &[ScheduledPost], now: &DateTime<Tz>) -> Self {
        let count = |status: PostStatus| posts.iter().filter(|p| p.status == status).count();

        let this_month = posts
            .iter()
            .filter_map(|post| post.created_at)
            .map(|created| created.with_timezone(&now.timezone()))
            .filter(|created| created.year() == now.year() && created.month() == now.month())
            .count();

        let total = posts.len();
        let completed = count(PostStatus::Completed);
        let success_rate = if total == 0 {
            0
        } else {
            // round half up in integers
            u32::try_from((completed * 200 + total) / (2 * total)).unwrap_or(100)
        };

        Self {
            total,
            active: count(PostStatus::Active),
            errors: count(PostStatus::Error),
            this_month,
            success_rate,
        }
    }
}
