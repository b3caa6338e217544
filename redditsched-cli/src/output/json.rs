//! JSON output formatting.

use anyhow::Result;
use redditsched_core::{
    AccountStatus, DashboardData, DashboardUser, PostOverview, RedditAccount, ScheduledPost,
};
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for the dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOutput<'a> {
    pub username: &'a str,
    pub is_linked: bool,
    pub accounts: Vec<AccountOutput<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_account: Option<i64>,
    pub overview: PostOverview,
    pub posts: &'a [ScheduledPost],
}

/// A linked account with its selection state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOutput<'a> {
    pub id: i64,
    pub username: &'a str,
    pub status: AccountStatus,
    pub can_post: bool,
    pub selected: bool,
}

/// JSON output after logging in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutput<'a> {
    pub authenticated: bool,
    pub username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_account: Option<i64>,
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }

    /// Formats the result of a login.
    pub fn format_login(&self, user: &DashboardUser, selected: Option<i64>) -> Result<String> {
        self.format(&LoginOutput {
            authenticated: user.is_authenticated,
            username: &user.username,
            selected_account: selected,
        })
    }

    /// Formats the dashboard.
    pub fn format_dashboard(
        &self,
        dashboard: &DashboardData,
        selected: Option<&RedditAccount>,
        overview: &PostOverview,
        posts: &[ScheduledPost],
    ) -> Result<String> {
        let selected_id = selected.map(|account| account.id);
        let accounts = dashboard
            .reddit_accounts
            .accounts
            .iter()
            .map(|account| AccountOutput {
                id: account.id,
                username: &account.reddit_username,
                status: account.reddit_account_status,
                can_post: account.reddit_account_status.can_post(),
                selected: selected_id == Some(account.id),
            })
            .collect();

        self.format(&DashboardOutput {
            username: &dashboard.user.username,
            is_linked: dashboard.reddit_accounts.is_linked,
            accounts,
            selected_account: selected_id,
            overview: *overview,
            posts,
        })
    }

    /// Formats linked accounts with their selection state.
    pub fn format_accounts(&self, accounts: &[RedditAccount], selected: Option<i64>) -> Result<String> {
        let outputs: Vec<AccountOutput<'_>> = accounts
            .iter()
            .map(|account| AccountOutput {
                id: account.id,
                username: &account.reddit_username,
                status: account.reddit_account_status,
                can_post: account.reddit_account_status.can_post(),
                selected: selected == Some(account.id),
            })
            .collect();

        self.format(&outputs)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pretty() {
        let formatter = JsonFormatter::new(true);
        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();
        assert!(output.contains('\n'));
    }

    #[test]
    fn test_format_compact() {
        let formatter = JsonFormatter::new(false);
        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_login_output_omits_missing_selection() {
        let formatter = JsonFormatter::new(false);
        let user = DashboardUser {
            username: "alice".to_string(),
            is_authenticated: true,
        };
        let output = formatter.format_login(&user, None).unwrap();
        assert_eq!(output, r#"{"authenticated":true,"username":"alice"}"#);
    }
}
