//! Text output formatting with colors.

use chrono::{DateTime, Duration, Local, Utc};
use redditsched_core::{
    AccountStatus, CronConversion, DashboardData, PostOverview, PostStatus, RedditAccount,
    ScheduledPost, SubmittedPost, UserResponse,
};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const BLUE: &str = "\x1b[34m";
const CYAN: &str = "\x1b[36m";

// Markers
const ACTIVE_MARKER: char = '●';
const INACTIVE_MARKER: char = '○';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    title_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            title_width: 40,
        }
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// A success notification.
    pub fn success_line(&self, message: &str) -> String {
        format!("{} {}", self.green("✓"), message)
    }

    /// An error notification with an optional description.
    pub fn error_line(&self, message: &str, description: &str) -> String {
        let mut line = format!("{} {}", self.red("✗"), self.bold(message));
        if !description.is_empty() && description != message {
            line.push_str(&format!("\n  {}", self.dim(description)));
        }
        line
    }

    /// Shown when the session ended and the user has to log in again.
    pub fn session_expired_line(&self) -> String {
        format!(
            "{} Your session has expired. Run `redditsched login` to continue.",
            self.yellow("!")
        )
    }

    // ========================================================================
    // User & Dashboard
    // ========================================================================

    /// Formats the logged-in user.
    pub fn format_user(&self, response: &UserResponse, server: &str) -> String {
        let mut lines = Vec::new();

        match &response.user {
            Some(user) => {
                lines.push(self.bold(&user.username));
                if let Some(email) = &user.email {
                    lines.push(format!("Email:   {}", self.cyan(email)));
                }
                let name = [user.first_name.as_deref(), user.last_name.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                if !name.is_empty() {
                    lines.push(format!("Name:    {name}"));
                }
                if let Some(linked) = user.is_reddit_linked {
                    let linked = if linked { "yes" } else { "no" };
                    lines.push(format!("Reddit:  {linked}"));
                }
            }
            None if response.authenticated => {
                lines.push("Logged in (profile unavailable)".to_string());
            }
            None => lines.push("Not logged in".to_string()),
        }

        lines.push(format!("Server:  {}", self.dim(server)));
        lines.join("\n")
    }

    /// Formats the dashboard summary.
    pub fn format_dashboard(
        &self,
        dashboard: &DashboardData,
        selected: Option<&RedditAccount>,
        overview: &PostOverview,
        posts: &[ScheduledPost],
    ) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Welcome, {}", self.bold(&dashboard.user.username)));
        lines.push("─".repeat(self.title_width));

        if dashboard.reddit_accounts.is_linked {
            lines.push(format!(
                "Reddit accounts: {}",
                dashboard.reddit_accounts.count
            ));
            if let Some(account) = selected {
                lines.push(format!(
                    "Active:          u/{} ({})",
                    self.cyan(&account.reddit_username),
                    self.status_badge(account.reddit_account_status)
                ));
            }
        } else {
            lines.push(self.yellow("No Reddit account linked."));
            lines.push(format!(
                "Run {} to link one.",
                self.bold("redditsched accounts link")
            ));
        }

        lines.push(String::new());
        lines.extend(self.format_overview(overview));
        lines.push(String::new());
        lines.push(self.format_posts(posts));
        lines.join("\n")
    }

    /// Formats the post overview lines.
    pub fn format_overview(&self, overview: &PostOverview) -> Vec<String> {
        let month = if overview.this_month > 0 {
            self.green(&format!("+{} this month", overview.this_month))
        } else {
            self.dim("No posts this month")
        };
        let errors = if overview.errors > 0 {
            self.red(&overview.errors.to_string())
        } else {
            overview.errors.to_string()
        };

        vec![
            format!("Total posts:     {} ({})", overview.total, month),
            format!("Active posts:    {}", overview.active),
            format!("Failed posts:    {errors}"),
            format!("Success rate:    {}%", overview.success_rate),
        ]
    }

    // ========================================================================
    // Posts
    // ========================================================================

    /// Formats a list of scheduled posts, one per line.
    pub fn format_posts(&self, posts: &[ScheduledPost]) -> String {
        if posts.is_empty() {
            return self.dim("No scheduled posts");
        }

        let now = Utc::now();
        let mut lines = vec![self.bold(&format!("Scheduled posts ({})", posts.len()))];
        for post in posts {
            let when = match post.next_run {
                Some(next_run) => self.format_relative(next_run, now),
                None => "-".to_string(),
            };
            lines.push(format!(
                "{:>5}  {}  r/{:<16} {}  {}",
                post.id,
                self.post_status(post.status),
                post.subreddit,
                truncate(&post.title, self.title_width),
                self.dim(&when),
            ));
        }
        lines.join("\n")
    }

    /// Formats one scheduled post in detail.
    pub fn format_post(&self, post: &ScheduledPost) -> String {
        let now = Utc::now();
        let mut lines = Vec::new();

        lines.push(format!("{} {}", self.bold(&post.title), self.dim(&format!("#{}", post.id))));
        lines.push(format!("Subreddit: r/{}", post.subreddit));
        match &post.reddit_account_username {
            Some(username) => lines.push(format!("Account:   u/{}", self.cyan(username))),
            None => lines.push(format!("Account:   #{}", post.reddit_account)),
        }
        lines.push(format!("Status:    {}", self.post_status(post.status)));

        match &post.cron_schedule {
            Some(cron) if post.is_recurring() => lines.push(format!("Schedule:  {cron}")),
            _ => lines.push("Schedule:  once".to_string()),
        }
        if let Some(next_run) = post.next_run {
            lines.push(format!(
                "Next run:  {} ({})",
                format_local(next_run),
                self.format_relative(next_run, now)
            ));
        }
        if let Some(end_date) = post.end_date {
            lines.push(format!("Ends:      {}", format_local(end_date)));
        }
        if let Some(error) = &post.last_submission_error {
            lines.push(format!("Last error: {}", self.red(error)));
        }
        if !post.selftext.is_empty() {
            lines.push(String::new());
            lines.push(post.selftext.clone());
        }

        lines.join("\n")
    }

    /// Formats a cron conversion.
    pub fn format_cron(&self, conversion: &CronConversion) -> String {
        format!(
            "{}\n{}",
            self.bold(&conversion.cron_schedule),
            self.dim(&conversion.schedule_text)
        )
    }

    // ========================================================================
    // Submissions
    // ========================================================================

    /// Formats a list of submissions, one per line.
    pub fn format_submissions(&self, submissions: &[SubmittedPost]) -> String {
        if submissions.is_empty() {
            return self.dim("No submissions yet");
        }

        let mut lines = vec![self.bold(&format!("Submissions ({})", submissions.len()))];
        for submission in submissions {
            let when = submission
                .submitted_at
                .map_or_else(|| "-".to_string(), format_local);
            let state = if submission.is_removed() {
                self.red("removed")
            } else {
                self.green("live")
            };
            lines.push(format!(
                "{:>5}  {}  {}  {}",
                submission.id,
                when,
                state,
                submission.reddit_url.as_deref().unwrap_or("")
            ));
        }
        lines.join("\n")
    }

    /// Formats one submission in detail.
    pub fn format_submission(&self, submission: &SubmittedPost) -> String {
        let mut lines = Vec::new();

        let title = submission
            .scheduled_post_title
            .as_deref()
            .unwrap_or("Submission");
        lines.push(format!("{} {}", self.bold(title), self.dim(&format!("#{}", submission.id))));
        if let Some(subreddit) = &submission.subreddit {
            lines.push(format!("Subreddit: r/{subreddit}"));
        }
        if let Some(submitted_at) = submission.submitted_at {
            lines.push(format!("Submitted: {}", format_local(submitted_at)));
        }
        if let Some(url) = &submission.reddit_url {
            lines.push(format!("URL:       {}", self.blue(url)));
        }
        if submission.is_removed() {
            let by = submission.removed_by.as_deref().unwrap_or("unknown");
            let at = submission
                .removed_at
                .map_or_else(|| "-".to_string(), format_local);
            lines.push(format!("Removed:   {} by {}", self.red(&at), by));
        }

        lines.join("\n")
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Formats linked accounts, marking the active one.
    pub fn format_accounts(&self, accounts: &[RedditAccount], selected: Option<i64>) -> String {
        if accounts.is_empty() {
            return self.dim("No Reddit accounts linked");
        }

        accounts
            .iter()
            .map(|account| self.format_account(account, selected == Some(account.id)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats one account line.
    pub fn format_account(&self, account: &RedditAccount, active: bool) -> String {
        let (marker, name) = if active {
            (
                self.green(&ACTIVE_MARKER.to_string()),
                self.bold(&format!("u/{}", account.reddit_username)),
            )
        } else {
            (
                self.dim(&INACTIVE_MARKER.to_string()),
                format!("u/{}", account.reddit_username),
            )
        };
        format!(
            "{} {:>5}  {}  {}",
            marker,
            account.id,
            name,
            self.status_badge(account.reddit_account_status)
        )
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Relative description of `at` as seen from `now`.
    pub fn format_relative(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let (diff, future) = if at >= now { (at - now, true) } else { (now - at, false) };

        let span = if diff < Duration::minutes(1) {
            return if future { "now".to_string() } else { "just now".to_string() };
        } else if diff < Duration::hours(1) {
            format!("{}m", diff.num_minutes())
        } else if diff < Duration::days(1) {
            let hours = diff.num_hours();
            let mins = diff.num_minutes() % 60;
            if mins > 0 {
                format!("{hours}h {mins}m")
            } else {
                format!("{hours}h")
            }
        } else {
            let days = diff.num_days();
            format!("{} day{}", days, if days == 1 { "" } else { "s" })
        };

        if future { format!("in {span}") } else { format!("{span} ago") }
    }

    fn post_status(&self, status: PostStatus) -> String {
        let label = format!("{:<9}", status.as_str());
        match status {
            PostStatus::Active => self.green(&label),
            PostStatus::Paused => self.yellow(&label),
            PostStatus::Completed => self.dim(&label),
            PostStatus::Error => self.red(&label),
            PostStatus::Unknown => label,
        }
    }

    fn status_badge(&self, status: AccountStatus) -> String {
        if status.can_post() {
            self.green(status.label())
        } else {
            self.red(status.label())
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn blue(&self, text: &str) -> String {
        self.paint(BLUE, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

fn format_local(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Shortens `text` to `width` characters, ending in an ellipsis.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return format!("{text:<width$}");
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, hour, min, 0).unwrap()
    }

    #[test]
    fn test_relative_future() {
        let formatter = TextFormatter::new(false);
        assert_eq!(formatter.format_relative(at(12, 30), at(12, 0)), "in 30m");
        assert_eq!(formatter.format_relative(at(15, 5), at(12, 0)), "in 3h 5m");
        assert_eq!(formatter.format_relative(at(14, 0), at(12, 0)), "in 2h");
    }

    #[test]
    fn test_relative_past() {
        let formatter = TextFormatter::new(false);
        assert_eq!(formatter.format_relative(at(11, 50), at(12, 0)), "10m ago");
        assert_eq!(formatter.format_relative(at(12, 0), at(12, 0)), "now");
    }

    #[test]
    fn test_relative_days() {
        let formatter = TextFormatter::new(false);
        let later = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        assert_eq!(formatter.format_relative(later, at(12, 0)), "in 2 days");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 8), "short   ");
        assert_eq!(truncate("a much longer title", 8), "a much …");
    }

    #[test]
    fn test_paint_respects_colors() {
        assert_eq!(TextFormatter::new(false).red("x"), "x");
        assert_eq!(TextFormatter::new(true).red("x"), format!("{RED}x{RESET}"));
    }
}
