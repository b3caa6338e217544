//! Scheduled and submitted post types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Post Status
// ============================================================================

/// Lifecycle status of a scheduled post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    /// Will be submitted at its next run.
    #[default]
    Active,
    /// Temporarily not submitted.
    Paused,
    /// One-shot post already submitted, or schedule ended.
    Completed,
    /// Last submission failed.
    Error,
    /// Unrecognized status from a newer server.
    #[serde(other)]
    Unknown,
}

impl PostStatus {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "error" => Ok(Self::Error),
            other => Err(format!("Unknown post status: {other}")),
        }
    }
}

// ============================================================================
// Scheduled Post
// ============================================================================

/// A post scheduled for submission, one-shot or recurring via cron.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPost {
    /// Server-side identifier.
    pub id: i64,
    /// Owning user id.
    #[serde(default)]
    pub user: Option<i64>,
    /// Owning username.
    #[serde(default)]
    pub username: Option<String>,
    /// Linked account used for posting.
    pub reddit_account: i64,
    /// Username of the linked account.
    #[serde(default)]
    pub reddit_account_username: Option<String>,
    /// Target subreddit (without `r/`).
    pub subreddit: String,
    /// Post title.
    pub title: String,
    /// Post body.
    #[serde(default)]
    pub selftext: String,
    /// Cron expression, `None` for a one-shot post.
    #[serde(default)]
    pub cron_schedule: Option<String>,
    /// Last date the schedule may fire.
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Next computed run time.
    #[serde(default)]
    pub next_run: Option<DateTime<Utc>>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: PostStatus,
    /// Error from the most recent failed submission.
    #[serde(default)]
    pub last_submission_error: Option<String>,
    /// When the last run started.
    #[serde(default)]
    pub last_run_started: Option<DateTime<Utc>>,
    /// When the last run finished.
    #[serde(default)]
    pub last_run_finished: Option<DateTime<Utc>>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ScheduledPost {
    /// Returns true if the post repeats on a cron schedule.
    pub fn is_recurring(&self) -> bool {
        self.cron_schedule.as_deref().is_some_and(|c| !c.trim().is_empty())
    }
}

/// Body for creating a scheduled post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPostData {
    /// Linked account used for posting.
    pub reddit_account: i64,
    /// Target subreddit.
    pub subreddit: String,
    /// Post title.
    pub title: String,
    /// Post body.
    pub selftext: String,
    /// Cron expression, `None` for a one-shot post.
    pub cron_schedule: Option<String>,
    /// Last date the schedule may fire.
    pub end_date: Option<DateTime<Utc>>,
}

/// Partial update for a scheduled post. Unset fields are omitted from the
/// PATCH body; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScheduledPostUpdate {
    /// Linked account used for posting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reddit_account: Option<i64>,
    /// Target subreddit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subreddit: Option<String>,
    /// Post title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Post body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selftext: Option<String>,
    /// Cron expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_schedule: Option<Option<String>>,
    /// End date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    /// Lifecycle status (pause / resume).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
}

impl ScheduledPostUpdate {
    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// Submitted Post
// ============================================================================

/// A single submission of a scheduled post to Reddit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedPost {
    /// Server-side identifier.
    pub id: i64,
    /// Originating scheduled post, if it still exists.
    #[serde(default)]
    pub scheduled_post: Option<i64>,
    /// Title of the originating scheduled post.
    #[serde(default)]
    pub scheduled_post_title: Option<String>,
    /// Subreddit the submission went to.
    #[serde(default)]
    pub subreddit: Option<String>,
    /// Reddit's id for the submission.
    #[serde(default)]
    pub reddit_post_id: Option<String>,
    /// Permalink.
    #[serde(default)]
    pub reddit_url: Option<String>,
    /// Submission time.
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    /// Removal time, if removed.
    #[serde(default)]
    pub removed_at: Option<DateTime<Utc>>,
    /// Who removed it.
    #[serde(default)]
    pub removed_by: Option<String>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SubmittedPost {
    /// Returns true if the submission was removed from Reddit.
    pub fn is_removed(&self) -> bool {
        self.removed_at.is_some()
    }
}

/// Result of converting natural-language schedule text to cron.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronConversion {
    /// Cron expression.
    pub cron_schedule: String,
    /// The input text, echoed back.
    pub schedule_text: String,
}
