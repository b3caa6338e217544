//! Posts command - manage scheduled posts.

use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Subcommand};
use redditsched_client::CallOptions;
use redditsched_core::{PostStatus, ScheduledPostData, ScheduledPostUpdate};
use tracing::debug;

use super::context::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the posts command.
#[derive(Args)]
pub struct PostsArgs {
    #[command(subcommand)]
    pub action: PostsAction,
}

/// Posts subcommands.
#[derive(Subcommand)]
pub enum PostsAction {
    /// List scheduled posts for the active account.
    #[command(visible_alias = "ls")]
    List {
        /// Show posts of every linked account.
        #[arg(long)]
        all: bool,
    },

    /// Show one scheduled post.
    Show {
        /// Post ID.
        id: i64,
    },

    /// Schedule a new post.
    Create(CreateArgs),

    /// Change a scheduled post.
    Update(UpdateArgs),

    /// Stop submitting a post until resumed.
    Pause {
        /// Post ID.
        id: i64,
    },

    /// Resume a paused post.
    Resume {
        /// Post ID.
        id: i64,
    },

    /// Delete a scheduled post.
    #[command(visible_alias = "rm")]
    Delete {
        /// Post ID.
        id: i64,
    },

    /// List submissions made for a post.
    Submissions {
        /// Post ID.
        id: i64,
    },
}

/// Schedule options shared by create and update.
#[derive(Args)]
pub struct ScheduleArgs {
    /// Cron expression, e.g. "0 9 * * 1".
    #[arg(long, conflicts_with = "schedule")]
    pub cron: Option<String>,

    /// Plain-language schedule, converted by the server.
    #[arg(long)]
    pub schedule: Option<String>,

    /// Stop recurring after this date (YYYY-MM-DD or RFC 3339).
    #[arg(long, value_parser = parse_end_date)]
    pub end_date: Option<DateTime<Utc>>,
}

/// Arguments for creating a post.
#[derive(Args)]
pub struct CreateArgs {
    /// Subreddit, without the r/ prefix.
    #[arg(long)]
    pub subreddit: String,

    /// Post title.
    #[arg(long)]
    pub title: String,

    /// Post body.
    #[arg(long, default_value = "")]
    pub body: String,

    /// Reddit account ID. Defaults to the active account.
    #[arg(long)]
    pub account: Option<i64>,

    #[command(flatten)]
    pub schedule: ScheduleArgs,
}

/// Arguments for updating a post.
#[derive(Args)]
pub struct UpdateArgs {
    /// Post ID.
    pub id: i64,

    /// New subreddit.
    #[arg(long)]
    pub subreddit: Option<String>,

    /// New title.
    #[arg(long)]
    pub title: Option<String>,

    /// New body.
    #[arg(long)]
    pub body: Option<String>,

    /// Move the post to another Reddit account.
    #[arg(long)]
    pub account: Option<i64>,

    /// New status.
    #[arg(long, value_parser = parse_status)]
    pub status: Option<PostStatus>,

    /// Submit once instead of on a schedule.
    #[arg(long, conflicts_with_all = ["cron", "schedule"])]
    pub once: bool,

    /// Remove the end date.
    #[arg(long, conflicts_with = "end_date")]
    pub no_end_date: bool,

    #[command(flatten)]
    pub schedule: ScheduleArgs,
}

/// Runs the posts command.
pub async fn run(args: &PostsArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;
    ctx.require_session()?;

    match &args.action {
        PostsAction::List { all } => list_posts(&ctx, *all, cli).await,
        PostsAction::Show { id } => show_post(&ctx, *id, cli).await,
        PostsAction::Create(create) => create_post(&ctx, create, cli).await,
        PostsAction::Update(update) => update_post(&ctx, update, cli).await,
        PostsAction::Pause { id } => set_status(&ctx, *id, PostStatus::Paused, cli).await,
        PostsAction::Resume { id } => set_status(&ctx, *id, PostStatus::Active, cli).await,
        PostsAction::Delete { id } => delete_post(&ctx, *id, cli).await,
        PostsAction::Submissions { id } => super::submissions::list(&ctx, Some(*id), cli).await,
    }
}

async fn list_posts(ctx: &AppContext, all: bool, cli: &Cli) -> Result<()> {
    let mut posts = ctx
        .call(
            || ctx.api.get_scheduled_posts(),
            CallOptions::context("loading scheduled posts"),
        )
        .await?;

    if !all {
        ctx.load_accounts().await?;
        if let Some(account) = ctx.selection.selected_account_id() {
            posts.retain(|post| post.reddit_account == account);
        }
    }

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_posts(&posts));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&posts)?);
        }
    }

    Ok(())
}

async fn show_post(ctx: &AppContext, id: i64, cli: &Cli) -> Result<()> {
    let post = ctx
        .call(
            || ctx.api.get_scheduled_post(id),
            CallOptions::context("loading the post"),
        )
        .await?;
    print_post(&post, cli)
}

async fn create_post(ctx: &AppContext, args: &CreateArgs, cli: &Cli) -> Result<()> {
    let reddit_account = ctx.resolve_account(args.account).await?;
    let cron_schedule = resolve_schedule(ctx, &args.schedule).await?;

    let data = ScheduledPostData {
        reddit_account,
        subreddit: normalize_subreddit(&args.subreddit),
        title: args.title.clone(),
        selftext: args.body.clone(),
        cron_schedule,
        end_date: args.schedule.end_date,
    };
    debug!(reddit_account, subreddit = %data.subreddit, "Creating scheduled post");

    let post = ctx
        .call(
            || ctx.api.create_scheduled_post(&data),
            CallOptions::context("creating post").success("Post scheduled"),
        )
        .await?;
    print_post(&post, cli)
}

async fn update_post(ctx: &AppContext, args: &UpdateArgs, cli: &Cli) -> Result<()> {
    let cron_schedule = if args.once {
        Some(None)
    } else {
        resolve_schedule(ctx, &args.schedule).await?.map(Some)
    };
    let end_date = if args.no_end_date {
        Some(None)
    } else {
        args.schedule.end_date.map(Some)
    };

    let update = ScheduledPostUpdate {
        reddit_account: args.account,
        subreddit: args.subreddit.as_deref().map(normalize_subreddit),
        title: args.title.clone(),
        selftext: args.body.clone(),
        cron_schedule,
        end_date,
        status: args.status,
    };
    if update.is_empty() {
        bail!("Nothing to update. Pass at least one field to change.");
    }

    let post = ctx
        .call(
            || ctx.api.update_scheduled_post(args.id, &update),
            CallOptions::context("updating post").success("Post updated"),
        )
        .await?;
    print_post(&post, cli)
}

async fn set_status(ctx: &AppContext, id: i64, status: PostStatus, cli: &Cli) -> Result<()> {
    let update = ScheduledPostUpdate {
        status: Some(status),
        ..ScheduledPostUpdate::default()
    };
    let message = match status {
        PostStatus::Paused => "Post paused",
        _ => "Post resumed",
    };

    let post = ctx
        .call(
            || ctx.api.update_scheduled_post(id, &update),
            CallOptions::context("updating post").success(message),
        )
        .await?;
    print_post(&post, cli)
}

async fn delete_post(ctx: &AppContext, id: i64, cli: &Cli) -> Result<()> {
    ctx.call(
        || ctx.api.delete_scheduled_post(id),
        CallOptions::context("deleting post").success("Post deleted"),
    )
    .await?;

    if cli.format == OutputFormat::Json {
        let formatter = JsonFormatter::new(cli.pretty);
        println!("{}", formatter.format(&serde_json::json!({ "deleted": id }))?);
    }

    Ok(())
}

fn print_post(post: &redditsched_core::ScheduledPost, cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_post(post));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(post)?);
        }
    }
    Ok(())
}

/// Cron expression for the given options, converting plain text through the API.
async fn resolve_schedule(ctx: &AppContext, args: &ScheduleArgs) -> Result<Option<String>> {
    if let Some(cron) = &args.cron {
        return Ok(Some(cron.trim().to_string()));
    }
    let Some(text) = &args.schedule else {
        return Ok(None);
    };

    let conversion = ctx
        .call(
            || ctx.api.convert_text_to_cron(text),
            CallOptions::context("converting the schedule"),
        )
        .await?;
    debug!(cron = %conversion.cron_schedule, "Converted schedule");
    Ok(Some(conversion.cron_schedule))
}

fn normalize_subreddit(name: &str) -> String {
    let name = name.trim();
    name.strip_prefix("r/")
        .or_else(|| name.strip_prefix("/r/"))
        .unwrap_or(name)
        .to_string()
}

fn parse_end_date(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Ok(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid date '{value}', expected YYYY-MM-DD or RFC 3339"))
}

fn parse_status(value: &str) -> Result<PostStatus, String> {
    value.parse()
}
