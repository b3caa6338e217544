//! Submissions command - posts already sent to Reddit.

use anyhow::Result;
use clap::{Args, Subcommand};
use redditsched_client::CallOptions;

use super::context::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the submissions command.
#[derive(Args)]
pub struct SubmissionsArgs {
    #[command(subcommand)]
    pub action: SubmissionsAction,
}

/// Submissions subcommands.
#[derive(Subcommand)]
pub enum SubmissionsAction {
    /// List submissions.
    #[command(visible_alias = "ls")]
    List {
        /// Only submissions of this scheduled post.
        #[arg(long)]
        post: Option<i64>,
    },

    /// Show one submission.
    Show {
        /// Submission ID.
        id: i64,
    },
}

/// Runs the submissions command.
pub async fn run(args: &SubmissionsArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;
    ctx.require_session()?;

    match &args.action {
        SubmissionsAction::List { post } => list(&ctx, *post, cli).await,
        SubmissionsAction::Show { id } => show(&ctx, *id, cli).await,
    }
}

/// Lists submissions, optionally for one scheduled post.
pub async fn list(ctx: &AppContext, post: Option<i64>, cli: &Cli) -> Result<()> {
    let submissions = ctx
        .call(
            || ctx.api.get_submitted_posts(post),
            CallOptions::context("loading submissions"),
        )
        .await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_submissions(&submissions));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&submissions)?);
        }
    }

    Ok(())
}

async fn show(ctx: &AppContext, id: i64, cli: &Cli) -> Result<()> {
    let submission = ctx
        .call(
            || ctx.api.get_submitted_post(id),
            CallOptions::context("loading the submission"),
        )
        .await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_submission(&submission));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&submission)?);
        }
    }

    Ok(())
}
