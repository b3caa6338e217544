//! Dashboard command - user, linked accounts and upcoming posts.

use anyhow::Result;
use chrono::Local;
use redditsched_client::CallOptions;
use redditsched_core::PostOverview;

use super::context::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the dashboard command.
pub async fn run(cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;
    ctx.require_session()?;

    let (dashboard, posts) = ctx
        .call(
            || async {
                futures::try_join!(ctx.api.get_dashboard_data(), ctx.api.get_scheduled_posts())
            },
            CallOptions::context("loading dashboard"),
        )
        .await?;

    ctx.selection.initialize(dashboard.accounts());
    let selected = ctx.selection.selected_account();
    let posts: Vec<_> = match &selected {
        Some(account) => posts
            .into_iter()
            .filter(|post| post.reddit_account == account.id)
            .collect(),
        None => posts,
    };
    let overview = PostOverview::compute(&posts, &Local::now());

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!(
                "{}",
                formatter.format_dashboard(&dashboard, selected.as_ref(), &overview, &posts)
            );
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!(
                "{}",
                formatter.format_dashboard(&dashboard, selected.as_ref(), &overview, &posts)?
            );
        }
    }

    Ok(())
}
