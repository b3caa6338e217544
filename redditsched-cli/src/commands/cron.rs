//! Cron command - preview a plain-language schedule.

use anyhow::Result;
use clap::Args;
use redditsched_client::CallOptions;

use super::context::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the cron command.
#[derive(Args)]
pub struct CronArgs {
    /// Schedule in plain words, e.g. "every weekday at 9am".
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

/// Runs the cron command.
pub async fn run(args: &CronArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;
    ctx.require_session()?;

    let text = args.text.join(" ");
    let conversion = ctx
        .call(
            || ctx.api.convert_text_to_cron(&text),
            CallOptions::context("converting the schedule"),
        )
        .await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_cron(&conversion));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&conversion)?);
        }
    }

    Ok(())
}
