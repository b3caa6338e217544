//! Accounts command - linked Reddit accounts and the active one.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use redditsched_client::CallOptions;
use tracing::{info, warn};

use super::context::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the accounts command.
#[derive(Args)]
pub struct AccountsArgs {
    #[command(subcommand)]
    pub action: AccountsAction,
}

/// Accounts subcommands.
#[derive(Subcommand)]
pub enum AccountsAction {
    /// List linked accounts.
    #[command(visible_alias = "ls")]
    List,

    /// Print the URL that links a new Reddit account.
    Link,

    /// Unlink an account.
    Unlink {
        /// Reddit account ID.
        id: i64,
    },

    /// Make an account the active one.
    Select {
        /// Reddit account ID.
        id: i64,
    },

    /// Show the active account.
    Current,
}

/// Runs the accounts command.
pub async fn run(args: &AccountsArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;
    ctx.require_session()?;

    match &args.action {
        AccountsAction::List => list_accounts(&ctx, cli).await,
        AccountsAction::Link => link_account(&ctx, cli).await,
        AccountsAction::Unlink { id } => unlink_account(&ctx, *id, cli).await,
        AccountsAction::Select { id } => select_account(&ctx, *id, cli).await,
        AccountsAction::Current => current_account(&ctx, cli).await,
    }
}

async fn list_accounts(ctx: &AppContext, cli: &Cli) -> Result<()> {
    let accounts = ctx.load_accounts().await?;
    print_accounts(ctx, &accounts, cli)
}

async fn link_account(ctx: &AppContext, cli: &Cli) -> Result<()> {
    let url = ctx
        .call(
            || ctx.api.get_reddit_login_url(),
            CallOptions::context("starting Reddit login"),
        )
        .await?;

    match cli.format {
        OutputFormat::Text => {
            println!("Open this URL to link a Reddit account:");
            println!();
            println!("  {url}");
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&serde_json::json!({ "login_url": url }))?);
        }
    }

    Ok(())
}

async fn unlink_account(ctx: &AppContext, id: i64, cli: &Cli) -> Result<()> {
    ctx.load_accounts().await?;

    ctx.call(
        || ctx.api.unlink_reddit_account(id),
        CallOptions::context("unlinking the account").success("Account unlinked"),
    )
    .await?;
    ctx.selection.remove_account(id);

    print_accounts(ctx, &ctx.selection.accounts(), cli)
}

async fn select_account(ctx: &AppContext, id: i64, cli: &Cli) -> Result<()> {
    let accounts = ctx.load_accounts().await?;
    let Some(account) = accounts.iter().find(|a| a.id == id) else {
        bail!("No linked Reddit account with ID {id}");
    };
    if !account.reddit_account_status.can_post() {
        warn!(
            account_id = id,
            status = account.reddit_account_status.label(),
            "Selected account cannot post"
        );
    }

    ctx.selection.change_selection(id);
    ctx.selection.settle().await;
    info!(account_id = id, "Active account changed");

    print_accounts(ctx, &accounts, cli)
}

async fn current_account(ctx: &AppContext, cli: &Cli) -> Result<()> {
    ctx.load_accounts().await?;
    let selected = ctx.selection.selected_account();

    match cli.format {
        OutputFormat::Text => match selected {
            Some(account) => {
                let formatter = TextFormatter::new(!cli.no_color);
                println!("{}", formatter.format_account(&account, true));
            }
            None => println!("No Reddit account linked"),
        },
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&selected)?);
        }
    }

    Ok(())
}

fn print_accounts(
    ctx: &AppContext,
    accounts: &[redditsched_core::RedditAccount],
    cli: &Cli,
) -> Result<()> {
    let selected = ctx.selection.selected_account_id();

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_accounts(accounts, selected));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_accounts(accounts, selected)?);
        }
    }

    Ok(())
}
