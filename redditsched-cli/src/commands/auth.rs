//! Session commands - login, signup, logout, whoami.

use std::io::{BufRead, Write};

use anyhow::{Result, bail};
use clap::Args;
use redditsched_client::CallOptions;
use redditsched_core::{LoginCredentials, SignupData};
use tracing::info;

use super::context::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the login command.
#[derive(Args)]
pub struct LoginArgs {
    /// Username to log in with.
    #[arg(long, short = 'u', conflicts_with = "email", required_unless_present = "email")]
    pub username: Option<String>,

    /// Email to log in with.
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Password. Read from stdin if omitted.
    #[arg(long)]
    pub password: Option<String>,
}

/// Arguments for the signup command.
#[derive(Args)]
pub struct SignupArgs {
    /// Username.
    #[arg(long, short = 'u')]
    pub username: String,

    /// Email address.
    #[arg(long, short = 'e')]
    pub email: String,

    /// Password. Read from stdin (twice) if omitted.
    #[arg(long)]
    pub password: Option<String>,

    /// First name.
    #[arg(long)]
    pub first_name: Option<String>,

    /// Last name.
    #[arg(long)]
    pub last_name: Option<String>,
}

/// Runs the login command.
pub async fn login(args: &LoginArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;

    let password = match &args.password {
        Some(password) => password.clone(),
        None => prompt("Password: ")?,
    };
    let credentials = match (&args.username, &args.email) {
        (Some(username), _) => LoginCredentials::with_username(username, password),
        (None, Some(email)) => LoginCredentials::with_email(email, password),
        (None, None) => bail!("Pass --username or --email"),
    };

    // A 401 here means bad credentials, not an expired session
    if let Err(e) = ctx.api.login(&credentials).await {
        bail!("Login failed: {e}");
    }
    ctx.session.login_user();

    let dashboard = ctx
        .call(
            || ctx.api.get_dashboard_data(),
            CallOptions::context("loading dashboard"),
        )
        .await?;
    ctx.selection.initialize(dashboard.accounts());
    info!(username = %dashboard.user.username, "Logged in");

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!(
                "{}",
                formatter.success_line(&format!("Logged in as {}", dashboard.user.username))
            );
            if let Some(account) = ctx.selection.selected_account() {
                println!("Active Reddit account: u/{}", account.reddit_username);
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!(
                "{}",
                formatter.format_login(&dashboard.user, ctx.selection.selected_account_id())?
            );
        }
    }

    Ok(())
}

/// Runs the signup command.
pub async fn signup(args: &SignupArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;

    let (password, password_confirm) = match &args.password {
        Some(password) => (password.clone(), password.clone()),
        None => (prompt("Password: ")?, prompt("Confirm password: ")?),
    };
    let data = SignupData {
        username: args.username.clone(),
        email: args.email.clone(),
        password,
        password_confirm,
        first_name: args.first_name.clone(),
        last_name: args.last_name.clone(),
    };
    if !data.passwords_match() {
        bail!("Passwords do not match");
    }

    let response = ctx
        .call(
            || ctx.api.signup(&data),
            CallOptions::context("creating your account"),
        )
        .await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            let message = response
                .message
                .clone()
                .unwrap_or_else(|| "Account created".to_string());
            println!("{}", formatter.success_line(&message));
            println!("Log in with: redditsched login --username {}", args.username);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&response)?);
        }
    }

    Ok(())
}

/// Runs the logout command.
pub async fn logout(cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;
    let was_authenticated = ctx.sign_out();

    match cli.format {
        OutputFormat::Text => {
            if was_authenticated {
                println!("Logged out");
            } else {
                println!("Not logged in");
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!(
                "{}",
                formatter.format(&serde_json::json!({ "logged_out": was_authenticated }))?
            );
        }
    }

    Ok(())
}

/// Runs the whoami command.
pub async fn whoami(cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli).await?;
    ctx.require_session()?;

    let response = ctx
        .call(|| ctx.api.get_user(), CallOptions::context("loading your profile"))
        .await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_user(&response, &ctx.settings.api_base_url));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&response)?);
        }
    }

    Ok(())
}

/// Prompts on stderr and reads one line from stdin.
fn prompt(label: &str) -> Result<String> {
    eprint!("{label}");
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let value = line.trim_end_matches(['\r', '\n']).to_string();
    if value.is_empty() {
        bail!("No input given");
    }
    Ok(value)
}
