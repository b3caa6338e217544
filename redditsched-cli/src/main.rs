// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! `RedditSched` CLI - schedule Reddit posts from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Log in and show the dashboard
//! redditsched login --username alice
//! redditsched
//!
//! # Schedule a recurring post on the selected account
//! redditsched posts create --subreddit rust --title "Weekly thread" \
//!     --schedule "every monday at 9am"
//!
//! # Switch the active Reddit account
//! redditsched accounts select 12
//!
//! # JSON output
//! redditsched posts list --format json --pretty
//!
//! # Point at another server
//! redditsched --base-url https://sched.example.com dashboard
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use redditsched_store::persistence::load_json_sync;
use redditsched_store::{LogLevel, Settings, default_settings_path};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{Reported, accounts, auth, config, cron, dashboard, posts, submissions};

// ============================================================================
// CLI Definition
// ============================================================================

/// `RedditSched` CLI - Reddit post scheduling.
#[derive(Parser)]
#[command(name = "redditsched")]
#[command(about = "Reddit post scheduling CLI")]
#[command(long_about = r#"
RedditSched schedules posts to Reddit through a RedditSched server.

Posts are submitted from one of your linked Reddit accounts, either once
or on a recurring cron schedule.

Examples:
  redditsched login --username alice    # Start a session
  redditsched                           # Dashboard
  redditsched posts list                # Scheduled posts
  redditsched accounts select 12        # Switch Reddit account
  redditsched cron "every day at noon"  # Preview a schedule
"#)]
#[command(version)]
#[command(author = "RedditSched Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, shows the dashboard.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// API origin for this invocation, overriding the configured one.
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session tokens.
    Login(auth::LoginArgs),

    /// Create a new user.
    Signup(auth::SignupArgs),

    /// End the session and forget stored tokens.
    Logout,

    /// Show the logged-in user.
    Whoami,

    /// Show the dashboard (default if no command specified).
    #[command(visible_alias = "d")]
    Dashboard,

    /// Manage scheduled posts.
    #[command(visible_alias = "p")]
    Posts(posts::PostsArgs),

    /// Inspect submitted posts.
    #[command(visible_alias = "s")]
    Submissions(submissions::SubmissionsArgs),

    /// Manage linked Reddit accounts.
    #[command(visible_alias = "a")]
    Accounts(accounts::AccountsArgs),

    /// Convert a plain-language schedule to a cron expression.
    Cron(cron::CronArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Not logged in, or the session expired.
    AuthRequired = 2,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("redditsched=debug,info")
    } else {
        EnvFilter::new(format!("redditsched={}", configured_log_level()))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Log level saved in the settings file, if it can be read.
fn configured_log_level() -> LogLevel {
    load_json_sync::<Settings>(&default_settings_path())
        .ok()
        .flatten()
        .map(|settings| settings.log_level)
        .unwrap_or_default()
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Login(args)) => auth::login(args, &cli).await,
        Some(Commands::Signup(args)) => auth::signup(args, &cli).await,
        Some(Commands::Logout) => auth::logout(&cli).await,
        Some(Commands::Whoami) => auth::whoami(&cli).await,
        Some(Commands::Dashboard) | None => dashboard::run(&cli).await,
        Some(Commands::Posts(args)) => posts::run(args, &cli).await,
        Some(Commands::Submissions(args)) => submissions::run(args, &cli).await,
        Some(Commands::Accounts(args)) => accounts::run(args, &cli).await,
        Some(Commands::Cron(args)) => cron::run(args, &cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli).await,
    };

    if let Err(e) = result {
        let code = match e.downcast_ref::<Reported>() {
            // Already shown to the user by the notifier
            Some(reported) if reported.auth_required => ExitCode::AuthRequired,
            Some(_) => ExitCode::Error,
            None => {
                if !cli.quiet {
                    eprintln!("Error: {e}");
                }
                ExitCode::Error
            }
        };
        std::process::exit(code as i32);
    }

    Ok(())
}
