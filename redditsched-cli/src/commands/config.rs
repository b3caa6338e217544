//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use redditsched_store::{
    CredentialBackend, LogLevel, SettingsStore, default_config_dir, default_settings_path,
    default_storage_path,
};
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Set the API origin.
    SetBaseUrl {
        /// URL such as https://sched.example.com.
        url: String,
    },

    /// Set where tokens are stored.
    SetBackend {
        /// Backend: file, keychain, memory.
        backend: String,
    },

    /// Set the log level used without --verbose.
    SetLogLevel {
        /// Level: error, warn, info, debug, trace.
        level: String,
    },

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => show_paths(cli),
        ConfigAction::SetBaseUrl { url } => set_base_url(url).await,
        ConfigAction::SetBackend { backend } => set_backend(backend).await,
        ConfigAction::SetLogLevel { level } => set_log_level(level).await,
        ConfigAction::Reset => reset_config().await,
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let store = SettingsStore::load_default().await?;
    let saved = store.get().await;
    let settings = store.effective().await;

    match cli.format {
        OutputFormat::Text => {
            println!("RedditSched Configuration");
            println!("{}", "─".repeat(40));
            println!();
            if settings.api_base_url == saved.api_base_url {
                println!("API base URL:       {}", settings.api_base_url);
            } else {
                println!(
                    "API base URL:       {} (from environment, saved: {})",
                    settings.api_base_url, saved.api_base_url
                );
            }
            println!("Request timeout:    {}s", settings.request_timeout_secs);
            println!("Max retries:        {}", settings.max_retries);
            println!("Retry base delay:   {}ms", settings.retry_base_delay_ms);
            println!("Selection debounce: {}ms", settings.selection_debounce_ms);
            println!("Credential backend: {}", settings.credential_backend);
            println!("Log level:          {}", settings.log_level);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            let output = formatter.format(&settings)?;
            println!("{output}");
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let settings_path = default_settings_path();
    let storage_path = default_storage_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Settings file: {}", settings_path.display());
            println!("Storage file:  {}", storage_path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "settings_file": settings_path.display().to_string(),
                "storage_file": storage_path.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn set_base_url(url: &str) -> Result<()> {
    let store = SettingsStore::load_default().await?;
    store.set_api_base_url(url).await?;
    store.save().await?;

    let url = store.api_base_url().await;
    info!(url = %url, "API base URL updated");
    println!("API base URL set to: {url}");

    Ok(())
}

async fn set_backend(backend: &str) -> Result<()> {
    let backend: CredentialBackend = backend.parse().map_err(|_| {
        let names: Vec<String> = CredentialBackend::all()
            .iter()
            .map(ToString::to_string)
            .collect();
        anyhow::anyhow!("Unknown backend: {}. Use: {}", backend, names.join(", "))
    })?;

    let store = SettingsStore::load_default().await?;
    store.set_credential_backend(backend).await;
    store.save().await?;

    info!(backend = %backend, "Credential backend updated");
    println!("Credential backend set to: {backend}");
    println!("Log in again to store tokens in the new backend.");

    Ok(())
}

async fn set_log_level(level: &str) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "error" => LogLevel::Error,
        "warn" | "warning" => LogLevel::Warn,
        "info" => LogLevel::Info,
        "debug" => LogLevel::Debug,
        "trace" => LogLevel::Trace,
        _ => anyhow::bail!("Unknown level: {}. Use: error, warn, info, debug, trace", level),
    };

    let store = SettingsStore::load_default().await?;
    store.set_log_level(level).await;
    store.save().await?;

    info!(level = %level, "Log level updated");
    println!("Log level set to: {level}");

    Ok(())
}

async fn reset_config() -> Result<()> {
    let store = SettingsStore::load_default().await?;
    store.reset().await;
    store.save().await?;

    info!(path = %store.path().display(), "Settings reset");
    println!("Configuration reset to defaults");

    Ok(())
}
