//! Shared per-invocation state for commands.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use redditsched_client::{ApiClient, ApiError, ApiErrorHandler, CallOptions, Notifier};
use redditsched_core::RedditAccount;
use redditsched_store::{
    AccountSelection, AccountStore, KeyValueStore, Session, Settings, SettingsStore, TokenStore,
};
use tracing::debug;

use super::Reported;
use crate::Cli;
use crate::output::TextFormatter;

// ============================================================================
// Terminal Notifier
// ============================================================================

/// Prints notifications to stderr so stdout stays parseable.
pub struct TerminalNotifier {
    formatter: TextFormatter,
    quiet: bool,
    session_ended: AtomicBool,
}

impl TerminalNotifier {
    /// Creates a notifier.
    pub fn new(use_colors: bool, quiet: bool) -> Self {
        Self {
            formatter: TextFormatter::new(use_colors),
            quiet,
            session_ended: AtomicBool::new(false),
        }
    }

    /// Returns true once a session expiry has been reported.
    pub fn session_ended(&self) -> bool {
        self.session_ended.load(Ordering::SeqCst)
    }
}

impl Notifier for TerminalNotifier {
    fn success(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", self.formatter.success_line(message));
        }
    }

    fn error(&self, message: &str, description: &str) {
        eprintln!("{}", self.formatter.error_line(message, description));
    }

    fn session_expired(&self) {
        self.session_ended.store(true, Ordering::SeqCst);
        eprintln!("{}", self.formatter.session_expired_line());
    }
}

// ============================================================================
// App Context
// ============================================================================

/// Everything a command needs to talk to the API.
pub struct AppContext {
    /// Effective settings for this run.
    pub settings: Settings,
    /// API client sharing the session's token store.
    pub api: ApiClient,
    /// Login state.
    pub session: Arc<Session>,
    /// Linked accounts and the active one.
    pub selection: AccountSelection,
    handler: ApiErrorHandler,
    notifier: Arc<TerminalNotifier>,
}

impl AppContext {
    /// Loads settings and opens the configured credential backend.
    pub async fn load(cli: &Cli) -> Result<Self> {
        let store = SettingsStore::load_default().await?;
        let mut settings = store.effective().await;
        if let Some(url) = &cli.base_url {
            settings.api_base_url = url.trim_end_matches('/').to_string();
        }
        settings.validate()?;

        debug!(
            base_url = %settings.api_base_url,
            backend = %settings.credential_backend,
            "Loaded settings"
        );

        let backend = settings.credential_backend.open_default();
        Self::open(settings, backend, cli)
    }

    /// Builds the context over an already opened credential backend.
    pub fn open(settings: Settings, backend: Arc<dyn KeyValueStore>, cli: &Cli) -> Result<Self> {
        let tokens = TokenStore::new(backend.clone());
        let session = Arc::new(Session::new(tokens.clone()));
        let selection =
            AccountSelection::with_debounce(AccountStore::new(backend), settings.selection_debounce());
        let api = ApiClient::from_settings(&settings, tokens)?;

        let notifier = Arc::new(TerminalNotifier::new(!cli.no_color, cli.quiet));
        let handler = ApiErrorHandler::new(session.clone(), notifier.clone());

        Ok(Self {
            settings,
            api,
            session,
            selection,
            handler,
            notifier,
        })
    }

    /// Runs an API call through the error handler.
    ///
    /// Failures have already been reported when this returns an error.
    pub async fn call<F, Fut, T>(&self, call: F, options: CallOptions) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match self.handler.handle_api_call(call, options).await {
            Some(value) => Ok(value),
            None => Err(Reported {
                auth_required: self.notifier.session_ended(),
            }
            .into()),
        }
    }

    /// Ends the session locally and forgets the active account.
    ///
    /// Returns whether a session was active.
    pub fn sign_out(&self) -> bool {
        let was_authenticated = self.session.is_authenticated();
        self.selection.clear();
        self.api.logout();
        self.session.logout_user();
        was_authenticated
    }

    /// Fails unless a session is active.
    pub fn require_session(&self) -> Result<()> {
        if self.session.is_authenticated() {
            return Ok(());
        }
        self.notifier
            .error("Not logged in", "Run `redditsched login` first.");
        Err(Reported {
            auth_required: true,
        }
        .into())
    }

    /// Fetches linked accounts and resolves the active one.
    pub async fn load_accounts(&self) -> Result<Vec<RedditAccount>> {
        let accounts = self
            .call(
                || self.api.get_reddit_accounts(),
                CallOptions::context("loading Reddit accounts"),
            )
            .await?;
        self.selection.initialize(accounts.clone());
        Ok(accounts)
    }

    /// The account to act on: `explicit` if given, else the active one.
    pub async fn resolve_account(&self, explicit: Option<i64>) -> Result<i64> {
        if let Some(id) = explicit {
            return Ok(id);
        }
        self.load_accounts().await?;
        self.selection.selected_account_id().ok_or_else(|| {
            anyhow::anyhow!("No Reddit account linked. Run `redditsched accounts link` first.")
        })
    }
}
