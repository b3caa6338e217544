//! User preferences store.
//!
//! Manages client settings with persistence and change notification.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::keychain::KeychainStore;
use crate::kv::{FileStore, KeyValueStore, MemoryStore};
use crate::persistence::{default_settings_path, default_storage_path, load_json, save_json};

/// Environment variable overriding [`Settings::api_base_url`].
pub const API_BASE_URL_ENV: &str = "REDDITSCHED_API_BASE_URL";

/// Default API origin.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

// ============================================================================
// Settings Types
// ============================================================================

/// Client preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Origin of the scheduling API.
    pub api_base_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Retries for idempotent reads.
    pub max_retries: u32,

    /// Base of the exponential retry backoff, in milliseconds.
    pub retry_base_delay_ms: u64,

    /// Quiet period before an account switch applies, in milliseconds.
    pub selection_debounce_ms: u64,

    /// Where tokens and the selected account are kept.
    pub credential_backend: CredentialBackend,

    /// Log level.
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 10,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            selection_debounce_ms: 300,
            credential_backend: CredentialBackend::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Settings {
    /// Returns the request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the retry backoff base.
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Returns the account selection debounce period.
    pub fn selection_debounce(&self) -> Duration {
        Duration::from_millis(self.selection_debounce_ms)
    }

    /// Applies overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    #[must_use]
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            debug!(url = %url, "API base URL overridden from environment");
            self.api_base_url = url.trim().to_string();
        }
        self
    }

    /// Checks that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), StoreError> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(StoreError::Config(format!(
                "api_base_url must be an http(s) URL, got '{url}'"
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(StoreError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Storage medium for credentials and the selected account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CredentialBackend {
    /// JSON file next to the settings, owner-only permissions.
    #[default]
    File,
    /// System keychain.
    Keychain,
    /// Process memory; nothing survives exit.
    Memory,
}

impl CredentialBackend {
    /// All available backends.
    pub fn all() -> &'static [CredentialBackend] {
        &[
            CredentialBackend::File,
            CredentialBackend::Keychain,
            CredentialBackend::Memory,
        ]
    }

    /// Opens the backend, using `storage_path` for the file variant.
    pub fn open(self, storage_path: &Path) -> Arc<dyn KeyValueStore> {
        debug!(backend = %self, "Opening credential backend");
        match self {
            CredentialBackend::File => Arc::new(FileStore::new(storage_path)),
            CredentialBackend::Keychain => Arc::new(KeychainStore::new()),
            CredentialBackend::Memory => Arc::new(MemoryStore::new()),
        }
    }

    /// Opens the backend at its default location.
    pub fn open_default(self) -> Arc<dyn KeyValueStore> {
        self.open(&default_storage_path())
    }
}

impl std::fmt::Display for CredentialBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialBackend::File => write!(f, "file"),
            CredentialBackend::Keychain => write!(f, "keychain"),
            CredentialBackend::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for CredentialBackend {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(CredentialBackend::File),
            "keychain" => Ok(CredentialBackend::Keychain),
            "memory" => Ok(CredentialBackend::Memory),
            other => Err(StoreError::Parse(format!(
                "unknown credential backend '{other}'"
            ))),
        }
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error level logging.
    Error,
    /// Warning level logging.
    #[default]
    Warn,
    /// Info level logging.
    Info,
    /// Debug level logging.
    Debug,
    /// Trace level logging.
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Persistent settings store with change notifications.
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
    notify: watch::Sender<u64>,
    version: Arc<RwLock<u64>>,
}

impl SettingsStore {
    /// Creates a store holding defaults, saved to `path`.
    pub fn new(path: PathBuf) -> Self {
        Self::with_settings(path, Settings::default())
    }

    fn with_settings(path: PathBuf, settings: Settings) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
            notify,
            version: Arc::new(RwLock::new(0)),
        }
    }

    /// Loads settings from the default path.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be loaded from disk.
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path.
    ///
    /// A missing or unreadable file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be loaded from disk.
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        let settings = if path.exists() {
            info!(path = %path.display(), "Loading settings");
            load_json(&path).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            })
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };

        Ok(Self::with_settings(path, settings))
    }

    /// Returns the settings file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Gets the current settings with environment overrides applied.
    ///
    /// Overrides are never written back to disk.
    pub async fn effective(&self) -> Settings {
        self.get().await.with_env_overrides()
    }

    /// Updates settings and notifies subscribers.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        {
            let mut settings = self.settings.write().await;
            f(&mut settings);
        }
        self.notify_change().await;
    }

    /// Restores defaults.
    pub async fn reset(&self) {
        self.update(|s| *s = Settings::default()).await;
        info!("Settings reset to defaults");
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Subscribes to settings changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    /// Notifies subscribers of a change.
    async fn notify_change(&self) {
        let mut version = self.version.write().await;
        *version += 1;
        let _ = self.notify.send(*version);
    }

    // ========================================================================
    // Convenience Methods
    // ========================================================================

    /// Returns the configured API origin.
    pub async fn api_base_url(&self) -> String {
        self.settings.read().await.api_base_url.clone()
    }

    /// Sets the API origin.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if `url` is not an http(s) URL; the
    /// stored value is left unchanged.
    pub async fn set_api_base_url(&self, url: &str) -> Result<(), StoreError> {
        let candidate = Settings {
            api_base_url: url.trim().trim_end_matches('/').to_string(),
            ..self.get().await
        };
        candidate.validate()?;
        self.update(|s| s.api_base_url = candidate.api_base_url).await;
        Ok(())
    }

    /// Returns the credential backend.
    pub async fn credential_backend(&self) -> CredentialBackend {
        self.settings.read().await.credential_backend
    }

    /// Sets the credential backend.
    pub async fn set_credential_backend(&self, backend: CredentialBackend) {
        self.update(|s| s.credential_backend = backend).await;
    }

    /// Sets the log level.
    pub async fn set_log_level(&self, level: LogLevel) {
        self.update(|s| s.log_level = level).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.api_base_url, "http://127.0.0.1:8000");
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.retry_base_delay(), Duration::from_millis(1000));
        assert_eq!(settings.selection_debounce(), Duration::from_millis(300));
        assert_eq!(settings.credential_backend, CredentialBackend::File);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"api_base_url": "https://api.example.com"}"#).unwrap();
        assert_eq!(settings.api_base_url, "https://api.example.com");
        assert_eq!(settings.max_retries, 3);
    }

    #[test]
    fn test_env_override() {
        let settings = Settings::default().with_overrides_from(|key| {
            (key == API_BASE_URL_ENV).then(|| " https://staging.example.com ".to_string())
        });
        assert_eq!(settings.api_base_url, "https://staging.example.com");

        let untouched = Settings::default().with_overrides_from(|_| Some(String::new()));
        assert_eq!(untouched.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_url = Settings {
            api_base_url: "ftp://example.com".to_string(),
            ..Settings::default()
        };
        assert!(matches!(bad_url.validate(), Err(StoreError::Config(_))));

        let zero_timeout = Settings {
            request_timeout_secs: 0,
            ..Settings::default()
        };
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_credential_backend_parse() {
        assert_eq!("file".parse::<CredentialBackend>().unwrap(), CredentialBackend::File);
        assert_eq!(
            " Keychain ".parse::<CredentialBackend>().unwrap(),
            CredentialBackend::Keychain
        );
        assert!("vault".parse::<CredentialBackend>().is_err());

        for backend in CredentialBackend::all() {
            assert_eq!(backend.to_string().parse::<CredentialBackend>().unwrap(), *backend);
        }
    }

    #[test]
    fn test_memory_backend_opens() {
        let backend = CredentialBackend::Memory.open(Path::new("unused.json"));
        backend.set("k", "v").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_settings_store_update_notifies() {
        let store = SettingsStore::new(PathBuf::from("/tmp/redditsched_test_settings.json"));
        let mut rx = store.subscribe();

        store.set_credential_backend(CredentialBackend::Memory).await;

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 1);
        assert_eq!(store.credential_backend().await, CredentialBackend::Memory);
    }

    #[tokio::test]
    async fn test_set_api_base_url_trims_and_validates() {
        let store = SettingsStore::new(PathBuf::from("/tmp/redditsched_test_settings.json"));

        store.set_api_base_url("https://api.example.com/").await.unwrap();
        assert_eq!(store.api_base_url().await, "https://api.example.com");

        assert!(store.set_api_base_url("not a url").await.is_err());
        assert_eq!(store.api_base_url().await, "https://api.example.com");
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let store = SettingsStore::new(PathBuf::from("/tmp/redditsched_test_settings.json"));
        store.set_log_level(LogLevel::Trace).await;

        store.reset().await;

        assert_eq!(store.get().await, Settings::default());
    }
}
