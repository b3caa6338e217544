// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `RedditSched` Store
//!
//! Client-side state for the `RedditSched` client.
//!
//! This crate provides:
//!
//! - **KeyValueStore**: Memory, file, and keychain storage backends
//! - **TokenStore**: The access/refresh credential pair
//! - **AccountStore**: The persisted selected-account id
//! - **Session**: Authenticated/anonymous state with watch channels
//! - **AccountSelection**: Known accounts and a debounced selection
//! - **SettingsStore**: User preferences with persistence
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use redditsched_store::{CredentialBackend, Session, SettingsStore, TokenStore};
//!
//! let settings = SettingsStore::load_default().await?.effective().await;
//! let backend = settings.credential_backend.open_default();
//!
//! let session = Session::new(TokenStore::new(backend));
//! let mut rx = session.subscribe();
//! while rx.changed().await.is_ok() {
//!     println!("Session is now {}", *rx.borrow());
//! }
//! ```

pub mod account_store;
pub mod debounce;
pub mod error;
pub mod keychain;
pub mod kv;
pub mod persistence;
pub mod selection;
pub mod session;
pub mod settings_store;
pub mod token_store;

pub use account_store::{AccountStore, SELECTED_ACCOUNT_KEY};
pub use debounce::Debouncer;
pub use error::StoreError;
pub use keychain::KeychainStore;
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use persistence::{
    default_config_dir, default_settings_path, default_storage_path, load_json,
    load_json_or_default, save_json,
};
pub use selection::{AccountSelection, DEFAULT_SELECTION_DEBOUNCE, SelectionState};
pub use session::{Session, SessionState};
pub use settings_store::{
    API_BASE_URL_ENV, CredentialBackend, DEFAULT_API_BASE_URL, LogLevel, Settings, SettingsStore,
};
pub use token_store::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenKind, TokenStore};

#[cfg(test)]
mod persistence_tests;
