//! Persistence round-trip and edge case tests.
//!
//! Tests file I/O operations, settings round-trip, and the file-backed
//! credential stores sharing one file.

use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use crate::account_store::AccountStore;
use crate::kv::{FileStore, KeyValueStore};
use crate::persistence::{ensure_dir, load_json, load_json_or_default, save_json};
use crate::settings_store::{CredentialBackend, LogLevel, Settings, SettingsStore};
use crate::token_store::TokenStore;

// ============================================================================
// JSON Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_and_load_settings_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("settings.json");

    let settings = Settings {
        api_base_url: "https://api.example.com".to_string(),
        max_retries: 5,
        credential_backend: CredentialBackend::Keychain,
        log_level: LogLevel::Debug,
        ..Settings::default()
    };

    save_json(&file_path, &settings).await.unwrap();
    let loaded: Settings = load_json(&file_path).await.unwrap();

    assert_eq!(loaded, settings);
}

#[tokio::test]
async fn test_save_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let nested_path = temp_dir.path().join("deeply").join("nested").join("test.json");

    let data = serde_json::json!({"key": "value"});

    save_json(&nested_path, &data).await.unwrap();
    assert!(nested_path.exists());
}

#[tokio::test]
async fn test_load_nonexistent_file() {
    let file_path = PathBuf::from("/nonexistent/path/settings.json");

    let result: Result<Settings, _> = load_json(&file_path).await;
    assert!(result.is_err());

    let fallback: Settings = load_json_or_default(&file_path).await;
    assert_eq!(fallback, Settings::default());
}

#[tokio::test]
async fn test_ensure_dir_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let dir_path = temp_dir.path().join("test_dir");

    ensure_dir(&dir_path).await.unwrap();
    ensure_dir(&dir_path).await.unwrap();

    assert!(dir_path.is_dir());
}

// ============================================================================
// Settings Store Tests
// ============================================================================

#[tokio::test]
async fn test_settings_store_save_and_reload() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");

    let store = SettingsStore::new(path.clone());
    store.set_api_base_url("https://api.example.com").await.unwrap();
    store.set_credential_backend(CredentialBackend::Memory).await;
    store.save().await.unwrap();

    let reloaded = SettingsStore::load(path).await.unwrap();
    let settings = reloaded.get().await;
    assert_eq!(settings.api_base_url, "https://api.example.com");
    assert_eq!(settings.credential_backend, CredentialBackend::Memory);
}

#[tokio::test]
async fn test_settings_store_corrupt_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    tokio::fs::write(&path, "{ not json").await.unwrap();

    let store = SettingsStore::load(path).await.unwrap();
    assert_eq!(store.get().await, Settings::default());
}

#[tokio::test]
async fn test_settings_unknown_fields_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    tokio::fs::write(&path, r#"{"max_retries": 1, "theme": "dark"}"#)
        .await
        .unwrap();

    let store = SettingsStore::load(path).await.unwrap();
    assert_eq!(store.get().await.max_retries, 1);
}

// ============================================================================
// File-Backed Credential Tests
// ============================================================================

#[test]
fn test_tokens_and_selection_share_storage_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("storage.json");

    {
        let backend: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&path));
        TokenStore::new(backend.clone()).set_tokens("access", "refresh");
        AccountStore::new(backend).set_selected_account_id(7);
    }

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["accessToken"], "access");
    assert_eq!(raw["refreshToken"], "refresh");
    assert_eq!(raw["selectedRedditAccountId"], "7");

    let backend = CredentialBackend::File.open(&path);
    let tokens = TokenStore::new(backend.clone());
    assert!(tokens.has_valid_tokens());

    tokens.clear_tokens();
    assert_eq!(AccountStore::new(backend).selected_account_id(), Some(7));
}
