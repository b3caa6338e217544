//! Key-value storage backends.
//!
//! The credential and selection stores sit on top of a small synchronous
//! [`KeyValueStore`] so that the backing medium can be swapped:
//!
//! - [`MemoryStore`] - process-local, used in tests and by the `memory` backend
//! - [`FileStore`] - a JSON object on disk, owner read/write only
//! - [`crate::keychain::KeychainStore`] - the system keychain
//!
//! Backends report failures; the typed stores above them decide how to
//! degrade.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, trace};

use crate::error::StoreError;
use crate::persistence::{load_json_sync, save_json_sync};

// ============================================================================
// Key-Value Store Trait
// ============================================================================

/// Synchronous string key-value storage.
pub trait KeyValueStore: Send + Sync {
    /// Reads a value. `Ok(None)` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a value, replacing any existing one.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes a key. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// ============================================================================
// Memory Store
// ============================================================================

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

// ============================================================================
// File Store
// ============================================================================

/// JSON-file-backed store.
///
/// Every operation re-reads the file so that concurrent processes observe
/// each other's writes (last write wins).
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Creates a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        Ok(load_json_sync(&self.path)?.unwrap_or_default())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let value = self.load()?.remove(key);
        trace!(key, hit = value.is_some(), "File store lookup");
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        save_json_sync(&self.path, &entries)?;
        debug!(key, path = %self.path.display(), "File store entry written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            save_json_sync(&self.path, &entries)?;
            debug!(key, path = %self.path.display(), "File store entry removed");
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
