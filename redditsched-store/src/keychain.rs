//! Credential storage in the system keychain.
//!
//! This backend keeps each key as its own keychain entry:
//! - macOS: Keychain Services
//! - Windows: Credential Manager
//! - Linux: kernel keyutils
//!
//! Entries live under the service name `RedditSched`, with the storage key
//! as the keychain account.

use keyring::Entry;
use tracing::debug;

use crate::error::StoreError;
use crate::kv::KeyValueStore;

/// Service name for `RedditSched` credentials.
const SERVICE_NAME: &str = "RedditSched";

/// Keychain-backed [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct KeychainStore {
    service: String,
}

impl KeychainStore {
    /// Creates a store using the default service name.
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Creates a store under a custom service name.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Returns the keychain service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        Entry::new(&self.service, key).map_err(StoreError::from)
    }
}

impl Default for KeychainStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for KeychainStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) if !value.is_empty() => Ok(Some(value)),
            // Empty password or no entry both mean "not found"
            Ok(_) | Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entry(key)?.set_password(value)?;
        debug!(service = %self.service, key, "Keychain entry stored");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => {
                debug!(service = %self.service, key, "Keychain entry deleted");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()), // Already deleted, that's fine
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_service_name() {
        assert_eq!(KeychainStore::new().service(), "RedditSched");
        assert_eq!(KeychainStore::with_service("Other").service(), "Other");
    }

    // Note: Actual keychain operations require platform access and are not
    // exercised in unit tests.
}
