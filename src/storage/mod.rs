//! Persisted client state.
//!
//! The portal keeps two kinds of state: tab-scoped values that disappear when
//! the tab closes (the session record, recent searches) and durable values that
//! survive restarts (remember-me, the notification cache, throttle
//! timestamps). Both are plain string key/value stores behind
//! [`KeyValueStore`]; [`BrowserStorage`] bundles one of each.

mod file_store;
pub mod keys;
mod memory_store;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use file_store::FileStore;
pub use memory_store::InMemoryStore;

use crate::PortalError;

/// String key/value storage.
///
/// Implementations must be cheap to call; every page load reads the session
/// record through this trait.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PortalError>;

    fn set(&self, key: &str, value: &str) -> Result<(), PortalError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), PortalError>;
}

/// Reads and decodes a JSON value.
///
/// A value that fails to decode is reported as `Err`, so callers can decide
/// whether malformed state is fatal or equivalent to "absent".
pub fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, PortalError> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn write_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), PortalError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// The two storage scopes available to a page.
#[derive(Clone)]
pub struct BrowserStorage {
    /// Cleared when the tab closes.
    pub tab: Arc<dyn KeyValueStore>,
    /// Survives restarts.
    pub durable: Arc<dyn KeyValueStore>,
}

impl BrowserStorage {
    pub fn new(tab: Arc<dyn KeyValueStore>, durable: Arc<dyn KeyValueStore>) -> Self {
        Self { tab, durable }
    }

    /// Both scopes held in memory. Suitable for tests and single-process demos.
    pub fn in_memory() -> Self {
        Self {
            tab: Arc::new(InMemoryStore::new()),
            durable: Arc::new(InMemoryStore::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Pref {
        theme: String,
    }

    #[test]
    fn test_json_helpers() {
        let store = InMemoryStore::new();

        assert_eq!(read_json::<Pref>(&store, "pref").unwrap(), None);

        let pref = Pref {
            theme: "dark".to_owned(),
        };
        write_json(&store, "pref", &pref).unwrap();
        assert_eq!(read_json::<Pref>(&store, "pref").unwrap(), Some(pref));
    }

    #[test]
    fn test_read_json_reports_malformed_value() {
        let store = InMemoryStore::new();
        store.set("pref", "{not json").unwrap();

        let result = read_json::<Pref>(&store, "pref");
        assert!(matches!(result, Err(PortalError::SerializationError(_))));
    }

    #[test]
    fn test_scopes_are_independent() {
        let storage = BrowserStorage::in_memory();
        storage.tab.set("k", "tab").unwrap();

        assert_eq!(storage.durable.get("k").unwrap(), None);
    }
}
