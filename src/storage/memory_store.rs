//! In-memory key/value storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::KeyValueStore;
use crate::PortalError;

/// Keys and values held in a `HashMap` behind a `RwLock`.
///
/// Clones share the same map, which makes it a natural stand-in for the tab
/// scope: every service constructed for one tab sees the same values.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PortalError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| PortalError::StorageError("Lock poisoned".to_owned()))?;

        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PortalError> {
        self.entries
            .write()
            .map_err(|_| PortalError::StorageError("Lock poisoned".to_owned()))?
            .insert(key.to_owned(), value.to_owned());

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PortalError> {
        self.entries
            .write()
            .map_err(|_| PortalError::StorageError("Lock poisoned".to_owned()))?
            .remove(key);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = InMemoryStore::new();
        store.set("theme", "dark").unwrap();

        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let store = InMemoryStore::new();
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = InMemoryStore::new();
        store.set("rememberMe", "true").unwrap();

        store.remove("rememberMe").unwrap();
        store.remove("rememberMe").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let store = InMemoryStore::new();
        let other = store.clone();
        store.set("k", "v").unwrap();

        assert_eq!(other.get("k").unwrap().as_deref(), Some("v"));
    }
}
