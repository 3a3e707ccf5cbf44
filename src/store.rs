//! The key-value collaborator that settings read from and write to

use std::collections::HashMap;
use std::fmt::Debug;

use parking_lot::RwLock;

use crate::error::DefaultsError;
use crate::value::StoredValue;

/// A persistent mapping from string keys to [`StoredValue`]s.
///
/// Implementations must be safe to call from several threads for individual
/// operations. Nothing above this trait assumes atomicity across keys.
pub trait KeyValueStore: Debug + Send + Sync {
    /// Read the raw value for `key`, `None` if nothing is stored
    fn get(&self, key: &str) -> Option<StoredValue>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: StoredValue) -> Result<(), DefaultsError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), DefaultsError>;

    /// All keys currently holding a value
    fn keys(&self) -> Vec<String>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Process-local store with no persistence
///
/// Useful for tests and for sessions that should not touch disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoredValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`
    pub fn with_entries(entries: impl IntoIterator<Item = (String, StoredValue)>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<StoredValue> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: StoredValue) -> Result<(), DefaultsError> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DefaultsError> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValueStore, MemoryStore};
    use crate::value::StoredValue;

    #[test]
    fn test_memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("username"), None);

        store
            .set("username", StoredValue::String("Alice".to_string()))
            .unwrap();
        assert_eq!(
            store.get("username"),
            Some(StoredValue::String("Alice".to_string()))
        );
        assert!(store.contains("username"));

        store.remove("username").unwrap();
        assert!(!store.contains("username"));
        // removing twice is fine
        store.remove("username").unwrap();
    }

    #[test]
    fn test_memory_store_with_entries() {
        let store = MemoryStore::with_entries([
            ("launchCount".to_string(), StoredValue::Integer(4)),
            ("isSubscribed".to_string(), StoredValue::Bool(true)),
        ]);

        let mut keys = store.keys();
        keys.sort();
        assert_eq!(keys, vec!["isSubscribed", "launchCount"]);
    }
}
