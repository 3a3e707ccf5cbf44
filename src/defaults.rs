//! Injected handle bundling a store with its write queue

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::DefaultsError;
use crate::setting::TypedSetting;
use crate::storable::Storable;
use crate::store::{KeyValueStore, MemoryStore};
use crate::value::StoredValue;
use crate::writer::{WritePolicy, WriteQueue};

/// Handle to a store shared by a set of settings
///
/// Cloning is cheap; clones share the store and the write queue, so writes
/// issued through any clone are applied in issue order.
///
/// # Example
///
/// ```
/// use iced_user_defaults::{Defaults, MemoryStore, WritePolicy};
///
/// let defaults = Defaults::with_policy(MemoryStore::new(), WritePolicy::Immediate);
/// let theme = defaults.setting("theme", "light".to_string()).unwrap();
///
/// assert_eq!(theme.get(), "light");
/// theme.set("dark".to_string());
/// assert_eq!(theme.get(), "dark");
/// ```
#[derive(Clone, Debug)]
pub struct Defaults {
    store: Arc<dyn KeyValueStore>,
    queue: WriteQueue,
}

impl Defaults {
    /// Wrap `store`, writing in the background when a tokio runtime is current
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self::with_policy(store, WritePolicy::detect())
    }

    /// Wrap `store` with an explicit write policy.
    ///
    /// `WritePolicy::Background` degrades to immediate writes when called
    /// outside a tokio runtime.
    pub fn with_policy(store: impl KeyValueStore + 'static, policy: WritePolicy) -> Self {
        Self::from_shared(Arc::new(store), policy)
    }

    /// Wrap a store that is already shared elsewhere
    pub fn from_shared(store: Arc<dyn KeyValueStore>, policy: WritePolicy) -> Self {
        let queue = WriteQueue::new(Arc::clone(&store), policy);
        Self { store, queue }
    }

    /// Fresh in-memory store with immediate writes
    pub fn in_memory() -> Self {
        Self::with_policy(MemoryStore::new(), WritePolicy::Immediate)
    }

    /// Declare a typed setting backed by this handle
    ///
    /// # Errors
    ///
    /// Returns [`DefaultsError::EmptyKey`] if `key` is empty.
    pub fn setting<T: Storable>(
        &self,
        key: impl Into<String>,
        default_value: T,
    ) -> Result<TypedSetting<T>, DefaultsError> {
        TypedSetting::new(self.clone(), key, default_value)
    }

    /// The policy actually in effect
    pub fn policy(&self) -> WritePolicy {
        self.queue.policy()
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Keys holding a value, counting writes that are still queued
    pub fn keys(&self) -> Vec<String> {
        let mut keys: BTreeSet<String> = self.store.keys().into_iter().collect();
        for (key, present) in self.queue.pending_keys() {
            if present {
                keys.insert(key);
            } else {
                keys.remove(&key);
            }
        }
        keys.into_iter().collect()
    }

    /// Wait until every write issued before this call has been applied
    pub async fn flush(&self) {
        self.queue.flush().await;
    }

    pub(crate) fn read(&self, key: &str) -> Option<StoredValue> {
        match self.queue.pending(key) {
            Some(queued) => queued,
            None => self.store.get(key),
        }
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        match self.queue.pending(key) {
            Some(queued) => queued.is_some(),
            None => self.store.contains(key),
        }
    }

    pub(crate) fn write(&self, key: &str, value: StoredValue) {
        self.queue.set(key, value);
    }

    pub(crate) fn remove(&self, key: &str) {
        self.queue.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::Defaults;
    use crate::error::DefaultsError;
    use crate::store::{KeyValueStore, MemoryStore};
    use crate::value::StoredValue;
    use crate::writer::WritePolicy;

    #[test]
    fn test_new_outside_runtime_is_immediate() {
        let defaults = Defaults::new(MemoryStore::new());
        assert_eq!(defaults.policy(), WritePolicy::Immediate);
    }

    #[tokio::test]
    async fn test_new_inside_runtime_is_background() {
        let defaults = Defaults::new(MemoryStore::new());
        assert_eq!(defaults.policy(), WritePolicy::Background);
    }

    #[test]
    fn test_setting_rejects_empty_key() {
        let defaults = Defaults::in_memory();
        let result = defaults.setting("", 0i64);
        assert!(matches!(result, Err(DefaultsError::EmptyKey)));
    }

    #[tokio::test]
    async fn test_clones_share_store_and_queue() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let defaults = Defaults::from_shared(Arc::clone(&store), WritePolicy::Background);
        let other = defaults.clone();

        defaults.write("launchCount", StoredValue::Integer(1));
        other.write("launchCount", StoredValue::Integer(2));
        assert_eq!(defaults.read("launchCount"), Some(StoredValue::Integer(2)));
        assert_eq!(defaults.keys(), vec!["launchCount".to_string()]);
        defaults.flush().await;

        assert_eq!(store.get("launchCount"), Some(StoredValue::Integer(2)));
        assert_eq!(other.keys(), vec!["launchCount".to_string()]);
    }
}
