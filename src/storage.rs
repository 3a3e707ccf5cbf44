//! JSON file backed store
//!
//! One suite maps to one JSON file. The whole suite is kept in memory and
//! rewritten after every mutation, which is fine for the handful of keys a
//! preference suite holds.

use std::collections::HashMap;
use std::fs::{create_dir_all, read_to_string, rename, write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde_json::{from_str, to_string_pretty};
use tracing::{debug, warn};

use crate::app_name::AppName;
use crate::error::DefaultsError;
use crate::store::KeyValueStore;
use crate::value::StoredValue;

/// Name of the suite used when none is given
pub const STANDARD_SUITE: &str = "standard";

/// A [`KeyValueStore`] persisted to a single JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, StoredValue>>,
}

impl JsonFileStore {
    /// Open the named suite of `app_name`
    ///
    /// # Errors
    ///
    /// Returns an error if the suite file exists but cannot be read.
    pub fn open(app_name: &AppName, suite: &str) -> Result<Self, DefaultsError> {
        Self::at(app_name.suite_path(suite))
    }

    /// Open the standard suite of `app_name`
    pub fn standard(app_name: &AppName) -> Result<Self, DefaultsError> {
        Self::open(app_name, STANDARD_SUITE)
    }

    /// Open a store backed by an explicit file path
    ///
    /// A missing or empty file yields an empty store. A file that cannot be
    /// parsed is logged and treated as empty; it gets overwritten on the next
    /// write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn at(path: impl Into<PathBuf>) -> Result<Self, DefaultsError> {
        let path = path.into();
        let entries = load_suite(&path)?;
        debug!(path = %path.display(), keys = entries.len(), "Opened defaults suite");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_suite(path: &Path) -> Result<HashMap<String, StoredValue>, DefaultsError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let contents = read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(HashMap::new());
    }

    match from_str(&contents) {
        Ok(entries) => Ok(entries),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable defaults suite");
            Ok(HashMap::new())
        }
    }
}

fn save_suite(path: &Path, entries: &HashMap<String, StoredValue>) -> Result<(), DefaultsError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    // Written next to the target and renamed over it, so a crash leaves
    // either the old suite or the new one on disk.
    let contents = to_string_pretty(entries)?;
    let temp_path = path.with_extension("json.tmp");
    write(&temp_path, contents)?;
    rename(&temp_path, path)?;
    Ok(())
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<StoredValue> {
        self.entries.read().get(key).cloned()
    }

    // The lock is held across the file write so concurrent writers cannot
    // persist an older snapshot over a newer one. Memory only changes once
    // the file has been written.
    fn set(&self, key: &str, value: StoredValue) -> Result<(), DefaultsError> {
        let mut entries = self.entries.write();
        let mut updated = entries.clone();
        updated.insert(key.to_string(), value);
        save_suite(&self.path, &updated)?;
        *entries = updated;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DefaultsError> {
        let mut entries = self.entries.write();
        if !entries.contains_key(key) {
            return Ok(());
        }

        let mut updated = entries.clone();
        updated.remove(key);
        save_suite(&self.path, &updated)?;
        *entries = updated;
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
    use std::fs::{read_to_string, write};

    use tempfile::TempDir;

    use super::JsonFileStore;
    use crate::defaults::Defaults;
    use crate::error::DefaultsError;
    use crate::store::KeyValueStore;
    use crate::value::StoredValue;
    use crate::writer::WritePolicy;

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFileStore::at(temp_dir.path().join("standard.json")).unwrap();
        assert!(store.keys().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_values_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("standard.json");

        let store = JsonFileStore::at(&path).unwrap();
        store
            .set("username", StoredValue::String("Alice".to_string()))
            .unwrap();
        store.set("blob", StoredValue::Data(vec![7, 8, 9])).unwrap();
        drop(store);

        let reopened = JsonFileStore::at(&path).unwrap();
        assert_eq!(
            reopened.get("username"),
            Some(StoredValue::String("Alice".to_string()))
        );
        assert_eq!(reopened.get("blob"), Some(StoredValue::Data(vec![7, 8, 9])));
    }

    #[test]
    fn test_remove_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("standard.json");

        let store = JsonFileStore::at(&path).unwrap();
        store.set("launchCount", StoredValue::Integer(2)).unwrap();
        store.remove("launchCount").unwrap();

        let reopened = JsonFileStore::at(&path).unwrap();
        assert!(!reopened.contains("launchCount"));
        assert!(!read_to_string(&path).unwrap().contains("launchCount"));
    }

    #[test]
    fn test_corrupt_file_is_treated_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("standard.json");
        write(&path, "{ definitely not json").unwrap();

        let store = JsonFileStore::at(&path).unwrap();
        assert!(store.keys().is_empty());

        store.set("isSubscribed", StoredValue::Bool(true)).unwrap();
        let reopened = JsonFileStore::at(&path).unwrap();
        assert_eq!(reopened.get("isSubscribed"), Some(StoredValue::Bool(true)));
    }

    #[test]
    fn test_failed_save_leaves_memory_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        write(&blocker, "").unwrap();
        // the parent is a regular file, so the suite can never be written
        let store = JsonFileStore::at(blocker.join("standard.json")).unwrap();

        let result = store.set("username", StoredValue::String("Alice".to_string()));
        assert!(matches!(result, Err(DefaultsError::Io(_))));
        assert_eq!(store.get("username"), None);
        assert!(!store.contains("username"));
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_failed_remove_keeps_value() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("suite");
        let path = dir.join("standard.json");
        let store = JsonFileStore::at(&path).unwrap();
        store.set("launchCount", StoredValue::Integer(4)).unwrap();

        // replace the directory with a file so the next save fails
        std::fs::remove_dir_all(&dir).unwrap();
        write(&dir, "").unwrap();

        assert!(store.remove("launchCount").is_err());
        assert_eq!(store.get("launchCount"), Some(StoredValue::Integer(4)));
    }

    #[test]
    fn test_dropped_setting_write_is_not_visible() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        write(&blocker, "").unwrap();
        let store = JsonFileStore::at(blocker.join("standard.json")).unwrap();
        let defaults = Defaults::with_policy(store, WritePolicy::Immediate);
        let username = defaults.setting("username", "Guest".to_string()).unwrap();

        username.set("Alice".to_string());
        assert_eq!(username.get(), "Guest");
        assert!(!username.has_value());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("standard.json");
        let store = JsonFileStore::at(&path).unwrap();
        store.set("isSubscribed", StoredValue::Bool(true)).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_float_settings_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("standard.json");

        let defaults =
            Defaults::with_policy(JsonFileStore::at(&path).unwrap(), WritePolicy::Immediate);
        let username = defaults.setting("username", "Guest".to_string()).unwrap();
        let volume = defaults.setting("volume", 1.0f64).unwrap();
        let scale = defaults.setting("scale", 1.0f32).unwrap();
        username.set("Alice".to_string());
        volume.set(0.25);
        scale.set(1.5);

        assert!(matches!(
            volume.try_set(f64::NAN),
            Err(DefaultsError::Unencodable { .. })
        ));
        volume.set(f64::INFINITY);
        assert_eq!(volume.get(), 0.25);

        let reopened =
            Defaults::with_policy(JsonFileStore::at(&path).unwrap(), WritePolicy::Immediate);
        assert_eq!(
            reopened.setting("username", "Guest".to_string()).unwrap().get(),
            "Alice"
        );
        assert_eq!(reopened.setting("volume", 1.0f64).unwrap().get(), 0.25);
        assert_eq!(reopened.setting("scale", 1.0f32).unwrap().get(), 1.5);
        assert!(!read_to_string(&path).unwrap().contains("null"));
    }
}
