//! Typed accessor for a single key

use std::fmt;

use crate::defaults::Defaults;
use crate::error::DefaultsError;
use crate::storable::{Storable, Strategy};

/// A typed view onto one key of a store, with a default for when the key is
/// absent or holds something that does not decode as `T`.
///
/// `set` and `reset` go through the handle's write queue; in background mode
/// they return before the store has been updated. Reads never wait, and see
/// queued writes issued through the same [`Defaults`] handle.
///
/// # Example
///
/// ```
/// use iced_user_defaults::{Defaults, TypedSetting};
///
/// let defaults = Defaults::in_memory();
/// let launch_count = TypedSetting::new(defaults, "launchCount", 0i64).unwrap();
///
/// assert!(!launch_count.has_value());
/// launch_count.set(launch_count.get() + 1);
/// assert_eq!(launch_count.get(), 1);
///
/// launch_count.reset();
/// assert_eq!(launch_count.get(), 0);
/// assert!(!launch_count.has_value());
/// ```
#[derive(Clone)]
pub struct TypedSetting<T> {
    key: String,
    default_value: T,
    defaults: Defaults,
}

impl<T: fmt::Debug> fmt::Debug for TypedSetting<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedSetting")
            .field("key", &self.key)
            .field("default_value", &self.default_value)
            .finish()
    }
}

impl<T: Storable> TypedSetting<T> {
    /// Bind `key` to `default_value`. No I/O happens here.
    ///
    /// # Errors
    ///
    /// Returns [`DefaultsError::EmptyKey`] if `key` is empty.
    pub fn new(
        defaults: Defaults,
        key: impl Into<String>,
        default_value: T,
    ) -> Result<Self, DefaultsError> {
        let key = key.into();
        if key.is_empty() {
            return Err(DefaultsError::EmptyKey);
        }

        Ok(Self {
            key,
            default_value,
            defaults,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default_value(&self) -> &T {
        &self.default_value
    }

    /// Strategy `T` is stored with
    pub fn strategy(&self) -> Strategy {
        T::STRATEGY
    }

    /// The stored value, or the default when absent or undecodable
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.defaults
            .read(&self.key)
            .and_then(|raw| T::decode(&raw))
            .unwrap_or_else(|| self.default_value.clone())
    }

    /// Store `value`. Values that cannot be encoded are logged and dropped.
    pub fn set(&self, value: T) {
        if let Err(e) = self.try_set(value) {
            tracing::warn!(key = %self.key, error = %e, "Dropped write");
        }
    }

    /// Store `value`, reporting encode failures instead of dropping them.
    ///
    /// Store failures still happen after this returns in background mode and
    /// are only logged.
    ///
    /// # Errors
    ///
    /// Returns [`DefaultsError::Unencodable`] if `value` has no stored form.
    pub fn try_set(&self, value: T) -> Result<(), DefaultsError> {
        let raw = value.encode().map_err(|reason| DefaultsError::Unencodable {
            key: self.key.clone(),
            reason,
        })?;
        self.defaults.write(&self.key, raw);
        Ok(())
    }

    /// Remove the stored value so the default shows through again.
    ///
    /// Unlike `set(default)`, this leaves `has_value()` false.
    pub fn reset(&self) {
        self.defaults.remove(&self.key);
    }

    /// Whether the store holds anything for this key, decodable or not
    pub fn has_value(&self) -> bool {
        self.defaults.contains(&self.key)
    }
}
