//! Settings Plugin for Iced
//!
//! Observable user settings on top of `iced_user_defaults`. Each property is
//! backed by a [`TypedSetting`]; every mutation fires a change notification
//! before the write is issued, so views can re-render from fresh reads.
//!
//! # Features
//!
//! - `username`, `is_subscribed` and `launch_count` with defaults
//! - Pre-change notifications through callbacks or an Iced subscription
//! - Bulk reset back to defaults
//!
//! # Example
//!
//! ```ignore
//! use iced_settings_plugin::{SettingsChanged, SettingsManager};
//! use iced_user_defaults::AppName;
//!
//! let app_name = AppName::new("com", "example", "myapp");
//! let settings = SettingsManager::open(&app_name)?;
//!
//! settings.increment_launch_count();
//!
//! fn subscription(app: &App) -> iced::Subscription<Message> {
//!     app.settings.listen().map(|SettingsChanged| Message::SettingsChanged)
//! }
//! ```

use iced::Subscription;
use iced_user_defaults::{
    AppName, ChangeNotifier, Defaults, DefaultsError, JsonFileStore, ObserverId, TypedSetting,
};
use tracing::debug;

pub use iced_user_defaults::Changed as SettingsChanged;

pub const USERNAME_KEY: &str = "username";
pub const IS_SUBSCRIBED_KEY: &str = "isSubscribed";
pub const LAUNCH_COUNT_KEY: &str = "launchCount";

pub const DEFAULT_USERNAME: &str = "Guest";
pub const DEFAULT_IS_SUBSCRIBED: bool = false;
pub const DEFAULT_LAUNCH_COUNT: i64 = 0;

/// The application's user settings
///
/// Holds no values itself; every read goes to the store. Clones share the
/// store, the write queue and the observers, so a clone can be handed to a
/// view or a background task.
#[derive(Debug, Clone)]
pub struct SettingsManager {
    username: TypedSetting<String>,
    is_subscribed: TypedSetting<bool>,
    launch_count: TypedSetting<i64>,
    defaults: Defaults,
    notifier: ChangeNotifier,
}

impl SettingsManager {
    /// Build the settings on top of an existing defaults handle
    ///
    /// # Errors
    ///
    /// Only fails if a property key is invalid, which the built-in keys are not.
    pub fn new(defaults: Defaults) -> Result<Self, DefaultsError> {
        Ok(Self {
            username: defaults.setting(USERNAME_KEY, DEFAULT_USERNAME.to_string())?,
            is_subscribed: defaults.setting(IS_SUBSCRIBED_KEY, DEFAULT_IS_SUBSCRIBED)?,
            launch_count: defaults.setting(LAUNCH_COUNT_KEY, DEFAULT_LAUNCH_COUNT)?,
            defaults,
            notifier: ChangeNotifier::new(),
        })
    }

    /// Open the standard suite of `app_name` on disk
    ///
    /// # Errors
    ///
    /// Returns an error if the suite file exists but cannot be read.
    pub fn open(app_name: &AppName) -> Result<Self, DefaultsError> {
        let store = JsonFileStore::standard(app_name)?;
        debug!(path = %store.path().display(), "Opening settings");
        Self::new(Defaults::new(store))
    }

    pub fn username(&self) -> String {
        self.username.get()
    }

    pub fn set_username(&self, value: impl Into<String>) {
        self.notifier.notify();
        self.username.set(value.into());
    }

    pub fn is_subscribed(&self) -> bool {
        self.is_subscribed.get()
    }

    pub fn set_is_subscribed(&self, value: bool) {
        self.notifier.notify();
        self.is_subscribed.set(value);
    }

    pub fn launch_count(&self) -> i64 {
        self.launch_count.get()
    }

    pub fn set_launch_count(&self, value: i64) {
        self.notifier.notify();
        self.launch_count.set(value);
    }

    /// Bump the launch count by one (a single notification)
    pub fn increment_launch_count(&self) {
        self.set_launch_count(self.launch_count().saturating_add(1));
    }

    /// Put every property back to its default.
    ///
    /// Each key is removed and then explicitly re-assigned its default, so
    /// afterwards the keys do hold a value. Observers see one notification
    /// per property. The steps are not atomic.
    pub fn reset_all(&self) {
        debug!("Resetting all settings");

        self.username.reset();
        self.is_subscribed.reset();
        self.launch_count.reset();

        self.set_username(DEFAULT_USERNAME);
        self.set_is_subscribed(DEFAULT_IS_SUBSCRIBED);
        self.set_launch_count(DEFAULT_LAUNCH_COUNT);
    }

    /// Backing setting of `username`, for `has_value`/`reset` access
    pub fn username_setting(&self) -> &TypedSetting<String> {
        &self.username
    }

    pub fn is_subscribed_setting(&self) -> &TypedSetting<bool> {
        &self.is_subscribed
    }

    pub fn launch_count_setting(&self) -> &TypedSetting<i64> {
        &self.launch_count
    }

    /// Run `callback` synchronously before every mutation
    pub fn on_change(&self, callback: impl Fn() + Send + Sync + 'static) -> ObserverId {
        self.notifier.subscribe(callback)
    }

    pub fn remove_observer(&self, id: ObserverId) -> bool {
        self.notifier.unsubscribe(id)
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Wait for queued writes to reach the store
    pub async fn flush(&self) {
        self.defaults.flush().await;
    }

    /// Subscribe to change notifications
    ///
    /// # Example
    /// ```ignore
    /// fn subscription(&self) -> Subscription<Message> {
    ///     self.settings.listen().map(|_| Message::SettingsChanged)
    /// }
    /// ```
    pub fn listen(&self) -> Subscription<SettingsChanged> {
        #[derive(Clone, Hash)]
        struct ListenState {
            notifier: ChangeNotifier,
        }

        fn create_stream(
            state: &ListenState,
        ) -> iced::futures::stream::BoxStream<'static, SettingsChanged> {
            Box::pin(state.notifier.watch())
        }

        let state = ListenState {
            notifier: self.notifier.clone(),
        };

        Subscription::run_with(state, create_stream)
    }
}
