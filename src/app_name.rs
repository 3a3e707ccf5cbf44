//! Application identity used to locate suite files on disk

use std::path::PathBuf;

/// Identifies the application whose defaults are being stored
///
/// Suite files live in the platform's local config directory:
/// - Linux: `$XDG_CONFIG_HOME/<app>/defaults` or `~/.config/<app>/defaults`
/// - macOS: `~/Library/Application Support/<qualifier>.<org>.<app>/defaults`
/// - Windows: `%LOCALAPPDATA%\<org>\<app>\config\defaults`
///
/// # Example
///
/// ```
/// use iced_user_defaults::AppName;
///
/// let app_name = AppName::new("com", "example", "myapp");
/// let path = app_name.suite_path("standard");
/// assert!(path.ends_with("defaults/standard.json"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppName {
    pub qualifier: String,
    pub organization: String,
    pub application: String,
}

impl AppName {
    /// Create a new application name
    ///
    /// * `qualifier` - Typically a reverse domain name (e.g., "com", "org")
    /// * `organization` - Your organization or username
    /// * `application` - The application name
    pub fn new(
        qualifier: impl Into<String>,
        organization: impl Into<String>,
        application: impl Into<String>,
    ) -> Self {
        Self {
            qualifier: qualifier.into(),
            organization: organization.into(),
            application: application.into(),
        }
    }

    /// Directory holding every suite of this application.
    ///
    /// Falls back to `./defaults` when no home directory can be determined.
    pub fn storage_dir(&self) -> PathBuf {
        directories::ProjectDirs::from(&self.qualifier, &self.organization, &self.application)
            .map(|dirs| dirs.config_local_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("defaults")
    }

    /// File backing the named suite, `<storage_dir>/<suite>.json`
    pub fn suite_path(&self, suite: &str) -> PathBuf {
        self.storage_dir().join(format!("{}.json", suite))
    }
}
