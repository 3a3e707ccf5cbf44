//! Typed, default-backed preferences for Iced applications
//!
//! A [`TypedSetting`] binds a key and a default value to a
//! [`KeyValueStore`]. Reads fall back to the default when the key is absent
//! or holds something of the wrong shape; writes are queued and applied in
//! issue order; `reset` removes the key so the default shows through again.
//!
//! # Features
//!
//! - Scalars, sequences, string-keyed maps and arbitrary serde types
//! - In-memory and JSON-file stores, one file per suite
//! - Fire-and-forget background writes on tokio, or synchronous writes
//! - [`ChangeNotifier`] for re-rendering on change
//!
//! # Example
//!
//! ```no_run
//! use iced_user_defaults::{AppName, Defaults, JsonFileStore};
//!
//! fn main() -> Result<(), iced_user_defaults::DefaultsError> {
//!     let app_name = AppName::new("com", "example", "myapp");
//!     let defaults = Defaults::new(JsonFileStore::standard(&app_name)?);
//!
//!     let username = defaults.setting("username", "Guest".to_string())?;
//!     println!("Hello, {}", username.get());
//!     username.set("Alice".to_string());
//!     Ok(())
//! }
//! ```

mod app_name;
mod defaults;
mod error;
mod notify;
mod setting;
mod storable;
mod storage;
mod store;
mod value;
mod writer;

pub use app_name::AppName;
pub use defaults::Defaults;
pub use error::DefaultsError;
pub use notify::{ChangeNotifier, Changed, ObserverId};
pub use setting::TypedSetting;
pub use storable::{Json, Storable, Strategy, decode_json, encode_json};
pub use storage::{JsonFileStore, STANDARD_SUITE};
pub use store::{KeyValueStore, MemoryStore};
pub use value::StoredValue;
pub use writer::WritePolicy;
