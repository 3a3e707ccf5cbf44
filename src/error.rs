//! Error types shared by stores and typed settings

use std::io::Error as IoError;

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Errors produced by the defaults layer.
///
/// Reads never produce these: an absent or undecodable value resolves to the
/// setting's default. They only show up on store construction, on explicit
/// store writes, and from [`TypedSetting::try_set`](crate::TypedSetting::try_set).
#[derive(Error, Debug)]
pub enum DefaultsError {
    /// Failed to read or write a suite file.
    #[error("IO error: {0}")]
    Io(#[from] IoError),
    /// Failed to serialize or deserialize a value or a suite file.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    /// A setting was declared with an empty key.
    #[error("Setting key must not be empty")]
    EmptyKey,
    /// A value could not be converted into a stored representation.
    #[error("Value for '{key}' cannot be stored: {reason}")]
    Unencodable { key: String, reason: String },
}
