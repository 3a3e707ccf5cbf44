//! Untyped values as they sit in a store

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A persisted value of unknown Rust type.
///
/// This is the shape vocabulary every [`KeyValueStore`](crate::KeyValueStore)
/// speaks: scalars, opaque bytes, ordered sequences and string-keyed maps.
/// The adjacent tagging keeps `Data` and `Array` apart once written to JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StoredValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Data(Vec<u8>),
    Array(Vec<StoredValue>),
    Dictionary(BTreeMap<String, StoredValue>),
}

impl StoredValue {
    /// Short name of the shape, used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            StoredValue::Bool(_) => "bool",
            StoredValue::Integer(_) => "integer",
            StoredValue::Float(_) => "float",
            StoredValue::String(_) => "string",
            StoredValue::Data(_) => "data",
            StoredValue::Array(_) => "array",
            StoredValue::Dictionary(_) => "dictionary",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StoredValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            StoredValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Integers widen to floats, nothing else does.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            StoredValue::Float(value) => Some(*value),
            StoredValue::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StoredValue::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&[u8]> {
        match self {
            StoredValue::Data(bytes) => Some(bytes.as_slice()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[StoredValue]> {
        match self {
            StoredValue::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&BTreeMap<String, StoredValue>> {
        match self {
            StoredValue::Dictionary(entries) => Some(entries),
            _ => None,
        }
    }
}
