//! Mapping Rust types onto stored shapes
//!
//! Every type a [`TypedSetting`](crate::TypedSetting) can hold implements
//! [`Storable`]. The implementation fixes, at compile time, which
//! [`Strategy`] the type goes through:
//!
//! - scalars (`String`, `bool`, integers, floats) are stored natively
//! - `Vec<T>` is stored as an `Array` of its elements
//! - `HashMap<String, T>` / `BTreeMap<String, T>` are stored as a `Dictionary`
//! - anything serde can handle is stored as a JSON blob, either wrapped in
//!   [`Json`] or declared with [`impl_json_storable!`](crate::impl_json_storable)
//!
//! A `Vec` of serializable structs still goes through the sequence strategy,
//! since the `Vec` impl is the one that applies.

use std::collections::{BTreeMap, HashMap};
use std::ops::{Deref, DerefMut};

use serde::{Serialize, de::DeserializeOwned};

use crate::value::StoredValue;

/// How a type is laid out in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Native scalar
    Primitive,
    /// Native ordered sequence
    Sequence,
    /// Native string-keyed mapping
    Mapping,
    /// JSON-encoded byte blob
    Serialized,
}

/// A type that can be written to and read back from a store.
pub trait Storable: Sized {
    /// The strategy this type is stored with
    const STRATEGY: Strategy;

    /// Convert to the stored representation.
    ///
    /// Returns the reason on failure; the caller decides whether to drop the
    /// write or surface it.
    fn encode(&self) -> Result<StoredValue, String>;

    /// Convert back from the stored representation.
    ///
    /// `None` means the stored shape does not match, which readers turn into
    /// the setting's default.
    fn decode(value: &StoredValue) -> Option<Self>;
}

impl Storable for String {
    const STRATEGY: Strategy = Strategy::Primitive;

    fn encode(&self) -> Result<StoredValue, String> {
        Ok(StoredValue::String(self.clone()))
    }

    fn decode(value: &StoredValue) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }
}

impl Storable for bool {
    const STRATEGY: Strategy = Strategy::Primitive;

    fn encode(&self) -> Result<StoredValue, String> {
        Ok(StoredValue::Bool(*self))
    }

    fn decode(value: &StoredValue) -> Option<Self> {
        value.as_bool()
    }
}

macro_rules! integer_storable {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Storable for $ty {
                const STRATEGY: Strategy = Strategy::Primitive;

                fn encode(&self) -> Result<StoredValue, String> {
                    i64::try_from(*self)
                        .map(StoredValue::Integer)
                        .map_err(|e| format!("{} does not fit in i64: {}", self, e))
                }

                fn decode(value: &StoredValue) -> Option<Self> {
                    value.as_integer().and_then(|raw| <$ty>::try_from(raw).ok())
                }
            }
        )+
    };
}

integer_storable!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

// JSON has no representation for NaN or the infinities.
fn encode_float(value: f64) -> Result<StoredValue, String> {
    if value.is_finite() {
        Ok(StoredValue::Float(value))
    } else {
        Err(format!("float {} is not finite", value))
    }
}

impl Storable for f64 {
    const STRATEGY: Strategy = Strategy::Primitive;

    fn encode(&self) -> Result<StoredValue, String> {
        encode_float(*self)
    }

    fn decode(value: &StoredValue) -> Option<Self> {
        value.as_float()
    }
}

impl Storable for f32 {
    const STRATEGY: Strategy = Strategy::Primitive;

    fn encode(&self) -> Result<StoredValue, String> {
        encode_float(f64::from(*self))
    }

    fn decode(value: &StoredValue) -> Option<Self> {
        value.as_float().map(|raw| raw as f32)
    }
}

impl<T: Storable> Storable for Vec<T> {
    const STRATEGY: Strategy = Strategy::Sequence;

    fn encode(&self) -> Result<StoredValue, String> {
        self.iter()
            .map(Storable::encode)
            .collect::<Result<Vec<_>, _>>()
            .map(StoredValue::Array)
    }

    fn decode(value: &StoredValue) -> Option<Self> {
        value.as_array()?.iter().map(T::decode).collect()
    }
}

impl<T: Storable> Storable for BTreeMap<String, T> {
    const STRATEGY: Strategy = Strategy::Mapping;

    fn encode(&self) -> Result<StoredValue, String> {
        encode_entries(self.iter())
    }

    fn decode(value: &StoredValue) -> Option<Self> {
        value
            .as_dictionary()?
            .iter()
            .map(|(key, item)| T::decode(item).map(|item| (key.clone(), item)))
            .collect()
    }
}

impl<T: Storable> Storable for HashMap<String, T> {
    const STRATEGY: Strategy = Strategy::Mapping;

    fn encode(&self) -> Result<StoredValue, String> {
        encode_entries(self.iter())
    }

    fn decode(value: &StoredValue) -> Option<Self> {
        value
            .as_dictionary()?
            .iter()
            .map(|(key, item)| T::decode(item).map(|item| (key.clone(), item)))
            .collect()
    }
}

fn encode_entries<'a, T, I>(entries: I) -> Result<StoredValue, String>
where
    T: Storable + 'a,
    I: Iterator<Item = (&'a String, &'a T)>,
{
    entries
        .map(|(key, item)| item.encode().map(|item| (key.clone(), item)))
        .collect::<Result<BTreeMap<_, _>, _>>()
        .map(StoredValue::Dictionary)
}

/// Encode any serde value as a JSON blob.
///
/// Shared by [`Json`] and [`impl_json_storable!`](crate::impl_json_storable).
pub fn encode_json<T: Serialize>(value: &T) -> Result<StoredValue, String> {
    serde_json::to_vec(value)
        .map(StoredValue::Data)
        .map_err(|e| format!("Failed to serialize value: {}", e))
}

/// Decode a JSON blob. Anything other than a parseable `Data` value is `None`.
pub fn decode_json<T: DeserializeOwned>(value: &StoredValue) -> Option<T> {
    serde_json::from_slice(value.as_data()?).ok()
}

/// Wrapper that stores any serde type as a JSON blob
///
/// # Example
///
/// ```
/// use iced_user_defaults::{Json, Storable, Strategy};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Profile {
///     theme: String,
/// }
///
/// assert_eq!(<Json<Profile> as Storable>::STRATEGY, Strategy::Serialized);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> From<T> for Json<T> {
    fn from(value: T) -> Self {
        Json(value)
    }
}

impl<T: Serialize + DeserializeOwned> Storable for Json<T> {
    const STRATEGY: Strategy = Strategy::Serialized;

    fn encode(&self) -> Result<StoredValue, String> {
        encode_json(&self.0)
    }

    fn decode(value: &StoredValue) -> Option<Self> {
        decode_json(value).map(Json)
    }
}

/// Implement [`Storable`] for serde types so they can be used directly as
/// setting values, stored as JSON blobs.
///
/// ```
/// use iced_user_defaults::{Storable, Strategy, impl_json_storable};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct WindowLayout {
///     sidebar_width: u32,
/// }
///
/// impl_json_storable!(WindowLayout);
///
/// assert_eq!(WindowLayout::STRATEGY, Strategy::Serialized);
/// ```
#[macro_export]
macro_rules! impl_json_storable {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Storable for $ty {
                const STRATEGY: $crate::Strategy = $crate::Strategy::Serialized;

                fn encode(&self) -> ::std::result::Result<$crate::StoredValue, ::std::string::String> {
                    $crate::encode_json(self)
                }

                fn decode(value: &$crate::StoredValue) -> ::std::option::Option<Self> {
                    $crate::decode_json(value)
                }
            }
        )+
    };
}
