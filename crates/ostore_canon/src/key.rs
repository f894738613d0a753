//! Structural keys.
//!
//! A structural key is the exact JSON serialization of a value. Two values
//! produce the same key iff they are deeply equal under JSON semantics:
//! object keys in the order they were given, arrays in order, and `null`
//! distinct from an omitted field.
//!
//! Key order is deliberately *not* normalized here. `{"a":1,"b":2}` and
//! `{"b":2,"a":1}` are different keys. Specialized canonicalizers that know a
//! map is order-insensitive (derived properties, for example) sort before
//! keying.
//!
//! Keys are only stable within one process. They are cache keys, not a wire
//! format.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::CanonError;

/// Deterministic string form of a serializable value.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StructuralKey(String);

impl StructuralKey {
    /// The key text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rebuild a fresh value of type `T` from this key.
    ///
    /// The result shares nothing with whatever instance the key was built
    /// from, which is what lets canonical values be independent of caller
    /// owned data.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CanonError> {
        serde_json::from_str(&self.0).map_err(|source| CanonError::Reconstruction {
            type_name: std::any::type_name::<T>(),
            source,
        })
    }
}

impl fmt::Display for StructuralKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StructuralKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build the structural key of `value`.
///
/// Fails with [`CanonError::Serialization`] when `value` has no JSON form,
/// e.g. a map with non-string keys or a `Serialize` impl that reports an
/// error.
pub fn structural_key<T: Serialize + ?Sized>(value: &T) -> Result<StructuralKey, CanonError> {
    serde_json::to_string(value)
        .map(StructuralKey)
        .map_err(|source| CanonError::Serialization {
            type_name: std::any::type_name::<T>(),
            source,
        })
}
