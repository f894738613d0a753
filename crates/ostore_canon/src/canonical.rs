//! Canonical handles.
//!
//! A [`Canonical<T>`] is the single shared instance of a structurally-unique
//! value within one canonicalizer. Equality and hashing go by identity, which
//! is sound because the canonicalizer hands out one live instance per
//! structure: identity equality implies structural equality, and structural
//! equality of values from the same canonicalizer implies identity equality.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// Identity of a live canonical value.
///
/// Only meaningful while the value is alive. Anything that stores an id must
/// also keep the [`Canonical`] it came from, otherwise the address may be
/// reused by a different value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalId(usize);

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:x}", self.0)
    }
}

/// Shared, identity-compared handle to a canonical value.
pub struct Canonical<T>(Arc<T>);

impl<T> Canonical<T> {
    pub(crate) fn from_arc(value: Arc<T>) -> Self {
        Canonical(value)
    }

    /// Identity comparison. Same as `==`.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    #[inline]
    pub fn id(&self) -> CanonicalId {
        CanonicalId(Arc::as_ptr(&self.0).cast::<()>() as usize)
    }

    /// Number of strong handles to this value, including `self`.
    pub fn strong_count(this: &Self) -> usize {
        Arc::strong_count(&this.0)
    }
}

impl<T> Clone for Canonical<T> {
    fn clone(&self) -> Self {
        Canonical(Arc::clone(&self.0))
    }
}

impl<T> Deref for Canonical<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> AsRef<T> for Canonical<T> {
    fn as_ref(&self) -> &T {
        &self.0
    }
}

impl<T> PartialEq for Canonical<T> {
    fn eq(&self, other: &Self) -> bool {
        Canonical::ptr_eq(self, other)
    }
}

impl<T> Eq for Canonical<T> {}

impl<T> Hash for Canonical<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl<T: fmt::Debug> fmt::Debug for Canonical<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Canonical").field(&*self.0).finish()
    }
}

impl<T: Serialize> Serialize for Canonical<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}
