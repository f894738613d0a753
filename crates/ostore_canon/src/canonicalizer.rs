//! Generic canonicalizers.
//!
//! [`Canonicalize`] is the one operation every parameter kind shares: map a
//! value to the single live [`Canonical`] handle for its structure. Two
//! implementations live here:
//!
//! - [`ValueCanonicalizer<T>`] keys by the exact structural key of `T` and
//!   rebuilds the stored value from that key, so the canonical instance never
//!   aliases caller-owned data.
//! - [`ListCanonicalizer<T>`] canonicalizes lists whose elements are already
//!   canonical, keying by element identity instead of re-serializing.
//!
//! Specialized canonicalizers (where clauses, orderings, ...) normalize their
//! input and then delegate to a `ValueCanonicalizer` of the same `T`, so the
//! concrete type flows through `Canonical<T>` unchanged.
//!
//! # Thread Safety
//! Each canonicalizer guards its trie with a `parking_lot::Mutex`. Lookups are
//! short and never call back into user code while the lock is held, apart from
//! `Deserialize` for the value being rebuilt.

use std::convert::Infallible;
use std::iter;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::key::{structural_key, StructuralKey};
use crate::trie::WeakRefTrie;
use crate::{CanonError, Canonical, CanonicalId};

/// Map values to their canonical handles.
pub trait Canonicalize {
    type Value;

    /// Return the canonical handle for `value`.
    ///
    /// Deeply-equal inputs return the same handle for as long as any handle
    /// from an earlier call is still alive.
    fn canonicalize(&self, value: &Self::Value) -> Result<Canonical<Self::Value>, CanonError>;

    /// Optional variant: `None` passes straight through.
    fn canonicalize_opt(
        &self,
        value: Option<&Self::Value>,
    ) -> Result<Option<Canonical<Self::Value>>, CanonError> {
        value.map(|v| self.canonicalize(v)).transpose()
    }
}

/// Canonicalizer keyed by exact structural identity.
pub struct ValueCanonicalizer<T> {
    trie: Mutex<WeakRefTrie<StructuralKey, T>>,
}

impl<T> Default for ValueCanonicalizer<T> {
    fn default() -> Self {
        ValueCanonicalizer {
            trie: Mutex::new(WeakRefTrie::default()),
        }
    }
}

impl<T: Serialize + DeserializeOwned> ValueCanonicalizer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve an already-computed structural key.
    ///
    /// On a miss the value is decoded from `key`, so `key` must be the
    /// structural key of a `T`.
    pub fn canonicalize_key(&self, key: StructuralKey) -> Result<Canonical<T>, CanonError> {
        let mut trie = self.trie.lock();
        let value = trie.lookup_or_insert(iter::once(key.clone()), || {
            tracing::trace!(key = key.as_str(), "canonical miss");
            key.decode::<T>()
        })?;
        Ok(Canonical::from_arc(value))
    }

    /// Number of canonical values still alive.
    pub fn live_count(&self) -> usize {
        self.trie.lock().live_count()
    }

    /// Drop bookkeeping for values that have been collected.
    pub fn prune(&self) -> usize {
        self.trie.lock().prune()
    }
}

impl<T: Serialize + DeserializeOwned> Canonicalize for ValueCanonicalizer<T> {
    type Value = T;

    fn canonicalize(&self, value: &T) -> Result<Canonical<T>, CanonError> {
        self.canonicalize_key(structural_key(value)?)
    }
}

/// Canonicalizer for lists of canonical handles.
///
/// Elements are compared by identity, so two lists collide iff they hold the
/// same canonical elements in the same order. The stored list keeps its
/// elements alive, which keeps the identities on its path valid.
pub struct ListCanonicalizer<T> {
    trie: Mutex<WeakRefTrie<CanonicalId, Vec<Canonical<T>>>>,
}

impl<T> Default for ListCanonicalizer<T> {
    fn default() -> Self {
        ListCanonicalizer {
            trie: Mutex::new(WeakRefTrie::default()),
        }
    }
}

impl<T> ListCanonicalizer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical handle for `items` in the order given.
    pub fn canonicalize_list(&self, items: &[Canonical<T>]) -> Canonical<Vec<Canonical<T>>> {
        let mut trie = self.trie.lock();
        let path = items.iter().map(Canonical::id);
        let list = trie.lookup_or_insert(path, || Ok::<_, Infallible>(items.to_vec()));
        match list {
            Ok(list) => Canonical::from_arc(list),
            Err(never) => match never {},
        }
    }

    pub fn live_count(&self) -> usize {
        self.trie.lock().live_count()
    }
}

impl<T> Canonicalize for ListCanonicalizer<T> {
    type Value = Vec<Canonical<T>>;

    fn canonicalize(&self, value: &Self::Value) -> Result<Canonical<Self::Value>, CanonError> {
        Ok(self.canonicalize_list(value))
    }
}

#[cfg(test)]
mod tests;
