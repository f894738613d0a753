//! Derived-property variants of object keys.
//!
//! The same object can be cached under several object keys that differ only in
//! their derived-property configuration. When the object itself changes, every
//! variant has to be updated, so the registry groups object keys by
//! `(api_name, primary_key)`.

use ostore_canon::{Canonical, DerivedProperties};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::cache_key::PrimaryKey;
use crate::registry::KnownCacheKey;

type ObjectId = (String, PrimaryKey);

#[derive(Default)]
pub struct ObjectCacheKeyRegistry {
    variants: FxHashMap<ObjectId, FxHashSet<KnownCacheKey>>,
}

impl ObjectCacheKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` as a variant of its object. Non-object keys are ignored.
    ///
    /// Returns `true` if the key was not registered before.
    pub fn register(&mut self, key: &KnownCacheKey) -> bool {
        let Some(object) = key.as_object() else {
            return false;
        };
        self.variants
            .entry((object.api_name.clone(), object.primary_key.clone()))
            .or_default()
            .insert(key.clone())
    }

    /// Forget `key`. Unknown keys are ignored.
    pub fn unregister(&mut self, key: &KnownCacheKey) -> bool {
        let Some(object) = key.as_object() else {
            return false;
        };
        let id = (object.api_name.clone(), object.primary_key.clone());
        let Some(set) = self.variants.get_mut(&id) else {
            return false;
        };
        let removed = set.remove(key);
        if set.is_empty() {
            self.variants.remove(&id);
        }
        removed
    }

    /// Every registered key of the given object.
    pub fn variants(
        &self,
        api_name: &str,
        primary_key: &PrimaryKey,
    ) -> impl Iterator<Item = &KnownCacheKey> + '_ {
        self.variants
            .get(&(api_name.to_owned(), primary_key.clone()))
            .into_iter()
            .flatten()
    }

    pub fn variant_count(&self, api_name: &str, primary_key: &PrimaryKey) -> usize {
        self.variants
            .get(&(api_name.to_owned(), primary_key.clone()))
            .map_or(0, FxHashSet::len)
    }

    /// Derived-property configuration of a registered key.
    pub fn rdp_config<'k>(&self, key: &'k KnownCacheKey) -> Option<&'k Canonical<DerivedProperties>> {
        if !self.is_registered(key) {
            return None;
        }
        key.as_object()?.rdp.as_ref()
    }

    pub fn has_rdp_config(&self, key: &KnownCacheKey) -> bool {
        self.rdp_config(key).is_some()
    }

    fn is_registered(&self, key: &KnownCacheKey) -> bool {
        key.as_object().is_some_and(|object| {
            self.variants
                .get(&(object.api_name.clone(), object.primary_key.clone()))
                .is_some_and(|set| set.contains(key))
        })
    }
}
