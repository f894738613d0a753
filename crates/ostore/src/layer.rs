//! Truth and optimistic layers.
//!
//! Entries live in a stack of layers. The bottom layer holds the truth as
//! last reported by the server; each optimistic batch pushes a layer tagged
//! with its [`OptimisticId`] on top. Reads resolve from the top down, so an
//! optimistic write shadows the truth until its layer is removed.
//!
//! ```text
//! top     [opt #2]  key_a -> Entry
//!         [opt #1]  key_a -> Entry, key_b -> Entry
//! bottom  [truth]   key_a -> Entry, key_c -> Entry
//! ```

use std::fmt;
use std::sync::Arc;

use ostore_keys::KnownCacheKey;
use rustc_hash::FxHashMap;

use crate::entry::Entry;

/// Tag of the optimistic layers written by one logical operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OptimisticId(u64);

impl OptimisticId {
    pub const fn new(id: u64) -> Self {
        OptimisticId(id)
    }
}

impl fmt::Display for OptimisticId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "optimistic#{}", self.0)
    }
}

type Entries<V> = FxHashMap<KnownCacheKey, Arc<Entry<V>>>;

struct OptimisticLayer<V> {
    id: OptimisticId,
    entries: Entries<V>,
}

/// The layer stack.
pub(crate) struct Layers<V> {
    truth: Entries<V>,
    /// Bottom to top.
    optimistic: Vec<OptimisticLayer<V>>,
}

impl<V> Default for Layers<V> {
    fn default() -> Self {
        Layers {
            truth: FxHashMap::default(),
            optimistic: Vec::new(),
        }
    }
}

impl<V> Layers<V> {
    /// Topmost entry for `key`.
    pub(crate) fn get(&self, key: &KnownCacheKey) -> Option<&Arc<Entry<V>>> {
        self.optimistic
            .iter()
            .rev()
            .find_map(|layer| layer.entries.get(key))
            .or_else(|| self.truth.get(key))
    }

    pub(crate) fn get_truth(&self, key: &KnownCacheKey) -> Option<&Arc<Entry<V>>> {
        self.truth.get(key)
    }

    /// Whether the visible entry for `key` comes from an optimistic layer.
    pub(crate) fn is_optimistic(&self, key: &KnownCacheKey) -> bool {
        match (self.get(key), self.get_truth(key)) {
            (Some(top), Some(truth)) => !Arc::ptr_eq(top, truth),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    pub(crate) fn set_truth(&mut self, entry: Arc<Entry<V>>) {
        self.truth.insert(entry.cache_key.clone(), entry);
    }

    /// Write into the top optimistic layer. Falls back to the truth layer
    /// when no optimistic layer exists.
    pub(crate) fn set_top(&mut self, entry: Arc<Entry<V>>) {
        let key = entry.cache_key.clone();
        match self.optimistic.last_mut() {
            Some(layer) => layer.entries.insert(key, entry),
            None => self.truth.insert(key, entry),
        };
    }

    pub(crate) fn push_layer(&mut self, id: OptimisticId) {
        self.optimistic.push(OptimisticLayer {
            id,
            entries: FxHashMap::default(),
        });
    }

    /// Keys written by layers tagged `id`.
    pub(crate) fn keys_in(&self, id: OptimisticId) -> Vec<KnownCacheKey> {
        let mut keys: Vec<KnownCacheKey> = Vec::new();
        for layer in self.optimistic.iter().filter(|layer| layer.id == id) {
            for key in layer.entries.keys() {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
        keys
    }

    /// Drop every layer tagged `id`. Returns the number of layers removed.
    pub(crate) fn remove_layer(&mut self, id: OptimisticId) -> usize {
        let before = self.optimistic.len();
        self.optimistic.retain(|layer| layer.id != id);
        before - self.optimistic.len()
    }

    /// Drop `key` from every layer.
    pub(crate) fn remove_key(&mut self, key: &KnownCacheKey) {
        self.truth.remove(key);
        for layer in &mut self.optimistic {
            layer.entries.remove(key);
        }
    }

    pub(crate) fn layer_count(&self) -> usize {
        self.optimistic.len()
    }

    pub(crate) fn truth_keys(&self) -> impl Iterator<Item = &KnownCacheKey> {
        self.truth.keys()
    }
}
