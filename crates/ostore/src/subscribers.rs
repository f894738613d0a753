//! Per-key subscriber lists.

use std::sync::Arc;

use ostore_keys::KnownCacheKey;
use rustc_hash::FxHashMap;

use crate::entry::Entry;

/// What subscribers receive whenever the visible entry of their key changes.
#[derive(Debug)]
pub struct SubjectPayload<V> {
    pub entry: Arc<Entry<V>>,
    /// The entry comes from an optimistic layer rather than the truth.
    pub is_optimistic: bool,
}

impl<V> Clone for SubjectPayload<V> {
    fn clone(&self) -> Self {
        SubjectPayload {
            entry: Arc::clone(&self.entry),
            is_optimistic: self.is_optimistic,
        }
    }
}

pub type Callback<V> = Box<dyn FnMut(&SubjectPayload<V>) + Send>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub(crate) struct Subscribers<V> {
    next_id: u64,
    by_key: FxHashMap<KnownCacheKey, Vec<(SubscriptionId, Callback<V>)>>,
    key_of: FxHashMap<SubscriptionId, KnownCacheKey>,
}

impl<V> Default for Subscribers<V> {
    fn default() -> Self {
        Subscribers {
            next_id: 0,
            by_key: FxHashMap::default(),
            key_of: FxHashMap::default(),
        }
    }
}

impl<V> Subscribers<V> {
    pub(crate) fn add(&mut self, key: KnownCacheKey, callback: Callback<V>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.by_key
            .entry(key.clone())
            .or_default()
            .push((id, callback));
        self.key_of.insert(id, key);
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let Some(key) = self.key_of.remove(&id) else {
            return false;
        };
        if let Some(list) = self.by_key.get_mut(&key) {
            list.retain(|(sub, _)| *sub != id);
            if list.is_empty() {
                self.by_key.remove(&key);
            }
        }
        true
    }

    /// Drop every subscriber of `key`. Returns how many there were.
    pub(crate) fn remove_key(&mut self, key: &KnownCacheKey) -> usize {
        let Some(list) = self.by_key.remove(key) else {
            return 0;
        };
        for (id, _) in &list {
            self.key_of.remove(id);
        }
        list.len()
    }

    pub(crate) fn notify(&mut self, key: &KnownCacheKey, payload: &SubjectPayload<V>) {
        if let Some(list) = self.by_key.get_mut(key) {
            for (_, callback) in list.iter_mut() {
                callback(payload);
            }
        }
    }

    pub(crate) fn count(&self, key: &KnownCacheKey) -> usize {
        self.by_key.get(key).map_or(0, Vec::len)
    }
}
