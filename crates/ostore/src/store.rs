//! The cache entry store.
//!
//! # Architecture
//!
//! ```text
//! query params ──► KeyBuilder ──► CacheKey ──► CacheKeys ──► KnownCacheKey
//!                  (canonicalize)              (intern)          │
//!                                                                ▼
//!                         RefCounts ◄── retain/release ──   Store::read / batch
//!                            │                                   │
//!                            └── gc: drop entries, subscribers ──┘
//! ```
//!
//! The store owns one [`Canonicalizers`] bundle and one key registry, so all
//! keys handed out by the same store compare by identity. Writes happen inside
//! [`Store::batch`]; subscribers of every key whose visible entry changed are
//! notified once the batch function returns.

use std::sync::Arc;
use std::time::Instant;

use ostore_canon::{CanonError, Canonical, Canonicalize, Canonicalizers, WhereClause};
use ostore_keys::{
    CacheKey, CacheKeys, KeyBuilder, KnownCacheKey, ObjectCacheKeyRegistry, PrimaryKey, RefCounts,
};

use crate::config::StoreConfig;
use crate::entry::{Entry, Status};
use crate::layer::{Layers, OptimisticId};
use crate::subscribers::{SubjectPayload, Subscribers, SubscriptionId};

/// Key-to-entry cache with optimistic layers and subscribers.
pub struct Store<V> {
    config: StoreConfig,
    canon: Canonicalizers,
    cache_keys: CacheKeys,
    ref_counts: RefCounts<KnownCacheKey>,
    objects: ObjectCacheKeyRegistry,
    layers: Layers<V>,
    subscribers: Subscribers<V>,
}

impl<V> Default for Store<V> {
    fn default() -> Self {
        Store::with_config(StoreConfig::default())
    }
}

impl<V> Store<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Store {
            config,
            canon: Canonicalizers::new(),
            cache_keys: CacheKeys::new(),
            ref_counts: RefCounts::new(config.keep_alive),
            objects: ObjectCacheKeyRegistry::new(),
            layers: Layers::default(),
            subscribers: Subscribers::default(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn canonicalizers(&self) -> &Canonicalizers {
        &self.canon
    }

    /// Key constructors bound to this store's canonicalizers.
    pub fn key_builder(&self) -> KeyBuilder<'_> {
        KeyBuilder::new(&self.canon)
    }

    pub fn canonicalize_where_clause(
        &self,
        clause: &WhereClause,
    ) -> Result<Canonical<WhereClause>, CanonError> {
        self.canon.where_clause.canonicalize(clause)
    }

    // -- Keys and lifetime --

    /// Intern `key` and start tracking it.
    ///
    /// A key nobody retains is cleaned up by [`Store::gc`] once the
    /// configured keep-alive has passed.
    pub fn cache_key(&mut self, key: CacheKey) -> KnownCacheKey {
        let known = self.cache_keys.get(key);
        if self.ref_counts.register(&known, Instant::now()) {
            self.objects.register(&known);
        }
        known
    }

    /// Keep `key` alive until released. A key cleaned up by an earlier
    /// [`Store::gc`] is tracked again.
    pub fn retain(&mut self, key: &KnownCacheKey) {
        if !self.ref_counts.is_tracked(key) {
            self.objects.register(key);
        }
        self.ref_counts.retain(key);
    }

    pub fn release(&mut self, key: &KnownCacheKey) {
        self.ref_counts.release(key, Instant::now());
    }

    /// Clean up every key whose keep-alive expired at `now`.
    ///
    /// Entries of those keys are removed from all layers, their subscribers
    /// dropped and object variants unregistered. Returns the number of keys
    /// cleaned up.
    pub fn gc(&mut self, now: Instant) -> usize {
        let expired = self.ref_counts.gc(now);
        for key in &expired {
            self.cleanup_key(key);
        }
        if !expired.is_empty() {
            self.cache_keys.prune();
        }
        expired.len()
    }

    fn cleanup_key(&mut self, key: &KnownCacheKey) {
        let subscribers = self.subscribers.remove_key(key);
        self.layers.remove_key(key);
        self.objects.unregister(key);
        tracing::debug!(%key, subscribers, "cleaned up cache key");
    }

    /// Number of keys currently tracked for cleanup.
    pub fn tracked_key_count(&self) -> usize {
        self.ref_counts.len()
    }

    pub fn retain_count(&self, key: &KnownCacheKey) -> usize {
        self.ref_counts.count(key)
    }

    /// Every tracked object key for the given object, one per derived-property
    /// configuration.
    pub fn object_variants<'s>(
        &'s self,
        api_name: &str,
        primary_key: &PrimaryKey,
    ) -> impl Iterator<Item = &'s KnownCacheKey> + 's {
        self.objects.variants(api_name, primary_key)
    }

    // -- Entries --

    /// The visible entry for `key`, optimistic layers included.
    pub fn read(&self, key: &KnownCacheKey) -> Option<Arc<Entry<V>>> {
        self.layers.get(key).cloned()
    }

    /// The truth entry for `key`, ignoring optimistic layers.
    pub fn peek_truth(&self, key: &KnownCacheKey) -> Option<Arc<Entry<V>>> {
        self.layers.get_truth(key).cloned()
    }

    /// Keys with an entry in the truth layer.
    pub fn truth_keys(&self) -> impl Iterator<Item = &KnownCacheKey> {
        self.layers.truth_keys()
    }

    /// Number of optimistic layers on top of the truth.
    pub fn layer_count(&self) -> usize {
        self.layers.layer_count()
    }

    /// What a subscriber of `key` would currently see.
    pub fn payload(&self, key: &KnownCacheKey) -> SubjectPayload<V> {
        let entry = self
            .read(key)
            .unwrap_or_else(|| Arc::new(Entry::init(key.clone())));
        SubjectPayload {
            entry,
            is_optimistic: self.layers.is_optimistic(key),
        }
    }

    /// Run `f` against a batch context.
    ///
    /// With `optimistic_id` set, writes go to a fresh optimistic layer tagged
    /// with that id, created on the first write. Otherwise they go to the
    /// truth layer. Subscribers are notified after `f` returns, once per key
    /// whose visible entry changed.
    pub fn batch<R>(
        &mut self,
        optimistic_id: Option<OptimisticId>,
        f: impl FnOnce(&mut BatchContext<'_, V>) -> R,
    ) -> R {
        let mut ctx = BatchContext {
            layers: &mut self.layers,
            optimistic_id,
            needs_layer: optimistic_id.is_some(),
            changed: Vec::new(),
        };
        let result = f(&mut ctx);

        let changed = ctx.changed;
        tracing::trace!(changed = changed.len(), optimistic = optimistic_id.is_some(), "batch done");
        for (key, before) in changed {
            self.notify_if_changed(&key, before.as_ref());
        }
        result
    }

    /// Remove every optimistic layer tagged `id`.
    ///
    /// Subscribers of keys whose visible entry changed as a result are
    /// notified with the entry now visible.
    pub fn remove_layer(&mut self, id: OptimisticId) {
        let keys = self.layers.keys_in(id);
        let before: Vec<_> = keys.iter().map(|key| self.layers.get(key).cloned()).collect();

        let removed = self.layers.remove_layer(id);
        tracing::debug!(%id, removed, keys = keys.len(), "removed optimistic layer");

        for (key, before) in keys.iter().zip(before) {
            self.notify_if_changed(key, before.as_ref());
        }
    }

    fn notify_if_changed(&mut self, key: &KnownCacheKey, before: Option<&Arc<Entry<V>>>) {
        let unchanged = match (before, self.layers.get(key)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }
        let payload = self.payload(key);
        self.subscribers.notify(key, &payload);
    }

    // -- Subscribers --

    /// Subscribe to changes of the visible entry for `key`.
    ///
    /// `callback` is called right away with the current payload and then
    /// after every change.
    pub fn subscribe(
        &mut self,
        key: &KnownCacheKey,
        mut callback: impl FnMut(&SubjectPayload<V>) + Send + 'static,
    ) -> SubscriptionId {
        callback(&self.payload(key));
        self.subscribers.add(key.clone(), Box::new(callback))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    pub fn subscriber_count(&self, key: &KnownCacheKey) -> usize {
        self.subscribers.count(key)
    }
}

/// Read and write access to the store during one [`Store::batch`].
pub struct BatchContext<'s, V> {
    layers: &'s mut Layers<V>,
    optimistic_id: Option<OptimisticId>,
    needs_layer: bool,
    /// Visible entry of every written key as of its first write.
    changed: Vec<(KnownCacheKey, Option<Arc<Entry<V>>>)>,
}

impl<V> BatchContext<'_, V> {
    pub fn is_optimistic(&self) -> bool {
        self.optimistic_id.is_some()
    }

    /// Optimistic batches read what is visible; truth batches read the truth.
    pub fn read(&self, key: &KnownCacheKey) -> Option<Arc<Entry<V>>> {
        match self.optimistic_id {
            Some(_) => self.layers.get(key).cloned(),
            None => self.layers.get_truth(key).cloned(),
        }
    }

    pub fn write(&mut self, key: &KnownCacheKey, value: Option<V>, status: Status) -> Arc<Entry<V>> {
        if !self.changed.iter().any(|(seen, _)| seen == key) {
            let before = self.layers.get(key).cloned();
            self.changed.push((key.clone(), before));
        }

        let entry = Arc::new(Entry::new(key.clone(), value, status));
        match self.optimistic_id {
            Some(id) => {
                if self.needs_layer {
                    self.layers.push_layer(id);
                    self.needs_layer = false;
                }
                self.layers.set_top(Arc::clone(&entry));
            }
            None => self.layers.set_truth(Arc::clone(&entry)),
        }
        entry
    }

    /// Write a tombstone for `key`.
    pub fn delete(&mut self, key: &KnownCacheKey, status: Status) -> Arc<Entry<V>> {
        self.write(key, None, status)
    }
}
