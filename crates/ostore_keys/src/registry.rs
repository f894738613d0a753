//! Cache key interning.
//!
//! [`CacheKeys`] maps every [`CacheKey`] to one shared [`KnownCacheKey`]
//! handle, so the store can index entries by handle identity. Keys are stored
//! weakly in a [`WeakRefTrie`] addressed by [`CacheKey::segments`]; a key
//! lives as long as someone holds its handle.
//!
//! Canonical parts appear in the path by identity. That is sound because an
//! interned key owns its canonical parts, so their identities cannot be
//! reused while the key is alive.

use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use ostore_canon::WeakRefTrie;
use parking_lot::Mutex;

use crate::cache_key::{CacheKey, KeyKind, KeySegment};

/// Interned cache key. Compared and hashed by identity.
#[derive(Clone)]
pub struct KnownCacheKey(Arc<CacheKey>);

impl KnownCacheKey {
    pub fn kind(&self) -> KeyKind {
        self.0.kind()
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl Deref for KnownCacheKey {
    type Target = CacheKey;

    fn deref(&self) -> &CacheKey {
        &self.0
    }
}

impl PartialEq for KnownCacheKey {
    fn eq(&self, other: &Self) -> bool {
        KnownCacheKey::ptr_eq(self, other)
    }
}

impl Eq for KnownCacheKey {}

impl Hash for KnownCacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for KnownCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KnownCacheKey({})", self.0)
    }
}

impl fmt::Display for KnownCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type OnCreate = Box<dyn Fn(&KnownCacheKey) + Send + Sync>;

/// Registry of live cache keys.
#[derive(Default)]
pub struct CacheKeys {
    trie: Mutex<WeakRefTrie<KeySegment, CacheKey>>,
    on_create: Option<OnCreate>,
}

impl CacheKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that calls `hook` once for every newly created handle.
    ///
    /// The hook runs after the registry lock is released, so it may intern
    /// further keys.
    pub fn with_on_create(hook: impl Fn(&KnownCacheKey) + Send + Sync + 'static) -> Self {
        CacheKeys {
            trie: Mutex::default(),
            on_create: Some(Box::new(hook)),
        }
    }

    /// Intern `key`, returning the live handle for an equal key if one exists.
    pub fn get(&self, key: CacheKey) -> KnownCacheKey {
        let path = key.segments();
        let mut created = false;
        let interned = self.trie.lock().lookup_or_insert(path, || {
            created = true;
            Ok::<_, Infallible>(key)
        });
        let known = match interned {
            Ok(key) => KnownCacheKey(key),
            Err(never) => match never {},
        };

        if created {
            tracing::debug!(key = %known, "cache key created");
            if let Some(hook) = &self.on_create {
                hook(&known);
            }
        }
        known
    }

    /// Live handle for `key`, without creating one.
    pub fn peek(&self, key: &CacheKey) -> Option<KnownCacheKey> {
        let path = key.segments();
        self.trie.lock().get(path.iter()).map(KnownCacheKey)
    }

    /// Number of keys with a live handle.
    pub fn live_count(&self) -> usize {
        self.trie.lock().live_count()
    }

    /// Reclaim trie nodes of keys that are gone.
    pub fn prune(&self) -> usize {
        self.trie.lock().prune()
    }
}
