//! Cached entries.

use std::time::Instant;

use ostore_keys::KnownCacheKey;

/// Load state of an entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Init,
    Loading,
    Loaded,
    Error,
}

/// Value cached under one key in one layer.
///
/// `value` is `None` for entries that were never loaded and for deletions.
/// Entries are shared as `Arc<Entry<V>>` and compared by identity to detect
/// changes.
#[derive(Clone, Debug)]
pub struct Entry<V> {
    pub cache_key: KnownCacheKey,
    pub value: Option<V>,
    pub status: Status,
    pub last_updated: Instant,
}

impl<V> Entry<V> {
    pub fn new(cache_key: KnownCacheKey, value: Option<V>, status: Status) -> Self {
        Entry {
            cache_key,
            value,
            status,
            last_updated: Instant::now(),
        }
    }

    /// Placeholder for a key nothing has been written to.
    pub fn init(cache_key: KnownCacheKey) -> Self {
        Entry::new(cache_key, None, Status::Init)
    }

    /// Whether this entry marks a deletion.
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none() && self.status != Status::Init
    }
}
