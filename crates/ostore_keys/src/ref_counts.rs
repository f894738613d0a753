//! Reference counts with delayed expiry.
//!
//! Every registered key starts unretained. A key whose count is zero is
//! scheduled to expire `keep_alive` after it became unretained; retaining it
//! again cancels the expiry. [`RefCounts::gc`] returns the keys whose expiry
//! has passed and forgets them. A keep-alive of `Duration::MAX` means unused
//! keys are kept forever.
//!
//! Time is passed in by the caller, which keeps the counts deterministic.

use std::hash::Hash;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

pub struct RefCounts<K> {
    keep_alive: Duration,
    counts: FxHashMap<K, usize>,
    /// Keys with a zero count, by the time they expire.
    expiries: FxHashMap<K, Instant>,
}

impl<K: Clone + Eq + Hash> RefCounts<K> {
    pub fn new(keep_alive: Duration) -> Self {
        RefCounts {
            keep_alive,
            counts: FxHashMap::default(),
            expiries: FxHashMap::default(),
        }
    }

    /// Start tracking `key` with no retains. Already tracked keys are left
    /// alone. Returns `true` for a new key.
    pub fn register(&mut self, key: &K, now: Instant) -> bool {
        if self.counts.contains_key(key) {
            return false;
        }
        self.counts.insert(key.clone(), 0);
        self.schedule_expiry(key, now);
        true
    }

    /// Increment the count of `key`, registering it if needed.
    pub fn retain(&mut self, key: &K) {
        *self.counts.entry(key.clone()).or_insert(0) += 1;
        self.expiries.remove(key);
    }

    /// Decrement the count of `key`. At zero the key is scheduled to expire.
    ///
    /// Releasing an unknown or unretained key does nothing.
    pub fn release(&mut self, key: &K, now: Instant) {
        match self.counts.get_mut(key) {
            Some(count) if *count > 0 => {
                *count -= 1;
                if *count == 0 {
                    self.schedule_expiry(key, now);
                }
            }
            _ => tracing::warn!("release of a key that is not retained"),
        }
    }

    /// A keep-alive too long to represent as an `Instant` never expires.
    fn schedule_expiry(&mut self, key: &K, now: Instant) {
        if let Some(expiry) = now.checked_add(self.keep_alive) {
            self.expiries.insert(key.clone(), expiry);
        }
    }

    pub fn count(&self, key: &K) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn is_tracked(&self, key: &K) -> bool {
        self.counts.contains_key(key)
    }

    /// Remove and return every key whose expiry is at or before `now`.
    pub fn gc(&mut self, now: Instant) -> Vec<K> {
        let expired: Vec<K> = self
            .expiries
            .iter()
            .filter(|(_, expiry)| **expiry <= now)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.expiries.remove(key);
            self.counts.remove(key);
        }
        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "expired unretained keys");
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests;
