//! Store configuration.

use std::time::Duration;

/// How long an unretained cache key survives before cleanup.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Configuration for a [`Store`](crate::Store).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Time between a key losing its last retain and its entries being
    /// dropped by [`Store::gc`](crate::Store::gc). `Duration::MAX` keeps
    /// unused keys forever.
    pub keep_alive: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            keep_alive: DEFAULT_KEEP_ALIVE,
        }
    }
}

impl StoreConfig {
    /// Create a config with the specified keep-alive.
    pub fn with_keep_alive(keep_alive: Duration) -> Self {
        StoreConfig { keep_alive }
    }
}
