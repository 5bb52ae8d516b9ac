//! Cache Contract
//!
//! Object-safe description of the four cache operations plus statistics.
//! Alternative engines (for example an adapter over a third-party cache used
//! as a benchmark baseline) implement it to be swapped in behind
//! `Arc<dyn CacheContract<K, V>>`.

use std::time::Duration;

use super::stats::CacheStats;
use crate::error::{BoxError, Result};

/// Loader signature accepted through the trait object
pub type DynLoader<'a, K, V> = &'a (dyn Fn(&K) -> std::result::Result<V, BoxError> + 'a);

/// Operations every cache engine exposes
pub trait CacheContract<K, V>: Send + Sync {
    /// Return the cached value or load, cache and return it
    ///
    /// Concurrent misses on the same key run `loader` once.
    fn get_or_load(
        &self,
        key: K,
        min_ttl: Duration,
        max_ttl: Duration,
        loader: DynLoader<'_, K, V>,
    ) -> Result<V>;

    /// Return the cached value without loading
    fn get_if_present(&self, key: &K) -> Option<V>;

    /// Insert or replace a value
    fn put(&self, key: K, value: V, min_ttl: Duration, max_ttl: Duration) -> Result<()>;

    /// Drop a key; absent keys are ignored
    fn remove(&self, key: &K);

    /// Snapshot of size and request/hit counters
    fn stats(&self) -> CacheStats;
}
