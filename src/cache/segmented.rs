//! Segmented LRU Cache
//!
//! Composes the router, the per-segment eviction engines, the key index, the
//! single-flight registry and the stats counters into the public cache.
//!
//! # Request Flow
//!
//! ```text
//! key ──▶ SegmentRouter ──▶ segment i
//!  │
//!  └────▶ KeyIndex ──hit──▶ Segment::touch (promotion, segment lock)
//!            │
//!           miss ──▶ Flights::join ──leader──▶ loader ──▶ Segment::admit
//!                          │                                   │
//!                       follower ◀──────── outcome ◀──── KeyIndex::insert
//! ```
//!
//! Hits never take a segment lock unless they promote a cold entry. Expired
//! and removed entries are retracted from the index at once but keep their
//! queue slot as a placeholder until it drifts off a tail.

use std::convert::Infallible;
use std::fmt;
use std::hash::Hash;
use std::time::Duration;

use tracing::{debug, info, instrument};

use super::clock::Clock;
use super::config::{CacheConfig, SegmentLayout, TtlRange};
use super::contract::{CacheContract, DynLoader};
use super::flight::{Flights, Role};
use super::index::{KeyIndex, Resident};
use super::node::NodeRef;
use super::router::SegmentRouter;
use super::segment::{Segment, SegmentOccupancy};
use super::stats::{CacheStats, StatsCollector};
use crate::error::{BoxError, Error, Result};

/// Concurrent two-tier LRU cache with TTLs and single-flight loading
pub struct SegmentedLruCache<K, V> {
    config: CacheConfig,
    layout: SegmentLayout,
    router: SegmentRouter,
    segments: Box<[Segment<K>]>,
    index: KeyIndex<K, V>,
    flights: Flights<K, V>,
    stats: StatsCollector,
    clock: Clock,
}

impl<K, V> SegmentedLruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache from explicit sizing values
    pub fn new(capacity: usize, segment_count: usize, hot_ratio: f64) -> Result<Self> {
        Self::with_config(CacheConfig::new(capacity, segment_count, hot_ratio))
    }

    /// Create a cache from a configuration
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        let layout = config.layout()?;
        let segments = (0..layout.segment_count)
            .map(|_| Segment::new(layout.hot_capacity, layout.cold_capacity))
            .collect();
        let clock = Clock::new();

        info!(
            capacity = config.capacity,
            segments = layout.segment_count,
            hot_capacity = layout.hot_capacity,
            cold_capacity = layout.cold_capacity,
            "segmented LRU cache created"
        );

        Ok(Self {
            router: SegmentRouter::new(layout.segment_count),
            segments,
            index: KeyIndex::with_capacity(layout.total_capacity()),
            flights: Flights::new(),
            stats: StatsCollector::new(clock.start_millis()),
            clock,
            layout,
            config,
        })
    }

    /// Return the cached value, or run `loader` once and cache its result
    ///
    /// Concurrent misses on the same key share one loader invocation. The
    /// callers that waited get the leader's value (or error) and are counted
    /// as misses. A failed load caches nothing, so the next call retries.
    pub fn get_or_load<F, E>(
        &self,
        key: K,
        min_ttl: Duration,
        max_ttl: Duration,
        loader: F,
    ) -> Result<V>
    where
        F: FnOnce(&K) -> std::result::Result<V, E>,
        E: Into<BoxError>,
    {
        let ttl = TtlRange::new(min_ttl, max_ttl)?;
        self.stats.record_request();

        if let Some(value) = self.lookup(&key) {
            return Ok(value);
        }
        self.load(key, ttl, loader)
    }

    /// [`get_or_load`](Self::get_or_load) for loaders that cannot fail
    pub fn get_or_insert_with<F>(
        &self,
        key: K,
        min_ttl: Duration,
        max_ttl: Duration,
        f: F,
    ) -> Result<V>
    where
        F: FnOnce(&K) -> V,
    {
        self.get_or_load(key, min_ttl, max_ttl, |k| Ok::<_, Infallible>(f(k)))
    }

    /// Return the cached value if present and not expired
    pub fn get_if_present(&self, key: &K) -> Option<V> {
        self.stats.record_request();
        self.lookup(key)
    }

    /// Insert `value`, replacing whatever is cached for `key`
    pub fn put(&self, key: K, value: V, min_ttl: Duration, max_ttl: Duration) -> Result<()> {
        let ttl = TtlRange::new(min_ttl, max_ttl)?;
        self.install(key, value, ttl);
        Ok(())
    }

    /// Drop `key` from the cache; absent keys are ignored
    pub fn remove(&self, key: &K) {
        if let Some(resident) = self.index.get(key) {
            self.retire(key, resident.node);
        }
    }

    /// Snapshot of size and counters
    pub fn stats(&self) -> CacheStats {
        self.stats
            .snapshot(self.index.len(), self.clock.now_millis())
    }

    /// Number of cached keys (expired but unvisited entries included)
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Maximum number of entries held at once
    pub fn capacity(&self) -> usize {
        self.layout.total_capacity()
    }

    pub fn segment_count(&self) -> usize {
        self.layout.segment_count
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn layout(&self) -> SegmentLayout {
        self.layout
    }

    /// Loads currently in progress
    pub fn loads_in_flight(&self) -> usize {
        self.flights.len()
    }

    /// Per-segment queue occupancy, in segment order
    pub fn segment_occupancy(&self) -> Vec<SegmentOccupancy> {
        self.segments.iter().map(Segment::occupancy).collect()
    }

    #[inline]
    fn segment(&self, key: &K) -> &Segment<K> {
        &self.segments[self.router.route(key)]
    }

    /// Serve a hit; an expired entry is retracted and reported as a miss
    fn lookup(&self, key: &K) -> Option<V> {
        let resident = self.index.get(key)?;
        if resident.is_expired(self.clock.now_millis()) {
            self.retire(key, resident.node);
            return None;
        }

        self.stats.record_hit();
        self.segment(key).touch(resident.node);
        Some(resident.value)
    }

    #[instrument(level = "debug", skip_all)]
    fn load<F, E>(&self, key: K, ttl: TtlRange, loader: F) -> Result<V>
    where
        F: FnOnce(&K) -> std::result::Result<V, E>,
        E: Into<BoxError>,
    {
        let leader = match self.flights.join(&key) {
            Role::Follower(flight) => return flight.wait(),
            Role::Leader(leader) => leader,
        };

        // Another leader may have finished between our index miss and join
        if let Some(resident) = self.index.get(&key) {
            if !resident.is_expired(self.clock.now_millis()) {
                return leader.complete(Ok(resident.value));
            }
        }

        let result = match loader(&key) {
            Ok(value) => {
                self.install(key, value.clone(), ttl);
                Ok(value)
            }
            Err(err) => {
                let err = Error::load(err);
                debug!(error = %err, "loader failed, nothing cached");
                Err(err)
            }
        };
        leader.complete(result)
    }

    /// Admit a fresh node for `key` and point the index at it
    fn install(&self, key: K, value: V, ttl: TtlRange) {
        let segment = self.segment(&key);
        let expire_at = self.clock.now_millis().saturating_add(ttl.sample());

        let admission = segment.admit(key.clone());
        if let Some(evicted) = admission.evicted {
            self.index.retract(&evicted.key, evicted.node);
        }
        let Some(node) = admission.node else {
            return;
        };

        let resident = Resident {
            node,
            value,
            expire_at,
        };
        if let Some(replaced) = self.index.insert(key.clone(), resident) {
            segment.release(replaced.node);
        }

        // Concurrent admissions may have recycled the slot before the index
        // entry landed; their retraction missed it, so retract here.
        if !segment.is_current(node) {
            self.index.retract(&key, node);
        }
    }

    /// Retract `key` if it still maps to `node`, leaving a placeholder
    fn retire(&self, key: &K, node: NodeRef) {
        if self.index.retract(key, node) {
            self.segment(key).release(node);
        }
    }

    /// Check index/queue agreement; only meaningful when quiescent
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self)
    where
        K: fmt::Debug + Ord,
    {
        use super::node::NodeStatus;

        let mut indexed = self.index.snapshot();
        indexed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut queued = Vec::new();
        for (i, segment) in self.segments.iter().enumerate() {
            assert!(
                segment.occupancy().is_full(),
                "segment {} queues not full: {:?}",
                i,
                segment.occupancy()
            );
            for (key, node, status) in segment.entries() {
                assert!(
                    matches!(status, NodeStatus::Hot | NodeStatus::Cold),
                    "key {:?} queued with status {:?}",
                    key,
                    status
                );
                assert_eq!(self.router.route(&key), i, "key {:?} in wrong segment", key);
                queued.push((key, node));
            }
        }
        queued.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(indexed, queued);
    }
}

impl<K, V> fmt::Debug for SegmentedLruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentedLruCache")
            .field("config", &self.config)
            .field("layout", &self.layout)
            .field("len", &self.index.len())
            .finish()
    }
}

impl<K, V> CacheContract<K, V> for SegmentedLruCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get_or_load(
        &self,
        key: K,
        min_ttl: Duration,
        max_ttl: Duration,
        loader: DynLoader<'_, K, V>,
    ) -> Result<V> {
        SegmentedLruCache::get_or_load(self, key, min_ttl, max_ttl, loader)
    }

    fn get_if_present(&self, key: &K) -> Option<V> {
        SegmentedLruCache::get_if_present(self, key)
    }

    fn put(&self, key: K, value: V, min_ttl: Duration, max_ttl: Duration) -> Result<()> {
        SegmentedLruCache::put(self, key, value, min_ttl, max_ttl)
    }

    fn remove(&self, key: &K) {
        SegmentedLruCache::remove(self, key)
    }

    fn stats(&self) -> CacheStats {
        SegmentedLruCache::stats(self)
    }
}

// =============================================================================
// Tests
// =============================================================================
