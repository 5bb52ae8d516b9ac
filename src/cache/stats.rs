//! Cache Statistics
//!
//! Striped request/hit counters and the immutable [`CacheStats`] snapshot.
//!
//! Counters never touch a segment lock. Each thread is pinned to one
//! cache-line padded stripe on first use, so concurrent increments rarely
//! share a line; reads sum all stripes.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam::utils::CachePadded;
use serde::Serialize;

use crate::error::{Error, Result};

/// Upper bound on stripes per counter
const MAX_STRIPES: usize = 64;

static NEXT_STRIPE: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static STRIPE: usize = NEXT_STRIPE.fetch_add(1, Ordering::Relaxed);
}

/// Contention-spreading counter
#[derive(Debug)]
pub struct StripedCounter {
    cells: Box<[CachePadded<AtomicU64>]>,
}

impl Default for StripedCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl StripedCounter {
    /// Counter sized to the machine's parallelism
    pub fn new() -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::with_stripes(parallelism * 2)
    }

    /// Counter with `stripes` cells, rounded up to a power of two
    pub fn with_stripes(stripes: usize) -> Self {
        let stripes = stripes.clamp(1, MAX_STRIPES).next_power_of_two();
        Self {
            cells: (0..stripes)
                .map(|_| CachePadded::new(AtomicU64::new(0)))
                .collect(),
        }
    }

    #[inline]
    pub fn increment(&self) {
        self.add(1);
    }

    #[inline]
    pub fn add(&self, n: u64) {
        let stripe = STRIPE.with(|s| *s) & (self.cells.len() - 1);
        self.cells[stripe].fetch_add(n, Ordering::Relaxed);
    }

    /// Current total; not atomic with respect to concurrent increments
    pub fn sum(&self) -> u64 {
        self.cells.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    /// Number of stripes
    pub fn stripes(&self) -> usize {
        self.cells.len()
    }
}

/// Live counters owned by a cache
#[derive(Debug)]
pub(crate) struct StatsCollector {
    requests: StripedCounter,
    hits: StripedCounter,
    start_time: u64,
}

impl StatsCollector {
    pub(crate) fn new(start_time: u64) -> Self {
        Self {
            requests: StripedCounter::new(),
            hits: StripedCounter::new(),
            start_time,
        }
    }

    #[inline]
    pub(crate) fn record_request(&self) {
        self.requests.increment();
    }

    #[inline]
    pub(crate) fn record_hit(&self) {
        self.hits.increment();
    }

    pub(crate) fn snapshot(&self, size: usize, now: u64) -> CacheStats {
        CacheStats::new(
            size,
            self.start_time,
            now,
            self.requests.sum(),
            self.hits.sum(),
        )
    }
}

/// Immutable statistics snapshot
///
/// Times are milliseconds on the owning cache's clock. Subtracting an
/// earlier snapshot yields the activity over the interval between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    size: usize,
    start_time: u64,
    record_time: u64,
    request_count: u64,
    hit_count: u64,
}

impl CacheStats {
    pub fn new(
        size: usize,
        start_time: u64,
        record_time: u64,
        request_count: u64,
        hit_count: u64,
    ) -> Self {
        Self {
            size,
            start_time,
            record_time,
            request_count,
            hit_count,
        }
    }

    /// Live entries when the snapshot was taken
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    pub fn record_time(&self) -> u64 {
        self.record_time
    }

    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    pub fn miss_count(&self) -> u64 {
        self.request_count.saturating_sub(self.hit_count)
    }

    /// Milliseconds covered by this snapshot
    pub fn elapsed(&self) -> u64 {
        self.record_time.saturating_sub(self.start_time)
    }

    pub fn hit_rate(&self) -> f64 {
        ratio(self.hit_count, self.request_count)
    }

    pub fn miss_rate(&self) -> f64 {
        ratio(self.miss_count(), self.request_count)
    }

    pub fn requests_per_second(&self) -> f64 {
        self.per_second(self.request_count)
    }

    pub fn hits_per_second(&self) -> f64 {
        self.per_second(self.hit_count)
    }

    pub fn misses_per_second(&self) -> f64 {
        self.per_second(self.miss_count())
    }

    fn per_second(&self, metric: u64) -> f64 {
        ratio(metric.saturating_mul(1000), self.elapsed())
    }

    /// Activity between `earlier` and this snapshot
    ///
    /// The result starts at `earlier.record_time`. Size is the (saturating)
    /// change in live entries.
    pub fn minus(&self, earlier: &CacheStats) -> Result<CacheStats> {
        self.check_start_time(earlier)?;
        Ok(CacheStats {
            size: self.size.saturating_sub(earlier.size),
            start_time: earlier.record_time,
            record_time: self.record_time,
            request_count: self.request_count.saturating_sub(earlier.request_count),
            hit_count: self.hit_count.saturating_sub(earlier.hit_count),
        })
    }

    /// Merge two snapshots taken from caches started at the same time
    pub fn plus(&self, other: &CacheStats) -> Result<CacheStats> {
        self.check_start_time(other)?;
        Ok(CacheStats {
            size: self.size.saturating_add(other.size),
            start_time: self.start_time,
            record_time: self.record_time.max(other.record_time),
            request_count: self.request_count.saturating_add(other.request_count),
            hit_count: self.hit_count.saturating_add(other.hit_count),
        })
    }

    fn check_start_time(&self, other: &CacheStats) -> Result<()> {
        if self.start_time != other.start_time {
            return Err(Error::StartTimeMismatch {
                left: self.start_time,
                right: other.start_time,
            });
        }
        Ok(())
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

// =============================================================================
// Tests
// =============================================================================
