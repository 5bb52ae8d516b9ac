//! Segmented LRU - Concurrent In-Process Cache
//!
//! A bounded key/value cache for many threads inside one process, with
//! per-entry time-to-live and protection against cache stampedes.
//!
//! # Features
//!
//! - Two-tier (hot/cold) LRU eviction: entries hit more than once outlive
//!   one-off lookups
//! - Lock sharding across independent segments
//! - Lazy TTL expiry with optional jitter, no background thread
//! - Single-flight loading: concurrent misses on one key run the loader once
//! - Lock-free request/hit counters with mergeable snapshots
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use segmented_lru::SegmentedLruCache;
//!
//! let cache = SegmentedLruCache::new(1_000, 8, 0.25)?;
//! let ttl = Duration::from_secs(30);
//!
//! let value = cache.get_or_insert_with(7u64, ttl, ttl, |k| k * 6)?;
//! assert_eq!(value, 42);
//! assert_eq!(cache.get_if_present(&7), Some(42));
//! # Ok::<(), segmented_lru::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`cache`] - Cache engine, configuration and statistics
//! - [`error`] - Error types

pub mod cache;
pub mod error;

// Re-export commonly used types
pub use cache::{
    CacheConfig, CacheContract, CacheStats, SegmentLayout, SegmentOccupancy, SegmentedLruCache,
};
pub use error::{BoxError, Error, Result};
