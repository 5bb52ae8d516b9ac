//! Segment Router
//!
//! Maps keys onto segments. The hash is folded with its upper bits before
//! the modulo so clustered hash values still spread across segments.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

/// Deterministic key -> segment mapping
#[derive(Debug, Clone)]
pub struct SegmentRouter<S = RandomState> {
    hasher: S,
    segments: usize,
}

impl SegmentRouter {
    /// Router over `segments` segments with a random hash seed
    pub fn new(segments: usize) -> Self {
        Self::with_hasher(segments, RandomState::new())
    }
}

impl<S: BuildHasher> SegmentRouter<S> {
    /// Router with an explicit hasher
    ///
    /// # Panics
    ///
    /// Panics if `segments` is zero. [`CacheConfig::validate`] rejects that
    /// before a cache builds its router.
    ///
    /// [`CacheConfig::validate`]: super::CacheConfig::validate
    pub fn with_hasher(segments: usize, hasher: S) -> Self {
        assert!(segments > 0, "router needs at least one segment");
        Self { hasher, segments }
    }

    /// Number of segments routed over
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments
    }

    /// Segment index for `key`
    #[inline]
    pub fn route<Q: Hash + ?Sized>(&self, key: &Q) -> usize {
        spread(self.hasher.hash_one(key), self.segments)
    }
}

/// Fold the high bits of `hash` into the low bits, then reduce
#[inline]
pub fn spread(hash: u64, segments: usize) -> usize {
    let h = hash ^ (hash >> 32);
    let h = h ^ (h >> 16);
    (h % segments as u64) as usize
}

// =============================================================================
// Tests
// =============================================================================
