//! Cache Configuration
//!
//! Sizing knobs for the segmented cache and the per-segment layout derived
//! from them.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{DEFAULT_CAPACITY, DEFAULT_HOT_RATIO, DEFAULT_SEGMENT_COUNT};

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Total number of entries across all segments
    pub capacity: usize,
    /// Number of independently locked segments
    pub segment_count: usize,
    /// Share of each segment reserved for the hot queue (0.0 - 1.0)
    pub hot_ratio: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            segment_count: DEFAULT_SEGMENT_COUNT,
            hot_ratio: DEFAULT_HOT_RATIO,
        }
    }
}

impl CacheConfig {
    /// Create a configuration from explicit values
    pub fn new(capacity: usize, segment_count: usize, hot_ratio: f64) -> Self {
        Self {
            capacity,
            segment_count,
            hot_ratio,
        }
    }

    /// Set the total capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the segment count
    pub fn with_segment_count(mut self, segment_count: usize) -> Self {
        self.segment_count = segment_count;
        self
    }

    /// Set the hot ratio
    pub fn with_hot_ratio(mut self, hot_ratio: f64) -> Self {
        self.hot_ratio = hot_ratio;
        self
    }

    /// Check the configuration
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidConfig(
                "capacity must be greater than 0".to_string(),
            ));
        }
        if self.segment_count == 0 {
            return Err(Error::InvalidConfig(
                "segment_count must be greater than 0".to_string(),
            ));
        }
        // Written this way so NaN is rejected as well
        if !(0.0..=1.0).contains(&self.hot_ratio) {
            return Err(Error::InvalidConfig(format!(
                "hot_ratio must be between 0 and 1, got {}",
                self.hot_ratio
            )));
        }
        Ok(())
    }

    /// Validate and derive the per-segment layout
    pub fn layout(&self) -> Result<SegmentLayout> {
        self.validate()?;

        let segment_capacity = self.capacity / self.segment_count;
        let hot_capacity = (segment_capacity as f64 * self.hot_ratio) as usize;

        Ok(SegmentLayout {
            segment_count: self.segment_count,
            hot_capacity,
            cold_capacity: segment_capacity - hot_capacity,
        })
    }
}

/// Per-segment queue sizes derived from a [`CacheConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentLayout {
    /// Number of segments
    pub segment_count: usize,
    /// Hot queue size in every segment
    pub hot_capacity: usize,
    /// Cold queue size in every segment
    pub cold_capacity: usize,
}

impl SegmentLayout {
    /// Entries a single segment can hold
    pub fn segment_capacity(&self) -> usize {
        self.hot_capacity + self.cold_capacity
    }

    /// Entries the whole cache can hold
    pub fn total_capacity(&self) -> usize {
        self.segment_capacity() * self.segment_count
    }

    /// Whether new entries can be retained at all
    ///
    /// Admission always goes through the cold queue, so a layout without cold
    /// slots turns every load into a pass-through.
    pub fn retains_entries(&self) -> bool {
        self.cold_capacity > 0
    }
}

/// Validated time-to-live range in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TtlRange {
    min: u64,
    max: u64,
}

impl TtlRange {
    pub(crate) fn new(min: Duration, max: Duration) -> Result<Self> {
        if min > max {
            return Err(Error::InvalidArgument(format!(
                "min_ttl ({:?}) must not exceed max_ttl ({:?})",
                min, max
            )));
        }
        Ok(Self {
            min: duration_millis(min),
            max: duration_millis(max),
        })
    }

    /// Pick a TTL, uniformly in `[min, max)` unless the bounds are equal
    pub(crate) fn sample(&self) -> u64 {
        if self.min == self.max {
            self.min
        } else {
            rand::thread_rng().gen_range(self.min..self.max)
        }
    }
}

fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// =============================================================================
// Tests
// =============================================================================
