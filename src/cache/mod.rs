//! Segmented Two-Tier LRU Cache
//!
//! In-process key/value cache with bounded size, per-entry TTL and
//! single-flight loading on miss.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                         SegmentedLruCache                                │
//! ├──────────────────────────────────────────────────────────────────────────┤
//! │  KeyIndex (DashMap)         Flights (single-flight)     StatsCollector   │
//! │  key -> node + value        key -> in-progress load     striped counters │
//! │         │                                                                │
//! │   SegmentRouter: hash -> segment                                         │
//! │         │                                                                │
//! │  ┌──────────────┐ ┌──────────────┐         ┌──────────────┐              │
//! │  │  Segment 0   │ │  Segment 1   │   ...   │  Segment N-1 │              │
//! │  │ hot  [....]  │ │ hot  [....]  │         │ hot  [....]  │              │
//! │  │ cold [......]│ │ cold [......]│         │ cold [......]│              │
//! │  └──────────────┘ └──────────────┘         └──────────────┘              │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - One mutex per segment, taken only to relink queue nodes
//! - Fixed-size slot arenas: no node allocation after construction
//! - Lazy expiry: no background sweeper, expired entries are dropped on read
//! - Hot/cold split filters one-hit wonders without LFU bookkeeping

mod clock;
mod config;
mod contract;
mod flight;
mod index;
mod node;
mod queue;
mod router;
mod segment;
mod segmented;
mod stats;

#[cfg(test)]
mod proptest;

pub use config::{CacheConfig, SegmentLayout};
pub use contract::{CacheContract, DynLoader};
pub use router::{spread, SegmentRouter};
pub use segment::SegmentOccupancy;
pub use segmented::SegmentedLruCache;
pub use stats::{CacheStats, StripedCounter};

/// Default total capacity (entries)
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Default number of segments
pub const DEFAULT_SEGMENT_COUNT: usize = 16;

/// Default share of each segment reserved for hot entries
pub const DEFAULT_HOT_RATIO: f64 = 0.25;

// =============================================================================
// Tests
// =============================================================================
