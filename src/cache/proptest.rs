//! Property-Based Tests for the Segmented Cache
//!
//! Drives random operation sequences through small caches and checks the
//! structural invariants after every step.
//!
//! # Test Properties
//!
//! 1. **Capacity**: every hot/cold queue always holds exactly its configured
//!    number of slots, placeholders included
//! 2. **Consistency**: the key index and the queues name the same live nodes
//! 3. **Bounded size**: live entries never exceed the layout capacity
//! 4. **Read-your-writes**: a value just stored is returned by the next read

#![cfg(test)]

use std::time::Duration;

use proptest::prelude::*;

use super::SegmentedLruCache;

const LONG_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
enum Op {
    Load(u16),
    Peek(u16),
    Put(u16, u32),
    Remove(u16),
    Expire(u16),
}

// =============================================================================
// Property Strategies
// =============================================================================

/// Strategy for generating small cache layouts, degenerate splits included.
fn layout_strategy() -> impl Strategy<Value = (usize, usize, f64)> {
    (
        1usize..=32,
        1usize..=4,
        prop_oneof![Just(0.0), Just(1.0), 0.0f64..=1.0],
    )
}

/// Strategy for operations over a key space a few times larger than the cache.
fn op_strategy() -> impl Strategy<Value = Op> {
    let key = 0u16..48;
    prop_oneof![
        4 => key.clone().prop_map(Op::Load),
        3 => key.clone().prop_map(Op::Peek),
        3 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Put(k, v)),
        1 => key.clone().prop_map(Op::Remove),
        1 => key.prop_map(Op::Expire),
    ]
}

fn apply(cache: &SegmentedLruCache<u16, u32>, op: &Op) {
    match *op {
        Op::Load(k) => {
            cache
                .get_or_insert_with(k, LONG_TTL, LONG_TTL, |k| u32::from(*k))
                .unwrap();
        }
        Op::Peek(k) => {
            cache.get_if_present(&k);
        }
        Op::Put(k, v) => cache.put(k, v, LONG_TTL, LONG_TTL).unwrap(),
        Op::Remove(k) => cache.remove(&k),
        Op::Expire(k) => {
            // Zero TTL: gone by the next read, retracted on that read
            cache.put(k, 0, Duration::ZERO, Duration::ZERO).unwrap();
            cache.get_if_present(&k);
        }
    }
}

// =============================================================================
// Structural Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: queues stay full and index/queues agree after every operation.
    #[test]
    fn prop_invariants_hold_after_every_op(
        (capacity, segments, hot_ratio) in layout_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let cache = SegmentedLruCache::new(capacity, segments, hot_ratio)?;
        let layout = cache.layout();

        for op in &ops {
            apply(&cache, op);
            cache.assert_consistent();

            let occupancy = cache.segment_occupancy();
            prop_assert!(occupancy.iter().all(|o| o.is_full()));
            prop_assert!(occupancy.iter().all(|o| o.live() <= layout.segment_capacity()));
            prop_assert!(cache.len() <= layout.total_capacity());
        }
    }

    /// Property: request and hit counters track every read.
    #[test]
    fn prop_counters_balance(
        (capacity, segments, hot_ratio) in layout_strategy(),
        keys in prop::collection::vec(0u16..48, 1..200),
    ) {
        let cache = SegmentedLruCache::new(capacity, segments, hot_ratio)?;
        let mut hits = 0u64;

        for k in &keys {
            if cache.get_if_present(k).is_some() {
                hits += 1;
            } else {
                cache.put(*k, u32::from(*k), LONG_TTL, LONG_TTL)?;
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.request_count(), keys.len() as u64);
        prop_assert_eq!(stats.hit_count(), hits);
        prop_assert_eq!(stats.size(), cache.len());
    }
}

// =============================================================================
// Behavioural Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: a put is visible to the very next read when entries are retained.
    #[test]
    fn prop_read_your_writes(
        (capacity, segments, hot_ratio) in layout_strategy(),
        ops in prop::collection::vec(op_strategy(), 0..100),
        key in 0u16..48,
        value in any::<u32>(),
    ) {
        let cache = SegmentedLruCache::new(capacity, segments, hot_ratio)?;
        for op in &ops {
            apply(&cache, op);
        }

        cache.put(key, value, LONG_TTL, LONG_TTL)?;
        let expected = cache.layout().retains_entries().then_some(value);
        prop_assert_eq!(cache.get_if_present(&key), expected);

        cache.remove(&key);
        prop_assert_eq!(cache.get_if_present(&key), None);
        cache.assert_consistent();
    }
}
