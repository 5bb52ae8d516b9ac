//! Key Index
//!
//! Concurrent key -> node map; the single source of truth for whether a key
//! is cached. Besides the node reference each entry carries the value and
//! its deadline, so hits are served without touching a segment lock.

use std::hash::Hash;

use dashmap::DashMap;

use super::node::NodeRef;

/// A cached value and the node that pins it in a segment
#[derive(Debug, Clone)]
pub(crate) struct Resident<V> {
    pub(crate) node: NodeRef,
    pub(crate) value: V,
    /// Absolute deadline in cache-clock milliseconds
    pub(crate) expire_at: u64,
}

impl<V> Resident<V> {
    #[inline]
    pub(crate) fn is_expired(&self, now: u64) -> bool {
        self.expire_at <= now
    }
}

/// Index of live entries
pub(crate) struct KeyIndex<K, V> {
    map: DashMap<K, Resident<V>>,
}

impl<K: Eq + Hash, V: Clone> KeyIndex<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            map: DashMap::with_capacity(capacity),
        }
    }

    /// Copy out the entry for `key`; the map shard is unlocked on return
    pub(crate) fn get(&self, key: &K) -> Option<Resident<V>> {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    /// Install `resident` unconditionally, returning what it replaced
    pub(crate) fn insert(&self, key: K, resident: Resident<V>) -> Option<Resident<V>> {
        self.map.insert(key, resident)
    }

    /// Remove `key` only if it still points at `node`
    pub(crate) fn retract(&self, key: &K, node: NodeRef) -> bool {
        self.map
            .remove_if(key, |_, resident| resident.node == node)
            .is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> Vec<(K, NodeRef)>
    where
        K: Clone,
    {
        self.map
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().node))
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
