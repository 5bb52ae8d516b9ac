//! Segment - Two-Tier Eviction Engine
//!
//! Each segment owns a hot and a cold [`Queue`] over a shared slot arena,
//! guarded by one mutex.
//!
//! # Policy
//!
//! - New entries are admitted at the cold head; the cold tail is evicted
//! - A hit on a cold entry promotes it to the hot head
//! - Promotion pushes the hot tail back to the cold head (demotion)
//! - Removed or expired entries stay in place as placeholders until they
//!   drift off a tail
//!
//! Both queues are always full (placeholders included), so every admission
//! evicts exactly one slot and the evicted slot is recycled for the new entry.

use parking_lot::Mutex;
use tracing::{error, trace};

use super::node::{Node, NodeRef, NodeStatus, SlotState};
use super::queue::Queue;

/// Result of admitting a new entry
#[derive(Debug)]
pub(crate) struct Admission<K> {
    /// Reference to the new node, `None` if the segment has no cold slots
    pub(crate) node: Option<NodeRef>,
    /// Live entry pushed off the cold tail to make room
    pub(crate) evicted: Option<Evicted<K>>,
}

/// An entry that lost its slot; the caller retracts it from the key index
#[derive(Debug)]
pub(crate) struct Evicted<K> {
    pub(crate) key: K,
    pub(crate) node: NodeRef,
}

/// Queue sizes and live entries of one segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentOccupancy {
    /// Slots currently linked in the hot queue
    pub hot_len: usize,
    /// Configured hot queue size
    pub hot_capacity: usize,
    /// Slots currently linked in the cold queue
    pub cold_len: usize,
    /// Configured cold queue size
    pub cold_capacity: usize,
    /// Hot slots holding a key
    pub hot_live: usize,
    /// Cold slots holding a key
    pub cold_live: usize,
}

impl SegmentOccupancy {
    /// Both queues hold exactly their configured number of slots
    pub fn is_full(&self) -> bool {
        self.hot_len == self.hot_capacity && self.cold_len == self.cold_capacity
    }

    /// Slots holding a key
    pub fn live(&self) -> usize {
        self.hot_live + self.cold_live
    }
}

struct Lists<K> {
    nodes: Vec<Node<K>>,
    hot: Queue,
    cold: Queue,
}

/// One independently locked shard of the cache
pub(crate) struct Segment<K> {
    lists: Mutex<Lists<K>>,
    slots: Box<[SlotState]>,
}

impl<K> Segment<K> {
    /// Build a segment with both queues filled with placeholders
    pub(crate) fn new(hot_capacity: usize, cold_capacity: usize) -> Self {
        let total = hot_capacity + cold_capacity;
        let mut nodes: Vec<Node<K>> = (0..total).map(|_| Node::placeholder()).collect();
        let mut hot = Queue::new(hot_capacity);
        let mut cold = Queue::new(cold_capacity);

        for id in 0..hot_capacity {
            hot.insert_head_evict_tail(&mut nodes, id);
        }
        for id in hot_capacity..total {
            cold.insert_head_evict_tail(&mut nodes, id);
        }

        Self {
            lists: Mutex::new(Lists { nodes, hot, cold }),
            slots: (0..total).map(|_| SlotState::placeholder()).collect(),
        }
    }

    /// Admit a brand-new entry at the cold head
    ///
    /// The cold tail is evicted and its slot reused; if it still held a key
    /// that key is handed back so the caller can retract it from the index.
    pub(crate) fn admit(&self, key: K) -> Admission<K> {
        let mut guard = self.lists.lock();
        let Lists { nodes, cold, .. } = &mut *guard;

        let Some(slot) = cold.evict_tail(nodes) else {
            // No cold slots: nothing can be retained
            return Admission {
                node: None,
                evicted: None,
            };
        };

        let state = &self.slots[slot];
        let evicted = nodes[slot].key.take().map(|old_key| Evicted {
            key: old_key,
            node: NodeRef {
                slot,
                stamp: state.stamp(),
            },
        });

        state.set_status(NodeStatus::Initial);
        let stamp = state.bump_stamp();
        nodes[slot].key = Some(key);
        state.set_status(NodeStatus::Cold);

        if cold.insert_head_evict_tail(nodes, slot).is_some() {
            invariant_violation("cold queue evicted twice for a single admission");
        }

        if evicted.is_some() {
            trace!(slot, "evicted cold tail");
        }

        Admission {
            node: Some(NodeRef { slot, stamp }),
            evicted,
        }
    }

    /// Record a hit, promoting a cold node to the hot head
    ///
    /// Hot and removed nodes are skipped without taking the lock. That read
    /// races with concurrent demotion; losing the race only delays promotion
    /// until the next hit.
    pub(crate) fn touch(&self, node: NodeRef) {
        let state = &self.slots[node.slot];
        match state.status() {
            NodeStatus::Hot | NodeStatus::Removed => return,
            NodeStatus::Initial | NodeStatus::Cold => {}
        }
        if state.stamp() != node.stamp {
            return;
        }

        let mut guard = self.lists.lock();
        if state.stamp() != node.stamp || state.status() != NodeStatus::Cold {
            return;
        }

        let Lists { nodes, hot, cold } = &mut *guard;
        cold.remove_arbitrary(nodes, node.slot);
        state.set_status(NodeStatus::Hot);

        let Some(demoted) = hot.insert_head_evict_tail(nodes, node.slot) else {
            invariant_violation("hot queue accepted a promotion without evicting");
        };

        let demoted_state = &self.slots[demoted];
        if nodes[demoted].key.is_some() {
            demoted_state.set_status(NodeStatus::Cold);
        }
        if cold.insert_head_evict_tail(nodes, demoted).is_some() {
            invariant_violation("demotion cascaded into a cold eviction");
        }

        trace!(promoted = node.slot, demoted, "promoted cold node");
    }

    /// Turn a live node into a placeholder without unlinking it
    ///
    /// Returns false if the node was already superseded.
    pub(crate) fn release(&self, node: NodeRef) -> bool {
        let mut guard = self.lists.lock();
        let state = &self.slots[node.slot];
        if !state.is_current(node) {
            return false;
        }

        guard.nodes[node.slot].key = None;
        state.set_status(NodeStatus::Removed);
        state.bump_stamp();
        true
    }

    /// True while `node` still names a live occupant of its slot
    pub(crate) fn is_current(&self, node: NodeRef) -> bool {
        self.slots
            .get(node.slot)
            .is_some_and(|state| state.is_current(node))
    }

    /// Status of the slot `node` points at, if it still owns it
    #[cfg(test)]
    pub(crate) fn status(&self, node: NodeRef) -> Option<NodeStatus> {
        let state = self.slots.get(node.slot)?;
        (state.stamp() == node.stamp).then(|| state.status())
    }

    /// Count queue members and live entries
    pub(crate) fn occupancy(&self) -> SegmentOccupancy {
        let guard = self.lists.lock();
        let live = |queue: &Queue| {
            queue
                .iter(&guard.nodes)
                .filter(|&id| guard.nodes[id].key.is_some())
                .count()
        };

        SegmentOccupancy {
            hot_len: guard.hot.len(),
            hot_capacity: guard.hot.capacity(),
            cold_len: guard.cold.len(),
            cold_capacity: guard.cold.capacity(),
            hot_live: live(&guard.hot),
            cold_live: live(&guard.cold),
        }
    }
}

impl<K: Clone> Segment<K> {
    /// Live keys with their node references, hot queue first, head to tail
    #[cfg(test)]
    pub(crate) fn entries(&self) -> Vec<(K, NodeRef, NodeStatus)> {
        let guard = self.lists.lock();
        guard
            .hot
            .iter(&guard.nodes)
            .chain(guard.cold.iter(&guard.nodes))
            .filter_map(|slot| {
                let key = guard.nodes[slot].key.clone()?;
                let state = &self.slots[slot];
                Some((
                    key,
                    NodeRef {
                        slot,
                        stamp: state.stamp(),
                    },
                    state.status(),
                ))
            })
            .collect()
    }
}

#[cold]
#[track_caller]
fn invariant_violation(what: &str) -> ! {
    error!(what, "segment invariant violated");
    panic!("segment invariant violated: {what}");
}

// =============================================================================
// Tests
// =============================================================================
