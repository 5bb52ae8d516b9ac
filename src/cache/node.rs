//! Cache Node Types
//!
//! Nodes live in a per-segment arena and are addressed by slot number from
//! both the key index and the intrusive queue links. A slot is recycled in
//! place when it falls off the cold tail, so every reuse bumps the slot's
//! stamp; a [`NodeRef`] is only valid while its stamp matches.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// Link terminator for the intrusive lists
pub(crate) const NIL: usize = usize::MAX;

/// Lifecycle state of a node within its segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeStatus {
    /// Detached from both queues while being (re)assigned
    Initial = 0,
    /// Linked in the hot queue
    Hot = 1,
    /// Linked in the cold queue
    Cold = 2,
    /// Placeholder: holds no key, still occupies a queue position
    Removed = 3,
}

impl NodeStatus {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => NodeStatus::Initial,
            1 => NodeStatus::Hot,
            2 => NodeStatus::Cold,
            _ => NodeStatus::Removed,
        }
    }

    /// True for states that carry a live key
    #[inline]
    pub fn is_live(self) -> bool {
        matches!(self, NodeStatus::Hot | NodeStatus::Cold)
    }
}

/// Stable reference to a node: slot number plus the stamp it was issued with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub(crate) slot: usize,
    pub(crate) stamp: u64,
}

/// Queue linkage and key for one arena slot, guarded by the segment lock
#[derive(Debug)]
pub(crate) struct Node<K> {
    pub(crate) key: Option<K>,
    pub(crate) prev: usize,
    pub(crate) next: usize,
}

impl<K> Node<K> {
    pub(crate) fn placeholder() -> Self {
        Self {
            key: None,
            prev: NIL,
            next: NIL,
        }
    }
}

/// Lock-free readable view of a slot
///
/// Written only while holding the segment lock; read without it on the
/// promotion fast path, where a stale value only costs a missed promotion.
#[derive(Debug)]
pub(crate) struct SlotState {
    status: AtomicU8,
    stamp: AtomicU64,
}

impl SlotState {
    pub(crate) fn placeholder() -> Self {
        Self {
            status: AtomicU8::new(NodeStatus::Removed as u8),
            stamp: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn status(&self) -> NodeStatus {
        NodeStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn set_status(&self, status: NodeStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    #[inline]
    pub(crate) fn stamp(&self) -> u64 {
        self.stamp.load(Ordering::SeqCst)
    }

    /// Invalidate every outstanding reference to this slot
    #[inline]
    pub(crate) fn bump_stamp(&self) -> u64 {
        self.stamp.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// True while `node` still names the live occupant of this slot
    #[inline]
    pub(crate) fn is_current(&self, node: NodeRef) -> bool {
        self.stamp() == node.stamp && self.status().is_live()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip_through_slot() {
        let state = SlotState::placeholder();
        assert_eq!(state.status(), NodeStatus::Removed);

        for status in [
            NodeStatus::Initial,
            NodeStatus::Hot,
            NodeStatus::Cold,
            NodeStatus::Removed,
        ] {
            state.set_status(status);
            assert_eq!(state.status(), status);
        }
    }

    #[test]
    fn test_stamp_invalidates_refs() {
        let state = SlotState::placeholder();
        let stamp = state.bump_stamp();
        state.set_status(NodeStatus::Cold);

        let node = NodeRef { slot: 0, stamp };
        assert!(state.is_current(node));

        state.bump_stamp();
        assert!(!state.is_current(node));
    }

    #[test]
    fn test_placeholder_is_not_live() {
        let state = SlotState::placeholder();
        assert!(!state.is_current(NodeRef { slot: 0, stamp: 0 }));
        assert!(!NodeStatus::Initial.is_live());
        assert!(NodeStatus::Hot.is_live());
    }
}
