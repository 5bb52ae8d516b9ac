//! Fixed-Capacity Queue
//!
//! Intrusive doubly-linked list over arena slots. Each queue is filled with
//! placeholders when its segment is built and keeps exactly `capacity`
//! members afterwards: a head insertion past capacity unlinks the tail.
//!
//! The queue performs no locking; callers hold the owning segment's lock.

use super::node::{Node, NIL};

/// Recency-ordered queue, most recent at the head
#[derive(Debug)]
pub(crate) struct Queue {
    head: usize,
    tail: usize,
    len: usize,
    capacity: usize,
}

impl Queue {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            head: NIL,
            tail: NIL,
            len: 0,
            capacity,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Link `id` at the head and unlink the tail if that overflows the queue
    ///
    /// With `capacity == 0` the evicted slot is `id` itself.
    pub(crate) fn insert_head_evict_tail<K>(
        &mut self,
        nodes: &mut [Node<K>],
        id: usize,
    ) -> Option<usize> {
        self.link_head(nodes, id);
        if self.len > self.capacity {
            self.evict_tail(nodes)
        } else {
            None
        }
    }

    /// Unlink the tail slot
    pub(crate) fn evict_tail<K>(&mut self, nodes: &mut [Node<K>]) -> Option<usize> {
        if self.tail == NIL {
            return None;
        }
        let tail = self.tail;
        self.unlink(nodes, tail);
        Some(tail)
    }

    /// Unlink a member from anywhere in the queue
    ///
    /// Leaves the queue one short of capacity until the caller relinks a slot.
    pub(crate) fn remove_arbitrary<K>(&mut self, nodes: &mut [Node<K>], id: usize) {
        self.unlink(nodes, id);
    }

    /// Slots from head to tail
    pub(crate) fn iter<'a, K>(&self, nodes: &'a [Node<K>]) -> impl Iterator<Item = usize> + 'a {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            if cursor == NIL {
                return None;
            }
            let id = cursor;
            cursor = nodes[id].next;
            Some(id)
        })
    }

    fn link_head<K>(&mut self, nodes: &mut [Node<K>], id: usize) {
        nodes[id].prev = NIL;
        nodes[id].next = self.head;
        if self.head == NIL {
            self.tail = id;
        } else {
            nodes[self.head].prev = id;
        }
        self.head = id;
        self.len += 1;
    }

    fn unlink<K>(&mut self, nodes: &mut [Node<K>], id: usize) {
        let (prev, next) = (nodes[id].prev, nodes[id].next);

        if prev == NIL {
            self.head = next;
        } else {
            nodes[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            nodes[next].prev = prev;
        }

        nodes[id].prev = NIL;
        nodes[id].next = NIL;
        self.len -= 1;
    }
}

// =============================================================================
// Tests
// =============================================================================
