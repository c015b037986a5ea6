//! # Circular doubly linked list over an index arena.
//!
//! ```text
//!   slot 0 (sentinel)
//!   ┌──────┐ next  ┌──────┐ next  ┌──────┐
//!   │ HEAD │──────►│  c1  │──────►│  c2  │──┐
//!   └──────┘◄──────└──────┘◄──────└──────┘  │
//!      ▲      prev          prev            │
//!      └────────────────────────────────────┘ tail.next = HEAD
//! ```
//!
//! ## Rules
//! - Slot 0 is the sentinel and is never freed; an empty list points it at itself.
//! - Unlinking rewires the neighbours only. The removed node keeps its own
//!   `prev`/`next`, so a walker standing on it can still step forward.
//! - While a walk is in progress, unlinked slots are retired instead of freed;
//!   they return to the vacant list when the last walk ends.
//! - Freeing a slot bumps its generation, so stale [`Slot`]s never touch a
//!   reused node.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::handlers::HandlerRef;
use crate::signal::connection::{ConnState, Flags};

/// Index of the sentinel node.
pub(crate) const HEAD: usize = 0;

/// Stable address of a node: arena index plus the generation it was allocated in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Slot {
    pub(crate) index: usize,
    pub(crate) generation: u64,
}

/// Payload of a linked node.
pub(crate) struct Entry<T: Send + 'static> {
    pub(crate) handler: HandlerRef<T>,
    pub(crate) state: Arc<ConnState>,
}

impl<T: Send + 'static> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            state: Arc::clone(&self.state),
        }
    }
}

struct Node<T: Send + 'static> {
    prev: usize,
    next: usize,
    generation: u64,
    linked: bool,
    entry: Option<Entry<T>>,
}

impl<T: Send + 'static> Node<T> {
    fn sentinel() -> Self {
        Self {
            prev: HEAD,
            next: HEAD,
            generation: 0,
            linked: true,
            entry: None,
        }
    }
}

pub(crate) struct List<T: Send + 'static> {
    nodes: Vec<Node<T>>,
    vacant: Vec<usize>,
    retired: Vec<usize>,
    walkers: usize,
    len: usize,
}

impl<T: Send + 'static> List<T> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Node::sentinel()],
            vacant: Vec::new(),
            retired: Vec::new(),
            walkers: 0,
            len: 0,
        }
    }

    /// Number of linked subscribers.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Links a new node right before the sentinel.
    pub(crate) fn push_back(&mut self, handler: HandlerRef<T>, flags: Flags) -> Arc<ConnState> {
        let index = match self.vacant.pop() {
            Some(index) => index,
            None => {
                self.nodes.push(Node {
                    prev: HEAD,
                    next: HEAD,
                    generation: 0,
                    linked: false,
                    entry: None,
                });
                self.nodes.len() - 1
            }
        };

        let tail = self.nodes[HEAD].prev;
        let slot = Slot {
            index,
            generation: self.nodes[index].generation,
        };
        let state = Arc::new(ConnState::new(slot, flags));

        let node = &mut self.nodes[index];
        node.prev = tail;
        node.next = HEAD;
        node.linked = true;
        node.entry = Some(Entry {
            handler,
            state: Arc::clone(&state),
        });
        self.nodes[tail].next = index;
        self.nodes[HEAD].prev = index;
        self.len += 1;
        state
    }

    /// Unlinks the node at `slot` if it is still the same, linked node.
    ///
    /// Returns the entry when its slot could be freed right away; the caller
    /// drops it after releasing the lock.
    pub(crate) fn unlink(&mut self, slot: Slot) -> Option<Entry<T>> {
        if slot.index == HEAD || slot.index >= self.nodes.len() {
            return None;
        }
        let node = &self.nodes[slot.index];
        if node.generation != slot.generation || !node.linked {
            return None;
        }

        let (prev, next) = (node.prev, node.next);
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
        self.nodes[slot.index].linked = false;
        self.len -= 1;
        self.retire(slot.index)
    }

    /// Detaches every node from the sentinel without touching connection flags.
    pub(crate) fn clear(&mut self) -> Vec<Entry<T>> {
        let mut freed = Vec::new();
        let mut cursor = self.nodes[HEAD].next;
        while cursor != HEAD {
            let next = self.nodes[cursor].next;
            self.nodes[cursor].linked = false;
            freed.extend(self.retire(cursor));
            cursor = next;
        }
        self.nodes[HEAD].next = HEAD;
        self.nodes[HEAD].prev = HEAD;
        self.len = 0;
        freed
    }

    /// Registers a walker and returns the first node to examine.
    pub(crate) fn begin_walk(&mut self) -> usize {
        self.walkers += 1;
        self.nodes[HEAD].next
    }

    /// Unregisters a walker; the last one out frees retired slots.
    pub(crate) fn end_walk(&mut self) -> Vec<Entry<T>> {
        self.walkers = self.walkers.saturating_sub(1);
        if self.walkers > 0 {
            return Vec::new();
        }
        let retired = std::mem::take(&mut self.retired);
        retired
            .into_iter()
            .filter_map(|index| self.free(index))
            .collect()
    }

    /// Advances `cursor` to the next linked node and returns its entry.
    ///
    /// The successor is captured before anything is mutated. A `once` node is
    /// unlinked and marked disconnected before it is returned.
    pub(crate) fn next_visit(&mut self, cursor: &mut usize) -> Option<Entry<T>> {
        while *cursor != HEAD {
            let index = *cursor;
            let node = &self.nodes[index];
            *cursor = node.next;
            if !node.linked {
                continue;
            }
            let Some(entry) = node.entry.clone() else {
                continue;
            };
            if entry.state.flags().once {
                entry.state.connected.store(false, Ordering::Release);
                let slot = entry.state.slot();
                let _retired = self.unlink(slot);
            }
            return Some(entry);
        }
        None
    }

    fn retire(&mut self, index: usize) -> Option<Entry<T>> {
        if self.walkers > 0 {
            self.retired.push(index);
            None
        } else {
            self.free(index)
        }
    }

    fn free(&mut self, index: usize) -> Option<Entry<T>> {
        let node = &mut self.nodes[index];
        node.generation += 1;
        self.vacant.push(index);
        node.entry.take()
    }
}
