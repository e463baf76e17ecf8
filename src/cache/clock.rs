//! Clock Queue Module
//!
//! Circular insertion-order queue with a persistent hand for CLOCK eviction.
//!
//! Nodes live in a slab (`Vec<Option<Node>>`) and are linked by index, so a
//! shard can hold a stable [`NodeId`] per key and unlink it in O(1).
//!
//! ```text
//!            head                         tail
//!             │                            │
//!   ┌──────► [A] ──► [B] ──► [C] ──► [D] ──┐
//!   └──────────────────────────────────────┘
//!                     ▲
//!                    hand
//! ```

// == Node Id ==
/// Stable handle to a node in a [`ClockQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: usize,
    next: usize,
}

// == Clock Queue ==
/// Circular doubly-linked queue in insertion order, scanned by a hand.
///
/// The hand always points at a live node while the queue is non-empty and
/// is `None` once the queue drains.
#[derive(Debug)]
pub struct ClockQueue<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    /// Oldest node (front of insertion order)
    head: Option<usize>,
    hand: Option<usize>,
    len: usize,
}

impl<T> Default for ClockQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ClockQueue<T> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            hand: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.node(id.0).map(|node| &node.value)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slots
            .get_mut(id.0)
            .and_then(|slot| slot.as_mut())
            .map(|node| &mut node.value)
    }

    // == Push Back ==
    /// Appends a value behind the newest node.
    ///
    /// The first node pushed into an empty queue also becomes the hand.
    pub fn push_back(&mut self, value: T) -> NodeId {
        let idx = match self.head {
            None => {
                let idx = self.alloc(Node {
                    value,
                    prev: 0,
                    next: 0,
                });
                self.link_mut(idx).prev = idx;
                self.link_mut(idx).next = idx;
                self.head = Some(idx);
                self.hand = Some(idx);
                idx
            }
            Some(head) => {
                let tail = self.link(head).prev;
                let idx = self.alloc(Node {
                    value,
                    prev: tail,
                    next: head,
                });
                self.link_mut(tail).next = idx;
                self.link_mut(head).prev = idx;
                idx
            }
        };
        self.len += 1;
        NodeId(idx)
    }

    // == Remove ==
    /// Unlinks a node and returns its value.
    ///
    /// If the hand pointed at the removed node it moves to the node that
    /// followed it, wrapping from the newest back to the oldest.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let (prev, next) = {
            let node = self.node(id.0)?;
            (node.prev, node.next)
        };

        if self.len == 1 {
            self.head = None;
            self.hand = None;
        } else {
            self.link_mut(prev).next = next;
            self.link_mut(next).prev = prev;
            if self.head == Some(id.0) {
                self.head = Some(next);
            }
            if self.hand == Some(id.0) {
                self.hand = Some(next);
            }
        }

        let node = self.slots[id.0].take()?;
        self.free.push(id.0);
        self.len -= 1;
        Some(node.value)
    }

    // == Hand ==
    /// Node currently under the hand.
    pub fn hand(&self) -> Option<NodeId> {
        self.hand.map(NodeId)
    }

    /// Moves the hand one node forward, wrapping at the end.
    pub fn advance(&mut self) {
        if let Some(hand) = self.hand {
            self.hand = Some(self.link(hand).next);
        }
    }

    // == Iteration ==
    /// Values from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let mut cursor = self.head;
        let mut remaining = self.len;
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            let node = self.node(cursor?)?;
            cursor = Some(node.next);
            remaining -= 1;
            Some(&node.value)
        })
    }

    fn alloc(&mut self, node: Node<T>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    fn node(&self, idx: usize) -> Option<&Node<T>> {
        self.slots.get(idx).and_then(|slot| slot.as_ref())
    }

    // Linked indices always refer to occupied slots.
    fn link(&self, idx: usize) -> &Node<T> {
        self.slots[idx].as_ref().expect("linked slot is occupied")
    }

    fn link_mut(&mut self, idx: usize) -> &mut Node<T> {
        self.slots[idx].as_mut().expect("linked slot is occupied")
    }
}
