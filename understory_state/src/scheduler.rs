// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Batched delivery.

use alloc::rc::Weak;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use hashbrown::HashMap;

use crate::change::ChangeSet;
use crate::id::NodeId;
use crate::node::{Node, NodeInner};

/// Delivery rounds before [`Scheduler::flush`] gives up on a feedback loop.
pub(crate) const MAX_ROUNDS: usize = 64;

struct Pending {
    node: Weak<NodeInner>,
    changes: ChangeSet,
}

/// Per-tree queue of nodes with batched subscribers awaiting delivery.
///
/// Each node appears at most once; triggers between flushes OR their changes
/// together.
#[derive(Default)]
pub(crate) struct Scheduler {
    queue: RefCell<Vec<Pending>>,
    index: RefCell<HashMap<NodeId, usize>>,
}

impl Scheduler {
    pub(crate) fn enqueue(&self, node: &Node, changes: ChangeSet) {
        let mut queue = self.queue.borrow_mut();
        let mut index = self.index.borrow_mut();
        match index.get(&node.id()) {
            Some(&slot) => queue[slot].changes |= changes,
            None => {
                index.insert(node.id(), queue.len());
                queue.push(Pending {
                    node: node.downgrade(),
                    changes,
                });
            }
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Delivers queued changes until nothing new is queued.
    ///
    /// Callbacks that write to the tree queue further deliveries, which run in
    /// the next round. Returns the number of callbacks invoked.
    pub(crate) fn flush(&self) -> usize {
        let mut delivered = 0;
        for _ in 0..MAX_ROUNDS {
            let batch = core::mem::take(&mut *self.queue.borrow_mut());
            self.index.borrow_mut().clear();
            if batch.is_empty() {
                return delivered;
            }
            for pending in batch {
                if let Some(inner) = pending.node.upgrade() {
                    delivered += Node::from_inner(inner).deliver(pending.changes);
                }
            }
        }
        let left = self.pending();
        if left > 0 {
            tracing::warn!(
                pending = left,
                rounds = MAX_ROUNDS,
                "batched delivery did not settle; leaving the rest queued"
            );
        }
        delivered
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use core::cell::Cell;

    use crate::{ChangeSet, Node, Value};

    #[test]
    fn one_entry_per_node() {
        let node = Node::new(1);
        let _sub = node.watch(|_, _| {});
        node.set(2);
        node.set(3);
        assert_eq!(node.inner.tree.scheduler.pending(), 1);
        assert_eq!(node.flush(), 1);
        assert_eq!(node.inner.tree.scheduler.pending(), 0);
        assert_eq!(node.flush(), 0);
    }

    #[test]
    fn writes_from_callbacks_run_next_round() {
        let node = Node::new(Value::object([("a", 0), ("b", 0)]));
        let a = node.at("a").unwrap();
        let b = node.at("b").unwrap();
        let mirror = b.clone();
        let _copy = a.watch(move |value, _| {
            mirror.set(value.clone());
        });
        let hits = Rc::new(Cell::new(ChangeSet::empty()));
        let sink = Rc::clone(&hits);
        let _seen = b.watch(move |_, changes| sink.set(sink.get() | changes));

        a.set(5);
        assert_eq!(node.flush(), 2);
        assert_eq!(b.get(), Value::from(5));
        assert_eq!(hits.get(), ChangeSet::VALUE);
    }

    #[test]
    fn endless_feedback_is_bounded() {
        let node = Node::new(0);
        let writer = node.clone();
        let _loop = node.watch(move |value, _| {
            let next = value.as_f64().unwrap_or(0.0) + 1.0;
            writer.set(next);
        });
        node.set(1);
        assert_eq!(node.flush(), super::MAX_ROUNDS);
        assert_eq!(node.inner.tree.scheduler.pending(), 1);
    }
}
