// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Subscribers and delivery.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::fmt;

use crate::change::ChangeSet;
use crate::value::Value;

use super::{Node, NodeInner};

type Callback = Rc<dyn Fn(&Value, ChangeSet)>;

struct Watcher {
    id: u64,
    sync: bool,
    callback: Callback,
}

/// A node's subscriber list.
#[derive(Default)]
pub(crate) struct Watchers {
    next: u64,
    entries: Vec<Watcher>,
}

impl Watchers {
    fn add(&mut self, callback: Callback, sync: bool) -> u64 {
        let id = self.next;
        self.next += 1;
        self.entries.push(Watcher { id, sync, callback });
        id
    }

    fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|w| w.id != id);
        self.entries.len() != before
    }

    fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|w| w.id == id)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    fn snapshot(&self, sync: bool) -> Vec<(u64, Callback)> {
        self.entries
            .iter()
            .filter(|w| w.sync == sync)
            .map(|w| (w.id, Rc::clone(&w.callback)))
            .collect()
    }

    fn has_batched(&self) -> bool {
        self.entries.iter().any(|w| !w.sync)
    }
}

/// Keeps a watch callback registered.
///
/// Dropping the subscription (or calling [`unsubscribe`](Self::unsubscribe))
/// removes the callback. [`forget`](Self::forget) leaves it registered until
/// [`Node::unwatch`] or [`Node::deconstruct`].
#[must_use = "dropping a Subscription removes the callback"]
pub struct Subscription {
    node: Weak<NodeInner>,
    id: u64,
    armed: bool,
}

impl Subscription {
    /// Removes the callback now.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    /// Keeps the callback registered after this handle is dropped.
    pub fn forget(mut self) {
        self.armed = false;
    }

    /// Returns `true` while the callback is still registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.node
            .upgrade()
            .is_some_and(|inner| inner.watchers.borrow().contains(self.id))
    }

    fn cancel(&mut self) {
        if core::mem::take(&mut self.armed)
            && let Some(inner) = self.node.upgrade()
        {
            inner.watchers.borrow_mut().remove(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("armed", &self.armed)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

impl Node {
    /// Subscribes `callback` to batched delivery.
    ///
    /// Changes accumulate per node until [`flush`](Self::flush), which calls
    /// `callback` once with the value at that time and every change since the
    /// last delivery.
    pub fn watch(&self, callback: impl Fn(&Value, ChangeSet) + 'static) -> Subscription {
        self.watch_with(callback, false)
    }

    /// Subscribes `callback` to synchronous delivery, inline with every trigger.
    pub fn watch_sync(&self, callback: impl Fn(&Value, ChangeSet) + 'static) -> Subscription {
        self.watch_with(callback, true)
    }

    /// Subscribes `callback` to synchronous or batched delivery.
    pub fn watch_with(
        &self,
        callback: impl Fn(&Value, ChangeSet) + 'static,
        sync: bool,
    ) -> Subscription {
        let id = self.inner.watchers.borrow_mut().add(Rc::new(callback), sync);
        Subscription {
            node: self.downgrade(),
            id,
            armed: true,
        }
    }

    /// Removes every subscriber of this node (not of its children).
    pub fn unwatch(&self) {
        self.inner.watchers.borrow_mut().clear();
    }

    /// Returns the number of subscribers of this node.
    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.inner.watchers.borrow().entries.len()
    }

    /// Calls synchronous subscribers and queues batched delivery.
    pub(crate) fn dispatch(&self, changes: ChangeSet) {
        let (sync, batched) = {
            let watchers = self.inner.watchers.borrow();
            (watchers.snapshot(true), watchers.has_batched())
        };
        if batched {
            self.inner.tree.scheduler.enqueue(self, changes);
        }
        if sync.is_empty() {
            return;
        }
        tracing::trace!(node = %self.id(), ?changes, subscribers = sync.len(), "dispatch");
        let value = self.snapshot();
        for (id, callback) in sync {
            // A callback may have unsubscribed a later one.
            if self.inner.watchers.borrow().contains(id) {
                callback(&value, changes);
            }
        }
    }

    /// Calls batched subscribers with accumulated `changes`.
    pub(crate) fn deliver(&self, changes: ChangeSet) -> usize {
        let batched = self.inner.watchers.borrow().snapshot(false);
        if batched.is_empty() {
            return 0;
        }
        tracing::trace!(node = %self.id(), ?changes, subscribers = batched.len(), "deliver");
        let value = self.snapshot();
        let mut delivered = 0;
        for (id, callback) in batched {
            if self.inner.watchers.borrow().contains(id) {
                callback(&value, changes);
                delivered += 1;
            }
        }
        delivered
    }
}
