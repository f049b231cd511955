// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-tree shared context.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use understory_validation::{ValidationError, ValidationTree};

use crate::change::ChangeSet;
use crate::events::EventsTree;
use crate::key::{Key, Path};
use crate::node::{Node, NodeInner};
use crate::scheduler::Scheduler;

pub(crate) type Errors = ValidationTree<Key, ValidationError>;

/// State shared by every node of one tree.
///
/// A root node owns its tree; descendants hold a reference to the same one.
/// A derived (computed) tree mirrors a node of its source tree: it shares the
/// source's error store and scheduler, and its paths are mapped under the
/// source node's current path.
pub(crate) struct Tree {
    pub(crate) events: RefCell<EventsTree>,
    pub(crate) validation: Rc<RefCell<Errors>>,
    pub(crate) scheduler: Rc<Scheduler>,
    upstream: Option<Weak<NodeInner>>,
    downstream: RefCell<Vec<Weak<NodeInner>>>,
}

impl Tree {
    pub(crate) fn root() -> Rc<Self> {
        Rc::new(Self {
            events: RefCell::default(),
            validation: Rc::default(),
            scheduler: Rc::default(),
            upstream: None,
            downstream: RefCell::default(),
        })
    }

    /// A tree whose root mirrors `source`.
    pub(crate) fn mirror(source: &Node) -> Rc<Self> {
        let shared = &source.inner.tree;
        Rc::new(Self {
            events: RefCell::default(),
            validation: Rc::clone(&shared.validation),
            scheduler: Rc::clone(&shared.scheduler),
            upstream: Some(source.downgrade()),
            downstream: RefCell::default(),
        })
    }

    /// The node this tree mirrors, if any.
    pub(crate) fn upstream(&self) -> Option<Node> {
        self.upstream
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Node::from_inner)
    }

    pub(crate) fn link_downstream(&self, root: &Node) {
        self.downstream.borrow_mut().push(root.downgrade());
    }

    pub(crate) fn unlink_downstream(&self, root: &Node) {
        self.downstream
            .borrow_mut()
            .retain(|weak| weak.strong_count() > 0 && !Weak::ptr_eq(weak, &root.downgrade()));
    }

    /// Roots of the live trees derived from nodes of this one.
    pub(crate) fn derived(&self) -> Vec<Node> {
        let mut downstream = self.downstream.borrow_mut();
        downstream.retain(|weak| weak.strong_count() > 0);
        downstream
            .iter()
            .filter_map(Weak::upgrade)
            .map(Node::from_inner)
            .collect()
    }

    /// Maps a path in this tree to the shared error store's path space.
    pub(crate) fn absolute(&self, local: &[Key]) -> Path {
        let mut path = match self.upstream() {
            Some(source) => source.inner.tree.absolute(&source.path()),
            None => Vec::new(),
        };
        path.extend_from_slice(local);
        path
    }

    /// Delivers metadata changes at local paths, then forwards them to every
    /// linked tree except `origin`.
    ///
    /// Each entry reaches the nodes registered along its path, deepest first,
    /// shifted by distance. The source tree receives the entries under the
    /// source node's path; each derived tree receives the entries at or below
    /// the node it mirrors.
    pub(crate) fn notify(&self, entries: &[(Path, ChangeSet)], origin: Option<&Self>) {
        if entries.is_empty() {
            return;
        }
        let deliveries = self.events.borrow().route_all(entries);
        for (node, changes) in deliveries {
            node.trigger(changes, false);
        }

        let is_origin = |tree: &Self| origin.is_some_and(|o| core::ptr::eq(o, tree));

        if let Some(source) = self.upstream()
            && !is_origin(&source.inner.tree)
        {
            let prefix = source.path();
            let mapped: Vec<(Path, ChangeSet)> = entries
                .iter()
                .map(|(path, changes)| {
                    let mut full = prefix.clone();
                    full.extend_from_slice(path);
                    (full, *changes)
                })
                .collect();
            source.inner.tree.notify(&mapped, Some(self));
        }

        let derived = self.derived();
        for root in derived {
            let tree = &root.inner.tree;
            if is_origin(tree) {
                continue;
            }
            let Some(anchor) = tree.upstream().map(|source| source.path()) else {
                continue;
            };
            let relative: Vec<(Path, ChangeSet)> = entries
                .iter()
                .filter(|(path, _)| path.starts_with(&anchor))
                .map(|(path, changes)| (path[anchor.len()..].to_vec(), *changes))
                .collect();
            tree.notify(&relative, Some(self));
        }
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("events", &self.events)
            .field("errors", &self.validation.borrow().len())
            .field("scheduler", &self.scheduler)
            .field("derived", &self.downstream.borrow().len())
            .finish_non_exhaustive()
    }
}
