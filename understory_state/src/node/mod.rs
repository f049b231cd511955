// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Addressable, observable tree nodes.

mod errors;
mod watch;

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::change::ChangeSet;
use crate::error::StateError;
use crate::id::NodeId;
use crate::key::{Key, Path};
use crate::storage::{self, ArrayStorage, Dormant, ObjectStorage, Storage, StorageKind, array, object};
use crate::tree::Tree;
use crate::value::{Shape, Value};

pub use errors::ValidationScope;
pub use watch::Subscription;
pub(crate) use watch::Watchers;

pub(crate) struct NodeInner {
    pub(crate) id: NodeId,
    pub(crate) tree: Rc<Tree>,
    pub(crate) parent: Option<Weak<NodeInner>>,
    pub(crate) key: RefCell<Option<Key>>,
    pub(crate) storage: RefCell<Storage>,
    pub(crate) dormant: RefCell<Dormant>,
    pub(crate) initial: RefCell<Value>,
    pub(crate) cache: RefCell<Option<Rc<Value>>>,
    pub(crate) dirty: Cell<Option<bool>>,
    pub(crate) watchers: RefCell<Watchers>,
    pub(crate) withheld: Cell<Option<ChangeSet>>,
    pub(crate) spliced: Cell<bool>,
}

/// One addressable point in a state tree.
///
/// A `Node` is a cheap handle; clones refer to the same node. The node's value
/// is held by its storage and mirrored into child nodes, so every sub-value can
/// be read, written and watched on its own. Writes compute a [`ChangeSet`] and
/// propagate it to the node's subscribers and then, shifted one scope outward
/// per level, to every ancestor.
///
/// ```rust
/// use understory_state::{ChangeSet, Node, Value};
///
/// let form = Node::new(Value::object([("name", "Ada"), ("role", "admin")]));
/// let name = form.at("name").unwrap();
///
/// assert_eq!(name.set("Grace"), ChangeSet::VALUE);
/// assert_eq!(form.get(), Value::object([("name", "Grace"), ("role", "admin")]));
/// assert!(form.is_dirty());
///
/// form.commit();
/// assert!(!form.is_dirty());
/// ```
#[derive(Clone)]
pub struct Node {
    pub(crate) inner: Rc<NodeInner>,
}

impl Node {
    /// Creates the root of a new tree holding `value`.
    pub fn new(value: impl Into<Value>) -> Self {
        Self::build(&Tree::root(), None, None, &[], value.into())
    }

    pub(crate) fn build(
        tree: &Rc<Tree>,
        parent: Option<Weak<NodeInner>>,
        key: Option<Key>,
        path: &[Key],
        value: Value,
    ) -> Self {
        let inner = Rc::new_cyclic(|this| NodeInner {
            id: NodeId::next(),
            tree: Rc::clone(tree),
            parent,
            key: RefCell::new(key),
            storage: RefCell::new(Storage::build(tree, this, path, value)),
            dormant: RefCell::new(Dormant::default()),
            initial: RefCell::new(Value::Absent),
            cache: RefCell::new(None),
            dirty: Cell::new(Some(false)),
            watchers: RefCell::new(Watchers::default()),
            withheld: Cell::new(None),
            spliced: Cell::new(false),
        });
        let node = Self { inner };
        *node.inner.initial.borrow_mut() = node.get();
        if !node.is_stranded() {
            tree.events.borrow_mut().register(path, &node);
        }
        node
    }

    pub(crate) fn spawn_child(&self, key: Key, value: Value) -> Self {
        let mut path = self.path();
        path.push(key.clone());
        Self::build(
            &self.inner.tree,
            Some(Rc::downgrade(&self.inner)),
            Some(key),
            &path,
            value,
        )
    }

    pub(crate) const fn from_inner(inner: Rc<NodeInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<NodeInner> {
        Rc::downgrade(&self.inner)
    }

    /// Returns this node's identity.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Returns the key under which this node sits in its parent, or `None` for a root.
    #[must_use]
    pub fn key(&self) -> Option<Key> {
        self.inner.key.borrow().clone()
    }

    /// Returns the parent node, or `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Self::from_inner)
    }

    /// Returns the root of this node's tree.
    #[must_use]
    pub fn root(&self) -> Self {
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            node = parent;
        }
        node
    }

    /// Returns the keys from the root to this node.
    #[must_use]
    pub fn path(&self) -> Path {
        let mut path = Vec::new();
        let mut node = self.clone();
        loop {
            let Some(key) = node.key() else { break };
            path.push(key);
            match node.parent() {
                Some(parent) => node = parent,
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// Returns the number of ancestors.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            depth += 1;
            node = parent;
        }
        depth
    }

    /// Returns the current value.
    ///
    /// The value is assembled from the children on first access after a change
    /// and cached until the next one.
    #[must_use]
    pub fn get(&self) -> Value {
        (*self.snapshot()).clone()
    }

    /// Calls `f` with the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.snapshot())
    }

    pub(crate) fn snapshot(&self) -> Rc<Value> {
        if let Some(value) = &*self.inner.cache.borrow() {
            return Rc::clone(value);
        }
        let value = Rc::new(self.inner.storage.borrow().compose());
        *self.inner.cache.borrow_mut() = Some(Rc::clone(&value));
        value
    }

    /// Returns the shape of the current value.
    #[must_use]
    pub fn shape(&self) -> Shape {
        self.inner.storage.borrow().shape()
    }

    /// Replaces the value and notifies subscribers and ancestors.
    ///
    /// Returns this node's own [`ChangeSet`], which is empty if `value` equals
    /// the current value. Setting [`Value::Absent`] detaches the node from its
    /// parent; setting a present value on a detached node reattaches it.
    pub fn set(&self, value: impl Into<Value>) -> ChangeSet {
        self.set_with(value.into(), true)
    }

    /// Like [`set`](Self::set), but only notifies ancestors if `notify_parents` is set.
    pub fn set_with(&self, value: Value, notify_parents: bool) -> ChangeSet {
        let changes = self.apply(value);
        if !changes.is_empty() {
            self.trigger(changes, notify_parents);
        }
        changes
    }

    fn apply(&self, value: Value) -> ChangeSet {
        let next = StorageKind::of(&value);
        let current = self.inner.storage.borrow().kind();
        if current == next {
            return match value {
                Value::Object(members) => object::reconcile(self, members),
                Value::Array(items) => array::reconcile(self, items),
                scalar => match &mut *self.inner.storage.borrow_mut() {
                    Storage::Primitive(p) => p.set(scalar),
                    _ => ChangeSet::empty(),
                },
            };
        }

        let mut changes = storage::transition(self.shape(), value.shape());
        changes |= self.swap_storage(next);
        changes
            | match value {
                Value::Object(members) => object::reconcile(self, members),
                Value::Array(items) => array::reconcile(self, items),
                scalar => {
                    if let Storage::Primitive(p) = &mut *self.inner.storage.borrow_mut() {
                        p.set(scalar);
                    }
                    ChangeSet::empty()
                }
            }
    }

    /// Installs storage of `kind`, parking the current container.
    ///
    /// Live children of the outgoing container are detached into its registry
    /// so they can be reattached if the node returns to that shape.
    fn swap_storage(&self, kind: StorageKind) -> ChangeSet {
        let fresh = self
            .inner
            .dormant
            .borrow_mut()
            .take(kind)
            .unwrap_or_else(|| Storage::empty(kind));
        let mut retired = self.inner.storage.replace(fresh);
        let detached = retired.retire();
        self.inner.dormant.borrow_mut().park(retired);

        let mut changes = ChangeSet::empty();
        if !detached.is_empty() {
            tracing::debug!(node = %self.id(), count = detached.len(), "parked container");
            for child in &detached {
                changes |= child.set_with(Value::Absent, false).shift();
            }
            changes |= ChangeSet::SHAPE;
        }
        changes
    }

    pub(crate) fn object<R>(&self, f: impl FnOnce(&ObjectStorage) -> R) -> Option<R> {
        match &*self.inner.storage.borrow() {
            Storage::Object(s) => Some(f(s)),
            _ => None,
        }
    }

    pub(crate) fn object_mut<R>(&self, f: impl FnOnce(&mut ObjectStorage) -> R) -> Option<R> {
        match &mut *self.inner.storage.borrow_mut() {
            Storage::Object(s) => Some(f(s)),
            _ => None,
        }
    }

    pub(crate) fn array<R>(&self, f: impl FnOnce(&ArrayStorage) -> R) -> Option<R> {
        match &*self.inner.storage.borrow() {
            Storage::Array(s) => Some(f(s)),
            _ => None,
        }
    }

    pub(crate) fn array_mut<R>(&self, f: impl FnOnce(&mut ArrayStorage) -> R) -> Option<R> {
        match &mut *self.inner.storage.borrow_mut() {
            Storage::Array(s) => Some(f(s)),
            _ => None,
        }
    }

    /// Returns the child node at `key`.
    ///
    /// Missing slots of an object or array are materialized as absent nodes and
    /// remembered, so the same node comes back for the same slot until it is
    /// attached, and keeps its identity afterwards. On an absent or null node
    /// the slot is prepared in a dormant container (an object for field keys,
    /// an array for index keys); setting a value on it turns this node into
    /// that container.
    ///
    /// # Errors
    ///
    /// [`StateError::NotAContainer`] if this node holds a boolean, number or
    /// string, and [`StateError::KeyMismatch`] if it holds an array and `key`
    /// is not a valid index.
    pub fn at(&self, key: impl Into<Key>) -> Result<Self, StateError> {
        let key = key.into();
        let kind = self.inner.storage.borrow().kind();
        let child = match kind {
            StorageKind::Object => object::child(self, key.to_field()),
            StorageKind::Array => {
                let index = key.as_index().ok_or(StateError::KeyMismatch { key })?;
                array::child(self, index)
            }
            StorageKind::Primitive => {
                if !self.inner.storage.borrow().is_nullish() {
                    return Err(StateError::NotAContainer { key });
                }
                Some(self.dormant_child(key))
            }
        };
        Ok(child.unwrap_or_else(|| panic!("storage of node {} changed during lookup", self.id())))
    }

    fn dormant_child(&self, key: Key) -> Self {
        let mut dormant = self.inner.dormant.borrow_mut();
        match key {
            Key::Index(index) => dormant
                .array()
                .registry
                .ensure(index, || self.spawn_child(Key::Index(index), Value::Absent)),
            Key::Field(name) => {
                let key = Key::Field(name.clone());
                dormant
                    .object()
                    .registry
                    .ensure(name, || self.spawn_child(key, Value::Absent))
            }
        }
    }

    /// Returns the child at `key` only if its value is present and not null.
    ///
    /// Unlike [`at`](Self::at) this never materializes nodes for slots that do
    /// not hold data.
    #[must_use]
    pub fn try_at(&self, key: impl Into<Key>) -> Option<Self> {
        let key = key.into();
        let exists = self.with(|value| value.child(&key).is_some_and(|v| !v.is_nullish()));
        if exists { self.at(key).ok() } else { None }
    }

    /// Returns this node if its value is present and not null.
    #[must_use]
    pub fn present(&self) -> Option<Self> {
        (!self.with(Value::is_nullish)).then(|| self.clone())
    }

    /// Follows `path` with [`at`](Self::at).
    ///
    /// Returns `None` if a segment cannot be addressed; an empty path returns
    /// this node.
    #[must_use]
    pub fn lookup(&self, path: &[Key]) -> Option<Self> {
        path.iter()
            .try_fold(self.clone(), |node, key| node.at(key).ok())
    }

    /// Removes the child at `key`.
    ///
    /// Returns this node's resulting [`ChangeSet`] (a shape change plus the
    /// child detach), or an empty set if there was nothing to remove.
    ///
    /// # Errors
    ///
    /// As for [`at`](Self::at).
    pub fn remove(&self, key: impl Into<Key>) -> Result<ChangeSet, StateError> {
        if self.inner.storage.borrow().is_nullish() {
            return Ok(ChangeSet::empty());
        }
        let child = self.at(key)?;
        let changes = child.set_with(Value::Absent, false);
        Ok(self.child_trigger(changes, &child))
    }

    /// Appends an item to an array (or to an absent/null node, which becomes one).
    ///
    /// # Errors
    ///
    /// [`StateError::KeyMismatch`] on an object and
    /// [`StateError::NotAContainer`] on a scalar.
    pub fn push(&self, value: impl Into<Value>) -> Result<ChangeSet, StateError> {
        self.insert(self.len(), value)
    }

    /// Inserts an item at `index`, shifting later items up.
    ///
    /// An index past the end pads the gap with null items.
    ///
    /// # Errors
    ///
    /// As for [`push`](Self::push).
    pub fn insert(&self, index: usize, value: impl Into<Value>) -> Result<ChangeSet, StateError> {
        let value = value.into();
        let (kind, nullish) = {
            let storage = self.inner.storage.borrow();
            (storage.kind(), storage.is_nullish())
        };
        let child = match kind {
            StorageKind::Array => None,
            StorageKind::Object => return Err(StateError::KeyMismatch { key: Key::Index(index) }),
            StorageKind::Primitive if nullish => Some(self.dormant_child(Key::Index(index))),
            StorageKind::Primitive => {
                return Err(StateError::NotAContainer { key: Key::Index(index) });
            }
        };
        let child = match child {
            Some(child) if child.shape() == Shape::Absent => child,
            _ if index >= self.len() => self.at(index)?,
            _ => array::fresh(self, index)
                .unwrap_or_else(|| panic!("storage of node {} changed during insert", self.id())),
        };
        let changes = child.set_with(value, false);
        if changes.is_empty() {
            return Ok(changes);
        }
        Ok(self.child_trigger(changes, &child))
    }

    /// Returns the number of present children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.with(|value| match value {
            Value::Object(members) => members.values().filter(|v| !v.is_absent()).count(),
            Value::Array(items) => items.len(),
            _ => 0,
        })
    }

    /// Returns `true` if the node has no present children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the keys of the present children, in order.
    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        self.children()
            .iter()
            .filter_map(Self::key)
            .collect()
    }

    /// Returns the present children, in key order.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        self.inner
            .storage
            .borrow()
            .live()
            .into_iter()
            .filter(|child| child.shape() != Shape::Absent)
            .collect()
    }

    /// Returns `true` if the value differs from the committed baseline.
    ///
    /// Containers compare their children against their own baseline, so a
    /// child that was changed and changed back is clean again.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        if let Some(dirty) = self.inner.dirty.get() {
            return dirty;
        }
        let dirty = {
            let initial = self.inner.initial.borrow();
            self.differs_from(&initial)
        };
        self.inner.dirty.set(Some(dirty));
        dirty
    }

    fn differs_from(&self, baseline: &Value) -> bool {
        let storage = self.inner.storage.borrow();
        match &*storage {
            Storage::Primitive(p) => p.value() != baseline,
            Storage::Object(s) => {
                let Value::Object(base) = baseline else {
                    return true;
                };
                let mut present = 0;
                for (name, child) in &s.children {
                    let expected = base.get(name).unwrap_or(&Value::Absent);
                    if child.differs_from(expected) {
                        return true;
                    }
                    if !expected.is_absent() {
                        present += 1;
                    }
                }
                present != base.values().filter(|v| !v.is_absent()).count()
            }
            Storage::Array(s) => {
                let Value::Array(base) = baseline else {
                    return true;
                };
                s.children.len() != base.len()
                    || s.children
                        .iter()
                        .zip(base)
                        .any(|(child, expected)| child.differs_from(expected))
            }
        }
    }

    /// Makes the current value the new baseline, recursively.
    ///
    /// Returns [`ChangeSet::COMMIT`] if the node was dirty, and an empty set
    /// otherwise.
    pub fn commit(&self) -> ChangeSet {
        self.commit_inner(true)
    }

    fn commit_inner(&self, notify_parents: bool) -> ChangeSet {
        let was_dirty = self.is_dirty();
        let children = self.inner.storage.borrow().live();
        for child in children {
            child.commit_inner(false);
        }
        *self.inner.initial.borrow_mut() = self.get();
        self.inner.dirty.set(Some(false));
        if !was_dirty {
            return ChangeSet::empty();
        }
        self.trigger(ChangeSet::COMMIT, notify_parents);
        ChangeSet::COMMIT
    }

    /// Sets the value back to the committed baseline.
    pub fn reset(&self) -> ChangeSet {
        let initial = self.inner.initial.borrow().clone();
        self.set_with(initial, true)
    }

    /// Sets `fallback` if the value is absent or null, and returns this node.
    pub fn pave(&self, fallback: impl Into<Value>) -> Self {
        if self.with(Value::is_nullish) {
            self.set(fallback);
        }
        self.clone()
    }

    /// Invalidates caches and delivers `changes`.
    ///
    /// Subscribers are notified (or the changes are buffered if the node is
    /// withheld); with `notify_parents` the parent then receives the changes
    /// shifted one scope outward, and so on up to the root.
    pub fn trigger(&self, changes: ChangeSet, notify_parents: bool) {
        if changes.is_empty() {
            return;
        }
        self.invalidate();
        match self.inner.withheld.get() {
            Some(buffer) => self.inner.withheld.set(Some(buffer.absorb(changes))),
            None => self.dispatch(changes),
        }
        if notify_parents && let Some(parent) = self.parent() {
            parent.child_trigger(changes, self);
        }
    }

    /// Handles a change reported by `child` and re-triggers on this node.
    ///
    /// Returns this node's own view of the change: the child's changes shifted
    /// one scope outward plus any shape change.
    pub(crate) fn child_trigger(&self, changes: ChangeSet, child: &Self) -> ChangeSet {
        let mut own = changes.shift();
        if changes.contains(ChangeSet::ATTACH) {
            own |= self.attach_child(child);
        }
        if changes.contains(ChangeSet::DETACH) {
            own |= self.detach_child(child);
        }
        self.trigger(own, true);
        own
    }

    fn attach_child(&self, child: &Self) -> ChangeSet {
        let Some(key) = child.key() else {
            return ChangeSet::empty();
        };
        let wanted = StorageKind::hosting(&key);
        let mut changes = ChangeSet::empty();
        if self.inner.storage.borrow().kind() != wanted {
            changes |= storage::transition(self.shape(), wanted.container_shape());
            changes |= self.swap_storage(wanted);
        }
        changes
            | match key {
                Key::Field(name) => object::attach(self, child, name),
                Key::Index(index) => array::attach(self, child, index),
            }
    }

    fn detach_child(&self, child: &Self) -> ChangeSet {
        match child.key() {
            Some(Key::Field(name)) => object::detach(self, child, name),
            Some(Key::Index(index)) => array::detach(self, child, index),
            None => ChangeSet::empty(),
        }
    }

    /// Moves an array item to a new position and announces the new key.
    pub(crate) fn reindex(&self, index: usize) {
        let next = Key::Index(index);
        if self.key().as_ref() == Some(&next) {
            return;
        }
        self.route(false);
        *self.inner.key.borrow_mut() = Some(next);
        self.route(true);
        tracing::debug!(node = %self.id(), index, "renumbered item");
        self.trigger(ChangeSet::KEY, false);
    }

    /// Takes a parked array item out of path routing once another item has
    /// been renumbered into its slot.
    pub(crate) fn splice_out(&self) {
        if self.inner.spliced.replace(true) {
            return;
        }
        self.route(false);
        tracing::debug!(node = %self.id(), "item left its slot");
    }

    /// Restores path routing for an item that occupies its slot again.
    pub(crate) fn rejoin(&self) {
        if !self.inner.spliced.replace(false) {
            return;
        }
        self.route(true);
        tracing::debug!(node = %self.id(), "item rejoined its slot");
    }

    /// `true` if this node or an ancestor was spliced out of an array and its
    /// path now belongs to another node.
    pub(crate) fn is_stranded(&self) -> bool {
        let mut node = Some(self.clone());
        while let Some(current) = node {
            if current.inner.spliced.get() {
                return true;
            }
            node = current.parent();
        }
        false
    }

    /// Registers (or unregisters) this subtree at its current paths.
    fn route(&self, on: bool) {
        let base = self.path();
        let subtree = self.subtree();
        let mut events = self.inner.tree.events.borrow_mut();
        for (relative, node) in &subtree {
            let path = join(&base, relative);
            if on {
                if !node.is_stranded() {
                    events.register(&path, node);
                }
            } else {
                events.unregister(&path, node.id());
            }
        }
    }

    /// Every node owned by this one (live, parked and dormant), with paths
    /// relative to this node, including this node itself.
    pub(crate) fn subtree(&self) -> Vec<(Path, Self)> {
        let mut out = Vec::new();
        let mut stack = alloc::vec![(Vec::new(), self.clone())];
        while let Some((path, node)) = stack.pop() {
            for (key, child) in node.owned() {
                let mut child_path = path.clone();
                child_path.push(key);
                stack.push((child_path, child));
            }
            out.push((path, node));
        }
        out
    }

    fn owned(&self) -> Vec<(Key, Self)> {
        let mut owned = self.inner.storage.borrow().owned();
        owned.extend(self.inner.dormant.borrow().owned());
        owned
    }

    /// `true` if the node owns no other nodes.
    pub(crate) fn is_hollow(&self) -> bool {
        self.inner.storage.borrow().is_hollow() && self.inner.dormant.borrow().is_hollow()
    }

    fn invalidate(&self) {
        let mut node = Some(self.clone());
        while let Some(current) = node {
            current.inner.cache.borrow_mut().take();
            current.inner.dirty.set(None);
            node = current.parent();
        }
    }

    /// Starts buffering changes instead of delivering them.
    ///
    /// Returns `false` if the node was already withheld; the call is then a no-op.
    pub fn withhold(&self) -> bool {
        if self.inner.withheld.get().is_some() {
            return false;
        }
        self.inner.withheld.set(Some(ChangeSet::empty()));
        true
    }

    /// Stops buffering and delivers everything buffered as one change.
    ///
    /// Returns the delivered changes.
    pub fn unleash(&self) -> ChangeSet {
        let Some(buffered) = self.inner.withheld.take() else {
            return ChangeSet::empty();
        };
        if !buffered.is_empty() {
            self.dispatch(buffered);
        }
        buffered
    }

    /// Returns `true` between [`withhold`](Self::withhold) and [`unleash`](Self::unleash).
    #[must_use]
    pub fn is_withheld(&self) -> bool {
        self.inner.withheld.get().is_some()
    }

    /// Announces that the node lost focus.
    pub fn blur(&self) {
        self.trigger(ChangeSet::BLUR, true);
    }

    /// Drops every subscriber in this subtree and unregisters it from path routing.
    ///
    /// The values are untouched; the nodes can still be read and written.
    pub fn deconstruct(&self) {
        self.route(false);
        for (_, node) in &self.subtree() {
            node.inner.watchers.borrow_mut().clear();
            node.inner.withheld.set(None);
        }
    }

    /// Drops parked nodes that nothing outside the tree refers to any more.
    ///
    /// Returns the number of nodes dropped. A dropped slot gets a new node (and
    /// a new id) the next time it is addressed.
    pub fn prune(&self) -> usize {
        let mut count = 0;
        for (_, child) in self.owned() {
            count += child.prune();
        }
        let mut dropped = self.inner.storage.borrow_mut().prune();
        dropped.extend(self.inner.dormant.borrow_mut().prune());
        for node in &dropped {
            node.deconstruct();
        }
        if !dropped.is_empty() {
            tracing::debug!(node = %self.id(), count = dropped.len(), "pruned parked nodes");
        }
        count + dropped.len()
    }

    /// Returns the number of parked nodes held directly by this node.
    #[must_use]
    pub fn parked(&self) -> usize {
        self.inner.storage.borrow().parked() + self.inner.dormant.borrow().parked()
    }

    /// Delivers pending batched notifications for this node's tree.
    ///
    /// Returns the number of callbacks invoked.
    pub fn flush(&self) -> usize {
        self.inner.tree.scheduler.flush()
    }
}

fn join(base: &[Key], relative: &[Key]) -> Path {
    let mut path = Vec::with_capacity(base.len() + relative.len());
    path.extend_from_slice(base);
    path.extend_from_slice(relative);
    path
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.inner.id)
            .field("path", &self.path())
            .field("value", &self.get())
            .finish_non_exhaustive()
    }
}
