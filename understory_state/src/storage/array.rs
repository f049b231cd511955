// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Positional container storage.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;

use crate::change::ChangeSet;
use crate::key::Key;
use crate::node::{Node, NodeInner};
use crate::tree::Tree;
use crate::value::Value;

use super::IdentityRegistry;

#[derive(Default)]
pub(crate) struct ArrayStorage {
    pub(crate) children: Vec<Node>,
    pub(crate) registry: IdentityRegistry<usize>,
}

impl ArrayStorage {
    pub(crate) fn build(
        tree: &Rc<Tree>,
        owner: &Weak<NodeInner>,
        path: &[Key],
        items: Vec<Value>,
    ) -> Self {
        let children = items
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                let key = Key::Index(index);
                let mut child_path = path.to_vec();
                child_path.push(key.clone());
                Node::build(tree, Some(owner.clone()), Some(key), &child_path, present(value))
            })
            .collect();
        Self {
            children,
            registry: IdentityRegistry::default(),
        }
    }

    pub(crate) fn compose(&self) -> Value {
        Value::Array(self.children.iter().map(|child| present(child.get())).collect())
    }
}

/// Arrays have no holes: an absent item reads as null.
fn present(value: Value) -> Value {
    if value.is_absent() { Value::Null } else { value }
}

/// Brings the children of `owner` in line with `items`, position by position.
pub(crate) fn reconcile(owner: &Node, items: Vec<Value>) -> ChangeSet {
    let Some(current) = owner.array(|s| s.children.clone()) else {
        return ChangeSet::empty();
    };
    let mut changes = ChangeSet::empty();
    let keep = items.len().min(current.len());

    if current.len() > keep {
        let moved = owner.array_mut(|s| {
            let tail: Vec<Node> = s.children.drain(keep..).collect();
            for (offset, node) in tail.into_iter().enumerate() {
                s.registry.register(keep + offset, node);
            }
        });
        if moved.is_none() {
            return changes;
        }
        tracing::debug!(parent = %owner.id(), from = keep, to = current.len(), "truncated items");
        for child in &current[keep..] {
            changes |= child.set_with(Value::Absent, false).shift();
        }
    }

    for (index, value) in items.into_iter().enumerate() {
        let value = present(value);
        if let Some(child) = current.get(index) {
            changes |= child.set_with(value, false).shift();
            continue;
        }
        let Some(reused) = owner.array_mut(|s| s.registry.claim_latest(&index)) else {
            return changes;
        };
        let child = match reused {
            Some(child) => {
                child.rejoin();
                child
            }
            None => owner.spawn_child(Key::Index(index), Value::Absent),
        };
        if owner.array_mut(|s| s.children.push(child.clone())).is_none() {
            return changes;
        }
        changes |= child.set_with(value, false).shift();
    }

    if changes.intersects(ChangeSet::CHILD_ATTACH | ChangeSet::CHILD_DETACH) {
        changes |= ChangeSet::SHAPE;
    }
    changes
}

/// Returns the node for `index`, materializing a parked one if needed.
pub(crate) fn child(owner: &Node, index: usize) -> Option<Node> {
    let child = owner.array_mut(|s| {
        if let Some(child) = s.children.get(index) {
            return child.clone();
        }
        s.registry
            .ensure(index, || owner.spawn_child(Key::Index(index), Value::Absent))
    })?;
    child.rejoin();
    Some(child)
}

/// Parks a brand-new node at `index`, for insertion ahead of the current occupant.
pub(crate) fn fresh(owner: &Node, index: usize) -> Option<Node> {
    let node = owner.spawn_child(Key::Index(index), Value::Absent);
    owner.array_mut(|s| s.registry.register(index, node.clone()))?;
    Some(node)
}

/// Splices a parked `child` into the live list after it became present.
///
/// Slots between the current end and `index` are filled with null items, and
/// every item after the insertion point is renumbered.
pub(crate) fn attach(owner: &Node, child: &Node, index: usize) -> ChangeSet {
    let Some((len, occupant)) = owner.array(|s| (s.children.len(), s.children.get(index).cloned()))
    else {
        panic!("attach of node {} at [{index}] into a non-array", child.id());
    };
    if occupant.as_ref() == Some(child) {
        return ChangeSet::SHAPE;
    }
    let claimed = owner
        .array_mut(|s| s.registry.claim(&index, child.id()))
        .flatten();
    let Some(claimed) = claimed else {
        panic!(
            "attach of node {} at [{index}] with no registered detached node",
            child.id()
        );
    };

    let mut changes = ChangeSet::SHAPE;
    for hole in len..index {
        let filler = owner.array_mut(|s| s.registry.claim_latest(&hole)).flatten();
        let filler = filler.unwrap_or_else(|| owner.spawn_child(Key::Index(hole), Value::Absent));
        filler.rejoin();
        owner.array_mut(|s| s.children.push(filler.clone()));
        changes |= filler.set_with(Value::Null, false).shift();
    }

    owner.array_mut(|s| s.children.insert(index, claimed.clone()));
    tracing::debug!(parent = %owner.id(), child = %child.id(), index, "inserted item");
    renumber_from(owner, index + 1);
    claimed.rejoin();
    changes
}

/// Splices a live `child` out of the list after it became absent, and
/// renumbers the items that followed it.
pub(crate) fn detach(owner: &Node, child: &Node, index: usize) -> ChangeSet {
    let remaining = owner
        .array_mut(|s| {
            if s.children.get(index) != Some(child) {
                return None;
            }
            s.children.remove(index);
            s.registry.register(index, child.clone());
            Some(s.children.len())
        })
        .flatten();
    let Some(remaining) = remaining else {
        return ChangeSet::empty();
    };
    tracing::debug!(parent = %owner.id(), child = %child.id(), index, "removed item");
    if index < remaining {
        // The next item takes over this path.
        child.splice_out();
    }
    renumber_from(owner, index);
    ChangeSet::SHAPE
}

fn renumber_from(owner: &Node, start: usize) {
    let tail = owner
        .array(|s| s.children.get(start..).map(<[Node]>::to_vec))
        .flatten()
        .unwrap_or_default();
    for (offset, node) in tail.into_iter().enumerate() {
        node.reindex(start + offset);
    }
}
