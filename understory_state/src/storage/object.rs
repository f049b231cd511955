// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyed container storage.

use alloc::collections::BTreeMap;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;

use crate::change::ChangeSet;
use crate::key::Key;
use crate::node::{Node, NodeInner};
use crate::tree::Tree;
use crate::value::Value;

use super::IdentityRegistry;

#[derive(Default)]
pub(crate) struct ObjectStorage {
    pub(crate) children: BTreeMap<String, Node>,
    pub(crate) registry: IdentityRegistry<String>,
}

impl ObjectStorage {
    pub(crate) fn build(
        tree: &Rc<Tree>,
        owner: &Weak<NodeInner>,
        path: &[Key],
        members: BTreeMap<String, Value>,
    ) -> Self {
        let children = members
            .into_iter()
            .filter(|(_, value)| !value.is_absent())
            .map(|(name, value)| {
                let key = Key::Field(name.clone());
                let mut child_path = path.to_vec();
                child_path.push(key.clone());
                let child = Node::build(tree, Some(owner.clone()), Some(key), &child_path, value);
                (name, child)
            })
            .collect();
        Self {
            children,
            registry: IdentityRegistry::default(),
        }
    }

    pub(crate) fn compose(&self) -> Value {
        Value::Object(
            self.children
                .iter()
                .filter_map(|(name, child)| {
                    let value = child.get();
                    (!value.is_absent()).then(|| (name.clone(), value))
                })
                .collect(),
        )
    }
}

/// Brings the children of `owner` in line with `members`.
///
/// Children missing from `members` are detached into the registry; new keys
/// reuse a parked node when one exists. Returns the owner's own-scope view of
/// what changed.
pub(crate) fn reconcile(owner: &Node, members: BTreeMap<String, Value>) -> ChangeSet {
    let Some(current) = owner.object(|s| s.children.clone()) else {
        return ChangeSet::empty();
    };
    let mut changes = ChangeSet::empty();

    let gone: Vec<(&String, &Node)> = current
        .iter()
        .filter(|(name, _)| members.get(*name).is_none_or(Value::is_absent))
        .collect();
    for (name, child) in gone {
        let moved = owner.object_mut(|s| {
            s.children.remove(name);
            s.registry.register(name.clone(), child.clone());
        });
        if moved.is_none() {
            // A callback replaced the owner's storage; its own set has already
            // reconciled the children.
            return changes;
        }
        tracing::debug!(parent = %owner.id(), child = %child.id(), key = %name, "detached member");
        changes |= child.set_with(Value::Absent, false).shift();
    }

    for (name, value) in members {
        if value.is_absent() {
            continue;
        }
        if let Some(child) = current.get(&name) {
            changes |= child.set_with(value, false).shift();
            continue;
        }
        let Some(reused) = owner.object_mut(|s| s.registry.claim_latest(&name)) else {
            return changes;
        };
        let child = match reused {
            Some(child) => child,
            None => owner.spawn_child(Key::Field(name.clone()), Value::Absent),
        };
        if owner
            .object_mut(|s| s.children.insert(name.clone(), child.clone()))
            .is_none()
        {
            return changes;
        }
        tracing::debug!(parent = %owner.id(), child = %child.id(), key = %name, "attached member");
        changes |= child.set_with(value, false).shift();
    }

    if changes.intersects(ChangeSet::CHILD_ATTACH | ChangeSet::CHILD_DETACH) {
        changes |= ChangeSet::SHAPE;
    }
    changes
}

/// Returns the node for `name`, materializing a parked one if needed.
pub(crate) fn child(owner: &Node, name: String) -> Option<Node> {
    owner.object_mut(|s| {
        if let Some(child) = s.children.get(&name) {
            return child.clone();
        }
        let key = Key::Field(name.clone());
        s.registry.ensure(name, || owner.spawn_child(key, Value::Absent))
    })
}

/// Moves a parked `child` back into the live set after it became present.
pub(crate) fn attach(owner: &Node, child: &Node, name: String) -> ChangeSet {
    let occupant = owner.object(|s| s.children.get(&name).cloned()).flatten();
    match occupant {
        Some(live) if live == *child => return ChangeSet::SHAPE,
        Some(live) => panic!(
            "attach of node {} at `{name}`, which is occupied by node {}",
            child.id(),
            live.id()
        ),
        None => {}
    }
    let claimed = owner
        .object_mut(|s| {
            let claimed = s.registry.claim(&name, child.id())?;
            s.children.insert(name.clone(), claimed.clone());
            Some(claimed)
        })
        .flatten();
    if claimed.is_none() {
        panic!(
            "attach of node {} at `{name}` with no registered detached node",
            child.id()
        );
    }
    tracing::debug!(parent = %owner.id(), child = %child.id(), key = %name, "attached member");
    ChangeSet::SHAPE
}

/// Parks a live `child` after it became absent.
pub(crate) fn detach(owner: &Node, child: &Node, name: String) -> ChangeSet {
    let removed = owner
        .object_mut(|s| {
            if s.children.get(&name) != Some(child) {
                return false;
            }
            s.children.remove(&name);
            s.registry.register(name.clone(), child.clone());
            true
        })
        .unwrap_or(false);
    if !removed {
        return ChangeSet::empty();
    }
    tracing::debug!(parent = %owner.id(), child = %child.id(), key = %name, "detached member");
    ChangeSet::SHAPE
}
