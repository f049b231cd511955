// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path-indexed routing of changes to interested nodes.
//!
//! Every node registers itself at its path when it is created. Changes that
//! originate at a path rather than at a node (validation errors on unset
//! optional fields, errors forwarded from a derived tree) are routed here:
//! each level from the root down to the target path receives the change,
//! shifted outward by its distance from the target, deepest level first.

use alloc::rc::Weak;
use alloc::vec::Vec;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::change::ChangeSet;
use crate::id::NodeId;
use crate::key::{Key, Path};
use crate::node::{Node, NodeInner};

#[derive(Debug, Default)]
struct Level {
    interested: SmallVec<[(NodeId, Weak<NodeInner>); 1]>,
    children: HashMap<Key, Level>,
}

impl Level {
    fn is_empty(&self) -> bool {
        self.interested.is_empty() && self.children.is_empty()
    }

    fn unregister(&mut self, path: &[Key], id: NodeId) {
        match path.split_first() {
            None => self.interested.retain(|(entry, weak)| {
                *entry != id && weak.strong_count() > 0
            }),
            Some((first, rest)) => {
                if let Some(child) = self.children.get_mut(first) {
                    child.unregister(rest, id);
                    if child.is_empty() {
                        self.children.remove(first);
                    }
                }
            }
        }
    }

    fn live(&self) -> impl Iterator<Item = Node> + '_ {
        self.interested
            .iter()
            .filter_map(|(_, weak)| weak.upgrade())
            .map(Node::from_inner)
    }
}

/// A tree of interested-node sets, indexed by path.
#[derive(Debug, Default)]
pub(crate) struct EventsTree {
    root: Level,
}

impl EventsTree {
    pub(crate) fn register(&mut self, path: &[Key], node: &Node) {
        let mut level = &mut self.root;
        for key in path {
            level = level.children.entry(key.clone()).or_default();
        }
        if !level.interested.iter().any(|(id, _)| *id == node.id()) {
            level.interested.push((node.id(), node.downgrade()));
        }
    }

    pub(crate) fn unregister(&mut self, path: &[Key], id: NodeId) {
        self.root.unregister(path, id);
    }

    /// Returns the live nodes registered exactly at `path`.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn interested(&self, path: &[Key]) -> Vec<Node> {
        let mut level = &self.root;
        for key in path {
            match level.children.get(key) {
                Some(child) => level = child,
                None => return Vec::new(),
            }
        }
        level.live().collect()
    }

    /// Returns the number of registrations, live or not.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        fn count(level: &Level) -> usize {
            level.interested.len() + level.children.values().map(count).sum::<usize>()
        }
        count(&self.root)
    }

    /// Resolves which nodes receive `changes` originating at `path`.
    ///
    /// Nodes registered at `path` receive `changes` as is; nodes registered at
    /// each ancestor path receive it shifted once per level of distance. The
    /// result is ordered deepest first.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn route(&self, path: &[Key], changes: ChangeSet) -> Vec<(Node, ChangeSet)> {
        self.route_all(&[(path.to_vec(), changes)])
    }

    /// Routes several changes at once, merging what each node receives.
    ///
    /// A node reached by several entries gets one OR-combined change set, at
    /// the position of its depth (deepest first).
    #[must_use]
    pub(crate) fn route_all(&self, entries: &[(Path, ChangeSet)]) -> Vec<(Node, ChangeSet)> {
        let mut merged: Vec<(usize, Node, ChangeSet)> = Vec::new();
        let mut slots: HashMap<NodeId, usize> = HashMap::new();
        for (path, changes) in entries {
            let mut levels = SmallVec::<[&Level; 8]>::new();
            levels.push(&self.root);
            let mut level = &self.root;
            for key in path {
                match level.children.get(key) {
                    Some(child) => {
                        levels.push(child);
                        level = child;
                    }
                    None => break,
                }
            }
            for (depth, level) in levels.iter().enumerate() {
                let shifted = changes.shift_by(path.len() - depth);
                for node in level.live() {
                    match slots.get(&node.id()) {
                        Some(&slot) => merged[slot].2 |= shifted,
                        None => {
                            slots.insert(node.id(), merged.len());
                            merged.push((depth, node, shifted));
                        }
                    }
                }
            }
        }
        merged.sort_by(|a, b| b.0.cmp(&a.0));
        merged
            .into_iter()
            .map(|(_, node, changes)| (node, changes))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;
    use alloc::vec;

    fn path(keys: &[&str]) -> Path {
        keys.iter().map(|k| Key::from(*k)).collect()
    }

    #[test]
    fn nodes_register_at_their_paths() {
        let root = Node::new(Value::object([("a", Value::object([("b", 1)]))]));
        let events = root.inner.tree.events.borrow();
        assert_eq!(events.len(), 3);
        assert_eq!(events.interested(&path(&["a", "b"])).len(), 1);
        assert!(events.interested(&path(&["x"])).is_empty());
    }

    #[test]
    fn route_shifts_per_level_deepest_first() {
        let root = Node::new(Value::object([("a", Value::object([("b", 1)]))]));
        let a = root.at("a").unwrap();
        let b = a.at("b").unwrap();
        let routed = root
            .inner
            .tree
            .events
            .borrow()
            .route(&path(&["a", "b"]), ChangeSet::ERRORS);
        assert_eq!(
            routed,
            vec![
                (b, ChangeSet::ERRORS),
                (a, ChangeSet::CHILD_ERRORS),
                (root, ChangeSet::DESCENDANT_ERRORS),
            ]
        );
    }

    #[test]
    fn route_to_unmaterialized_path_reaches_ancestors() {
        let root = Node::new(Value::object([("a", 1)]));
        let routed = root
            .inner
            .tree
            .events
            .borrow()
            .route(&path(&["x", "y"]), ChangeSet::INVALID);
        assert_eq!(routed, vec![(root, ChangeSet::DESCENDANT_INVALID)]);
    }

    #[test]
    fn route_all_merges() {
        let root = Node::new(Value::object([("a", 1), ("b", 2)]));
        let routed = root.inner.tree.events.borrow().route_all(&[
            (path(&["a"]), ChangeSet::ERRORS),
            (path(&["b"]), ChangeSet::VALID),
        ]);
        assert_eq!(routed.len(), 3);
        assert_eq!(routed[2], (root, ChangeSet::CHILD_ERRORS | ChangeSet::CHILD_VALID));
    }

    #[test]
    fn unregister_prunes_levels() {
        let root = Node::new(Value::object([("a", Value::object([("b", 1)]))]));
        let b = root.lookup(&path(&["a", "b"])).unwrap();
        root.inner
            .tree
            .events
            .borrow_mut()
            .unregister(&path(&["a", "b"]), b.id());
        let events = root.inner.tree.events.borrow();
        assert_eq!(events.len(), 2);
        assert!(events.interested(&path(&["a", "b"])).is_empty());
    }
}
