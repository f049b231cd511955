// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identity registry for detached and not-yet-attached children.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::id::NodeId;
use crate::node::Node;

/// Per-container map from child slot to node instances handed out for it.
///
/// The registry owns its nodes. A node enters through
/// [`register`](Self::register) when it is detached (or through
/// [`ensure`](Self::ensure) when an empty slot is first addressed) and leaves
/// through [`claim`](Self::claim) when it is attached again. Entries are only
/// dropped by an explicit [`prune`](Self::prune).
///
/// A slot usually has at most one entry. Array removals can park several
/// nodes under the same index; the most recently registered one is the slot's
/// current occupant.
pub(crate) struct IdentityRegistry<K> {
    entries: HashMap<K, SmallVec<[Node; 1]>>,
}

impl<K> Default for IdentityRegistry<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Clone + Eq + Hash> IdentityRegistry<K> {
    /// Parks `node` under `key`.
    pub(crate) fn register(&mut self, key: K, node: Node) {
        let slot = self.entries.entry(key).or_default();
        if !slot.contains(&node) {
            slot.push(node);
        }
    }

    /// Removes and returns the entry for `key` with identity `id`.
    pub(crate) fn claim(&mut self, key: &K, id: NodeId) -> Option<Node> {
        let slot = self.entries.get_mut(key)?;
        let position = slot.iter().position(|node| node.id() == id)?;
        let node = slot.remove(position);
        if slot.is_empty() {
            self.entries.remove(key);
        }
        Some(node)
    }

    /// Removes and returns the current occupant of `key`.
    pub(crate) fn claim_latest(&mut self, key: &K) -> Option<Node> {
        let slot = self.entries.get_mut(key)?;
        let node = slot.pop();
        if slot.is_empty() {
            self.entries.remove(key);
        }
        node
    }

    /// Returns the current occupant of `key` without removing it.
    #[cfg(test)]
    pub(crate) fn get(&self, key: &K) -> Option<Node> {
        self.entries.get(key).and_then(|slot| slot.last()).cloned()
    }

    /// Returns the current occupant of `key`, creating one with `make` first
    /// if the slot is empty.
    pub(crate) fn ensure(&mut self, key: K, make: impl FnOnce() -> Node) -> Node {
        let slot = self.entries.entry(key).or_default();
        if let Some(node) = slot.last() {
            return node.clone();
        }
        let node = make();
        slot.push(node.clone());
        node
    }

    /// Every parked node with its key.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &Node)> + '_ {
        self.entries
            .iter()
            .flat_map(|(key, slot)| slot.iter().map(move |node| (key, node)))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.values().map(SmallVec::len).sum()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops entries that nothing outside the registry refers to.
    ///
    /// A node is only dropped if it holds no parked nodes of its own. Callers
    /// prune bottom-up so that whole abandoned subtrees go in one pass.
    pub(crate) fn prune(&mut self) -> Vec<Node> {
        let mut dropped = Vec::new();
        self.entries.retain(|_, slot| {
            let mut index = 0;
            while index < slot.len() {
                let node = &slot[index];
                if Rc::strong_count(&node.inner) == 1 && node.is_hollow() {
                    dropped.push(slot.remove(index));
                } else {
                    index += 1;
                }
            }
            !slot.is_empty()
        });
        dropped
    }
}
