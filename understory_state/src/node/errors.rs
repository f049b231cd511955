// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Validation errors attached to node paths.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use understory_validation::ValidationError;

use crate::change::ChangeSet;
use crate::error::StateError;
use crate::key::{Key, Path};
use crate::tree::Tree;
use crate::value::Value;

use super::Node;

impl Node {
    /// Returns the errors added exactly at this node.
    ///
    /// An item spliced out of an array no longer owns its old path, so it
    /// reports no errors until it is inserted again.
    #[must_use]
    pub fn errors(&self) -> Vec<ValidationError> {
        if self.is_stranded() {
            return Vec::new();
        }
        let path = self.absolute_path();
        self.inner
            .tree
            .validation
            .borrow()
            .at(&path)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Returns every error at or below this node, with paths relative to it.
    #[must_use]
    pub fn nested_errors(&self) -> Vec<(Path, ValidationError)> {
        if self.is_stranded() {
            return Vec::new();
        }
        let path = self.absolute_path();
        self.inner
            .tree
            .validation
            .borrow()
            .nested(&path)
            .into_iter()
            .map(|(relative, error)| (relative.to_vec(), error.clone()))
            .collect()
    }

    /// Returns `true` if there are no errors at or below this node.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        if self.is_stranded() {
            return true;
        }
        self.inner
            .tree
            .validation
            .borrow()
            .is_valid(&self.absolute_path())
    }

    /// Adds an error at this node.
    ///
    /// Returns [`ChangeSet::ERRORS`], plus [`ChangeSet::INVALID`] if the node
    /// was valid before. On an item spliced out of an array the error is
    /// dropped and the result is empty.
    pub fn add_error(&self, error: impl Into<ValidationError>) -> ChangeSet {
        if self.is_stranded() {
            return ChangeSet::empty();
        }
        let path = self.absolute_path();
        let was_valid = {
            let mut store = self.inner.tree.validation.borrow_mut();
            let was_valid = store.is_valid(&path);
            store.add(&path, error.into());
            was_valid
        };
        let mut changes = ChangeSet::ERRORS;
        if was_valid {
            changes |= ChangeSet::INVALID;
        }
        self.inner.tree.notify(&[(self.path(), changes)], None);
        changes
    }

    /// Removes every error at or below this node.
    ///
    /// Each path that lost an error hears [`ChangeSet::ERRORS`] and
    /// [`ChangeSet::VALID`]; ancestors hear them shifted. Returns this node's
    /// share of the notification, or an empty set if there was nothing to
    /// clear.
    pub fn clear_errors(&self) -> ChangeSet {
        if self.is_stranded() {
            return ChangeSet::empty();
        }
        let base = self.absolute_path();
        let removed = self.inner.tree.validation.borrow_mut().clear(&base);
        if removed.is_empty() {
            return ChangeSet::empty();
        }
        let local = self.path();
        let mut entries: Vec<(Path, ChangeSet)> = Vec::new();
        for (path, _) in removed {
            let mut at = local.clone();
            at.extend_from_slice(&path[base.len()..]);
            if !entries.iter().any(|(seen, _)| *seen == at) {
                entries.push((at, ChangeSet::ERRORS | ChangeSet::VALID));
            }
        }
        let own = entries
            .iter()
            .fold(ChangeSet::empty(), |acc, (path, changes)| {
                acc | changes.shift_by(path.len() - local.len())
            });
        self.inner.tree.notify(&entries, None);
        own
    }

    /// Clears this node's errors and runs `validator` to add new ones.
    ///
    /// The node, everything it owns and its ancestors are withheld while the
    /// validator runs, and so are the matching nodes of every tree linked to
    /// this one through computed nodes. Subscribers on either side see one
    /// combined change: an error that is cleared and added again does not
    /// flicker through valid. Returns whether the node is valid afterwards.
    pub fn validate(&self, validator: impl FnOnce(&ValidationScope)) -> bool {
        self.validate_with(&(), |scope, _| validator(scope))
    }

    /// Like [`validate`](Self::validate), passing `context` through to the validator.
    pub fn validate_with<C: ?Sized>(
        &self,
        context: &C,
        validator: impl FnOnce(&ValidationScope, &C),
    ) -> bool {
        let mut held: Vec<Self> = Vec::new();
        withhold_around(self, &mut held);
        self.withhold_linked(&mut held);

        self.clear_errors();
        validator(
            &ValidationScope {
                node: self.clone(),
            },
            context,
        );
        for node in &held {
            node.unleash();
        }
        self.is_valid()
    }

    /// Withholds the nodes of other trees that share this tree's errors.
    ///
    /// A source tree is held around the node its derived tree mirrors; a
    /// derived tree is held from its root.
    fn withhold_linked(&self, held: &mut Vec<Self>) {
        let mut seen: Vec<Rc<Tree>> = vec![Rc::clone(&self.inner.tree)];
        let mut pending = seen.clone();
        while let Some(tree) = pending.pop() {
            for anchor in tree.upstream().into_iter().chain(tree.derived()) {
                let next = &anchor.inner.tree;
                if seen.iter().any(|known| Rc::ptr_eq(known, next)) {
                    continue;
                }
                seen.push(Rc::clone(next));
                pending.push(Rc::clone(next));
                withhold_around(&anchor, held);
            }
        }
    }

    pub(crate) fn absolute_path(&self) -> Path {
        self.inner.tree.absolute(&self.path())
    }
}

/// Withholds `node`, everything it owns and its ancestors.
///
/// Nodes are recorded deepest first, so children deliver before their parents.
fn withhold_around(node: &Node, held: &mut Vec<Node>) {
    let mut subtree = node.subtree();
    subtree.reverse();
    for (_, owned) in subtree {
        if owned.withhold() {
            held.push(owned);
        }
    }
    let mut ancestor = node.parent();
    while let Some(current) = ancestor {
        if current.withhold() {
            held.push(current.clone());
        }
        ancestor = current.parent();
    }
}

/// Restricted view of a node handed to validators.
///
/// A scope can read values, walk to children and add errors, but cannot write
/// values.
#[derive(Clone)]
pub struct ValidationScope {
    node: Node,
}

impl ValidationScope {
    /// Returns the current value.
    #[must_use]
    pub fn get(&self) -> Value {
        self.node.get()
    }

    /// Calls `f` with the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        self.node.with(f)
    }

    /// Returns the key of the scoped node.
    #[must_use]
    pub fn key(&self) -> Option<Key> {
        self.node.key()
    }

    /// Returns the path of the scoped node.
    #[must_use]
    pub fn path(&self) -> Path {
        self.node.path()
    }

    /// Scopes the child at `key`, which may be unset.
    ///
    /// # Errors
    ///
    /// As for [`Node::at`].
    pub fn at(&self, key: impl Into<Key>) -> Result<Self, StateError> {
        self.node.at(key).map(|node| Self { node })
    }

    /// Scopes the child at `key` only if it holds a present, non-null value.
    #[must_use]
    pub fn try_at(&self, key: impl Into<Key>) -> Option<Self> {
        self.node.try_at(key).map(|node| Self { node })
    }

    /// Follows `path` with [`at`](Self::at).
    #[must_use]
    pub fn lookup(&self, path: &[Key]) -> Option<Self> {
        self.node.lookup(path).map(|node| Self { node })
    }

    /// Adds an error at the scoped node.
    pub fn add_error(&self, error: impl Into<ValidationError>) -> ChangeSet {
        self.node.add_error(error)
    }

    /// Returns the errors added exactly at the scoped node.
    #[must_use]
    pub fn errors(&self) -> Vec<ValidationError> {
        self.node.errors()
    }

    /// Returns every error at or below the scoped node.
    #[must_use]
    pub fn nested_errors(&self) -> Vec<(Path, ValidationError)> {
        self.node.nested_errors()
    }

    /// Returns `true` if there are no errors at or below the scoped node.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.node.is_valid()
    }
}

impl fmt::Debug for ValidationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationScope")
            .field("node", &self.node)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;

    #[test]
    fn add_error_reports_first_invalidation() {
        let form = Node::new(Value::object([("name", "")]));
        let name = form.at("name").unwrap();
        assert_eq!(name.add_error("required"), ChangeSet::ERRORS | ChangeSet::INVALID);
        assert_eq!(name.add_error("too short"), ChangeSet::ERRORS);
        assert_eq!(name.errors().len(), 2);
        assert!(form.errors().is_empty());
        assert!(!form.is_valid());
        assert_eq!(form.nested_errors()[0].0, vec![Key::from("name")]);
    }

    #[test]
    fn errors_reach_ancestors_shifted() {
        let form = Node::new(Value::object([("a", Value::object([("b", 1)]))]));
        let b = form.lookup(&[Key::from("a"), Key::from("b")]).unwrap();
        let seen = Rc::new(RefCell::new(ChangeSet::empty()));
        let sink = Rc::clone(&seen);
        let _sub = form.watch_sync(move |_, changes| *sink.borrow_mut() |= changes);
        b.add_error("bad");
        assert_eq!(
            *seen.borrow(),
            ChangeSet::DESCENDANT_ERRORS | ChangeSet::DESCENDANT_INVALID
        );
    }

    #[test]
    fn clear_errors_reports_validity() {
        let form = Node::new(Value::object([("a", 1)]));
        let a = form.at("a").unwrap();
        a.add_error("bad");
        assert_eq!(
            form.clear_errors(),
            ChangeSet::CHILD_ERRORS | ChangeSet::CHILD_VALID
        );
        a.add_error("bad");
        assert_eq!(a.clear_errors(), ChangeSet::ERRORS | ChangeSet::VALID);
        assert!(form.is_valid());
        assert_eq!(form.clear_errors(), ChangeSet::empty());
    }

    #[test]
    fn validate_replaces_errors_without_flicker() {
        let form = Node::new(Value::object([("age", -1)]));
        let age = form.at("age").unwrap();
        let check = |scope: &ValidationScope| {
            let age = scope.at("age").unwrap();
            if age.get().as_f64().is_some_and(|n| n < 0.0) {
                age.add_error("negative");
            }
        };
        assert!(!form.validate(check));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = age.watch_sync(move |_, changes| sink.borrow_mut().push(changes));
        assert!(!form.validate(check));
        assert_eq!(*seen.borrow(), vec![ChangeSet::ERRORS]);
        assert_eq!(age.errors(), vec![ValidationError::new("negative")]);
    }

    #[test]
    fn validate_passes_context() {
        let form = Node::new(Value::object([("n", 5)]));
        let valid = form.validate_with(&3.0, |scope, limit| {
            let n = scope.at("n").unwrap();
            if n.get().as_f64().is_some_and(|n| n > *limit) {
                n.add_error("too large");
            }
        });
        assert!(!valid);
        assert!(form.validate_with(&10.0, |_, _| {}));
    }
}
