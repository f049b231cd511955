// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The path-indexed error store.

use alloc::vec::Vec;
use core::fmt;
use core::hash::Hash;

use hashbrown::HashMap;

/// Index of an error in a [`ValidationTree`]'s flat error list.
///
/// Indices are only meaningful until the error is cleared. Once every error in
/// a tree has been cleared the list is reset and indices are reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ErrorIndex(usize);

impl ErrorIndex {
    /// Returns the raw list position.
    #[must_use]
    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for ErrorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorIndex({})", self.0)
    }
}

#[derive(Debug)]
struct Entry<K, E> {
    path: Vec<K>,
    error: E,
}

/// One path segment's bookkeeping.
#[derive(Debug)]
struct PathNode<K> {
    /// Error index -> `true` if the error was added exactly at this node.
    flags: HashMap<usize, bool>,
    children: HashMap<K, PathNode<K>>,
}

impl<K> Default for PathNode<K> {
    fn default() -> Self {
        Self {
            flags: HashMap::new(),
            children: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> PathNode<K> {
    fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.children.is_empty()
    }

    fn find(&self, path: &[K]) -> Option<&Self> {
        let mut node = self;
        for segment in path {
            node = node.children.get(segment)?;
        }
        Some(node)
    }

    fn sorted_indices(&self, direct_only: bool) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .flags
            .iter()
            .filter(|(_, direct)| !direct_only || **direct)
            .map(|(index, _)| *index)
            .collect();
        indices.sort_unstable();
        indices
    }

    /// Drops empty nodes along `path`, bottom-up.
    fn prune(&mut self, path: &[K]) {
        if let Some((first, rest)) = path.split_first()
            && let Some(child) = self.children.get_mut(first)
        {
            child.prune(rest);
            if child.is_empty() {
                self.children.remove(first);
            }
        }
    }
}

/// A path-indexed store of validation errors.
///
/// `K` is the path segment type and `E` the error type. Errors are kept in a
/// flat append-only list; each path node maps the indices of every error at or
/// below it to a "direct" flag.
///
/// # Example
///
/// ```rust
/// use understory_validation::ValidationTree;
///
/// let mut tree = ValidationTree::<u32, &str>::new();
/// tree.add(&[1, 2], "e1");
/// tree.add(&[1, 2, 3], "e2");
///
/// assert_eq!(tree.at(&[1, 2]), vec![&"e1"]);
/// let nested: Vec<_> = tree.nested(&[1]).into_iter().map(|(_, e)| *e).collect();
/// assert_eq!(nested, vec!["e1", "e2"]);
/// ```
pub struct ValidationTree<K, E> {
    errors: Vec<Option<Entry<K, E>>>,
    live: usize,
    root: PathNode<K>,
}

impl<K, E> Default for ValidationTree<K, E>
where
    K: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, E: fmt::Debug> fmt::Debug for ValidationTree<K, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationTree")
            .field("live", &self.live)
            .field("slots", &self.errors.len())
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl<K, E> ValidationTree<K, E>
where
    K: Clone + Eq + Hash,
{
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            live: 0,
            root: PathNode::default(),
        }
    }

    /// Returns the number of errors currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if no errors are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Adds `error` at `path`.
    ///
    /// Every ancestor of `path` (including the root) records the error as
    /// inherited; the node at `path` records it as direct.
    pub fn add(&mut self, path: &[K], error: E) -> ErrorIndex {
        let index = self.errors.len();
        self.errors.push(Some(Entry {
            path: path.to_vec(),
            error,
        }));
        self.live += 1;

        let mut node = &mut self.root;
        for segment in path {
            node.flags.insert(index, false);
            node = node.children.entry(segment.clone()).or_default();
        }
        node.flags.insert(index, true);
        ErrorIndex(index)
    }

    /// Returns the errors added exactly at `path`, in insertion order.
    #[must_use]
    pub fn at(&self, path: &[K]) -> Vec<&E> {
        let Some(node) = self.root.find(path) else {
            return Vec::new();
        };
        node.sorted_indices(true)
            .into_iter()
            .filter_map(|index| self.entry(index))
            .map(|entry| &entry.error)
            .collect()
    }

    /// Returns every error at or below `path`, with paths relative to `path`.
    ///
    /// Errors are returned in insertion order. A direct error at `path` itself
    /// has an empty relative path.
    #[must_use]
    pub fn nested(&self, path: &[K]) -> Vec<(&[K], &E)> {
        let Some(node) = self.root.find(path) else {
            return Vec::new();
        };
        node.sorted_indices(false)
            .into_iter()
            .filter_map(|index| self.entry(index))
            .map(|entry| (&entry.path[path.len()..], &entry.error))
            .collect()
    }

    /// Returns `true` if there are no errors at or below `path`.
    #[must_use]
    pub fn is_valid(&self, path: &[K]) -> bool {
        self.root
            .find(path)
            .is_none_or(|node| node.flags.is_empty())
    }

    /// Returns `true` if there is at least one error added exactly at `path`.
    #[must_use]
    pub fn has_direct(&self, path: &[K]) -> bool {
        self.root
            .find(path)
            .is_some_and(|node| node.flags.values().any(|direct| *direct))
    }

    /// Returns the error stored at `index`, if it has not been cleared.
    #[must_use]
    pub fn get(&self, index: ErrorIndex) -> Option<(&[K], &E)> {
        self.entry(index.0)
            .map(|entry| (entry.path.as_slice(), &entry.error))
    }

    /// Iterates over all stored errors with their absolute paths, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&[K], &E)> + '_ {
        self.errors
            .iter()
            .flatten()
            .map(|entry| (entry.path.as_slice(), &entry.error))
    }

    /// Removes every error at or below `path`.
    ///
    /// Returns the removed errors with their absolute paths, in insertion order.
    pub fn clear(&mut self, path: &[K]) -> Vec<(Vec<K>, E)> {
        let indices = {
            let mut node = &mut self.root;
            for segment in path {
                match node.children.get_mut(segment) {
                    Some(child) => node = child,
                    None => return Vec::new(),
                }
            }
            let indices = node.sorted_indices(false);
            node.flags.clear();
            node.children.clear();
            indices
        };
        if indices.is_empty() {
            return Vec::new();
        }

        // Ancestors only hold inherited flags for the removed indices.
        let mut node = &mut self.root;
        for segment in path {
            node.flags
                .retain(|index, _| indices.binary_search(index).is_err());
            match node.children.get_mut(segment) {
                Some(child) => node = child,
                None => break,
            }
        }
        self.root.prune(path);

        let mut removed = Vec::with_capacity(indices.len());
        for index in indices {
            if let Some(entry) = self.errors.get_mut(index).and_then(Option::take) {
                self.live -= 1;
                removed.push((entry.path, entry.error));
            }
        }
        if self.live == 0 {
            self.errors.clear();
        }
        removed
    }

    /// Removes every error.
    pub fn clear_all(&mut self) {
        self.errors.clear();
        self.live = 0;
        self.root = PathNode::default();
    }

    fn entry(&self, index: usize) -> Option<&Entry<K, E>> {
        self.errors.get(index).and_then(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    type Tree = ValidationTree<&'static str, &'static str>;

    #[test]
    fn direct_and_nested() {
        let mut tree = Tree::new();
        tree.add(&["a", "b"], "e1");
        tree.add(&["a", "b", "c"], "e2");

        assert_eq!(tree.at(&["a", "b"]), vec![&"e1"]);
        assert_eq!(tree.at(&["a", "b", "c"]), vec![&"e2"]);
        assert!(tree.at(&["a"]).is_empty());

        let nested = tree.nested(&["a"]);
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[0], (&["b"][..], &"e1"));
        assert_eq!(nested[1], (&["b", "c"][..], &"e2"));
    }

    #[test]
    fn validity_follows_descendants() {
        let mut tree = Tree::new();
        assert!(tree.is_valid(&[]));
        tree.add(&["a", "b"], "e1");

        assert!(!tree.is_valid(&[]));
        assert!(!tree.is_valid(&["a"]));
        assert!(!tree.is_valid(&["a", "b"]));
        assert!(tree.is_valid(&["a", "b", "c"]));
        assert!(tree.is_valid(&["z"]));

        assert!(tree.has_direct(&["a", "b"]));
        assert!(!tree.has_direct(&["a"]));
    }

    #[test]
    fn clear_removes_subtree_and_ancestor_flags() {
        let mut tree = Tree::new();
        tree.add(&["a", "b"], "e1");
        tree.add(&["a", "b", "c"], "e2");
        tree.add(&["x"], "e3");

        let removed = tree.clear(&["a", "b"]);
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].1, "e1");
        assert_eq!(removed[1].0, vec!["a", "b", "c"]);

        assert!(tree.is_valid(&["a"]));
        assert!(!tree.is_valid(&[]));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.nested(&[]).len(), 1);
    }

    #[test]
    fn clear_everything_resets_indices() {
        let mut tree = Tree::new();
        tree.add(&["a"], "e1");
        tree.add(&["b"], "e2");
        assert_eq!(tree.clear(&[]).len(), 2);
        assert!(tree.is_empty());

        let index = tree.add(&["c"], "e3");
        assert_eq!(index.get(), 0);
        assert_eq!(tree.get(index), Some((&["c"][..], &"e3")));
    }

    #[test]
    fn clear_missing_path_is_noop() {
        let mut tree = Tree::new();
        tree.add(&["a"], "e1");
        assert!(tree.clear(&["nope"]).is_empty());
        assert!(tree.clear(&["a", "deeper"]).is_empty());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn holes_are_skipped() {
        let mut tree = Tree::new();
        tree.add(&["a"], "e1");
        tree.add(&["b"], "e2");
        tree.add(&["a"], "e3");
        tree.clear(&["b"]);

        let all: Vec<_> = tree.iter().map(|(_, e)| *e).collect();
        assert_eq!(all, vec!["e1", "e3"]);
        assert_eq!(tree.at(&["a"]), vec![&"e1", &"e3"]);
    }

    #[test]
    fn clear_all_empties() {
        let mut tree = Tree::new();
        tree.add(&["a", "b"], "e1");
        tree.clear_all();
        assert!(tree.is_valid(&["a"]));
        assert!(tree.is_empty());
    }
}
