// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Storage strategies: how a node holds its current value.
//!
//! A node holds exactly one [`Storage`] at a time, picked by the runtime shape
//! of its value. Containers own their live children plus an
//! [`IdentityRegistry`] of children that are detached or not yet attached.
//! The diff algorithms take the owning [`Node`] rather than the storage, and
//! only borrow the storage for short bookkeeping steps, because setting a
//! child runs subscriber callbacks that may read the tree again.

pub(crate) mod array;
pub(crate) mod object;
mod primitive;
mod registry;

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;

use crate::change::ChangeSet;
use crate::key::Key;
use crate::node::{Node, NodeInner};
use crate::tree::Tree;
use crate::value::{Shape, Value};

pub(crate) use array::ArrayStorage;
pub(crate) use object::ObjectStorage;
pub(crate) use primitive::PrimitiveStorage;
pub(crate) use registry::IdentityRegistry;

/// The own-scope change implied by a shape transition.
pub(crate) fn transition(before: Shape, after: Shape) -> ChangeSet {
    if before == after {
        ChangeSet::empty()
    } else if before == Shape::Absent {
        ChangeSet::ATTACH
    } else if after == Shape::Absent {
        ChangeSet::DETACH
    } else {
        ChangeSet::TYPE
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum StorageKind {
    Primitive,
    Object,
    Array,
}

impl StorageKind {
    pub(crate) const fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::Array,
            _ => Self::Primitive,
        }
    }

    /// The container kind that hosts children addressed by `key`.
    pub(crate) const fn hosting(key: &Key) -> Self {
        match key {
            Key::Index(_) => Self::Array,
            Key::Field(_) => Self::Object,
        }
    }

    pub(crate) const fn container_shape(self) -> Shape {
        match self {
            Self::Array => Shape::Array,
            Self::Object => Shape::Object,
            Self::Primitive => Shape::Null,
        }
    }
}

pub(crate) enum Storage {
    Primitive(PrimitiveStorage),
    Object(ObjectStorage),
    Array(ArrayStorage),
}

impl Storage {
    /// Builds storage (and child nodes) for a freshly constructed node.
    pub(crate) fn build(
        tree: &Rc<Tree>,
        owner: &Weak<NodeInner>,
        path: &[Key],
        value: Value,
    ) -> Self {
        match value {
            Value::Object(members) => Self::Object(ObjectStorage::build(tree, owner, path, members)),
            Value::Array(items) => Self::Array(ArrayStorage::build(tree, owner, path, items)),
            scalar => Self::Primitive(PrimitiveStorage::new(scalar)),
        }
    }

    pub(crate) fn empty(kind: StorageKind) -> Self {
        match kind {
            StorageKind::Primitive => Self::Primitive(PrimitiveStorage::new(Value::Absent)),
            StorageKind::Object => Self::Object(ObjectStorage::default()),
            StorageKind::Array => Self::Array(ArrayStorage::default()),
        }
    }

    pub(crate) const fn kind(&self) -> StorageKind {
        match self {
            Self::Primitive(_) => StorageKind::Primitive,
            Self::Object(_) => StorageKind::Object,
            Self::Array(_) => StorageKind::Array,
        }
    }

    pub(crate) const fn shape(&self) -> Shape {
        match self {
            Self::Primitive(p) => p.value().shape(),
            Self::Object(_) => Shape::Object,
            Self::Array(_) => Shape::Array,
        }
    }

    pub(crate) const fn is_nullish(&self) -> bool {
        match self {
            Self::Primitive(p) => p.value().is_nullish(),
            _ => false,
        }
    }

    /// Assembles the current value from the live children.
    pub(crate) fn compose(&self) -> Value {
        match self {
            Self::Primitive(p) => p.value().clone(),
            Self::Object(s) => s.compose(),
            Self::Array(s) => s.compose(),
        }
    }

    /// Live children, in key order.
    pub(crate) fn live(&self) -> Vec<Node> {
        match self {
            Self::Primitive(_) => Vec::new(),
            Self::Object(s) => s.children.values().cloned().collect(),
            Self::Array(s) => s.children.clone(),
        }
    }

    /// Live children with their keys, in key order.
    pub(crate) fn live_entries(&self) -> Vec<(Key, Node)> {
        match self {
            Self::Primitive(_) => Vec::new(),
            Self::Object(s) => s
                .children
                .iter()
                .map(|(name, node)| (Key::Field(name.clone()), node.clone()))
                .collect(),
            Self::Array(s) => s
                .children
                .iter()
                .enumerate()
                .map(|(index, node)| (Key::Index(index), node.clone()))
                .collect(),
        }
    }

    /// Live and parked children with their keys.
    pub(crate) fn owned(&self) -> Vec<(Key, Node)> {
        let mut owned = self.live_entries();
        match self {
            Self::Primitive(_) => {}
            Self::Object(s) => owned.extend(
                s.registry
                    .iter()
                    .map(|(name, node)| (Key::Field(name.clone()), node.clone())),
            ),
            Self::Array(s) => owned.extend(
                s.registry
                    .iter()
                    .map(|(index, node)| (Key::Index(*index), node.clone())),
            ),
        }
        owned
    }

    /// Moves every live child into the registry, returning them.
    ///
    /// The caller still has to set each returned child to absent.
    pub(crate) fn retire(&mut self) -> Vec<Node> {
        match self {
            Self::Primitive(_) => Vec::new(),
            Self::Object(s) => {
                let children = core::mem::take(&mut s.children);
                children
                    .into_iter()
                    .map(|(name, node)| {
                        s.registry.register(name, node.clone());
                        node
                    })
                    .collect()
            }
            Self::Array(s) => {
                let children = core::mem::take(&mut s.children);
                for (index, node) in children.iter().enumerate() {
                    s.registry.register(index, node.clone());
                }
                children
            }
        }
    }

    pub(crate) fn prune(&mut self) -> Vec<Node> {
        match self {
            Self::Primitive(_) => Vec::new(),
            Self::Object(s) => s.registry.prune(),
            Self::Array(s) => s.registry.prune(),
        }
    }

    /// `true` if the storage owns no nodes at all.
    pub(crate) fn is_hollow(&self) -> bool {
        match self {
            Self::Primitive(_) => true,
            Self::Object(s) => s.children.is_empty() && s.registry.is_empty(),
            Self::Array(s) => s.children.is_empty() && s.registry.is_empty(),
        }
    }

    pub(crate) fn parked(&self) -> usize {
        match self {
            Self::Primitive(_) => 0,
            Self::Object(s) => s.registry.len(),
            Self::Array(s) => s.registry.len(),
        }
    }
}

/// Container storages parked while a node holds another shape.
///
/// At most one of each container kind is kept, so nodes handed out for either
/// kind of key stay attachable.
#[derive(Default)]
pub(crate) struct Dormant {
    object: Option<ObjectStorage>,
    array: Option<ArrayStorage>,
}

impl Dormant {
    pub(crate) fn take(&mut self, kind: StorageKind) -> Option<Storage> {
        match kind {
            StorageKind::Object => self.object.take().map(Storage::Object),
            StorageKind::Array => self.array.take().map(Storage::Array),
            StorageKind::Primitive => None,
        }
    }

    pub(crate) fn park(&mut self, storage: Storage) {
        match storage {
            Storage::Object(s) => self.object = Some(s),
            Storage::Array(s) => self.array = Some(s),
            Storage::Primitive(_) => {}
        }
    }

    pub(crate) fn object(&mut self) -> &mut ObjectStorage {
        self.object.get_or_insert_with(ObjectStorage::default)
    }

    pub(crate) fn array(&mut self) -> &mut ArrayStorage {
        self.array.get_or_insert_with(ArrayStorage::default)
    }

    pub(crate) fn owned(&self) -> Vec<(Key, Node)> {
        let mut owned = Vec::new();
        if let Some(s) = &self.object {
            owned.extend(
                s.registry
                    .iter()
                    .map(|(name, node)| (Key::Field(name.clone()), node.clone())),
            );
        }
        if let Some(s) = &self.array {
            owned.extend(
                s.registry
                    .iter()
                    .map(|(index, node)| (Key::Index(*index), node.clone())),
            );
        }
        owned
    }

    pub(crate) fn prune(&mut self) -> Vec<Node> {
        let mut dropped = Vec::new();
        if let Some(s) = &mut self.object {
            dropped.extend(s.registry.prune());
        }
        if let Some(s) = &mut self.array {
            dropped.extend(s.registry.prune());
        }
        dropped
    }

    pub(crate) fn is_hollow(&self) -> bool {
        self.object.as_ref().is_none_or(|s| s.registry.is_empty())
            && self.array.as_ref().is_none_or(|s| s.registry.is_empty())
    }

    pub(crate) fn parked(&self) -> usize {
        self.object.as_ref().map_or(0, |s| s.registry.len())
            + self.array.as_ref().map_or(0, |s| s.registry.len())
    }
}
