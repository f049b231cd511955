// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory State: reactive state trees for nested, JSON-like data.
//!
//! A [`Node`] wraps a [`Value`] in a tree of addressable nodes. Every sub-value
//! (an object member, an array item) has its own node that can be read,
//! written and watched independently, and every write reports a precise
//! [`ChangeSet`]:
//!
//! - **Fine-grained changes**: a write diffs the new value against the
//!   existing children. Untouched branches keep their nodes; only the slots
//!   that changed are notified.
//! - **Upward propagation**: ancestors learn that a child or a descendant
//!   changed, with the change shifted one [`Scope`] outward per level.
//! - **Stable identity**: a node removed from its container is parked, and the
//!   same node (with the same [`NodeId`], subscribers and baseline) comes back
//!   when the slot is filled again. Array removals renumber the items that
//!   follow.
//! - **Dirty tracking**: [`Node::is_dirty`] compares against the baseline set
//!   by [`Node::commit`], recursively.
//! - **Validation**: errors are data attached to paths, stored in a shared
//!   [`ValidationTree`]. Paths that have no node yet (unset optional fields)
//!   can carry errors too.
//! - **Computed nodes**: [`Node::into_computed`] derives a node through a pair
//!   of mappings and keeps both sides in sync without feedback loops.
//!
//! ## Example
//!
//! ```rust
//! use core::cell::Cell;
//! use std::rc::Rc;
//! use understory_state::{ChangeSet, Node, Value};
//!
//! let form = Node::new(Value::object([
//!     ("name", Value::from("Ada")),
//!     ("tags", Value::array(["math"])),
//! ]));
//!
//! let seen = Rc::new(Cell::new(ChangeSet::empty()));
//! let sink = Rc::clone(&seen);
//! let _sub = form.watch_sync(move |_, changes| sink.set(sink.get() | changes));
//!
//! form.at("tags").unwrap().push("logic").unwrap();
//! assert!(seen.get().contains(ChangeSet::CHILD_SHAPE | ChangeSet::DESCENDANT_ATTACH));
//!
//! let name = form.at("name").unwrap();
//! name.validate(|scope| {
//!     if scope.get().as_str().is_some_and(str::is_empty) {
//!         scope.add_error("required");
//!     }
//! });
//! assert!(form.is_valid());
//! ```
//!
//! ## Delivery
//!
//! Subscribers registered with [`Node::watch_sync`] run inline, during the
//! write. Subscribers registered with [`Node::watch`] are batched: changes are
//! OR-combined per node until [`Node::flush`] delivers them, once per node.
//! [`Node::withhold`] and [`Node::unleash`] suspend delivery for one node and
//! replay the buffered changes as one.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. Nodes are single-threaded (`!Send`).
//!
//! ## Features
//!
//! - `std` (default): enables `std` in dependencies.
//! - `serde`: `Serialize` and `Deserialize` for [`Value`] and [`Key`].

#![no_std]

extern crate alloc;

mod access;
mod change;
mod computed;
mod error;
mod events;
mod id;
mod key;
mod node;
mod scheduler;
#[cfg(feature = "serde")]
mod serde;
mod storage;
mod tree;
mod typed;
mod value;

pub use access::{ErrorSink, ReadValue};
pub use change::{ChangeSet, Kind, Scope};
pub use computed::{Computed, ComputedBuilder};
pub use error::StateError;
pub use id::NodeId;
pub use key::{Key, Path};
pub use node::{Node, Subscription, ValidationScope};
pub use typed::{StateValue, Typed};
pub use value::{Shape, Value};

pub use understory_validation::{ValidationError, ValidationTree};
