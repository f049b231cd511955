// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Validation: a path-indexed store of validation errors.
//!
//! Validation results for nested data (form models, documents, settings trees)
//! are naturally addressed by *path*: an error belongs to `address.street`,
//! not to a particular object. This crate stores such errors so that three
//! queries stay cheap:
//!
//! - **Direct errors** ([`ValidationTree::at`]): the errors added exactly at a path.
//! - **Nested errors** ([`ValidationTree::nested`]): every error at or below a
//!   path, with its path relative to the query.
//! - **Validity** ([`ValidationTree::is_valid`]): whether anything at or below a
//!   path has an error.
//!
//! ## Layout
//!
//! Errors live once in a flat, append-only list addressed by index. Every
//! path node records, for each error index relevant to it, whether the error is
//! *direct* (added at this node) or *inherited* (added somewhere below).
//! Clearing a subtree only touches the nodes on the path plus the removed
//! subtree; the flat list keeps holes until everything is cleared, at which
//! point it is reset.
//!
//! ## Example
//!
//! ```rust
//! use understory_validation::{ValidationError, ValidationTree};
//!
//! let mut errors = ValidationTree::<&str, ValidationError>::new();
//! errors.add(&["address", "street"], ValidationError::new("required"));
//! errors.add(&["address", "street", "number"], ValidationError::new("not a number"));
//!
//! // Only the error added exactly at the path is direct.
//! assert_eq!(errors.at(&["address", "street"]).len(), 1);
//!
//! // Nested queries see both, relative to the query path.
//! let nested = errors.nested(&["address"]);
//! assert_eq!(nested.len(), 2);
//! assert_eq!(nested[0].0, &["street"][..]);
//! assert_eq!(nested[1].0, &["street", "number"][..]);
//!
//! assert!(!errors.is_valid(&["address"]));
//! errors.clear(&["address"]);
//! assert!(errors.is_valid(&[]));
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod error;
mod tree;

pub use error::ValidationError;
pub use tree::{ErrorIndex, ValidationTree};
