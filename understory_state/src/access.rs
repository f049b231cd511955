// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capability traits shared by nodes and validation scopes.
//!
//! Code that only needs to read values or report errors can be written once
//! against these traits and used with a [`Node`] as well as with the
//! restricted [`ValidationScope`] handed to validators.

use alloc::vec::Vec;

use understory_validation::ValidationError;

use crate::change::ChangeSet;
use crate::key::{Key, Path};
use crate::node::{Node, ValidationScope};
use crate::value::Value;

/// Read access to a position in a state tree.
pub trait ReadValue {
    /// Returns the current value.
    fn value(&self) -> Value;

    /// Returns the key in the parent, or `None` at a root.
    fn key(&self) -> Option<Key>;

    /// Returns the keys from the root.
    fn path(&self) -> Path;
}

/// Read and write access to the validation errors at a position.
pub trait ErrorSink {
    /// Adds an error here.
    fn add_error(&self, error: ValidationError) -> ChangeSet;

    /// Returns the errors added exactly here.
    fn errors(&self) -> Vec<ValidationError>;

    /// Returns `true` if there are no errors here or below.
    fn is_valid(&self) -> bool;
}

impl ReadValue for Node {
    fn value(&self) -> Value {
        self.get()
    }

    fn key(&self) -> Option<Key> {
        Self::key(self)
    }

    fn path(&self) -> Path {
        Self::path(self)
    }
}

impl ReadValue for ValidationScope {
    fn value(&self) -> Value {
        self.get()
    }

    fn key(&self) -> Option<Key> {
        Self::key(self)
    }

    fn path(&self) -> Path {
        Self::path(self)
    }
}

impl ErrorSink for Node {
    fn add_error(&self, error: ValidationError) -> ChangeSet {
        Self::add_error(self, error)
    }

    fn errors(&self) -> Vec<ValidationError> {
        Self::errors(self)
    }

    fn is_valid(&self) -> bool {
        Self::is_valid(self)
    }
}

impl ErrorSink for ValidationScope {
    fn add_error(&self, error: ValidationError) -> ChangeSet {
        Self::add_error(self, error)
    }

    fn errors(&self) -> Vec<ValidationError> {
        Self::errors(self)
    }

    fn is_valid(&self) -> bool {
        Self::is_valid(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn require_text(target: &(impl ReadValue + ErrorSink)) {
        if target.value().as_str().is_none_or(str::is_empty) {
            target.add_error(ValidationError::with_kind("required", "must not be empty"));
        }
    }

    #[test]
    fn same_rule_for_nodes_and_scopes() {
        let form = Node::new(Value::object([("a", ""), ("b", "")]));
        let a = form.at("a").unwrap();
        require_text(&a);
        assert!(!ErrorSink::is_valid(&a));

        form.validate(|scope| require_text(&scope.at("b").unwrap()));
        assert!(ErrorSink::is_valid(&a), "validate clears earlier errors");
        assert_eq!(
            form.at("b").unwrap().errors()[0].kind(),
            Some("required")
        );
        assert_eq!(ReadValue::path(&a), [Key::from("a")]);
    }
}
