// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recoverable addressing errors.

use core::fmt;

use crate::key::Key;

/// A key could not address a child of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateError {
    /// The node holds a scalar (boolean, number or string), which has no children.
    NotAContainer {
        /// The key that was requested.
        key: Key,
    },
    /// The node holds an array and the key is not a valid index.
    KeyMismatch {
        /// The key that was requested.
        key: Key,
    },
}

impl StateError {
    /// Returns the key that failed to resolve.
    #[must_use]
    pub fn key(&self) -> &Key {
        match self {
            Self::NotAContainer { key } | Self::KeyMismatch { key } => key,
        }
    }
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAContainer { key } => {
                write!(f, "cannot address `{key}` inside a scalar value")
            }
            Self::KeyMismatch { key } => write!(f, "`{key}` is not an array index"),
        }
    }
}

impl core::error::Error for StateError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn messages_name_the_key() {
        let err = StateError::NotAContainer { key: Key::from("x") };
        assert_eq!(err.to_string(), "cannot address `x` inside a scalar value");
        let err = StateError::KeyMismatch { key: Key::from("y") };
        assert_eq!(err.to_string(), "`y` is not an array index");
        assert_eq!(err.key(), &Key::from("y"));
    }
}
