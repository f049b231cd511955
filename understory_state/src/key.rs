// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path segments.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

/// One segment of a node's path.
///
/// Object children are addressed by [`Key::Field`], array children by
/// [`Key::Index`]. When a key reaches a container it is normalized: an index
/// used on an object becomes the field with that decimal name, and a numeric
/// field used on an array becomes the index.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// A named object member.
    Field(String),
    /// A position in an array.
    Index(usize),
}

/// A sequence of keys from a tree's root.
pub type Path = Vec<Key>;

impl Key {
    /// Returns the array position this key addresses, if it is numeric.
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Field(name) => parse_index(name),
        }
    }

    /// Returns the object member name this key addresses.
    #[must_use]
    pub fn to_field(&self) -> String {
        match self {
            Self::Field(name) => name.clone(),
            Self::Index(index) => index.to_string(),
        }
    }

    /// Returns `true` for [`Key::Index`].
    #[must_use]
    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }
}

/// Canonical decimal only: no sign, no leading zeros.
fn parse_index(name: &str) -> Option<usize> {
    if name.is_empty() || (name.len() > 1 && name.starts_with('0')) {
        return None;
    }
    if !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Field(name.into())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Self::Field(name.clone())
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Negative integers become fields named by their decimal text, which no
/// array accepts.
impl From<i32> for Key {
    fn from(index: i32) -> Self {
        match usize::try_from(index) {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Field(index.to_string()),
        }
    }
}

impl From<&Self> for Key {
    fn from(key: &Self) -> Self {
        key.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_fields_address_arrays() {
        assert_eq!(Key::from("3").as_index(), Some(3));
        assert_eq!(Key::from(7_usize).as_index(), Some(7));
        assert_eq!(Key::from("03").as_index(), None);
        assert_eq!(Key::from("-1").as_index(), None);
        assert_eq!(Key::from("+1").as_index(), None);
        assert_eq!(Key::from("").as_index(), None);
        assert_eq!(Key::from("0").as_index(), Some(0));
        assert_eq!(Key::from(2), Key::Index(2));
        assert_eq!(Key::from(-2).as_index(), None);
    }

    #[test]
    fn display_is_bare() {
        assert_eq!(Key::from("name").to_string(), "name");
        assert_eq!(Key::from(12_usize).to_string(), "12");
        assert_eq!(Key::Index(4).to_field(), "4");
        assert!(Key::Index(0).is_index());
    }
}
