// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The JSON-like value model held by a state tree.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::key::Key;

/// A nested, JSON-like value.
///
/// [`Value::Absent`] is the detach sentinel: it marks a slot that does not
/// exist, as opposed to [`Value::Null`], which is a present, empty value.
/// Inside an object an absent member is the same as a missing one.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// The slot does not exist.
    Absent,
    /// An explicit empty value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string.
    String(String),
    /// An ordered list.
    Array(Vec<Self>),
    /// A keyed map.
    Object(BTreeMap<String, Self>),
}

/// The runtime shape of a [`Value`].
///
/// A change between two shapes is a [`TYPE`](crate::ChangeSet::TYPE) change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// [`Value::Absent`].
    Absent,
    /// [`Value::Null`].
    Null,
    /// [`Value::Bool`].
    Bool,
    /// [`Value::Number`].
    Number,
    /// [`Value::String`].
    String,
    /// [`Value::Array`].
    Array,
    /// [`Value::Object`].
    Object,
}

impl Shape {
    /// Returns `true` for arrays and objects.
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Array | Self::Object)
    }
}

impl Value {
    /// Builds an object from key/value pairs.
    ///
    /// Absent values are dropped.
    pub fn object<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Self>,
    {
        Self::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .filter(|(_, v): &(String, Self)| !v.is_absent())
                .collect(),
        )
    }

    /// Builds an array from items.
    pub fn array<V: Into<Self>>(items: impl IntoIterator<Item = V>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    /// Returns the shape of this value.
    #[must_use]
    pub const fn shape(&self) -> Shape {
        match self {
            Self::Absent => Shape::Absent,
            Self::Null => Shape::Null,
            Self::Bool(_) => Shape::Bool,
            Self::Number(_) => Shape::Number,
            Self::String(_) => Shape::String,
            Self::Array(_) => Shape::Array,
            Self::Object(_) => Shape::Object,
        }
    }

    /// Returns `true` for [`Value::Absent`].
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for [`Value::Absent`] and [`Value::Null`].
    #[must_use]
    pub const fn is_nullish(&self) -> bool {
        matches!(self, Self::Absent | Self::Null)
    }

    /// Returns the boolean, if this is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the number, if this is one.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string slice, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the items, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the members, if this is an object.
    #[must_use]
    pub fn as_object(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Object(members) => Some(members),
            _ => None,
        }
    }

    /// Returns the sub-value addressed by `key`, if it exists.
    ///
    /// Keys are normalized the way containers normalize them: numeric fields
    /// index arrays and indices name object members.
    #[must_use]
    pub fn child(&self, key: &Key) -> Option<&Self> {
        match self {
            Self::Object(members) => members.get(&key.to_field()).filter(|v| !v.is_absent()),
            Self::Array(items) => key.as_index().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Returns the sub-value addressed by `path`, if every segment exists.
    #[must_use]
    pub fn pointer(&self, path: &[Key]) -> Option<&Self> {
        path.iter().try_fold(self, |value, key| value.child(key))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Absent, Self::Absent) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            // NaN is equal to itself so that re-setting it is a no-op.
            (Self::Number(a), Self::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => {
                let mut a = a.iter().filter(|(_, v)| !v.is_absent());
                let mut b = b.iter().filter(|(_, v)| !v.is_absent());
                loop {
                    match (a.next(), b.next()) {
                        (None, None) => return true,
                        (Some((ka, va)), Some((kb, vb))) if ka == kb && va == vb => {}
                        _ => return false,
                    }
                }
            }
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Number(value.into())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(value.into())
    }
}

// Numbers are f64; integers past 2^53 round the way they do in JSON.
impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Self>> for Value {
    fn from(items: Vec<Self>) -> Self {
        Self::Array(items)
    }
}

impl From<BTreeMap<String, Self>> for Value {
    fn from(members: BTreeMap<String, Self>) -> Self {
        Self::Object(members)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn nan_equals_itself() {
        assert_eq!(Value::from(f64::NAN), Value::from(f64::NAN));
        assert_ne!(Value::from(1.0), Value::from(f64::NAN));
    }

    #[test]
    fn absent_members_are_ignored() {
        let mut members = BTreeMap::new();
        members.insert(String::from("a"), Value::from(1));
        members.insert(String::from("b"), Value::Absent);
        assert_eq!(Value::Object(members), Value::object([("a", 1)]));
        assert_eq!(
            Value::object([("a", Value::Absent)]),
            Value::Object(BTreeMap::new())
        );
    }

    #[test]
    fn shapes() {
        assert_eq!(Value::Absent.shape(), Shape::Absent);
        assert_eq!(Value::from("x").shape(), Shape::String);
        assert!(Value::array([1, 2]).shape().is_container());
        assert!(!Value::Null.shape().is_container());
        assert!(Value::Null.is_nullish());
        assert!(Value::Absent.is_nullish());
        assert_ne!(Value::Null, Value::Absent);
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn child_and_pointer() {
        let value = Value::object([
            ("list", Value::array([10, 20])),
            ("name", Value::from("n")),
        ]);
        assert_eq!(value.child(&Key::from("name")), Some(&Value::from("n")));
        assert_eq!(
            value.pointer(&[Key::from("list"), Key::from("1")]),
            Some(&Value::from(20))
        );
        assert_eq!(value.pointer(&[Key::from("list"), Key::Index(2)]), None);
        assert_eq!(value.pointer(&[]), Some(&value));
        assert_eq!(Value::from(1).child(&Key::Index(0)), None);
        assert_eq!(value.as_object().map(BTreeMap::len), Some(2));
        assert_eq!(
            Value::array([true]).as_array(),
            Some(&vec![Value::Bool(true)][..])
        );
    }
}
