// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed handles over nodes.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use crate::change::ChangeSet;
use crate::error::StateError;
use crate::key::Key;
use crate::node::Node;
use crate::value::Value;

/// Conversion between a Rust type and a [`Value`].
///
/// `from_value` returns `None` when the value does not have the expected
/// shape (including when it is absent).
pub trait StateValue: Sized {
    /// Converts into a value.
    fn into_value(self) -> Value;

    /// Reads from a value.
    fn from_value(value: &Value) -> Option<Self>;
}

impl StateValue for Value {
    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl StateValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl StateValue for f64 {
    fn into_value(self) -> Value {
        Value::Number(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl StateValue for f32 {
    fn into_value(self) -> Value {
        Value::Number(self.into())
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "narrowing to f32 is the requested conversion"
    )]
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64().map(|n| n as f32)
    }
}

macro_rules! integer {
    ($($ty:ty),*) => {
        $(
            impl StateValue for $ty {
                fn into_value(self) -> Value {
                    Value::from(self)
                }

                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "range and integrality are checked first"
                )]
                fn from_value(value: &Value) -> Option<Self> {
                    let n = value.as_f64()?;
                    // `MAX + 1` is a power of two, so the exclusive bound is exact in f64.
                    (n.fract() == 0.0 && n >= <$ty>::MIN as f64 && n < <$ty>::MAX as f64 + 1.0)
                        .then(|| n as $ty)
                }
            }
        )*
    };
}

integer!(i32, i64, u32, usize);

impl StateValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(String::from)
    }
}

/// Absent and null read as `None`; `None` writes null.
impl<T: StateValue> StateValue for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Null, T::into_value)
    }

    fn from_value(value: &Value) -> Option<Self> {
        if value.is_nullish() {
            return Some(None);
        }
        T::from_value(value).map(Some)
    }
}

impl<T: StateValue> StateValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(T::into_value).collect())
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_array()?.iter().map(T::from_value).collect()
    }
}

impl<T: StateValue> StateValue for BTreeMap<String, T> {
    fn into_value(self) -> Value {
        Value::Object(
            self.into_iter()
                .map(|(name, value)| (name, value.into_value()))
                .collect(),
        )
    }

    fn from_value(value: &Value) -> Option<Self> {
        value
            .as_object()?
            .iter()
            .filter(|(_, member)| !member.is_absent())
            .map(|(name, member)| T::from_value(member).map(|v| (name.clone(), v)))
            .collect()
    }
}

/// A node read and written as `T`.
pub struct Typed<T> {
    node: Node,
    marker: PhantomData<fn() -> T>,
}

impl<T: StateValue> Typed<T> {
    /// Returns the value as `T`, or `None` if it does not convert.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.node.with(T::from_value)
    }

    /// Writes `value`.
    pub fn set(&self, value: T) -> ChangeSet {
        self.node.set(value.into_value())
    }

    /// Returns the underlying node.
    #[must_use]
    pub fn node(&self) -> &Node {
        &self.node
    }
}

impl<T> Clone for Typed<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Typed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Typed")
            .field("type", &core::any::type_name::<T>())
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

impl Node {
    /// Returns the child at `key` as a typed handle.
    ///
    /// # Errors
    ///
    /// As for [`at`](Self::at).
    pub fn field<T: StateValue>(&self, key: impl Into<Key>) -> Result<Typed<T>, StateError> {
        self.at(key).map(Node::typed)
    }

    /// Returns this node as a typed handle.
    #[must_use]
    pub fn typed<T: StateValue>(self) -> Typed<T> {
        Typed {
            node: self,
            marker: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn scalars_convert_strictly() {
        assert_eq!(i32::from_value(&Value::from(3)), Some(3));
        assert_eq!(i32::from_value(&Value::from(3.5)), None);
        assert_eq!(u32::from_value(&Value::from(-1)), None);
        assert_eq!(bool::from_value(&Value::from("true")), None);
    }

    #[test]
    fn integers_reject_values_past_their_range() {
        assert_eq!(i64::from_value(&Value::from(9_223_372_036_854_775_808.0)), None);
        assert_eq!(
            i64::from_value(&Value::from(-9_223_372_036_854_775_808.0)),
            Some(i64::MIN)
        );
        assert_eq!(u32::from_value(&Value::from(4_294_967_296.0)), None);
        assert_eq!(u32::from_value(&Value::from(4_294_967_295.0)), Some(u32::MAX));
        assert_eq!(i32::from_value(&Value::from(2_147_483_648.0)), None);
        assert_eq!(usize::from_value(&Value::from(18_446_744_073_709_551_616.0)), None);
        assert_eq!(
            String::from_value(&Value::from("x")),
            Some(String::from("x"))
        );
    }

    #[test]
    fn optional_fields() {
        let form = Node::new(Value::object([("nick", Value::Null)]));
        let nick = form.field::<Option<String>>("nick").unwrap();
        assert_eq!(nick.get(), Some(None));
        nick.set(Some(String::from("ada")));
        assert_eq!(form.get(), Value::object([("nick", "ada")]));

        let missing = form.field::<Option<i64>>("age").unwrap();
        assert_eq!(missing.get(), Some(None));
    }

    #[test]
    fn collections() {
        let tags = Node::new(Value::array(["a", "b"])).typed::<Vec<String>>();
        assert_eq!(tags.get(), Some(vec![String::from("a"), String::from("b")]));
        tags.set(vec![String::from("c")]);
        assert_eq!(tags.node().len(), 1);

        let scores = Node::new(Value::object([("x", 1), ("y", 2)])).typed::<BTreeMap<String, u32>>();
        assert_eq!(scores.get().unwrap()["y"], 2);
        assert_eq!(
            Node::new(Value::array([1])).typed::<BTreeMap<String, u32>>().get(),
            None
        );
    }
}
