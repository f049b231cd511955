// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scalar and sentinel storage.

use crate::change::ChangeSet;
use crate::value::Value;

use super::transition;

/// Holds a value that has no addressable children.
pub(crate) struct PrimitiveStorage {
    value: Value,
}

impl PrimitiveStorage {
    pub(crate) const fn new(value: Value) -> Self {
        Self { value }
    }

    pub(crate) const fn value(&self) -> &Value {
        &self.value
    }

    /// Replaces the value.
    ///
    /// Returns exactly one of: empty, [`VALUE`](ChangeSet::VALUE),
    /// [`TYPE`](ChangeSet::TYPE), [`ATTACH`](ChangeSet::ATTACH) or
    /// [`DETACH`](ChangeSet::DETACH).
    pub(crate) fn set(&mut self, value: Value) -> ChangeSet {
        if self.value == value {
            return ChangeSet::empty();
        }
        let changes = transition(self.value.shape(), value.shape());
        self.value = value;
        if changes.is_empty() {
            ChangeSet::VALUE
        } else {
            changes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_one_kind() {
        let mut storage = PrimitiveStorage::new(Value::Absent);
        assert_eq!(storage.set(Value::Absent), ChangeSet::empty());
        assert_eq!(storage.set(Value::from(1)), ChangeSet::ATTACH);
        assert_eq!(storage.set(Value::from(2)), ChangeSet::VALUE);
        assert_eq!(storage.set(Value::from(2)), ChangeSet::empty());
        assert_eq!(storage.set(Value::from("2")), ChangeSet::TYPE);
        assert_eq!(storage.set(Value::Null), ChangeSet::TYPE);
        assert_eq!(storage.set(Value::Absent), ChangeSet::DETACH);
        assert_eq!(storage.value(), &Value::Absent);
    }

    #[test]
    fn nan_is_stable() {
        let mut storage = PrimitiveStorage::new(Value::from(f64::NAN));
        assert_eq!(storage.set(Value::from(f64::NAN)), ChangeSet::empty());
    }
}
