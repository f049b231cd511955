// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for the node invariants:
//!
//! 1. Setting the current value again changes nothing.
//! 2. A node reads back what was set, and is dirty exactly when that differs
//!    from the baseline.
//! 3. A fresh or committed node is clean.
//! 4. Object members keep their node across detach and reattach.
//! 5. Array removal renumbers every later item.
//! 6. Ancestors hear a change once, shifted by their distance.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use understory_state::{ChangeSet, Key, Node, Value};

fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-1000_i32..1000).prop_map(Value::from),
        "[a-z]{0,4}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-c]", inner, 0..4).prop_map(Value::Object),
        ]
    })
}

fn object_strategy() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-d]", value_strategy(), 0..4).prop_map(Value::Object)
}

proptest! {
    #[test]
    fn setting_the_same_value_is_a_no_op(value in value_strategy()) {
        let node = Node::new(value.clone());
        prop_assert_eq!(node.set(value.clone()), ChangeSet::empty());
        prop_assert_eq!(node.set(node.get()), ChangeSet::empty());
        prop_assert_eq!(node.get(), value);
    }

    #[test]
    fn reads_back_and_tracks_dirty(before in value_strategy(), after in value_strategy()) {
        let node = Node::new(before.clone());
        prop_assert!(!node.is_dirty());

        let changes = node.set(after.clone());
        prop_assert_eq!(node.get(), after.clone());
        prop_assert_eq!(changes.is_empty(), before == after);
        prop_assert_eq!(node.is_dirty(), before != after);

        node.commit();
        prop_assert!(!node.is_dirty());
        prop_assert_eq!(node.get(), after);
    }

    #[test]
    fn members_keep_identity(first in object_strategy(), other in value_strategy()) {
        let node = Node::new(first.clone());
        let Some(members) = first.as_object() else { unreachable!() };
        let ids: Vec<_> = members
            .keys()
            .map(|name| (name.clone(), node.at(name.as_str()).unwrap().id()))
            .collect();

        node.set(other);
        node.set(first.clone());
        prop_assert_eq!(node.get(), first);
        for (name, id) in ids {
            prop_assert_eq!(node.at(name.as_str()).unwrap().id(), id);
        }
    }

    #[test]
    fn removal_renumbers(items in prop::collection::vec(0_i32..100, 1..8), pick in any::<prop::sample::Index>()) {
        let list = Node::new(Value::array(items.clone()));
        let index = pick.index(items.len());
        let survivors: Vec<_> = (0..items.len())
            .filter(|i| *i != index)
            .map(|i| list.at(i).unwrap())
            .collect();

        list.remove(index).unwrap();

        let mut expected = items;
        expected.remove(index);
        prop_assert_eq!(list.get(), Value::array(expected));
        for (position, node) in survivors.iter().enumerate() {
            prop_assert_eq!(node.key(), Some(Key::Index(position)));
            prop_assert_eq!(&list.at(position).unwrap(), node);
        }
    }

    #[test]
    fn ancestors_hear_shifted_changes(depth in 1_usize..6) {
        let mut value = Value::from(0);
        for _ in 0..depth {
            value = Value::object([("k", value)]);
        }
        let root = Node::new(value);
        let path = vec![Key::from("k"); depth];

        let mut logs = Vec::new();
        let mut subs = Vec::new();
        for level in 0..depth {
            let node = root.lookup(&path[..level]).unwrap();
            let log = Rc::new(RefCell::new(Vec::new()));
            let sink = Rc::clone(&log);
            subs.push(node.watch_sync(move |_, changes| sink.borrow_mut().push(changes)));
            logs.push(log);
        }

        root.lookup(&path).unwrap().set(1);
        for (level, log) in logs.iter().enumerate() {
            prop_assert_eq!(&*log.borrow(), &vec![ChangeSet::VALUE.shift_by(depth - level)]);
        }
    }
}
