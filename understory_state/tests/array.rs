// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Positional identity: splicing, renumbering and reinsertion.

use std::cell::RefCell;
use std::rc::Rc;

use understory_state::{ChangeSet, Key, Node, Value};

fn assert_keys_match_positions(list: &Node) {
    for (index, child) in list.children().iter().enumerate() {
        assert_eq!(child.key(), Some(Key::Index(index)));
        assert_eq!(list.at(index).unwrap(), *child);
    }
}

#[test]
fn removal_splices_and_renumbers() {
    let list = Node::new(Value::array([1, 2, 3, 4]));
    let third = list.at(2).unwrap();
    let fourth = list.at(3).unwrap();

    let changes = list.remove(1).unwrap();
    assert!(changes.contains(ChangeSet::SHAPE | ChangeSet::CHILD_DETACH));
    assert_eq!(list.get(), Value::array([1, 3, 4]));
    assert_eq!(third.key(), Some(Key::Index(1)));
    assert_eq!(fourth.key(), Some(Key::Index(2)));
    assert_eq!(fourth.path(), vec![Key::Index(2)]);
    assert_keys_match_positions(&list);
}

#[test]
fn renumbered_items_hear_key_changes() {
    let list = Node::new(Value::array(["a", "b", "c"]));
    let last = list.at(2).unwrap();
    let seen = Rc::new(RefCell::new(ChangeSet::empty()));
    let sink = Rc::clone(&seen);
    let _sub = last.watch_sync(move |_, changes| *sink.borrow_mut() |= changes);

    list.remove(0).unwrap();
    assert_eq!(*seen.borrow(), ChangeSet::KEY);
}

#[test]
fn detached_item_reinserts_at_its_slot() {
    let list = Node::new(Value::array([1, 2, 3]));
    let first = list.at(0).unwrap();
    let second = list.at(1).unwrap();
    let third = list.at(2).unwrap();

    second.set(Value::Absent);
    assert_eq!(list.get(), Value::array([1, 3]));
    assert_eq!(list.at(1).unwrap(), third);

    first.set(9);
    assert_eq!(list.get(), Value::array([9, 3]));

    second.set(7);
    assert_eq!(list.get(), Value::array([9, 7, 3]));
    assert_eq!(list.at(1).unwrap(), second);
    assert_eq!(third.key(), Some(Key::Index(2)));
    assert_keys_match_positions(&list);
}

#[test]
fn insert_shifts_the_tail() {
    let list = Node::new(Value::array(["a", "c"]));
    let c = list.at(1).unwrap();
    let changes = list.insert(1, "b").unwrap();
    assert!(changes.contains(ChangeSet::SHAPE | ChangeSet::CHILD_ATTACH));
    assert_eq!(list.get(), Value::array(["a", "b", "c"]));
    assert_eq!(c.key(), Some(Key::Index(2)));
    assert_keys_match_positions(&list);
}

#[test]
fn insert_past_the_end_pads_with_null() {
    let list = Node::new(Value::array([1]));
    list.insert(3, 4).unwrap();
    assert_eq!(
        list.get(),
        Value::array([Value::from(1), Value::Null, Value::Null, Value::from(4)])
    );
    assert_keys_match_positions(&list);
}

#[test]
fn push_appends() {
    let list = Node::new(Value::array::<Value>([]));
    list.push("x").unwrap();
    list.push("y").unwrap();
    assert_eq!(list.get(), Value::array(["x", "y"]));
    assert_eq!(list.len(), 2);

    let empty = Node::new(Value::Null);
    empty.push(1).unwrap();
    assert_eq!(empty.get(), Value::array([1]));
}

#[test]
fn shrinking_and_growing_reuses_nodes() {
    let list = Node::new(Value::array([1, 2, 3]));
    let third = list.at(2).unwrap();
    list.set(Value::array([1]));
    assert_eq!(third.get(), Value::Absent);
    assert_eq!(list.len(), 1);

    list.set(Value::array([1, 2, 5]));
    assert_eq!(list.at(2).unwrap(), third);
    assert_eq!(third.get(), Value::from(5));
}

#[test]
fn nested_paths_follow_renumbering() {
    let list = Node::new(Value::array([
        Value::object([("name", "x")]),
        Value::object([("name", "y")]),
    ]));
    let name = list
        .lookup(&[Key::Index(1), Key::from("name")])
        .unwrap();
    list.remove(0).unwrap();
    assert_eq!(name.path(), vec![Key::Index(0), Key::from("name")]);

    // Errors follow the node's current path.
    name.add_error("taken");
    assert_eq!(list.nested_errors()[0].0, vec![Key::Index(0), Key::from("name")]);
}

#[test]
fn spliced_items_leave_their_errors_behind() {
    let list = Node::new(Value::array([1, 2, 3]));
    let first = list.at(0).unwrap();
    let second = list.at(1).unwrap();
    let heard = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&heard);
    let _sub = first.watch_sync(move |_, changes| sink.borrow_mut().push(changes));

    list.remove(0).unwrap();
    heard.borrow_mut().clear();
    second.add_error("bad");

    assert_eq!(first.get(), Value::Absent);
    assert!(first.errors().is_empty());
    assert!(first.nested_errors().is_empty());
    assert!(first.is_valid());
    assert!(heard.borrow().is_empty());
    assert_eq!(first.add_error("ignored"), ChangeSet::empty());
    assert_eq!(second.errors().len(), 1);

    // Reinserted, the item answers for its slot again.
    second.clear_errors();
    first.set(1);
    assert_eq!(list.get(), Value::array([1, 2, 3]));
    assert_eq!(first.key(), Some(Key::Index(0)));
    assert!(first.is_valid());
    first.add_error("own");
    assert_eq!(first.errors().len(), 1);
    assert!(heard.borrow().iter().any(|c| c.contains(ChangeSet::INVALID)));
}
