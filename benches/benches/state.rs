// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_state`: building, writing and splicing node trees.

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use understory_state::{Key, Node, Value};

/// An object `depth` levels deep with `width` members at every level.
fn nested(width: usize, depth: usize) -> Value {
    let mut value = Value::from(0);
    for _ in 0..depth {
        value = Value::Object(
            (0..width)
                .map(|i| (key_name(i), value.clone()))
                .collect(),
        );
    }
    value
}

fn key_name(i: usize) -> String {
    format!("k{i}")
}

fn leaf_path(depth: usize) -> Vec<Key> {
    vec![Key::from("k0"); depth]
}

fn bench_set_leaf(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_state/set_leaf");
    group.sample_size(50);
    for depth in [2_usize, 6] {
        let root = Node::new(nested(4, depth));
        let leaf = root.lookup(&leaf_path(depth)).unwrap();
        let _sub = root.watch_sync(|_, changes| {
            black_box(changes);
        });
        let mut n = 0_i32;
        group.bench_function(format!("depth={depth}"), |b| {
            b.iter(|| {
                n += 1;
                black_box(leaf.set(n));
            });
        });
    }
    group.finish();
}

fn bench_set_whole(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_state/set_whole");
    group.sample_size(30);
    for (width, depth) in [(4_usize, 3_usize), (8, 3)] {
        let a = nested(width, depth);
        let mut b_value = a.clone();
        if let Value::Object(members) = &mut b_value {
            members.insert("extra".into(), Value::from(true));
        }
        group.bench_function(format!("w={width}/d={depth}"), |b| {
            b.iter_batched(
                || {
                    let root = Node::new(a.clone());
                    // Materialize the whole tree so the write touches live nodes.
                    let mut stack = vec![root.clone()];
                    while let Some(node) = stack.pop() {
                        stack.extend(node.children());
                    }
                    root
                },
                |root| {
                    black_box(root.set(b_value.clone()));
                    root
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_array_splice(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_state/array_splice");
    group.sample_size(50);
    for len in [64_usize, 1024] {
        let items = Value::array((0..len).map(|i| Value::from(i)));
        group.bench_function(format!("remove_front/len={len}"), |b| {
            b.iter_batched(
                || {
                    let list = Node::new(items.clone());
                    let _ = list.children();
                    list
                },
                |list| {
                    black_box(list.remove(0).unwrap());
                    list
                },
                BatchSize::LargeInput,
            );
        });
        group.bench_function(format!("insert_front/len={len}"), |b| {
            b.iter_batched(
                || {
                    let list = Node::new(items.clone());
                    let _ = list.children();
                    list
                },
                |list| {
                    black_box(list.insert(0, -1).unwrap());
                    list
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_state/validate");
    group.sample_size(50);
    for width in [8_usize, 64] {
        let form = Node::new(Value::Object(
            (0..width).map(|i| (key_name(i), Value::from(""))).collect(),
        ));
        let fields: Vec<_> = (0..width).map(key_name).collect();
        group.bench_function(format!("fields={width}"), |b| {
            b.iter(|| {
                black_box(form.validate(|scope| {
                    for field in &fields {
                        let node = scope.at(field.as_str()).unwrap();
                        if node.with(|v| v.as_str().is_some_and(str::is_empty)) {
                            node.add_error("required");
                        }
                    }
                }))
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_set_leaf,
    bench_set_whole,
    bench_array_splice,
    bench_validate
);
criterion_main!(benches);
