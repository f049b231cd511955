// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_validation`: path queries over many errors.

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use understory_validation::ValidationTree;

/// Tiny LCG for deterministic paths.
struct Lcg(u64);

impl Lcg {
    fn next_u32(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }
}

fn populate(count: usize, depth: usize) -> ValidationTree<u32, String> {
    let mut rng = Lcg(0x5eed);
    let mut tree = ValidationTree::new();
    for i in 0..count {
        let path: Vec<u32> = (0..depth).map(|_| rng.next_u32() % 8).collect();
        tree.add(&path, format!("e{i}"));
    }
    tree
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_validation/query");
    group.sample_size(50);
    for count in [100_usize, 10_000] {
        let tree = populate(count, 4);
        group.bench_function(format!("nested/errors={count}"), |b| {
            b.iter(|| black_box(tree.nested(black_box(&[1_u32, 2][..])).len()));
        });
        group.bench_function(format!("is_valid/errors={count}"), |b| {
            b.iter(|| black_box(tree.is_valid(black_box(&[3_u32][..]))));
        });
    }
    group.finish();
}

fn bench_clear(c: &mut Criterion) {
    let mut group = c.benchmark_group("understory_validation/clear");
    group.sample_size(30);
    for count in [100_usize, 10_000] {
        group.bench_function(format!("subtree/errors={count}"), |b| {
            b.iter_batched(
                || populate(count, 4),
                |mut tree| black_box(tree.clear(&[0]).len()),
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_queries, bench_clear);
criterion_main!(benches);
