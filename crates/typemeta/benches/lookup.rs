// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor Lookup Benchmark
//!
//! Measures the registry hot path:
//! - cached lookups of plain type names
//! - uncached specializations of container types
//! - cold builds of a small bean graph

#![allow(clippy::uninlined_format_args)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use typemeta::{
    ConstructorFacts, FactsTable, Marker, MethodFacts, ParamShape, TypeExpr, TypeFacts,
    TypeRegistry,
};

fn facts() -> FactsTable {
    let mut table = FactsTable::with_core_types()
        .with(TypeFacts::new("List").marker(Marker::ElementContainer).interface())
        .with(TypeFacts::new("Map").marker(Marker::PairContainer).interface());
    for i in 0..16 {
        let name = format!("Bean{i}");
        let next = format!("Bean{}", (i + 1) % 16);
        table.insert(
            TypeFacts::new(name.as_str())
                .constructor(ConstructorFacts::new(Vec::new()))
                .method(MethodFacts::new("getId", Vec::new()).returns("long"))
                .method(MethodFacts::new("getNext", Vec::new()).returns(next.as_str()))
                .method(MethodFacts::new(
                    "setNext",
                    vec![ParamShape::Type(TypeExpr::named(next.as_str()))],
                )),
        );
    }
    table
}

fn bench_cached_get(c: &mut Criterion) {
    let registry = TypeRegistry::new(facts());
    registry.get("Bean0").expect("warm up");

    c.bench_function("registry_cached_get", |b| {
        b.iter(|| black_box(registry.get(black_box("Bean7")).expect("cached")));
    });
}

fn bench_specialization(c: &mut Criterion) {
    let registry = TypeRegistry::new(facts());
    let expr: TypeExpr = "Map<String,List<Bean3>>".parse().expect("expr");
    registry.resolve(&expr).expect("warm up");

    c.bench_function("registry_specialize_map", |b| {
        b.iter(|| black_box(registry.resolve(black_box(&expr)).expect("specialized")));
    });
}

fn bench_cold_build(c: &mut Criterion) {
    let table = facts();
    c.bench_function("registry_cold_bean_ring", |b| {
        b.iter_batched(
            || TypeRegistry::new(table.clone()),
            |registry| black_box(registry.get("Bean0").expect("ring")),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_cached_get,
    bench_specialization,
    bench_cold_build
);
criterion_main!(benches);
