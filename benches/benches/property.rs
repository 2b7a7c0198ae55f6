// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `marquee_property` and property writes on an element tree.

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Once;
use std::{cell::Cell, rc::Rc, string::String};

use marquee_property::{Property, PropertyCell, PropertyMetadataBuilder, PropertyRegistry, PropertyStore};
use marquee_skin::{ElementTree, ElementTypeId, Slot};

fn bench_store(c: &mut Criterion) {
    static PRINT_SIZES: Once = Once::new();
    PRINT_SIZES.call_once(|| {
        eprintln!(
            "sizes: PropertyStore={} ErasedValue={}",
            core::mem::size_of::<PropertyStore>(),
            core::mem::size_of::<marquee_property::ErasedValue>(),
        );
    });

    let mut registry = PropertyRegistry::new();
    let width: Property<f64> =
        registry.register("Width", PropertyMetadataBuilder::new(0.0_f64).build());
    let opacity: Property<f64> = registry.register(
        "Opacity",
        PropertyMetadataBuilder::new(1.0_f64)
            .coerce(|v| v.clamp(0.0, 1.0))
            .build(),
    );
    let text: Property<String> =
        registry.register("Text", PropertyMetadataBuilder::new(String::new()).build());

    let mut group = c.benchmark_group("property/store");

    group.bench_function("get_effective/local", |b| {
        let mut store = PropertyStore::new();
        store.set(width, 100.0);
        b.iter(|| black_box(store.get_effective(width, &registry)));
    });

    group.bench_function("get_effective/default", |b| {
        let store = PropertyStore::new();
        b.iter(|| black_box(store.get_effective(width, &registry)));
    });

    group.bench_function("get_ref/string", |b| {
        let mut store = PropertyStore::new();
        store.set(text, String::from("hello world hello world hello world"));
        b.iter(|| black_box(store.get(text).map(String::len)));
    });

    group.bench_function("set/coerced", |b| {
        let metadata = registry.get_metadata(opacity);
        b.iter_batched(
            PropertyStore::new,
            |mut store| {
                let value = metadata.map_or(2.0, |m| m.coerce(2.0));
                store.set(opacity, value);
                black_box(store);
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_tree_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("property/tree");

    let mut tree = ElementTree::new();
    let width = tree.register_property("Width", PropertyMetadataBuilder::new(0.0_f64).build());
    let quiet = tree.create(ElementTypeId::ELEMENT).unwrap();
    let observed = tree.create(ElementTypeId::ELEMENT).unwrap();
    let hits = Rc::new(Cell::new(0_u64));
    for _ in 0..4 {
        let hits = hits.clone();
        tree.attach_handler(None, observed, Slot::Property(width.id()), move |_, _| {
            hits.set(hits.get() + 1);
        })
        .unwrap();
    }

    let mut next = 0.0_f64;
    group.bench_function("set/no_observers", |b| {
        b.iter(|| {
            next += 1.0;
            black_box(tree.set(quiet, width, next).unwrap())
        });
    });

    group.bench_function("set/four_observers", |b| {
        b.iter(|| {
            next += 1.0;
            black_box(tree.set(observed, width, next).unwrap())
        });
    });

    group.bench_function("set/equal_value", |b| {
        tree.set(observed, width, 1.0).unwrap();
        b.iter(|| black_box(tree.set(observed, width, 1.0).unwrap()));
    });

    group.finish();
    black_box(hits.get());
}

fn bench_cell(c: &mut Criterion) {
    let mut group = c.benchmark_group("property/cell");

    let cell = PropertyCell::new(0_u64);
    let sink = Rc::new(Cell::new(0_u64));
    let s = sink.clone();
    cell.attach_fn(move |_, v| s.set(*v));
    let mut next = 0_u64;
    group.bench_function("set/one_observer", |b| {
        b.iter(|| {
            next += 1;
            black_box(cell.set(next))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_store, bench_tree_writes, bench_cell);
criterion_main!(benches);
