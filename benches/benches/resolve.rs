// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for resource lookup, binding updates and subtree cloning.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use marquee_skin::{
    CloneOptions, DynamicResource, ElementTree, ElementTypeId, NodeId, PropertyMetadataBuilder,
    Resource, SkinResources, TreeSearchMode,
};

/// A logical chain `0 <- 1 <- ... <- depth - 1`, returned root first.
fn build_chain(tree: &mut ElementTree, depth: usize) -> Vec<NodeId> {
    let mut nodes = Vec::with_capacity(depth);
    for i in 0..depth {
        let node = tree.create(ElementTypeId::ELEMENT).unwrap();
        if i > 0 {
            tree.add_child(nodes[i - 1], node).unwrap();
        }
        nodes.push(node);
    }
    nodes
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve/walk");

    for depth in [4_usize, 16, 64] {
        let mut tree = ElementTree::new();
        let chain = build_chain(&mut tree, depth);
        tree.insert_resource(chain[0], "Accent", Resource::value(1_u32))
            .unwrap();
        let leaf = chain[depth - 1];

        group.bench_with_input(BenchmarkId::new("root_hit", depth), &leaf, |b, &leaf| {
            b.iter(|| black_box(tree.resolve(leaf, "Accent", TreeSearchMode::LogicalTree)));
        });
        group.bench_with_input(BenchmarkId::new("miss", depth), &leaf, |b, &leaf| {
            b.iter(|| black_box(tree.resolve(leaf, "Missing", TreeSearchMode::Hybrid)));
        });
    }

    let mut tree = ElementTree::new();
    let chain = build_chain(&mut tree, 16);
    let mut skin = SkinResources::new("Default");
    skin.insert("Accent", Resource::value(1_u32));
    tree.load_skin(skin);
    let leaf = chain[15];
    group.bench_function("skin_hit/16", |b| {
        b.iter(|| black_box(tree.resolve(leaf, "Accent", TreeSearchMode::LogicalTree)));
    });

    group.finish();
}

fn bench_binding(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve/binding");

    let mut tree = ElementTree::new();
    let color = tree.register_property("Color", PropertyMetadataBuilder::new(0_u32).build());
    let chain = build_chain(&mut tree, 16);
    tree.insert_resource(chain[0], "Accent", Resource::value(0_u32))
        .unwrap();
    let leaf = chain[15];
    let binding = tree
        .create_binding(leaf, color.id(), DynamicResource::new("Accent"))
        .unwrap();
    tree.activate_binding(binding).unwrap();

    let mut next = 0_u32;
    group.bench_function("dictionary_change/16", |b| {
        b.iter(|| {
            next = next.wrapping_add(1);
            tree.insert_resource(chain[0], "Accent", Resource::value(next))
                .unwrap();
            black_box(tree.get(leaf, color).unwrap())
        });
    });

    group.finish();
}

fn bench_clone(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve/clone");

    for width in [4_usize, 32] {
        let mut tree = ElementTree::new();
        let label = tree.register_property("Label", PropertyMetadataBuilder::new(0_u32).build());
        let template = tree.create(ElementTypeId::ELEMENT).unwrap();
        for value in (0_u32..).take(width) {
            let child = tree.create(ElementTypeId::ELEMENT).unwrap();
            tree.add_child(template, child).unwrap();
            tree.set(child, label, value).unwrap();
        }

        group.bench_with_input(BenchmarkId::new("flat", width), &template, |b, &template| {
            b.iter(|| {
                let copy = tree
                    .clone_node(template, CloneOptions { cut_logical_parent: true })
                    .unwrap();
                tree.dispose(black_box(copy.root));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_binding, bench_clone);
criterion_main!(benches);
