// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end tests for `marquee_skin`.
//!
//! These build small trees the way a markup loader would and check how
//! property writes, resource lookup, bindings and cloning interact.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use marquee_skin::{
    AssignmentMode, CloneOptions, CopyPolicy, DynamicResource, ElementState, ElementTree,
    ElementTypeId, EngineConfig, Error, ErrorKind, MissingResourceDiagnostics, NodeId,
    Notification, Property, PropertyMetadataBuilder, Resolution, Resource, ResourceSource,
    SkinResources, Slot, TreeSearchMode,
};

fn element(tree: &mut ElementTree) -> NodeId {
    tree.create(ElementTypeId::ELEMENT).unwrap()
}

/// Root, middle and leaf, linked by `add_child`.
fn chain(tree: &mut ElementTree) -> [NodeId; 3] {
    let root = element(tree);
    let middle = element(tree);
    let leaf = element(tree);
    tree.add_child(root, middle).unwrap();
    tree.add_child(middle, leaf).unwrap();
    [root, middle, leaf]
}

fn register_color(tree: &mut ElementTree) -> Property<u32> {
    tree.register_property("Color", PropertyMetadataBuilder::new(0_u32).build())
}

fn bind(tree: &mut ElementTree, node: NodeId, property: Property<u32>, key: &str) {
    let id = tree
        .create_binding(node, property.id(), DynamicResource::new(key))
        .unwrap();
    tree.activate_binding(id).unwrap();
}

#[test]
fn equal_value_write_does_not_notify() {
    let mut tree = ElementTree::new();
    let width = tree.register_property("Width", PropertyMetadataBuilder::new(0.0_f64).build());
    let node = element(&mut tree);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    tree.attach_handler(None, node, Slot::Property(width.id()), move |_, n| {
        if let Notification::PropertyChanged { old, .. } = n {
            log.borrow_mut().push(*old.downcast_ref::<f64>().unwrap());
        }
    })
    .unwrap();

    assert!(tree.set(node, width, 100.0).unwrap());
    assert!(!tree.set(node, width, 100.0).unwrap());
    assert!(tree.set(node, width, 50.0).unwrap());
    assert_eq!(*seen.borrow(), [0.0, 100.0]);

    // Writing the default explicitly is also a no-op.
    let other = element(&mut tree);
    assert!(!tree.set(other, width, 0.0).unwrap());
}

#[test]
fn detach_twice_is_harmless() {
    let mut tree = ElementTree::new();
    let width = tree.register_property("Width", PropertyMetadataBuilder::new(0_i32).build());
    let node = element(&mut tree);
    let calls = Rc::new(Cell::new(0));
    let c = calls.clone();
    let slot = Slot::Property(width.id());
    let id = tree
        .attach_handler(None, node, slot, move |_, _| c.set(c.get() + 1))
        .unwrap();

    assert!(tree.detach(node, slot, id));
    assert!(!tree.detach(node, slot, id));
    tree.set(node, width, 1).unwrap();
    assert_eq!(calls.get(), 0);
    assert_eq!(tree.observer_count(node, slot), 0);
}

#[test]
fn observer_may_detach_itself_during_dispatch() {
    let mut tree = ElementTree::new();
    let width = tree.register_property("Width", PropertyMetadataBuilder::new(0_i32).build());
    let node = element(&mut tree);
    let slot = Slot::Property(width.id());
    let own_id = Rc::new(Cell::new(None));
    let calls = Rc::new(Cell::new(0));
    let (id_ref, c) = (own_id.clone(), calls.clone());
    let id = tree
        .attach_handler(None, node, slot, move |tree, n| {
            c.set(c.get() + 1);
            if let (Some(id), Notification::PropertyChanged { node, .. }) = (id_ref.get(), n) {
                tree.detach(*node, slot, id);
            }
        })
        .unwrap();
    own_id.set(Some(id));

    tree.set(node, width, 1).unwrap();
    tree.set(node, width, 2).unwrap();
    assert_eq!(calls.get(), 1);
}

#[test]
fn clones_do_not_share_state() {
    let mut tree = ElementTree::new();
    let width = tree.register_property("Width", PropertyMetadataBuilder::new(0_i32).build());
    let [root, middle, leaf] = chain(&mut tree);
    tree.set(leaf, width, 10).unwrap();

    let copy = tree.clone_node(middle, CloneOptions::default()).unwrap().root;
    let copied_leaf = tree.owned(copy)[0];
    tree.set(leaf, width, 20).unwrap();
    assert_eq!(tree.get(copied_leaf, width).unwrap(), 10);
    tree.set(copied_leaf, width, 30).unwrap();
    assert_eq!(tree.get(leaf, width).unwrap(), 20);

    // The copy keeps the source's logical parent but is not owned by it.
    assert_eq!(tree.logical_parent(copy), Some(root));
    assert_eq!(tree.owned(root), &[middle]);
    tree.dispose(middle);
    assert!(tree.contains(copy));
    assert!(tree.contains(copied_leaf));
}

#[test]
fn cut_logical_parent_clears_only_the_root_link() {
    let mut tree = ElementTree::new();
    let [_, middle, leaf] = chain(&mut tree);
    let copy = tree
        .clone_node(middle, CloneOptions { cut_logical_parent: true })
        .unwrap()
        .root;
    let copied_leaf = tree.owned(copy)[0];
    assert_eq!(tree.logical_parent(copy), None);
    assert_eq!(tree.logical_parent(copied_leaf), Some(copy));
    assert_ne!(copied_leaf, leaf);
}

#[test]
fn cloning_a_disposed_node_is_invalid_state() {
    let mut tree = ElementTree::new();
    let node = element(&mut tree);
    tree.dispose(node);
    let err = tree.clone_node(node, CloneOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn nearest_definition_wins() {
    let mut tree = ElementTree::new();
    let [root, middle, leaf] = chain(&mut tree);
    tree.insert_resource(root, "K", Resource::value(1_u32)).unwrap();
    tree.insert_resource(middle, "K", Resource::value(2_u32)).unwrap();

    let found = tree.resolve(leaf, "K", TreeSearchMode::LogicalTree);
    assert_eq!(found.resource(), Some(&Resource::value(2_u32)));
    assert!(matches!(
        found,
        Resolution::Found {
            source: ResourceSource::Node(n),
            ..
        } if n == middle
    ));
}

#[test]
fn hybrid_walk_falls_back_to_visual_parent() {
    let mut tree = ElementTree::new();
    let host = element(&mut tree);
    let content = element(&mut tree);
    tree.insert_resource(host, "K", Resource::value(7_u32)).unwrap();
    tree.set_visual_parent(content, Some(host)).unwrap();

    assert!(!tree.resolve(content, "K", TreeSearchMode::LogicalTree).is_found());
    assert!(tree.resolve(content, "K", TreeSearchMode::VisualTree).is_found());
    assert_eq!(
        tree.resolve(content, "K", TreeSearchMode::Hybrid).resource(),
        Some(&Resource::value(7_u32))
    );
}

#[test]
fn nearer_dictionary_change_rebinds() {
    let mut tree = ElementTree::new();
    let color = register_color(&mut tree);
    let [root, middle, leaf] = chain(&mut tree);
    tree.insert_resource(root, "Accent", Resource::value(1_u32)).unwrap();
    bind(&mut tree, leaf, color, "Accent");
    assert_eq!(tree.get(leaf, color).unwrap(), 1);

    tree.insert_resource(middle, "Accent", Resource::value(2_u32)).unwrap();
    assert_eq!(tree.get(leaf, color).unwrap(), 2);

    tree.remove_resource(middle, "Accent").unwrap();
    assert_eq!(tree.get(leaf, color).unwrap(), 1);
}

#[test]
fn reparenting_rebinds() {
    let mut tree = ElementTree::new();
    let color = register_color(&mut tree);
    let first = element(&mut tree);
    let second = element(&mut tree);
    let leaf = element(&mut tree);
    tree.insert_resource(first, "Accent", Resource::value(1_u32)).unwrap();
    tree.insert_resource(second, "Accent", Resource::value(2_u32)).unwrap();
    tree.set_logical_parent(leaf, Some(first)).unwrap();
    bind(&mut tree, leaf, color, "Accent");
    assert_eq!(tree.get(leaf, color).unwrap(), 1);

    tree.set_logical_parent(leaf, Some(second)).unwrap();
    assert_eq!(tree.get(leaf, color).unwrap(), 2);
    // The old parent is no longer watched.
    tree.insert_resource(first, "Accent", Resource::value(3_u32)).unwrap();
    assert_eq!(tree.get(leaf, color).unwrap(), 2);
}

#[test]
fn repeated_updates_do_not_accumulate_watches() {
    let mut tree = ElementTree::new();
    let color = register_color(&mut tree);
    let [root, middle, leaf] = chain(&mut tree);
    tree.insert_resource(root, "Accent", Resource::value(0_u32)).unwrap();
    bind(&mut tree, leaf, color, "Accent");

    let count = |tree: &ElementTree| {
        [root, middle, leaf]
            .iter()
            .map(|&n| tree.observer_count(n, Slot::Resources))
            .sum::<usize>()
    };
    let before = count(&tree);
    assert_eq!(before, 3);
    for i in 1..=100_u32 {
        tree.insert_resource(root, "Accent", Resource::value(i)).unwrap();
    }
    assert_eq!(tree.get(leaf, color).unwrap(), 100);
    assert_eq!(count(&tree), before);
    let lp = tree.logical_parent_property().id();
    assert_eq!(tree.observer_count(leaf, Slot::Property(lp)), 1);
}

#[test]
fn moving_definition_keeps_watches_to_searched_path() {
    let mut tree = ElementTree::new();
    let color = register_color(&mut tree);
    let mut nodes = vec![element(&mut tree)];
    for _ in 1..11 {
        let node = element(&mut tree);
        tree.add_child(nodes[nodes.len() - 1], node).unwrap();
        nodes.push(node);
    }
    let leaf = nodes[10];
    let binding = tree
        .create_binding(leaf, color.id(), DynamicResource::new("Accent"))
        .unwrap();
    tree.activate_binding(binding).unwrap();

    let mut holder = None;
    for (i, depth) in (0..100_u32).zip((0..11_usize).cycle()) {
        if let Some(previous) = holder.take() {
            tree.remove_resource(previous, "Accent").unwrap();
        }
        tree.insert_resource(nodes[depth], "Accent", Resource::value(i))
            .unwrap();
        holder = Some(nodes[depth]);

        assert_eq!(tree.get(leaf, color).unwrap(), i);
        let watches = tree.binding(binding).unwrap().watches();
        assert_eq!(watches.dictionary_count(), 11 - depth);
        assert_eq!(watches.link_count(), 10 - depth);
        assert!(!watches.watches_skin());
        let watched = nodes
            .iter()
            .map(|&n| tree.observer_count(n, Slot::Resources))
            .sum::<usize>();
        assert_eq!(watched, 11 - depth);
    }
}

#[test]
fn hybrid_binding_survives_mixed_parent_cycle() {
    let mut tree = ElementTree::new();
    let color = register_color(&mut tree);
    let a = element(&mut tree);
    let b = element(&mut tree);
    tree.set_visual_parent(a, Some(b)).unwrap();
    tree.set_logical_parent(b, Some(a)).unwrap();
    let mut skin = SkinResources::new("Default");
    skin.insert("Accent", Resource::value(4_u32));
    tree.load_skin(skin);

    let binding = tree
        .create_binding(
            a,
            color.id(),
            DynamicResource::new("Accent").with_search_mode(TreeSearchMode::Hybrid),
        )
        .unwrap();
    tree.activate_binding(binding).unwrap();
    assert_eq!(tree.get(a, color).unwrap(), 4);

    tree.insert_resource(b, "Accent", Resource::value(5_u32)).unwrap();
    assert_eq!(tree.get(a, color).unwrap(), 5);
}

#[test]
fn skin_reload_rebinds() {
    let mut tree = ElementTree::new();
    let color = register_color(&mut tree);
    let leaf = element(&mut tree);
    let mut dark = SkinResources::new("Dark");
    dark.insert("Accent", Resource::value(1_u32));
    tree.load_skin(dark);
    bind(&mut tree, leaf, color, "Accent");
    assert_eq!(tree.get(leaf, color).unwrap(), 1);

    let mut base = SkinResources::new("Base");
    base.insert("Accent", Resource::value(2_u32));
    tree.load_skin(SkinResources::new("Light").with_parent(base));
    assert_eq!(tree.get(leaf, color).unwrap(), 2);

    // A local definition shadows the skin.
    tree.insert_resource(leaf, "Accent", Resource::value(3_u32)).unwrap();
    assert_eq!(tree.get(leaf, color).unwrap(), 3);
}

#[test]
fn copy_assignment_gives_each_target_its_own_node() {
    let mut tree = ElementTree::new();
    let width = tree.register_property("Width", PropertyMetadataBuilder::new(0_i32).build());
    let fill = tree.register_property(
        "Fill",
        PropertyMetadataBuilder::new(None::<NodeId>)
            .copy_policy(CopyPolicy::Deep)
            .build(),
    );
    let root = element(&mut tree);
    let a = element(&mut tree);
    let b = element(&mut tree);
    tree.add_child(root, a).unwrap();
    tree.add_child(root, b).unwrap();
    let brush = tree.create(ElementTypeId::OBJECT).unwrap();
    tree.set(brush, width, 1).unwrap();
    tree.insert_resource(root, "Brush", Resource::Node(brush)).unwrap();

    let mut fills = Vec::new();
    for target in [a, b] {
        let id = tree
            .create_binding(
                target,
                fill.id(),
                DynamicResource::new("Brush").with_assignment(AssignmentMode::Copy),
            )
            .unwrap();
        tree.activate_binding(id).unwrap();
        let copy = tree.get(target, fill).unwrap().unwrap();
        assert_ne!(copy, brush);
        assert_eq!(tree.owner(copy), Some(target));
        assert_eq!(tree.logical_parent(copy), Some(target));
        fills.push(copy);
    }
    assert_ne!(fills[0], fills[1]);
    tree.set(fills[0], width, 5).unwrap();
    assert_eq!(tree.get(fills[1], width).unwrap(), 1);
    assert_eq!(tree.get(brush, width).unwrap(), 1);

    // A new resource replaces and disposes the previous copy.
    let other = tree.create(ElementTypeId::OBJECT).unwrap();
    tree.insert_resource(root, "Brush", Resource::Node(other)).unwrap();
    assert!(!tree.contains(fills[0]));
    assert!(tree.contains(brush));
    assert_eq!(tree.owner(brush), None);
    let replaced = tree.get(a, fill).unwrap().unwrap();
    assert!(tree.contains(replaced));
    assert_ne!(replaced, other);
}

#[test]
fn reference_assignment_shares_the_node() {
    let mut tree = ElementTree::new();
    let fill = tree.register_property("Fill", PropertyMetadataBuilder::new(None::<NodeId>).build());
    let root = element(&mut tree);
    let leaf = element(&mut tree);
    tree.add_child(root, leaf).unwrap();
    let brush = tree.create(ElementTypeId::OBJECT).unwrap();
    tree.insert_resource(root, "Brush", Resource::Node(brush)).unwrap();

    let id = tree
        .create_binding(leaf, fill.id(), DynamicResource::new("Brush"))
        .unwrap();
    tree.activate_binding(id).unwrap();
    assert_eq!(tree.get(leaf, fill).unwrap(), Some(brush));
}

#[test]
fn missing_key_is_not_an_error() {
    let mut tree = ElementTree::with_config(
        EngineConfig::new().with_missing_resources(MissingResourceDiagnostics::Warn),
    );
    let color = register_color(&mut tree);
    let leaf = element(&mut tree);
    tree.set(leaf, color, 9).unwrap();
    let id = tree
        .create_binding(leaf, color.id(), DynamicResource::new("Nowhere"))
        .unwrap();
    assert!(!tree.activate_binding(id).unwrap());
    assert_eq!(tree.get(leaf, color).unwrap(), 9);

    // Defining it later is picked up.
    tree.insert_resource(leaf, "Nowhere", Resource::value(4_u32)).unwrap();
    assert_eq!(tree.get(leaf, color).unwrap(), 4);
}

#[test]
fn disposing_releases_bindings_and_handles_go_stale() {
    let mut tree = ElementTree::new();
    let color = register_color(&mut tree);
    let [root, middle, leaf] = chain(&mut tree);
    tree.insert_resource(root, "Accent", Resource::value(1_u32)).unwrap();
    bind(&mut tree, leaf, color, "Accent");

    tree.dispose(middle);
    assert_eq!(tree.observer_count(root, Slot::Resources), 0);
    assert_eq!(tree.element_state(leaf), ElementState::Disposed);
    assert_eq!(tree.set(leaf, color, 3), Err(Error::DisposedNode(leaf)));
    // A fresh node never reuses the stale handle.
    let fresh = element(&mut tree);
    assert_ne!(fresh, leaf);
    assert_ne!(fresh, middle);
}

#[test]
fn item_containers_host_template_instances() {
    let mut tree = ElementTree::new();
    let color = register_color(&mut tree);
    let library = element(&mut tree);
    let template = element(&mut tree);
    let label = element(&mut tree);
    tree.add_child(library, template).unwrap();
    tree.add_child(template, label).unwrap();
    let id = tree
        .create_binding(
            label,
            color.id(),
            DynamicResource::new("Accent").with_search_mode(TreeSearchMode::Hybrid),
        )
        .unwrap();
    tree.activate_binding(id).unwrap();

    let list = element(&mut tree);
    tree.insert_resource(list, "Accent", Resource::value(8_u32)).unwrap();
    tree.set_element_state(list, ElementState::Running).unwrap();
    let containers: Vec<_> = (0..3)
        .map(|_| {
            tree.prepare_item_container(list, ElementTypeId::ELEMENT, Some(template))
                .unwrap()
        })
        .collect();

    assert_eq!(tree.owned(list), containers.as_slice());
    for &container in &containers {
        let control = tree.template_control(container).unwrap();
        assert_eq!(tree.logical_parent(control), None);
        assert_eq!(tree.visual_parent(control), Some(container));
        let copied_label = tree.owned(control)[0];
        assert_eq!(tree.element_state(copied_label), ElementState::Running);
        assert_eq!(tree.get(copied_label, color).unwrap(), 8);
    }
    assert_eq!(tree.get(label, color).unwrap(), 0);
}

#[test]
fn mode_names_round_trip_and_reject_unknown() {
    assert_eq!(
        "Hybrid".parse::<TreeSearchMode>(),
        Ok(TreeSearchMode::Hybrid)
    );
    let err = "Sideways".parse::<TreeSearchMode>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotImplemented);
    let err = "Move".parse::<AssignmentMode>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotImplemented);
}
