// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The clone engine.
//!
//! Cloning copies a node together with everything reachable over deep edges:
//! the nodes it owns and the node references held by properties whose copy
//! policy is [`CopyPolicy::Deep`]. References between copied nodes are
//! remapped onto the copies; references leaving the copied set are kept as
//! they are. Parent links are always shallow.
//!
//! The copy is built in phases. The source graph is walked and validated
//! before anything is allocated, so a failed clone leaves the tree
//! untouched. Bindings are copied inactive and handed back, so that the
//! caller can place the copy before it starts resolving resources.

use alloc::vec;
use alloc::vec::Vec;
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use marquee_property::{CopyPolicy, ErasedValue, PropertyStore};

use crate::error::{Error, Result};
use crate::id::{BindingId, NodeId, TriggerId};
use crate::node::NodeData;
use crate::notify::{Observer, Slot};
use crate::trigger::EventTrigger;
use crate::tree::ElementTree;

/// Options for [`ElementTree::clone_node`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CloneOptions {
    /// Leave the copy without a logical parent.
    pub cut_logical_parent: bool,
}

/// The result of [`ElementTree::clone_node`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cloned {
    /// The copy of the source node.
    pub root: NodeId,
    /// Copied bindings waiting for [`ElementTree::activate_bindings`].
    pub deferred_bindings: Vec<BindingId>,
}

struct PlanEntry {
    source: NodeId,
    /// The node whose deep property reached this one, if it is not owned
    /// inside the copied set.
    via: Option<NodeId>,
}

impl ElementTree {
    /// Deep-copies `source`.
    ///
    /// The copy has no owner. Its nodes start in
    /// [`ElementState::Constructing`](crate::ElementState::Constructing), and
    /// the init hook of each node's type runs once the whole copy is built.
    ///
    /// Fails with [`Error::DisposedNode`] if `source`, or a node reachable
    /// from it over deep edges, is disposed.
    pub fn clone_node(&mut self, source: NodeId, options: CloneOptions) -> Result<Cloned> {
        let plan = self.plan_clone(source)?;

        // Allocate.
        let mut map: HashMap<NodeId, NodeId> = HashMap::with_capacity(plan.len());
        for entry in &plan {
            let Some((ty, flags)) = self
                .nodes
                .get(entry.source)
                .map(|d| (d.element_type, d.flags))
            else {
                continue;
            };
            let copy = self.nodes.insert(NodeData::new(ty, flags));
            map.insert(entry.source, copy);
        }
        let remap =
            |map: &HashMap<NodeId, NodeId>, id: NodeId| map.get(&id).copied().unwrap_or(id);

        // Bindings, so that stored binding handles can be remapped.
        let mut binding_map: HashMap<BindingId, BindingId> = HashMap::new();
        let mut deferred = Vec::new();
        for entry in &plan {
            let copy = map[&entry.source];
            let ids: SmallVec<[BindingId; 2]> = self
                .nodes
                .get(entry.source)
                .map(|d| d.bindings.clone())
                .unwrap_or_default();
            for id in ids {
                let Some(binding) = self.bindings.get(id) else {
                    continue;
                };
                let last_copy = binding.last_copy().map(|n| remap(&map, n));
                let copied = binding.copy_to(copy, last_copy);
                let needs_activation = copied.needs_activation();
                let new_id = self.bindings.insert(copied);
                binding_map.insert(id, new_id);
                if needs_activation {
                    deferred.push(new_id);
                }
            }
        }

        // Contents.
        let lp = self.logical_parent_prop.id();
        let mut trigger_copies: Vec<(NodeId, TriggerId)> = Vec::new();
        for entry in &plan {
            let copy = map[&entry.source];
            let Some(data) = self.nodes.get(entry.source) else {
                continue;
            };
            let is_root = entry.source == source;

            let mut store = PropertyStore::new();
            for (property, value) in data.store.iter() {
                if is_root && options.cut_logical_parent && property == lp {
                    continue;
                }
                let value = if let Some(target) = value.downcast_ref::<Option<NodeId>>() {
                    ErasedValue::new(target.map(|n| remap(&map, n)))
                } else if let Some(binding) = value.downcast_ref::<Option<BindingId>>() {
                    ErasedValue::new(binding.map(|b| binding_map.get(&b).copied().unwrap_or(b)))
                } else {
                    value.clone_value()
                };
                store.set_erased(property, value);
            }

            let mut resources = data.resources.clone();
            if let Some(dict) = &mut resources {
                dict.remap_nodes(|n| remap(&map, n));
            }
            let mut names = data.names.clone();
            if let Some(names) = &mut names {
                for node in names.values_mut() {
                    *node = remap(&map, *node);
                }
            }
            let mut owned: SmallVec<[NodeId; 4]> = data
                .owned
                .iter()
                .filter_map(|n| map.get(n).copied())
                .collect();
            for adopted in plan.iter().filter(|e| e.via == Some(entry.source)) {
                owned.push(map[&adopted.source]);
            }
            let owner = if is_root {
                None
            } else {
                match data.owner.and_then(|o| map.get(&o).copied()) {
                    Some(owner) => Some(owner),
                    None => entry.via.map(|v| map[&v]),
                }
            };
            let template_control = data.template_control.map(|n| remap(&map, n));
            let bindings = data
                .bindings
                .iter()
                .filter_map(|b| binding_map.get(b).copied())
                .collect();

            let mut triggers = SmallVec::new();
            for &trigger_id in &data.triggers {
                let Some(trigger) = self.triggers.get(trigger_id) else {
                    continue;
                };
                let attached = trigger.attached_to().map(|n| remap(&map, n));
                let copied = EventTrigger {
                    event: trigger.event.clone(),
                    actions: trigger.actions.clone(),
                    attached: None,
                    owner: copy,
                };
                let new_id = self.triggers.insert(copied);
                triggers.push(new_id);
                if let Some(node) = attached {
                    trigger_copies.push((node, new_id));
                }
            }

            if let Some(target) = self.nodes.get_mut(copy) {
                target.store = store;
                target.resources = resources;
                target.names = names;
                target.owned = owned;
                target.owner = owner;
                target.template_control = template_control;
                target.bindings = bindings;
                target.triggers = triggers;
            }
        }

        for (node, trigger) in trigger_copies {
            if let Ok(observer) = self.attach(node, Slot::Events, Observer::Trigger(trigger)) {
                if let Some(t) = self.triggers.get_mut(trigger) {
                    t.attached = Some((node, observer));
                }
            }
        }

        // Re-attach change handlers.
        for entry in &plan {
            let copy = map[&entry.source];
            let hook = self.element_type(copy).and_then(|ty| ty.init_hook());
            if let Some(hook) = hook {
                hook(self, copy);
            }
        }

        let root = map[&source];
        tracing::trace!(?source, copy = ?root, nodes = plan.len(), "cloned");
        Ok(Cloned {
            root,
            deferred_bindings: deferred,
        })
    }

    /// Clones `source` and activates the copied bindings.
    pub fn deep_copy(&mut self, source: NodeId, cut_logical_parent: bool) -> Result<NodeId> {
        let cloned = self.clone_node(source, CloneOptions { cut_logical_parent })?;
        self.activate_bindings(&cloned.deferred_bindings);
        Ok(cloned.root)
    }

    /// Walks deep edges from `source` in depth-first order.
    fn plan_clone(&self, source: NodeId) -> Result<Vec<PlanEntry>> {
        if !self.contains(source) {
            return Err(Error::DisposedNode(source));
        }
        let lp = self.logical_parent_prop.id();
        let vp = self.visual_parent_prop.id();
        let mut plan: Vec<PlanEntry> = Vec::new();
        let mut seen: HashSet<NodeId> = HashSet::new();
        let mut stack = vec![PlanEntry { source, via: None }];
        while let Some(entry) = stack.pop() {
            if !seen.insert(entry.source) {
                continue;
            }
            let data = self
                .nodes
                .get(entry.source)
                .ok_or(Error::DisposedNode(entry.source))?;
            let mut next: SmallVec<[PlanEntry; 4]> = data
                .owned
                .iter()
                .map(|&owned| PlanEntry {
                    source: owned,
                    via: None,
                })
                .collect();
            for (property, value) in data.store.iter() {
                if property == lp || property == vp {
                    continue;
                }
                let Some(&Some(target)) = value.downcast_ref::<Option<NodeId>>() else {
                    continue;
                };
                if self.copy_policy(entry.source, property) == CopyPolicy::Deep {
                    next.push(PlanEntry {
                        source: target,
                        via: Some(entry.source),
                    });
                }
            }
            // Reversed so that the first edge is visited first.
            stack.extend(next.into_iter().rev());
            plan.push(entry);
        }
        // Nodes whose owner is copied too keep that ownership.
        for entry in &mut plan {
            if self.owner(entry.source).is_some_and(|o| seen.contains(&o)) {
                entry.via = None;
            }
        }
        Ok(plan)
    }
}
