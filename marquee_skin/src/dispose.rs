// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node disposal.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use hashbrown::HashSet;

use marquee_property::{ErasedValue, PropertyId};

use crate::id::NodeId;
use crate::node::Subscription;
use crate::notify::{Notification, Slot};
use crate::tree::ElementTree;

impl ElementTree {
    /// Disposes `node` and everything it owns.
    ///
    /// For each disposed node this deactivates and frees its bindings,
    /// detaches and frees its triggers, detaches every handler it installed
    /// elsewhere and drops its own observer lists. Disposal cannot fail.
    /// Disposing a stale handle is a no-op.
    ///
    /// Surviving dictionaries drop entries that named a disposed node, and
    /// their observers are told which keys went away. Parent links that
    /// pointed at a disposed node become stale handles; resource lookup
    /// stops at them, and observers of those links are notified so that
    /// lookups through them run again.
    pub fn dispose(&mut self, node: NodeId) {
        if !self.contains(node) {
            return;
        }
        self.release(node);

        let mut disposed = HashSet::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let Some(data) = self.nodes.remove(current) else {
                continue;
            };
            disposed.insert(current);
            for binding in data.bindings {
                self.free_binding(binding);
            }
            for trigger in data.triggers {
                self.free_trigger(trigger);
            }
            for subscription in data.subscriptions {
                match subscription {
                    Subscription::Slot { source, slot, id } => {
                        self.detach(source, slot, id);
                    }
                    Subscription::Skin(id) => {
                        self.skin_observers.detach(id);
                    }
                }
            }
            stack.extend(data.owned);
        }
        tracing::trace!(?node, count = disposed.len(), "disposed");

        let (removed, orphaned) = self.forget_disposed(&disposed);
        for (owner, key) in removed {
            let notification = Notification::ResourcesChanged {
                node: owner,
                key: Some(key),
            };
            self.notify_slot(owner, Slot::Resources, &notification);
        }
        for (child, property, parent) in orphaned {
            let notification = Notification::PropertyChanged {
                node: child,
                property,
                old: ErasedValue::new(Some(parent)),
            };
            self.notify_slot(child, Slot::Property(property), &notification);
        }
    }

    /// Drops dictionary entries naming a disposed node and collects the
    /// parent links left pointing at one.
    fn forget_disposed(
        &mut self,
        disposed: &HashSet<NodeId>,
    ) -> (Vec<(NodeId, String)>, Vec<(NodeId, PropertyId, NodeId)>) {
        let relations = [self.logical_parent_prop.id(), self.visual_parent_prop.id()];
        let mut removed = Vec::new();
        let mut orphaned = Vec::new();
        for (id, data) in self.nodes.iter_mut() {
            if let Some(dict) = data.resources.as_mut() {
                let keys = dict.retain_nodes(|n| !disposed.contains(&n));
                removed.extend(keys.into_iter().map(|key| (id, key)));
            }
            for relation in relations {
                let parent = data
                    .store
                    .get_erased(relation)
                    .and_then(|v| v.downcast_ref::<Option<NodeId>>().copied().flatten());
                if let Some(parent) = parent.filter(|p| disposed.contains(p)) {
                    orphaned.push((id, relation, parent));
                }
            }
        }
        (removed, orphaned)
    }
}
