// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node data.

use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;
use smallvec::SmallVec;

use marquee_property::{ObserverId, Observers, PropertyStore};

use crate::id::{BindingId, ElementTypeId, NodeId, TriggerId};
use crate::notify::{Observer, Slot};
use crate::resources::ResourceDictionary;

bitflags::bitflags! {
    /// Structural capabilities of an element type.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node participates in the visual tree and may have a visual parent.
        const VISUAL    = 0b0000_0001;
        /// Node owns a local resource dictionary.
        const RESOURCES = 0b0000_0010;
    }
}

/// Lifecycle state of a node.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ElementState {
    /// Created but not yet live in a running tree.
    #[default]
    Constructing,
    /// Live.
    Running,
    /// Disposed. Stale handles report this state.
    Disposed,
}

/// A handler this node installed on some other change source.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Subscription {
    Slot {
        source: NodeId,
        slot: Slot,
        id: ObserverId,
    },
    Skin(ObserverId),
}

#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) element_type: ElementTypeId,
    pub(crate) flags: NodeFlags,
    pub(crate) state: ElementState,
    pub(crate) store: PropertyStore,
    pub(crate) resources: Option<ResourceDictionary>,
    pub(crate) names: Option<HashMap<String, NodeId>>,
    pub(crate) owner: Option<NodeId>,
    pub(crate) owned: SmallVec<[NodeId; 4]>,
    pub(crate) template_control: Option<NodeId>,
    pub(crate) bindings: SmallVec<[BindingId; 2]>,
    pub(crate) triggers: SmallVec<[TriggerId; 1]>,
    pub(crate) observers: HashMap<Slot, Observers<Observer>>,
    pub(crate) subscriptions: Vec<Subscription>,
}

impl NodeData {
    pub(crate) fn new(element_type: ElementTypeId, flags: NodeFlags) -> Self {
        Self {
            element_type,
            flags,
            state: ElementState::Constructing,
            store: PropertyStore::new(),
            resources: flags
                .contains(NodeFlags::RESOURCES)
                .then(ResourceDictionary::new),
            names: None,
            owner: None,
            owned: SmallVec::new(),
            template_control: None,
            bindings: SmallVec::new(),
            triggers: SmallVec::new(),
            observers: HashMap::new(),
            subscriptions: Vec::new(),
        }
    }

    pub(crate) fn is_visual(&self) -> bool {
        self.flags.contains(NodeFlags::VISUAL)
    }
}
