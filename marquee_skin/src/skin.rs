// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The skin resource registry.
//!
//! A skin is the last place resource lookup goes to. Skins may inherit from a
//! parent skin (a skin layered over a base theme); lookup walks that chain.
//! Replacing the loaded skin notifies every skin observer, so active bindings
//! re-resolve against the new registry.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use marquee_property::ObserverId;

use crate::id::NodeId;
use crate::node::Subscription;
use crate::notify::Observer;
use crate::resources::{Resource, ResourceDictionary};
use crate::tree::ElementTree;

/// A named set of skin resources with an optional parent skin.
///
/// ```rust
/// use marquee_skin::{Resource, SkinResources};
///
/// let mut base = SkinResources::new("Base");
/// base.insert("Accent", Resource::value(0x3366ff_u32));
/// base.insert("Margin", Resource::value(4_u32));
///
/// let mut dark = SkinResources::new("Dark").with_parent(base);
/// dark.insert("Accent", Resource::value(0x112233_u32));
///
/// assert_eq!(dark.find("Accent").and_then(|r| r.downcast_ref()), Some(&0x112233_u32));
/// assert_eq!(dark.find("Margin").and_then(|r| r.downcast_ref()), Some(&4_u32));
/// ```
#[derive(Clone, Debug)]
pub struct SkinResources {
    name: String,
    resources: ResourceDictionary,
    parent: Option<Box<SkinResources>>,
}

impl SkinResources {
    /// Creates an empty skin.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources: ResourceDictionary::new(),
            parent: None,
        }
    }

    /// Sets the skin this one inherits from.
    #[must_use]
    pub fn with_parent(mut self, parent: Self) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    /// Returns the skin name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the inherited skin.
    #[must_use]
    pub fn parent(&self) -> Option<&Self> {
        self.parent.as_deref()
    }

    /// Returns this layer's own entries.
    #[must_use]
    pub fn resources(&self) -> &ResourceDictionary {
        &self.resources
    }

    /// Adds an entry to this layer.
    pub fn insert(&mut self, key: impl Into<String>, resource: Resource) -> Option<Resource> {
        self.resources.insert(key, resource)
    }

    /// Looks up a key in this layer, then in inherited layers.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&Resource> {
        let mut layer = Some(self);
        while let Some(skin) = layer {
            if let Some(found) = skin.resources.get(key) {
                return Some(found);
            }
            layer = skin.parent();
        }
        None
    }

    /// Node resources of every layer.
    fn nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut layer = Some(self);
        while let Some(skin) = layer {
            out.extend(skin.resources.iter().filter_map(|(_, r)| r.as_node()));
            layer = skin.parent();
        }
        out
    }
}

impl ElementTree {
    /// Returns the loaded skin.
    #[must_use]
    pub fn skin(&self) -> Option<&SkinResources> {
        self.skin.as_ref()
    }

    /// Looks up a key in the loaded skin.
    #[must_use]
    pub fn find_skin_resource(&self, key: &str) -> Option<&Resource> {
        self.skin.as_ref().and_then(|s| s.find(key))
    }

    /// Replaces the loaded skin.
    ///
    /// Skin observers are notified after the swap. Node resources of the
    /// replaced skin are disposed once they have been notified.
    pub fn load_skin(&mut self, skin: SkinResources) {
        tracing::debug!(skin = skin.name(), "loading skin");
        let previous = self.skin.replace(skin);
        self.notify_skin();
        if let Some(old) = previous {
            self.dispose_skin_nodes(&old);
        }
    }

    /// Unloads the skin, notifying skin observers.
    pub fn unload_skin(&mut self) {
        let Some(old) = self.skin.take() else {
            return;
        };
        tracing::debug!(skin = old.name(), "unloading skin");
        self.notify_skin();
        self.dispose_skin_nodes(&old);
    }

    fn dispose_skin_nodes(&mut self, old: &SkinResources) {
        let still_used = self
            .skin
            .as_ref()
            .map(SkinResources::nodes)
            .unwrap_or_default();
        for node in old.nodes() {
            if !still_used.contains(&node) {
                self.dispose(node);
            }
        }
    }

    /// Attaches an observer to skin changes.
    ///
    /// A [`Handler`](crate::Handler) with an owner is detached when the owner
    /// is disposed.
    pub fn attach_skin(&mut self, observer: Observer) -> ObserverId {
        let owner = observer.owner();
        let id = self.skin_observers.attach(observer);
        if let Some(data) = owner.and_then(|o| self.nodes.get_mut(o)) {
            data.subscriptions.push(Subscription::Skin(id));
        }
        id
    }

    /// Detaches a skin observer. Unknown IDs are ignored.
    pub fn detach_skin(&mut self, id: ObserverId) -> bool {
        self.skin_observers.detach(id)
    }
}
