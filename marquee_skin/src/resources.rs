// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resource dictionaries.
//!
//! A resource is either a plain value or a node (a brush, a template, a
//! style). Node resources are owned by the node whose dictionary holds them,
//! and get that node as their logical parent when they have none.

use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;

use marquee_property::ErasedValue;

use crate::error::{Error, Result};
use crate::id::NodeId;
use crate::notify::{Notification, Slot};
use crate::tree::ElementTree;

/// A dictionary entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Resource {
    /// A node, such as a template or a shared brush.
    Node(NodeId),
    /// Any other value.
    Value(ErasedValue),
}

impl Resource {
    /// Wraps a plain value.
    pub fn value<T: Clone + PartialEq + 'static>(value: T) -> Self {
        Self::Value(ErasedValue::new(value))
    }

    /// Returns the node, if this is a node resource.
    #[must_use]
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Self::Node(id) => Some(*id),
            Self::Value(_) => None,
        }
    }

    /// Downcasts a value resource.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Self::Value(v) => v.downcast_ref(),
            Self::Node(_) => None,
        }
    }
}

/// Key to resource mapping.
#[derive(Clone, Debug, Default)]
pub struct ResourceDictionary {
    entries: HashMap<String, Resource>,
}

impl ResourceDictionary {
    /// Creates an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Resource> {
        self.entries.get(key)
    }

    /// Returns `true` if the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Inserts an entry and returns the one it replaced.
    ///
    /// This does not notify anyone; use [`ElementTree::insert_resource`] for
    /// dictionaries attached to a tree.
    pub fn insert(&mut self, key: impl Into<String>, resource: Resource) -> Option<Resource> {
        self.entries.insert(key.into(), resource)
    }

    /// Removes an entry.
    pub fn remove(&mut self, key: &str) -> Option<Resource> {
        self.entries.remove(key)
    }

    /// Iterates keys in unspecified order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resource)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn remap_nodes(&mut self, mut f: impl FnMut(NodeId) -> NodeId) {
        for resource in self.entries.values_mut() {
            if let Resource::Node(id) = resource {
                *id = f(*id);
            }
        }
    }

    /// Drops node resources rejected by `keep`, returning their keys.
    pub(crate) fn retain_nodes(&mut self, mut keep: impl FnMut(NodeId) -> bool) -> Vec<String> {
        let mut removed = Vec::new();
        self.entries.retain(|key, r| {
            let kept = r.as_node().is_none_or(&mut keep);
            if !kept {
                removed.push(key.clone());
            }
            kept
        });
        removed
    }
}

impl ElementTree {
    /// Returns the local dictionary of a node.
    #[must_use]
    pub fn resources(&self, node: NodeId) -> Option<&ResourceDictionary> {
        self.nodes.get(node).and_then(|n| n.resources.as_ref())
    }

    /// Inserts a resource into the local dictionary of `node`, then notifies
    /// its observers.
    ///
    /// A node resource is adopted by `node` and, if it has no logical parent
    /// yet, gets `node` as its logical parent. A replaced node resource is
    /// released and handed back to the caller.
    pub fn insert_resource(
        &mut self,
        node: NodeId,
        key: impl Into<String>,
        resource: Resource,
    ) -> Result<Option<Resource>> {
        let key = key.into();
        let data = self.nodes.get(node).ok_or(Error::DisposedNode(node))?;
        if data.resources.is_none() {
            return Err(Error::NoResources(node));
        }
        let mut reparent = false;
        if let Resource::Node(child) = resource {
            self.check_adopt(node, child)?;
            if self.logical_parent(child).is_none() {
                self.check_parent(child, node, self.logical_parent_prop.id())?;
                reparent = true;
            }
        }

        if let Resource::Node(child) = resource {
            self.adopt(node, child)?;
            if reparent {
                self.set_logical_parent(child, Some(node))?;
            }
        }
        let previous = self
            .nodes
            .get_mut(node)
            .and_then(|n| n.resources.as_mut())
            .and_then(|dict| dict.insert(key.clone(), resource.clone()));
        if let Some(Resource::Node(old)) = previous {
            if Some(old) != resource.as_node() {
                self.release(old);
            }
        }
        self.notify_slot(
            node,
            Slot::Resources,
            &Notification::ResourcesChanged {
                node,
                key: Some(key),
            },
        );
        Ok(previous)
    }

    /// Removes a resource from the local dictionary of `node`, then notifies
    /// its observers. A removed node resource is released to the caller.
    pub fn remove_resource(&mut self, node: NodeId, key: &str) -> Result<Option<Resource>> {
        let data = self.nodes.get_mut(node).ok_or(Error::DisposedNode(node))?;
        let dict = data.resources.as_mut().ok_or(Error::NoResources(node))?;
        let removed = dict.remove(key);
        if removed.is_none() {
            return Ok(None);
        }
        if let Some(Resource::Node(old)) = removed {
            self.release(old);
        }
        self.notify_slot(
            node,
            Slot::Resources,
            &Notification::ResourcesChanged {
                node,
                key: Some(String::from(key)),
            },
        );
        Ok(removed)
    }

    /// Fires a bulk change notification for the dictionary of `node`.
    pub fn notify_resources_changed(&mut self, node: NodeId) -> Result<()> {
        let data = self.nodes.get(node).ok_or(Error::DisposedNode(node))?;
        if data.resources.is_none() {
            return Err(Error::NoResources(node));
        }
        self.notify_slot(
            node,
            Slot::Resources,
            &Notification::ResourcesChanged { node, key: None },
        );
        Ok(())
    }
}
