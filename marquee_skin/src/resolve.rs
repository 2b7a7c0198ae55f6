// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resource resolution.
//!
//! A lookup starts at a node, checks each local dictionary on the way up the
//! chosen relation, and finally asks the loaded skin. The nearest definition
//! wins. Lookup can optionally record every dictionary and parent link it
//! passed, attaching an observer to each, so that a change anywhere along the
//! path can trigger a new lookup.

use alloc::string::String;
use alloc::vec::Vec;
use core::str::FromStr;
use hashbrown::HashSet;

use marquee_property::{ObserverId, PropertyId};

use crate::error::Error;
use crate::id::NodeId;
use crate::notify::{Observer, Slot};
use crate::resources::Resource;
use crate::tree::ElementTree;

/// Which parent relation a lookup follows.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TreeSearchMode {
    /// Follow logical parents.
    #[default]
    LogicalTree,
    /// Follow visual parents. A non-visual node ends the walk after its own
    /// dictionary is searched.
    VisualTree,
    /// Prefer the logical parent; where it is unset, take the visual parent
    /// for that one step.
    Hybrid,
}

impl FromStr for TreeSearchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LogicalTree" => Ok(Self::LogicalTree),
            "VisualTree" => Ok(Self::VisualTree),
            "Hybrid" => Ok(Self::Hybrid),
            _ => Err(Error::NotImplemented {
                setting: "search mode",
                value: String::from(s),
            }),
        }
    }
}

/// Where a resource was found.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResourceSource {
    /// In the local dictionary of this node.
    Node(NodeId),
    /// In the loaded skin.
    Skin,
}

/// Result of a lookup. Not finding anything is not an error.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// The nearest matching entry.
    Found {
        /// A copy of the entry.
        resource: Resource,
        /// Where it was found.
        source: ResourceSource,
    },
    /// No dictionary on the path, and not the skin, defines the key.
    NotFound,
}

impl Resolution {
    /// Returns the resource, if found.
    #[must_use]
    pub fn resource(&self) -> Option<&Resource> {
        match self {
            Self::Found { resource, .. } => Some(resource),
            Self::NotFound => None,
        }
    }

    /// Returns `true` if something was found.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// Everything a lookup looked at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchPath {
    /// Nodes whose dictionaries were consulted, nearest first.
    pub dictionaries: Vec<NodeId>,
    /// Parent links read while walking, as (node, parent property).
    pub parent_links: Vec<(NodeId, PropertyId)>,
    /// Whether the skin was consulted.
    pub skin: bool,
}

/// Observer attachments made along a search path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Watches {
    pub(crate) dictionaries: Vec<(NodeId, ObserverId)>,
    pub(crate) links: Vec<(NodeId, PropertyId, ObserverId)>,
    pub(crate) skin: Option<ObserverId>,
}

impl Watches {
    /// Number of dictionaries watched.
    #[must_use]
    pub fn dictionary_count(&self) -> usize {
        self.dictionaries.len()
    }

    /// Number of parent links watched.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Whether the skin registry is watched.
    #[must_use]
    pub fn watches_skin(&self) -> bool {
        self.skin.is_some()
    }

    /// Returns `true` if nothing is watched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dictionaries.is_empty() && self.links.is_empty() && self.skin.is_none()
    }
}

impl ElementTree {
    /// Looks up `key` starting at `start`.
    ///
    /// ```rust
    /// use marquee_skin::{ElementTree, ElementTypeId, Resource, TreeSearchMode};
    ///
    /// let mut tree = ElementTree::new();
    /// let root = tree.create(ElementTypeId::ELEMENT).unwrap();
    /// let leaf = tree.create(ElementTypeId::ELEMENT).unwrap();
    /// tree.add_child(root, leaf).unwrap();
    /// tree.insert_resource(root, "Accent", Resource::value(7_u32)).unwrap();
    ///
    /// let found = tree.resolve(leaf, "Accent", TreeSearchMode::LogicalTree);
    /// assert_eq!(found.resource().and_then(|r| r.downcast_ref()), Some(&7_u32));
    /// assert!(!tree.resolve(leaf, "Missing", TreeSearchMode::LogicalTree).is_found());
    /// ```
    #[must_use]
    pub fn resolve(&self, start: NodeId, key: &str, mode: TreeSearchMode) -> Resolution {
        self.resolve_traced(start, key, mode).0
    }

    /// Looks up `key` and also reports the path that was searched.
    #[must_use]
    pub fn resolve_traced(
        &self,
        start: NodeId,
        key: &str,
        mode: TreeSearchMode,
    ) -> (Resolution, SearchPath) {
        let mut path = SearchPath::default();
        let lp = self.logical_parent_prop.id();
        let vp = self.visual_parent_prop.id();

        // Each relation is acyclic on its own, but a hybrid walk mixes both
        // and can come back to a node it has already seen.
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut cursor = self.contains(start).then_some(start);
        while let Some(node) = cursor {
            if !visited.insert(node) {
                break;
            }
            let Some(data) = self.nodes.get(node) else {
                // A stale parent handle ends the walk.
                break;
            };
            if let Some(dict) = &data.resources {
                path.dictionaries.push(node);
                if let Some(resource) = dict.get(key) {
                    let found = Resolution::Found {
                        resource: resource.clone(),
                        source: ResourceSource::Node(node),
                    };
                    return (found, path);
                }
            }
            cursor = match mode {
                TreeSearchMode::LogicalTree => {
                    path.parent_links.push((node, lp));
                    self.link(node, lp)
                }
                // A non-visual node has no visual parent to follow.
                TreeSearchMode::VisualTree if !data.is_visual() => None,
                TreeSearchMode::VisualTree => {
                    path.parent_links.push((node, vp));
                    self.link(node, vp)
                }
                TreeSearchMode::Hybrid => {
                    path.parent_links.push((node, lp));
                    match self.link(node, lp) {
                        Some(parent) => Some(parent),
                        None if data.is_visual() => {
                            path.parent_links.push((node, vp));
                            self.link(node, vp)
                        }
                        None => None,
                    }
                }
            };
        }

        path.skin = true;
        let resolution = match self.find_skin_resource(key) {
            Some(resource) => Resolution::Found {
                resource: resource.clone(),
                source: ResourceSource::Skin,
            },
            None => Resolution::NotFound,
        };
        (resolution, path)
    }

    /// Looks up `key` and attaches `observer` to everything on the path.
    ///
    /// The returned [`Watches`] must be given back to
    /// [`release_watches`](Self::release_watches) before the next lookup.
    pub fn resolve_and_watch(
        &mut self,
        start: NodeId,
        key: &str,
        mode: TreeSearchMode,
        observer: &Observer,
    ) -> (Resolution, Watches) {
        let (resolution, path) = self.resolve_traced(start, key, mode);
        let mut watches = Watches::default();
        for node in path.dictionaries {
            if let Ok(id) = self.attach(node, Slot::Resources, observer.clone()) {
                watches.dictionaries.push((node, id));
            }
        }
        for (node, property) in path.parent_links {
            if let Ok(id) = self.attach(node, Slot::Property(property), observer.clone()) {
                watches.links.push((node, property, id));
            }
        }
        if path.skin {
            watches.skin = Some(self.attach_skin(observer.clone()));
        }
        (resolution, watches)
    }

    /// Detaches everything a [`resolve_and_watch`](Self::resolve_and_watch)
    /// call attached. Disposed sources are skipped.
    pub fn release_watches(&mut self, watches: Watches) {
        for (node, id) in watches.dictionaries {
            self.detach(node, Slot::Resources, id);
        }
        for (node, property, id) in watches.links {
            self.detach(node, Slot::Property(property), id);
        }
        if let Some(id) = watches.skin {
            self.detach_skin(id);
        }
    }
}
