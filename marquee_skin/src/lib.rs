// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Marquee Skin: element trees with dynamic resources.
//!
//! This crate is the object-graph engine underneath every Marquee control.
//! It keeps an arena of nodes whose attributes are reactive properties from
//! `marquee_property`, looks resources up through the tree and a global skin
//! registry, keeps dynamic resource bindings current, and clones subtrees so
//! that templates can be stamped out as independent live copies.
//!
//! ## Core Concepts
//!
//! - [`ElementTree`] owns every node. Nodes are addressed by generational
//!   [`NodeId`] handles; a handle to a disposed node is stale and never
//!   aliases a later node.
//! - Logical and visual parents are ordinary node-reference properties
//!   ([`ElementTree::logical_parent_property`]). They never own. Ownership is
//!   a separate list: disposing a node disposes what it owns.
//! - Every change source (a property slot, a resource dictionary, the skin)
//!   carries an ordered observer list. Notifications are delivered to a
//!   snapshot of it, so observers may attach and detach while being called.
//! - [`DynamicResource`] bindings resolve a key with
//!   [`ElementTree::resolve_and_watch`], write the result into their target
//!   and watch every dictionary and parent link on the way, so that any
//!   change along the path makes them resolve again.
//! - [`ElementTree::clone_node`] deep-copies a subtree, remapping references
//!   between copied nodes and optionally cutting the copy's logical parent.
//!
//! ## Quick Start
//!
//! ```rust
//! use marquee_skin::{
//!     DynamicResource, ElementTree, ElementTypeId, PropertyMetadataBuilder, Resource,
//! };
//!
//! let mut tree = ElementTree::new();
//! let background = tree.register_property(
//!     "Background",
//!     PropertyMetadataBuilder::new(0_u32).build(),
//! );
//!
//! let window = tree.create(ElementTypeId::ELEMENT).unwrap();
//! let button = tree.create(ElementTypeId::ELEMENT).unwrap();
//! tree.add_child(window, button).unwrap();
//! tree.insert_resource(window, "Accent", Resource::value(0x3366_ff_u32)).unwrap();
//!
//! let binding = tree
//!     .create_binding(button, background.id(), DynamicResource::new("Accent"))
//!     .unwrap();
//! tree.activate_binding(binding).unwrap();
//! assert_eq!(tree.get(button, background).unwrap(), 0x3366_ff);
//!
//! // Replacing the resource updates the bound property.
//! tree.insert_resource(window, "Accent", Resource::value(0xff_6633_u32)).unwrap();
//! assert_eq!(tree.get(button, background).unwrap(), 0xff_6633);
//! ```
//!
//! ## Diagnostics
//!
//! The crate logs through `tracing`. Binding updates are traced when
//! [`EngineConfig::with_trace_bindings`] is set, and failures swallowed
//! while reacting to a change are reported at `warn` level.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod binding;
mod clone;
mod config;
mod dispose;
mod element_type;
mod error;
mod id;
mod node;
mod notify;
mod resolve;
mod resources;
mod skin;
mod template;
mod tree;
mod trigger;

pub use binding::{AssignmentMode, Binding, BindingState, DynamicResource};
pub use clone::{CloneOptions, Cloned};
pub use config::{EngineConfig, MissingResourceDiagnostics};
pub use element_type::{ElementType, InitHook};
pub use error::{Error, ErrorKind, Result};
pub use id::{BindingId, ElementTypeId, NodeId, TriggerId};
pub use node::{ElementState, NodeFlags};
pub use notify::{Handler, HandlerFn, Notification, Observer, Slot};
pub use resolve::{Resolution, ResourceSource, SearchPath, TreeSearchMode, Watches};
pub use resources::{Resource, ResourceDictionary};
pub use skin::SkinResources;
pub use tree::ElementTree;
pub use trigger::{EventTrigger, SetterAction, TriggerAction};

pub use marquee_property::{
    CopyPolicy, ErasedValue, ObserverId, Property, PropertyCell, PropertyId, PropertyMetadata,
    PropertyMetadataBuilder,
};
