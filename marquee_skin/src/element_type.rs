// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element types: structural flags, copy-policy overrides and init hooks.

use alloc::borrow::Cow;
use alloc::rc::Rc;
use core::fmt;
use smallvec::SmallVec;

use marquee_property::{CopyPolicy, PropertyId};

use crate::id::NodeId;
use crate::node::NodeFlags;
use crate::tree::ElementTree;

/// Hook run on every node of a type right after it is created or cloned.
///
/// This is where a control attaches its change handlers, so that copies are
/// as reactive as the node they were copied from.
pub type InitHook = Rc<dyn Fn(&mut ElementTree, NodeId)>;

/// Description of a kind of node.
///
/// ```rust
/// use marquee_skin::{CopyPolicy, ElementTree, ElementType, NodeFlags, PropertyMetadataBuilder};
/// use marquee_skin::NodeId;
///
/// let mut tree = ElementTree::new();
/// let target = tree.register_property(
///     "Target",
///     PropertyMetadataBuilder::new(None::<NodeId>).build(),
/// );
/// let ty = tree.register_type(
///     ElementType::new("Label")
///         .with_flags(NodeFlags::VISUAL)
///         .copy_policy(target.id(), CopyPolicy::Shallow),
/// );
/// let label = tree.create(ty).unwrap();
/// assert_eq!(tree.element_type(label).unwrap().name(), "Label");
/// ```
#[derive(Clone)]
pub struct ElementType {
    name: Cow<'static, str>,
    flags: NodeFlags,
    copy_policies: SmallVec<[(PropertyId, CopyPolicy); 4]>,
    init: Option<InitHook>,
}

impl ElementType {
    /// Creates a type with no flags, overrides or hook.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            flags: NodeFlags::empty(),
            copy_policies: SmallVec::new(),
            init: None,
        }
    }

    /// Sets the structural flags.
    #[must_use]
    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Overrides the registered copy policy of `property` for nodes of this type.
    #[must_use]
    pub fn copy_policy(mut self, property: PropertyId, policy: CopyPolicy) -> Self {
        match self.copy_policies.iter_mut().find(|(id, _)| *id == property) {
            Some(entry) => entry.1 = policy,
            None => self.copy_policies.push((property, policy)),
        }
        self
    }

    /// Sets the init hook.
    #[must_use]
    pub fn on_init(mut self, hook: impl Fn(&mut ElementTree, NodeId) + 'static) -> Self {
        self.init = Some(Rc::new(hook));
        self
    }

    /// Returns the type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the structural flags.
    #[must_use]
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Returns the override for `property`, if this type declares one.
    #[must_use]
    pub fn copy_policy_override(&self, property: PropertyId) -> Option<CopyPolicy> {
        self.copy_policies
            .iter()
            .find(|(id, _)| *id == property)
            .map(|(_, policy)| *policy)
    }

    pub(crate) fn init_hook(&self) -> Option<InitHook> {
        self.init.clone()
    }
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementType")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("copy_policies", &self.copy_policies)
            .field("init", &self.init.is_some())
            .finish()
    }
}
