// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamic resource bindings.
//!
//! A binding keeps one property of one node in sync with the resource found
//! for a key. While it is active it watches every dictionary, parent link
//! and the skin that its last lookup went through, and looks up again when
//! any of them changes. Every new lookup first releases the previous set of
//! watches, so the watched set always matches the most recent path.

use alloc::string::String;
use core::str::FromStr;

use marquee_property::{ErasedValue, PropertyId};

use crate::clone::CloneOptions;
use crate::config::MissingResourceDiagnostics;
use crate::error::{Error, Result};
use crate::id::{BindingId, NodeId};
use crate::notify::Observer;
use crate::resolve::{Resolution, TreeSearchMode, Watches};
use crate::resources::Resource;
use crate::tree::ElementTree;

/// How a resolved node resource is assigned to the target.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum AssignmentMode {
    /// Assign the resource itself.
    #[default]
    Reference,
    /// Assign a private copy, logically parented to the target.
    Copy,
}

impl FromStr for AssignmentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Reference" => Ok(Self::Reference),
            "Copy" => Ok(Self::Copy),
            _ => Err(Error::NotImplemented {
                setting: "assignment mode",
                value: String::from(s),
            }),
        }
    }
}

/// Lifecycle state of a binding.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum BindingState {
    /// Not watching anything.
    #[default]
    Inactive,
    /// Watching its last search path.
    Active,
}

/// Settings of a dynamic resource binding.
///
/// ```rust
/// use marquee_skin::{AssignmentMode, DynamicResource, TreeSearchMode};
///
/// let config = DynamicResource::new("ItemTemplate")
///     .with_search_mode(TreeSearchMode::Hybrid)
///     .with_assignment(AssignmentMode::Copy);
/// assert_eq!(config.key(), Some("ItemTemplate"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DynamicResource {
    key: Option<String>,
    search_mode: TreeSearchMode,
    assignment: AssignmentMode,
    keep_binding: bool,
}

impl DynamicResource {
    /// Binds to `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    /// A binding whose target receives the binding itself instead of a
    /// resource. The target must be an `Option<BindingId>` property.
    #[must_use]
    pub fn keep_binding() -> Self {
        Self {
            keep_binding: true,
            ..Self::default()
        }
    }

    /// Sets the relation followed by lookups.
    #[must_use]
    pub fn with_search_mode(mut self, mode: TreeSearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    /// Sets the assignment mode.
    #[must_use]
    pub fn with_assignment(mut self, mode: AssignmentMode) -> Self {
        self.assignment = mode;
        self
    }

    /// The resource key.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The relation followed by lookups.
    #[must_use]
    pub fn search_mode(&self) -> TreeSearchMode {
        self.search_mode
    }

    /// The assignment mode.
    #[must_use]
    pub fn assignment(&self) -> AssignmentMode {
        self.assignment
    }

    /// Whether the binding assigns itself.
    #[must_use]
    pub fn is_keep_binding(&self) -> bool {
        self.keep_binding
    }
}

/// A dynamic resource binding owned by its target node.
#[derive(Debug)]
pub struct Binding {
    config: DynamicResource,
    target: NodeId,
    property: PropertyId,
    state: BindingState,
    watches: Watches,
    last_copy: Option<NodeId>,
}

impl Binding {
    pub(crate) fn new(config: DynamicResource, target: NodeId, property: PropertyId) -> Self {
        Self {
            config,
            target,
            property,
            state: BindingState::Inactive,
            watches: Watches::default(),
            last_copy: None,
        }
    }

    /// A fresh inactive copy, retargeted.
    pub(crate) fn copy_to(&self, target: NodeId, last_copy: Option<NodeId>) -> Self {
        Self {
            last_copy,
            ..Self::new(self.config.clone(), target, self.property)
        }
    }

    /// The settings.
    #[must_use]
    pub fn config(&self) -> &DynamicResource {
        &self.config
    }

    /// The node whose property is kept in sync.
    #[must_use]
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// The property that is kept in sync.
    #[must_use]
    pub fn property(&self) -> PropertyId {
        self.property
    }

    /// The lifecycle state.
    #[must_use]
    pub fn state(&self) -> BindingState {
        self.state
    }

    /// What the binding currently watches.
    #[must_use]
    pub fn watches(&self) -> &Watches {
        &self.watches
    }

    /// The copy produced by the last assignment in copy mode.
    #[must_use]
    pub fn last_copy(&self) -> Option<NodeId> {
        self.last_copy
    }

    pub(crate) fn needs_activation(&self) -> bool {
        self.config.key.is_some() || self.config.keep_binding
    }
}

impl ElementTree {
    /// Creates an inactive binding for `property` of `target`, owned by `target`.
    pub fn create_binding(
        &mut self,
        target: NodeId,
        property: PropertyId,
        config: DynamicResource,
    ) -> Result<BindingId> {
        if self.registry.get(property).is_none() {
            return Err(Error::UnknownProperty(property));
        }
        if !self.contains(target) {
            return Err(Error::DisposedNode(target));
        }
        let id = self.bindings.insert(Binding::new(config, target, property));
        if let Some(data) = self.nodes.get_mut(target) {
            data.bindings.push(id);
        }
        Ok(id)
    }

    /// Returns a binding.
    #[must_use]
    pub fn binding(&self, id: BindingId) -> Option<&Binding> {
        self.bindings.get(id)
    }

    /// Activates a binding and updates its target.
    ///
    /// Fails with [`Error::MissingResourceKey`] if no key is configured. A
    /// key that resolves to nothing is not a failure: the binding stays
    /// active and the target is left unchanged. Returns whether the target
    /// was assigned.
    pub fn activate_binding(&mut self, id: BindingId) -> Result<bool> {
        let binding = self.bindings.get_mut(id).ok_or(Error::StaleBinding(id))?;
        if !binding.needs_activation() {
            return Err(Error::MissingResourceKey(id));
        }
        binding.state = BindingState::Active;
        match self.update_binding(id) {
            Ok(assigned) => Ok(assigned),
            Err(err) => {
                self.deactivate_binding(id);
                Err(err)
            }
        }
    }

    /// Releases everything the binding watches and makes it inactive.
    ///
    /// Returns `false` for a stale binding.
    pub fn deactivate_binding(&mut self, id: BindingId) -> bool {
        let Some(binding) = self.bindings.get_mut(id) else {
            return false;
        };
        binding.state = BindingState::Inactive;
        let watches = core::mem::take(&mut binding.watches);
        self.release_watches(watches);
        true
    }

    /// Activates every binding in `ids`, logging failures.
    pub fn activate_bindings(&mut self, ids: &[BindingId]) {
        for &id in ids {
            if let Err(err) = self.activate_binding(id) {
                tracing::warn!(target: "marquee_skin::binding", ?id, %err, "activation failed");
            }
        }
    }

    /// Looks the key up again and assigns the result.
    ///
    /// Previously watched sources are released first. An inactive binding
    /// assigns without watching. Returns whether the target was assigned.
    pub fn update_binding(&mut self, id: BindingId) -> Result<bool> {
        let binding = self.bindings.get_mut(id).ok_or(Error::StaleBinding(id))?;
        let watches = core::mem::take(&mut binding.watches);
        let target = binding.target;
        let property = binding.property;
        let active = binding.state == BindingState::Active;
        let config = binding.config.clone();
        self.release_watches(watches);

        if config.keep_binding {
            self.set_erased(target, property, ErasedValue::new(Some(id)))?;
            return Ok(true);
        }
        let key = config.key.ok_or(Error::MissingResourceKey(id))?;
        let resolution = if active {
            let (resolution, watches) =
                self.resolve_and_watch(target, &key, config.search_mode, &Observer::Binding(id));
            if let Some(binding) = self.bindings.get_mut(id) {
                binding.watches = watches;
            }
            resolution
        } else {
            self.resolve(target, &key, config.search_mode)
        };
        if self.config.trace_bindings() {
            tracing::trace!(
                target: "marquee_skin::binding",
                ?id,
                key = key.as_str(),
                found = resolution.is_found(),
                "update"
            );
        }

        match resolution {
            Resolution::Found { resource, .. } => {
                self.assign_resource(id, target, property, config.assignment, resource)?;
                Ok(true)
            }
            Resolution::NotFound => {
                if self.config.missing_resources() == MissingResourceDiagnostics::Warn {
                    tracing::warn!(
                        target: "marquee_skin::binding",
                        key = key.as_str(),
                        start = ?target,
                        "resource not found"
                    );
                }
                Ok(false)
            }
        }
    }

    fn assign_resource(
        &mut self,
        id: BindingId,
        target: NodeId,
        property: PropertyId,
        assignment: AssignmentMode,
        resource: Resource,
    ) -> Result<()> {
        let node = match resource {
            Resource::Value(value) => {
                self.set_erased(target, property, value)?;
                return Ok(());
            }
            Resource::Node(node) => node,
        };
        if assignment == AssignmentMode::Reference {
            self.set_erased(target, property, ErasedValue::new(Some(node)))?;
            return Ok(());
        }

        if !self.registry.is_of_type::<Option<NodeId>>(property) {
            return Err(Error::TypeMismatch {
                property,
                expected: self.registry.get(property).map_or("", |r| r.type_name()),
                found: core::any::type_name::<Option<NodeId>>(),
            });
        }
        let cloned = self.clone_node(
            node,
            CloneOptions {
                cut_logical_parent: false,
            },
        )?;
        let copy = cloned.root;
        if let Err(err) = self
            .adopt(target, copy)
            .and_then(|()| self.set_logical_parent(copy, Some(target)))
        {
            self.dispose(copy);
            return Err(err);
        }
        self.activate_bindings(&cloned.deferred_bindings);
        let previous = self
            .bindings
            .get_mut(id)
            .and_then(|b| b.last_copy.replace(copy));
        let result = self.set_erased(target, property, ErasedValue::new(Some(copy)));
        if let Some(previous) = previous.filter(|p| *p != copy) {
            self.dispose(previous);
        }
        result.map(|_| ())
    }

    /// Reacts to a change on a watched source.
    pub(crate) fn on_binding_source_changed(&mut self, id: BindingId) {
        let active = self
            .bindings
            .get(id)
            .is_some_and(|b| b.state == BindingState::Active);
        if !active {
            return;
        }
        if let Err(err) = self.update_binding(id) {
            tracing::warn!(target: "marquee_skin::binding", ?id, %err, "update failed");
        }
    }

    fn reconfigure(
        &mut self,
        id: BindingId,
        apply: impl FnOnce(&mut DynamicResource) -> bool,
    ) -> Result<()> {
        let binding = self.bindings.get_mut(id).ok_or(Error::StaleBinding(id))?;
        if apply(&mut binding.config) && binding.state == BindingState::Active {
            if let Err(err) = self.update_binding(id) {
                self.deactivate_binding(id);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Changes the key. An active binding updates if it changed.
    ///
    /// If that update fails the binding is deactivated.
    pub fn set_binding_key(&mut self, id: BindingId, key: Option<String>) -> Result<()> {
        self.reconfigure(id, |config| {
            let changed = config.key != key;
            config.key = key;
            changed
        })
    }

    /// Changes the search mode. An active binding updates if it changed.
    pub fn set_binding_search_mode(&mut self, id: BindingId, mode: TreeSearchMode) -> Result<()> {
        self.reconfigure(id, |config| {
            let changed = config.search_mode != mode;
            config.search_mode = mode;
            changed
        })
    }

    /// Changes the assignment mode. An active binding updates if it changed.
    pub fn set_binding_assignment(&mut self, id: BindingId, mode: AssignmentMode) -> Result<()> {
        self.reconfigure(id, |config| {
            let changed = config.assignment != mode;
            config.assignment = mode;
            changed
        })
    }

    /// Removes a binding, releasing its watches and disposing its last copy.
    ///
    /// The target keeps its current value. Returns `false` for a stale binding.
    pub fn remove_binding(&mut self, id: BindingId) -> bool {
        let Some(binding) = self.free_binding(id) else {
            return false;
        };
        if let Some(data) = self.nodes.get_mut(binding.target) {
            data.bindings.retain(|b| *b != id);
        }
        if let Some(copy) = binding.last_copy {
            self.dispose(copy);
        }
        true
    }

    /// Drops a binding from the arena and releases its watches.
    pub(crate) fn free_binding(&mut self, id: BindingId) -> Option<Binding> {
        let mut binding = self.bindings.remove(id)?;
        binding.state = BindingState::Inactive;
        let watches = core::mem::take(&mut binding.watches);
        self.release_watches(watches);
        Some(binding)
    }
}
