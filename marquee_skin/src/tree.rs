// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The element tree: node storage, properties, parent links and observation.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use hashbrown::HashMap;

use marquee_property::{
    CopyPolicy, ErasedValue, ObserverId, Observers, Property, PropertyId, PropertyMetadata,
    PropertyMetadataBuilder, PropertyRegistry,
};

use crate::binding::Binding;
use crate::config::EngineConfig;
use crate::element_type::ElementType;
use crate::error::{Error, Result};
use crate::id::{Arena, BindingId, ElementTypeId, NodeId, TriggerId};
use crate::node::{ElementState, NodeData, NodeFlags, Subscription};
use crate::notify::{Handler, Notification, Observer, Slot};
use crate::skin::SkinResources;
use crate::trigger::EventTrigger;

/// A tree of reactive elements.
///
/// The tree owns every node, binding and trigger, the property registry and
/// the loaded skin. Nodes are addressed by [`NodeId`] handles. Parent links
/// are plain handles stored in the `LogicalParent` and `VisualParent`
/// properties; ownership is tracked separately.
///
/// All notification is synchronous. Every write that changes an effective
/// value runs the observers of that slot, over a snapshot of the list, before
/// returning. Observers receive `&mut ElementTree` and may write again.
///
/// ```rust
/// use marquee_skin::{ElementTree, ElementTypeId, PropertyMetadataBuilder};
///
/// let mut tree = ElementTree::new();
/// let width = tree.register_property("Width", PropertyMetadataBuilder::new(0.0_f64).build());
///
/// let root = tree.create(ElementTypeId::ELEMENT).unwrap();
/// let child = tree.create(ElementTypeId::ELEMENT).unwrap();
/// tree.add_child(root, child).unwrap();
/// assert_eq!(tree.logical_parent(child), Some(root));
///
/// assert!(tree.set(child, width, 120.0).unwrap());
/// assert!(!tree.set(child, width, 120.0).unwrap());
/// assert_eq!(tree.get(child, width).unwrap(), 120.0);
/// ```
pub struct ElementTree {
    pub(crate) config: EngineConfig,
    pub(crate) registry: PropertyRegistry,
    pub(crate) types: Vec<ElementType>,
    pub(crate) nodes: Arena<NodeId, NodeData>,
    pub(crate) bindings: Arena<BindingId, Binding>,
    pub(crate) triggers: Arena<TriggerId, EventTrigger>,
    pub(crate) skin: Option<SkinResources>,
    pub(crate) skin_observers: Observers<Observer>,
    pub(crate) logical_parent_prop: Property<Option<NodeId>>,
    pub(crate) visual_parent_prop: Property<Option<NodeId>>,
}

impl Default for ElementTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementTree {
    /// Creates an empty tree with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::new())
    }

    /// Creates an empty tree.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        let mut registry = PropertyRegistry::new();
        let parent_link = || {
            PropertyMetadataBuilder::new(None::<NodeId>)
                .copy_policy(CopyPolicy::Shallow)
                .build()
        };
        let logical_parent_prop = registry.register("LogicalParent", parent_link());
        let visual_parent_prop = registry.register("VisualParent", parent_link());
        let types = vec![
            ElementType::new("Element").with_flags(NodeFlags::VISUAL | NodeFlags::RESOURCES),
            ElementType::new("Object"),
        ];
        Self {
            config,
            registry,
            types,
            nodes: Arena::default(),
            bindings: Arena::default(),
            triggers: Arena::default(),
            skin: None,
            skin_observers: Observers::new(),
            logical_parent_prop,
            visual_parent_prop,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the property registry.
    #[must_use]
    pub fn registry(&self) -> &PropertyRegistry {
        &self.registry
    }

    /// Registers a property.
    ///
    /// # Panics
    ///
    /// Panics if the name is already taken.
    pub fn register_property<T: Clone + PartialEq + 'static>(
        &mut self,
        name: &'static str,
        metadata: PropertyMetadata<T>,
    ) -> Property<T> {
        self.registry.register(name, metadata)
    }

    /// Registers an element type.
    ///
    /// # Panics
    ///
    /// Panics if more than 65,535 types are registered.
    pub fn register_type(&mut self, ty: ElementType) -> ElementTypeId {
        assert!(
            self.types.len() < usize::from(u16::MAX),
            "Too many element types registered"
        );
        #[expect(clippy::cast_possible_truncation, reason = "checked above")]
        let id = ElementTypeId(self.types.len() as u16);
        self.types.push(ty);
        id
    }

    /// Returns a registered element type.
    #[must_use]
    pub fn type_info(&self, ty: ElementTypeId) -> Option<&ElementType> {
        self.types.get(usize::from(ty.0))
    }

    /// The `LogicalParent` property.
    #[must_use]
    pub fn logical_parent_property(&self) -> Property<Option<NodeId>> {
        self.logical_parent_prop
    }

    /// The `VisualParent` property.
    #[must_use]
    pub fn visual_parent_property(&self) -> Property<Option<NodeId>> {
        self.visual_parent_prop
    }

    // --- Node lifecycle ---

    /// Creates a node of the given type and runs the type's init hook.
    pub fn create(&mut self, ty: ElementTypeId) -> Result<NodeId> {
        let info = self.type_info(ty).ok_or(Error::UnknownElementType(ty))?;
        let flags = info.flags();
        let hook = info.init_hook();
        let id = self.nodes.insert(NodeData::new(ty, flags));
        if let Some(hook) = hook {
            hook(self, id);
        }
        Ok(id)
    }

    /// Returns `true` if `node` refers to a live node.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(node)
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree has no live nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    /// Returns the lifecycle state; stale handles report [`ElementState::Disposed`].
    #[must_use]
    pub fn element_state(&self, node: NodeId) -> ElementState {
        self.nodes
            .get(node)
            .map_or(ElementState::Disposed, |n| n.state)
    }

    /// Sets the lifecycle state of `node` and everything it owns.
    ///
    /// [`ElementState::Disposed`] disposes the node.
    pub fn set_element_state(&mut self, node: NodeId, state: ElementState) -> Result<()> {
        if !self.contains(node) {
            return Err(Error::DisposedNode(node));
        }
        if state == ElementState::Disposed {
            self.dispose(node);
            return Ok(());
        }
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(data) = self.nodes.get_mut(current) {
                data.state = state;
                stack.extend(data.owned.iter().copied());
            }
        }
        Ok(())
    }

    /// Returns the type of a node.
    #[must_use]
    pub fn element_type(&self, node: NodeId) -> Option<&ElementType> {
        self.element_type_id(node).and_then(|ty| self.type_info(ty))
    }

    /// Returns the type ID of a node.
    #[must_use]
    pub fn element_type_id(&self, node: NodeId) -> Option<ElementTypeId> {
        self.nodes.get(node).map(|n| n.element_type)
    }

    /// Returns the structural flags of a node.
    #[must_use]
    pub fn flags(&self, node: NodeId) -> Option<NodeFlags> {
        self.nodes.get(node).map(|n| n.flags)
    }

    /// Returns the node that owns `node`.
    #[must_use]
    pub fn owner(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.owner)
    }

    /// Returns the nodes owned by `node`, in adoption order.
    #[must_use]
    pub fn owned(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(node).map_or(&[], |n| n.owned.as_slice())
    }

    /// Makes `child` a logical child of `parent`, owned by it.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_adopt(parent, child)?;
        self.set_logical_parent(child, Some(parent))?;
        self.adopt(parent, child)
    }

    /// Transfers ownership of `node` to `owner`.
    ///
    /// Disposing `owner` will dispose `node`. Parent links are not touched.
    pub fn adopt(&mut self, owner: NodeId, node: NodeId) -> Result<()> {
        self.check_adopt(owner, node)?;
        if self.owner(node) == Some(owner) {
            return Ok(());
        }
        self.release(node);
        if let Some(data) = self.nodes.get_mut(node) {
            data.owner = Some(owner);
        }
        if let Some(data) = self.nodes.get_mut(owner) {
            data.owned.push(node);
        }
        Ok(())
    }

    pub(crate) fn check_adopt(&self, owner: NodeId, node: NodeId) -> Result<()> {
        for id in [owner, node] {
            if !self.contains(id) {
                return Err(Error::DisposedNode(id));
            }
        }
        let mut cursor = Some(owner);
        while let Some(current) = cursor {
            if current == node {
                return Err(Error::ParentCycle {
                    node,
                    parent: owner,
                });
            }
            cursor = self.owner(current);
        }
        Ok(())
    }

    /// Detaches `node` from its owner. Returns `false` if it had none.
    pub fn release(&mut self, node: NodeId) -> bool {
        let Some(owner) = self.nodes.get_mut(node).and_then(|d| d.owner.take()) else {
            return false;
        };
        if let Some(data) = self.nodes.get_mut(owner) {
            data.owned.retain(|id| *id != node);
            if data.template_control == Some(node) {
                data.template_control = None;
            }
        }
        true
    }

    // --- Properties ---

    /// Returns the policy used for `property` when `node` is cloned.
    #[must_use]
    pub fn copy_policy(&self, node: NodeId, property: PropertyId) -> CopyPolicy {
        self.element_type(node)
            .and_then(|ty| ty.copy_policy_override(property))
            .or_else(|| self.registry.copy_policy(property))
            .unwrap_or_default()
    }

    /// Returns the effective value of a property.
    pub fn get<T: Clone + PartialEq + 'static>(
        &self,
        node: NodeId,
        property: Property<T>,
    ) -> Result<T> {
        let value = self.get_erased(node, property.id())?;
        value
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| Error::TypeMismatch {
                property: property.id(),
                expected: value.type_name(),
                found: core::any::type_name::<T>(),
            })
    }

    /// Returns the effective value of a property, type-erased.
    pub fn get_erased(&self, node: NodeId, property: PropertyId) -> Result<ErasedValue> {
        let data = self.nodes.get(node).ok_or(Error::DisposedNode(node))?;
        data.store
            .effective_erased(property, &self.registry)
            .ok_or(Error::UnknownProperty(property))
    }

    /// Returns `true` if the property has a local value on `node`.
    #[must_use]
    pub fn has_local_value(&self, node: NodeId, property: PropertyId) -> bool {
        self.nodes
            .get(node)
            .is_some_and(|n| n.store.contains(property))
    }

    /// Writes a property.
    ///
    /// The value is coerced first. Returns `false`, without notifying, if the
    /// coerced value equals the current effective value.
    pub fn set<T: Clone + PartialEq + 'static>(
        &mut self,
        node: NodeId,
        property: Property<T>,
        value: T,
    ) -> Result<bool> {
        self.set_erased(node, property.id(), ErasedValue::new(value))
    }

    /// Writes a property from an erased value.
    pub fn set_erased(
        &mut self,
        node: NodeId,
        property: PropertyId,
        value: ErasedValue,
    ) -> Result<bool> {
        let data = self.nodes.get(node).ok_or(Error::DisposedNode(node))?;
        let registration = self
            .registry
            .get(property)
            .ok_or(Error::UnknownProperty(property))?;
        if registration.type_id() != value.type_id() {
            return Err(Error::TypeMismatch {
                property,
                expected: registration.type_name(),
                found: value.type_name(),
            });
        }
        let value = registration.coerce(value);
        let is_visual_link = property == self.visual_parent_prop.id();
        if is_visual_link || property == self.logical_parent_prop.id() {
            if is_visual_link && !data.is_visual() {
                return Err(Error::NotVisual(node));
            }
            if let Some(&Some(parent)) = value.downcast_ref::<Option<NodeId>>() {
                self.check_parent(node, parent, property)?;
            }
        }
        let old = match data.store.get_erased(property) {
            Some(current) => current.clone_value(),
            None => registration.default_value(),
        };
        if old == value {
            return Ok(false);
        }
        if let Some(data) = self.nodes.get_mut(node) {
            data.store.set_erased(property, value);
        }
        self.notify_slot(
            node,
            Slot::Property(property),
            &Notification::PropertyChanged {
                node,
                property,
                old,
            },
        );
        Ok(true)
    }

    /// Removes the local value of a property.
    ///
    /// Observers run if the effective value changes.
    pub fn clear_value(&mut self, node: NodeId, property: PropertyId) -> Result<bool> {
        let registration = self
            .registry
            .get(property)
            .ok_or(Error::UnknownProperty(property))?;
        let default = registration.default_value();
        let data = self.nodes.get_mut(node).ok_or(Error::DisposedNode(node))?;
        let Some(old) = data.store.clear(property) else {
            return Ok(false);
        };
        if old == default {
            return Ok(false);
        }
        self.notify_slot(
            node,
            Slot::Property(property),
            &Notification::PropertyChanged {
                node,
                property,
                old,
            },
        );
        Ok(true)
    }

    // --- Parent links ---

    pub(crate) fn link(&self, node: NodeId, relation: PropertyId) -> Option<NodeId> {
        self.nodes
            .get(node)?
            .store
            .get_erased(relation)?
            .downcast_ref::<Option<NodeId>>()
            .copied()
            .flatten()
    }

    /// Returns the logical parent handle of `node`. The handle may be stale.
    #[must_use]
    pub fn logical_parent(&self, node: NodeId) -> Option<NodeId> {
        self.link(node, self.logical_parent_prop.id())
    }

    /// Sets the logical parent of `node`.
    pub fn set_logical_parent(&mut self, node: NodeId, parent: Option<NodeId>) -> Result<bool> {
        self.set(node, self.logical_parent_prop, parent)
    }

    /// Returns the visual parent handle of `node`. The handle may be stale.
    #[must_use]
    pub fn visual_parent(&self, node: NodeId) -> Option<NodeId> {
        self.link(node, self.visual_parent_prop.id())
    }

    /// Sets the visual parent of `node`, which must be a visual node.
    pub fn set_visual_parent(&mut self, node: NodeId, parent: Option<NodeId>) -> Result<bool> {
        self.set(node, self.visual_parent_prop, parent)
    }

    /// Fails if `parent` is dead or if following `relation` upward from
    /// `parent` reaches `node`.
    pub(crate) fn check_parent(
        &self,
        node: NodeId,
        parent: NodeId,
        relation: PropertyId,
    ) -> Result<()> {
        if !self.contains(parent) {
            return Err(Error::DisposedNode(parent));
        }
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == node {
                return Err(Error::ParentCycle { node, parent });
            }
            cursor = self.link(current, relation);
        }
        Ok(())
    }

    // --- Name scopes ---

    /// Registers `name` for `node` in the name scope of `scope`.
    ///
    /// Returns the node previously registered under that name.
    pub fn register_name(
        &mut self,
        scope: NodeId,
        name: impl Into<String>,
        node: NodeId,
    ) -> Result<Option<NodeId>> {
        if !self.contains(node) {
            return Err(Error::DisposedNode(node));
        }
        let data = self.nodes.get_mut(scope).ok_or(Error::DisposedNode(scope))?;
        Ok(data
            .names
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), node))
    }

    /// Removes a name from the name scope of `scope`.
    pub fn unregister_name(&mut self, scope: NodeId, name: &str) -> Option<NodeId> {
        self.nodes.get_mut(scope)?.names.as_mut()?.remove(name)
    }

    /// Finds a named node in the scope of `start` or of its logical ancestors.
    #[must_use]
    pub fn find_name(&self, start: NodeId, name: &str) -> Option<NodeId> {
        let mut cursor = Some(start);
        while let Some(current) = cursor {
            let data = self.nodes.get(current)?;
            if let Some(&found) = data.names.as_ref().and_then(|n| n.get(name)) {
                if self.contains(found) {
                    return Some(found);
                }
            }
            cursor = self.logical_parent(current);
        }
        None
    }

    // --- Events ---

    /// Raises a named event on `node`.
    pub fn raise_event(&mut self, node: NodeId, name: &str) -> Result<()> {
        if !self.contains(node) {
            return Err(Error::DisposedNode(node));
        }
        self.notify_slot(
            node,
            Slot::Events,
            &Notification::Event {
                node,
                name: String::from(name),
            },
        );
        Ok(())
    }

    // --- Observation ---

    /// Attaches an observer to a change source of `node`.
    ///
    /// Attaching an equal observer again returns the existing ID.
    pub fn attach(&mut self, node: NodeId, slot: Slot, observer: Observer) -> Result<ObserverId> {
        let owner = observer.owner();
        if let Some(owner) = owner {
            if !self.contains(owner) {
                return Err(Error::DisposedNode(owner));
            }
        }
        let data = self.nodes.get_mut(node).ok_or(Error::DisposedNode(node))?;
        let id = data.observers.entry(slot).or_default().attach(observer);
        if let Some(owner_data) = owner.and_then(|o| self.nodes.get_mut(o)) {
            owner_data.subscriptions.push(Subscription::Slot {
                source: node,
                slot,
                id,
            });
        }
        Ok(id)
    }

    /// Detaches an observer. Stale nodes and unknown IDs are ignored.
    pub fn detach(&mut self, node: NodeId, slot: Slot, id: ObserverId) -> bool {
        let Some(data) = self.nodes.get_mut(node) else {
            return false;
        };
        let Some(list) = data.observers.get_mut(&slot) else {
            return false;
        };
        let removed = list.detach(id);
        if list.is_empty() {
            data.observers.remove(&slot);
        }
        removed
    }

    /// Attaches a callback to a change source of `source`.
    ///
    /// With an `owner`, the callback is detached when the owner is disposed.
    pub fn attach_handler(
        &mut self,
        owner: Option<NodeId>,
        source: NodeId,
        slot: Slot,
        f: impl Fn(&mut Self, &Notification) + 'static,
    ) -> Result<ObserverId> {
        let handler = Handler {
            owner,
            f: Rc::new(f),
        };
        self.attach(source, slot, Observer::Handler(handler))
    }

    /// Returns the number of observers attached to a change source.
    #[must_use]
    pub fn observer_count(&self, node: NodeId, slot: Slot) -> usize {
        self.nodes
            .get(node)
            .and_then(|n| n.observers.get(&slot))
            .map_or(0, Observers::len)
    }
}

impl fmt::Debug for ElementTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementTree")
            .field("config", &self.config)
            .field("properties", &self.registry.len())
            .field("types", &self.types.len())
            .field("nodes", &self.nodes.len())
            .field("bindings", &self.bindings.len())
            .field("triggers", &self.triggers.len())
            .field("skin", &self.skin.as_ref().map(SkinResources::name))
            .field("skin_observers", &self.skin_observers.len())
            .finish_non_exhaustive()
    }
}
