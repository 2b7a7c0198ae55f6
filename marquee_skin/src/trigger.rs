// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event triggers.
//!
//! A trigger listens for one named event on one node and runs an ordered
//! list of actions when it is raised. Triggers are owned by a node and are
//! copied and disposed with it.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use marquee_property::{ObserverId, Property};

use crate::error::{Error, Result};
use crate::id::{NodeId, TriggerId};
use crate::notify::{Notification, Observer, Slot};
use crate::tree::ElementTree;

/// Something a trigger does when its event fires.
pub trait TriggerAction {
    /// Runs the action. `element` is the node the event was raised on.
    fn execute(&self, tree: &mut ElementTree, element: NodeId) -> Result<()>;
}

impl<F> TriggerAction for F
where
    F: Fn(&mut ElementTree, NodeId) -> Result<()>,
{
    fn execute(&self, tree: &mut ElementTree, element: NodeId) -> Result<()> {
        self(tree, element)
    }
}

/// Sets a property of the element to a fixed value.
#[derive(Clone, Debug)]
pub struct SetterAction<T> {
    property: Property<T>,
    value: T,
}

impl<T> SetterAction<T> {
    /// Creates a setter.
    pub fn new(property: Property<T>, value: T) -> Self {
        Self { property, value }
    }
}

impl<T: Clone + PartialEq + 'static> TriggerAction for SetterAction<T> {
    fn execute(&self, tree: &mut ElementTree, element: NodeId) -> Result<()> {
        tree.set(element, self.property, self.value.clone()).map(|_| ())
    }
}

/// A named-event trigger.
pub struct EventTrigger {
    pub(crate) event: String,
    pub(crate) actions: Vec<Rc<dyn TriggerAction>>,
    pub(crate) attached: Option<(NodeId, ObserverId)>,
    pub(crate) owner: NodeId,
}

impl EventTrigger {
    /// The event name this trigger reacts to.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// The node the trigger is attached to.
    #[must_use]
    pub fn attached_to(&self) -> Option<NodeId> {
        self.attached.map(|(node, _)| node)
    }

    /// The owning node.
    #[must_use]
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Number of actions.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }
}

impl fmt::Debug for EventTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTrigger")
            .field("event", &self.event)
            .field("actions", &self.actions.len())
            .field("attached", &self.attached)
            .field("owner", &self.owner)
            .finish()
    }
}

impl ElementTree {
    /// Creates a trigger owned by `owner` and attached to it.
    pub fn create_trigger(&mut self, owner: NodeId, event: impl Into<String>) -> Result<TriggerId> {
        let data = self.nodes.get_mut(owner).ok_or(Error::DisposedNode(owner))?;
        let id = self.triggers.insert(EventTrigger {
            event: event.into(),
            actions: Vec::new(),
            attached: None,
            owner,
        });
        data.triggers.push(id);
        self.attach_trigger(id, owner)?;
        Ok(id)
    }

    /// Returns a trigger.
    #[must_use]
    pub fn trigger(&self, id: TriggerId) -> Option<&EventTrigger> {
        self.triggers.get(id)
    }

    /// Appends an action.
    pub fn add_trigger_action(
        &mut self,
        id: TriggerId,
        action: impl TriggerAction + 'static,
    ) -> Result<()> {
        let trigger = self.triggers.get_mut(id).ok_or(Error::StaleTrigger(id))?;
        trigger.actions.push(Rc::new(action));
        Ok(())
    }

    /// Changes the event name.
    pub fn set_trigger_event(&mut self, id: TriggerId, event: impl Into<String>) -> Result<()> {
        let trigger = self.triggers.get_mut(id).ok_or(Error::StaleTrigger(id))?;
        trigger.event = event.into();
        Ok(())
    }

    /// Attaches a trigger to the events of `node`, detaching it from its
    /// previous node first.
    pub fn attach_trigger(&mut self, id: TriggerId, node: NodeId) -> Result<()> {
        if !self.triggers.contains(id) {
            return Err(Error::StaleTrigger(id));
        }
        if !self.contains(node) {
            return Err(Error::DisposedNode(node));
        }
        self.detach_trigger(id);
        let observer = self.attach(node, Slot::Events, Observer::Trigger(id))?;
        if let Some(trigger) = self.triggers.get_mut(id) {
            trigger.attached = Some((node, observer));
        }
        Ok(())
    }

    /// Detaches a trigger from its node. Returns `false` if it was not attached.
    pub fn detach_trigger(&mut self, id: TriggerId) -> bool {
        let Some((node, observer)) = self.triggers.get_mut(id).and_then(|t| t.attached.take())
        else {
            return false;
        };
        self.detach(node, Slot::Events, observer);
        true
    }

    /// Removes a trigger. Returns `false` for a stale trigger.
    pub fn remove_trigger(&mut self, id: TriggerId) -> bool {
        let Some(trigger) = self.free_trigger(id) else {
            return false;
        };
        if let Some(data) = self.nodes.get_mut(trigger.owner) {
            data.triggers.retain(|t| *t != id);
        }
        true
    }

    pub(crate) fn free_trigger(&mut self, id: TriggerId) -> Option<EventTrigger> {
        self.detach_trigger(id);
        self.triggers.remove(id)
    }

    pub(crate) fn on_trigger_notification(&mut self, id: TriggerId, notification: &Notification) {
        let Notification::Event { node, name } = notification else {
            return;
        };
        let Some(trigger) = self.triggers.get(id) else {
            return;
        };
        if trigger.attached_to() != Some(*node) || trigger.event != *name {
            return;
        }
        let actions = trigger.actions.clone();
        for action in actions {
            if let Err(err) = action.execute(self, *node) {
                tracing::warn!(?id, event = name.as_str(), %err, "trigger action failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementTypeId, PropertyMetadataBuilder};
    use core::cell::RefCell;

    #[test]
    fn actions_run_in_order_on_matching_event() {
        let mut tree = ElementTree::new();
        let node = tree.create(ElementTypeId::ELEMENT).unwrap();
        let trigger = tree.create_trigger(node, "GotFocus").unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second"] {
            let log = log.clone();
            tree.add_trigger_action(trigger, move |_: &mut ElementTree, _: NodeId| -> Result<()> {
                log.borrow_mut().push(tag);
                Ok(())
            })
            .unwrap();
        }

        tree.raise_event(node, "LostFocus").unwrap();
        assert!(log.borrow().is_empty());
        tree.raise_event(node, "GotFocus").unwrap();
        assert_eq!(*log.borrow(), ["first", "second"]);
    }

    #[test]
    fn setter_action_writes_element() {
        let mut tree = ElementTree::new();
        let selected =
            tree.register_property("Selected", PropertyMetadataBuilder::new(false).build());
        let node = tree.create(ElementTypeId::ELEMENT).unwrap();
        let trigger = tree.create_trigger(node, "Click").unwrap();
        tree.add_trigger_action(trigger, SetterAction::new(selected, true)).unwrap();

        tree.raise_event(node, "Click").unwrap();
        assert!(tree.get(node, selected).unwrap());
    }

    #[test]
    fn reattaching_moves_the_subscription() {
        let mut tree = ElementTree::new();
        let a = tree.create(ElementTypeId::ELEMENT).unwrap();
        let b = tree.create(ElementTypeId::ELEMENT).unwrap();
        let trigger = tree.create_trigger(a, "Click").unwrap();
        let hits = Rc::new(RefCell::new(Vec::new()));
        let log = hits.clone();
        tree.add_trigger_action(trigger, move |_: &mut ElementTree, element: NodeId| -> Result<()> {
            log.borrow_mut().push(element);
            Ok(())
        })
        .unwrap();

        tree.attach_trigger(trigger, b).unwrap();
        assert_eq!(tree.observer_count(a, Slot::Events), 0);
        tree.raise_event(a, "Click").unwrap();
        tree.raise_event(b, "Click").unwrap();
        assert_eq!(*hits.borrow(), [b]);
        assert_eq!(tree.trigger(trigger).unwrap().attached_to(), Some(b));
    }

    #[test]
    fn failing_action_does_not_stop_the_rest() {
        let mut tree = ElementTree::new();
        let node = tree.create(ElementTypeId::ELEMENT).unwrap();
        let trigger = tree.create_trigger(node, "Click").unwrap();
        let ran = Rc::new(RefCell::new(false));
        let flag = ran.clone();
        tree.add_trigger_action(trigger, |_: &mut ElementTree, element: NodeId| -> Result<()> {
            Err(Error::NotVisual(element))
        })
        .unwrap();
        tree.add_trigger_action(trigger, move |_: &mut ElementTree, _: NodeId| -> Result<()> {
            *flag.borrow_mut() = true;
            Ok(())
        })
        .unwrap();

        tree.raise_event(node, "Click").unwrap();
        assert!(*ran.borrow());
    }

    #[test]
    fn triggers_die_with_owner() {
        let mut tree = ElementTree::new();
        let owner = tree.create(ElementTypeId::ELEMENT).unwrap();
        let target = tree.create(ElementTypeId::ELEMENT).unwrap();
        let trigger = tree.create_trigger(owner, "Click").unwrap();
        tree.attach_trigger(trigger, target).unwrap();

        tree.dispose(owner);
        assert!(tree.trigger(trigger).is_none());
        assert_eq!(tree.observer_count(target, Slot::Events), 0);
        assert!(!tree.remove_trigger(trigger));
    }
}
