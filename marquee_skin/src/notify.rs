// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change sources, notifications and observers.

use alloc::rc::Rc;
use alloc::string::String;
use core::fmt;

use marquee_property::{ErasedValue, PropertyId};

use crate::id::{BindingId, NodeId, TriggerId};
use crate::tree::ElementTree;

/// A change source on a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Writes to one property.
    Property(PropertyId),
    /// Mutations of the node's local resource dictionary.
    Resources,
    /// Named events raised on the node.
    Events,
}

/// What an observer is told when its source changes.
#[derive(Clone, Debug)]
pub enum Notification {
    /// `property` of `node` now differs from `old`.
    PropertyChanged {
        /// The written node.
        node: NodeId,
        /// The written property.
        property: PropertyId,
        /// The effective value before the write.
        old: ErasedValue,
    },
    /// The local dictionary of `node` changed.
    ResourcesChanged {
        /// The owner of the dictionary.
        node: NodeId,
        /// The affected key, or `None` for a bulk change.
        key: Option<String>,
    },
    /// The skin registry was replaced or unloaded.
    SkinChanged,
    /// `node` raised an event.
    Event {
        /// The raising node.
        node: NodeId,
        /// The event name.
        name: String,
    },
}

/// Callback type of a [`Handler`].
pub type HandlerFn = Rc<dyn Fn(&mut ElementTree, &Notification)>;

/// A callback observer, optionally tied to the node that installed it.
///
/// A handler whose owner has been disposed is skipped, and disposing the
/// owner detaches every handler it installed through
/// [`ElementTree::attach_handler`].
#[derive(Clone)]
pub struct Handler {
    pub(crate) owner: Option<NodeId>,
    pub(crate) f: HandlerFn,
}

impl Handler {
    /// Creates a handler not tied to any node.
    pub fn new(f: impl Fn(&mut ElementTree, &Notification) + 'static) -> Self {
        Self {
            owner: None,
            f: Rc::new(f),
        }
    }

    /// Creates a handler owned by `owner`.
    pub fn owned_by(owner: NodeId, f: impl Fn(&mut ElementTree, &Notification) + 'static) -> Self {
        Self {
            owner: Some(owner),
            f: Rc::new(f),
        }
    }

    /// Returns the owning node.
    #[must_use]
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    pub(crate) fn call(&self, tree: &mut ElementTree, notification: &Notification) {
        (self.f)(tree, notification);
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && Rc::ptr_eq(&self.f, &other.f)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// An entry in an observer list.
#[derive(Clone, Debug, PartialEq)]
pub enum Observer {
    /// Re-evaluates a binding.
    Binding(BindingId),
    /// Offers the notification to an event trigger.
    Trigger(TriggerId),
    /// Runs a callback.
    Handler(Handler),
}

impl Observer {
    /// Returns the node whose disposal should detach this observer.
    pub(crate) fn owner(&self) -> Option<NodeId> {
        match self {
            Self::Handler(h) => h.owner,
            Self::Binding(_) | Self::Trigger(_) => None,
        }
    }
}

impl ElementTree {
    pub(crate) fn deliver(&mut self, observer: Observer, notification: &Notification) {
        match observer {
            Observer::Binding(id) => self.on_binding_source_changed(id),
            Observer::Trigger(id) => self.on_trigger_notification(id, notification),
            Observer::Handler(handler) => {
                if handler.owner.is_some_and(|owner| !self.contains(owner)) {
                    return;
                }
                handler.call(self, notification);
            }
        }
    }

    /// Dispatches `notification` to a snapshot of the observers of `slot`.
    pub(crate) fn notify_slot(&mut self, node: NodeId, slot: Slot, notification: &Notification) {
        let Some(snapshot) = self
            .nodes
            .get(node)
            .and_then(|data| data.observers.get(&slot))
            .map(|list| list.snapshot())
        else {
            return;
        };
        for observer in snapshot {
            self.deliver(observer, notification);
        }
    }

    pub(crate) fn notify_skin(&mut self) {
        let snapshot = self.skin_observers.snapshot();
        for observer in snapshot {
            self.deliver(observer, &Notification::SkinChanged);
        }
    }
}
