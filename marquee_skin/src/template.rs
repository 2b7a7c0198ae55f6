// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Template instantiation helpers.
//!
//! A template is an ordinary subtree that is never shown itself. Hosts stamp
//! out copies of it with [`ElementTree::instantiate_template`] and install
//! them with [`ElementTree::set_template_control`]. The copy is owned by the
//! host and hangs below it in the visual tree, while its logical parent is
//! cut so that it does not point back into the tree that defined the
//! template.

use crate::error::{Error, Result};
use crate::id::{ElementTypeId, NodeId};
use crate::node::NodeFlags;
use crate::tree::ElementTree;

impl ElementTree {
    /// Produces a live copy of `template` with its logical parent cut and its
    /// bindings activated.
    pub fn instantiate_template(&mut self, template: NodeId) -> Result<NodeId> {
        self.deep_copy(template, true)
    }

    /// Returns the control currently installed in `host`.
    #[must_use]
    pub fn template_control(&self, host: NodeId) -> Option<NodeId> {
        self.nodes.get(host)?.template_control
    }

    /// Installs `control` as the template control of `host`.
    ///
    /// The previous control is disposed. The new one is adopted by `host`,
    /// gets `host` as its visual parent and takes over the element state of
    /// `host`. Passing `None` only disposes the previous control.
    pub fn set_template_control(&mut self, host: NodeId, control: Option<NodeId>) -> Result<()> {
        if !self.contains(host) {
            return Err(Error::DisposedNode(host));
        }
        let previous = self.template_control(host);
        if previous == control {
            return Ok(());
        }
        if let Some(control) = control {
            if !self.contains(control) {
                return Err(Error::DisposedNode(control));
            }
            if !self.flags(control).is_some_and(|f| f.contains(NodeFlags::VISUAL)) {
                return Err(Error::NotVisual(control));
            }
            self.check_parent(control, host, self.visual_parent_prop.id())?;
            self.check_adopt(host, control)?;
        }

        if let Some(previous) = previous {
            self.dispose(previous);
        }
        let Some(control) = control else {
            return Ok(());
        };
        self.adopt(host, control)?;
        self.set_visual_parent(control, Some(host))?;
        self.set_element_state(control, self.element_state(host))?;
        if let Some(data) = self.nodes.get_mut(host) {
            data.template_control = Some(control);
        }
        tracing::trace!(?host, ?control, "template control installed");
        Ok(())
    }

    /// Creates an item container for an items control.
    ///
    /// The container is a child of `owner`, shares its element state and, if
    /// `item_template` is given, hosts a fresh instance of it. Nothing is left
    /// behind on failure.
    pub fn prepare_item_container(
        &mut self,
        owner: NodeId,
        ty: ElementTypeId,
        item_template: Option<NodeId>,
    ) -> Result<NodeId> {
        if !self.contains(owner) {
            return Err(Error::DisposedNode(owner));
        }
        let container = self.create(ty)?;
        match self.fill_item_container(owner, container, item_template) {
            Ok(()) => Ok(container),
            Err(err) => {
                self.dispose(container);
                Err(err)
            }
        }
    }

    fn fill_item_container(
        &mut self,
        owner: NodeId,
        container: NodeId,
        item_template: Option<NodeId>,
    ) -> Result<()> {
        self.add_child(owner, container)?;
        self.set_element_state(container, self.element_state(owner))?;
        if let Some(template) = item_template {
            let control = self.instantiate_template(template)?;
            if let Err(err) = self.set_template_control(container, Some(control)) {
                self.dispose(control);
                return Err(err);
            }
        }
        Ok(())
    }
}
