// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine errors.

use alloc::string::String;
use core::fmt;

use marquee_property::PropertyId;

use crate::id::{BindingId, ElementTypeId, NodeId, TriggerId};

/// Broad classification of an [`Error`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The operation touched a disposed or otherwise unusable object.
    InvalidState,
    /// A required setting is missing or a relation would become invalid.
    InvalidConfiguration,
    /// A setting named a mode with no implementation.
    NotImplemented,
    /// A value did not match the registered type of its property.
    TypeMismatch,
}

/// An error returned by an [`ElementTree`](crate::ElementTree) operation.
///
/// Failed operations leave the tree as it was before the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The node handle is stale: the node was disposed.
    DisposedNode(NodeId),
    /// The binding was removed or its owner disposed.
    StaleBinding(BindingId),
    /// The trigger was removed or its owner disposed.
    StaleTrigger(TriggerId),
    /// The element type was never registered.
    UnknownElementType(ElementTypeId),
    /// The node does not take part in the visual tree.
    NotVisual(NodeId),
    /// The node has no local resource dictionary.
    NoResources(NodeId),
    /// Setting `parent` as a parent of `node` would close a cycle.
    ParentCycle {
        /// The node whose parent was being set.
        node: NodeId,
        /// The rejected parent.
        parent: NodeId,
    },
    /// The binding was activated without a resource key.
    MissingResourceKey(BindingId),
    /// The property was never registered.
    UnknownProperty(PropertyId),
    /// A value of type `found` was written to a property of type `expected`.
    TypeMismatch {
        /// The property being written or read.
        property: PropertyId,
        /// The registered value type.
        expected: &'static str,
        /// The offending value type.
        found: &'static str,
    },
    /// `setting` was given a value with no implementation.
    NotImplemented {
        /// Which setting was being parsed.
        setting: &'static str,
        /// The unsupported value.
        value: String,
    },
}

impl Error {
    /// Returns the classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DisposedNode(_)
            | Self::StaleBinding(_)
            | Self::StaleTrigger(_)
            | Self::NotVisual(_)
            | Self::NoResources(_) => ErrorKind::InvalidState,
            Self::UnknownElementType(_)
            | Self::ParentCycle { .. }
            | Self::MissingResourceKey(_)
            | Self::UnknownProperty(_) => ErrorKind::InvalidConfiguration,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::NotImplemented { .. } => ErrorKind::NotImplemented,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DisposedNode(id) => write!(f, "node {id:?} is disposed"),
            Self::StaleBinding(id) => write!(f, "binding {id:?} no longer exists"),
            Self::StaleTrigger(id) => write!(f, "trigger {id:?} no longer exists"),
            Self::UnknownElementType(id) => write!(f, "element type {id:?} is not registered"),
            Self::NotVisual(id) => write!(f, "node {id:?} is not part of the visual tree"),
            Self::NoResources(id) => write!(f, "node {id:?} has no resource dictionary"),
            Self::ParentCycle { node, parent } => {
                write!(f, "making {parent:?} the parent of {node:?} would create a cycle")
            }
            Self::MissingResourceKey(id) => {
                write!(f, "binding {id:?} cannot be activated without a resource key")
            }
            Self::UnknownProperty(id) => write!(f, "property {id} is not registered"),
            Self::TypeMismatch {
                property,
                expected,
                found,
            } => write!(f, "property {property} holds {expected}, got {found}"),
            Self::NotImplemented { setting, value } => {
                write!(f, "{setting} value {value:?} is not implemented")
            }
        }
    }
}

impl core::error::Error for Error {}

/// Result alias for fallible tree operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn kinds_follow_variants() {
        let node = NodeId(0, 1);
        assert_eq!(Error::DisposedNode(node).kind(), ErrorKind::InvalidState);
        assert_eq!(
            Error::MissingResourceKey(BindingId(0, 1)).kind(),
            ErrorKind::InvalidConfiguration
        );
        let err = Error::NotImplemented {
            setting: "search mode",
            value: "Sideways".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::NotImplemented);
        assert_eq!(
            err.to_string(),
            "search mode value \"Sideways\" is not implemented"
        );
    }
}
