// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property metadata definitions.
//!
//! [`PropertyMetadata`] stores a property's default value, its coercion
//! callback and its [`CopyPolicy`]; [`PropertyMetadataBuilder`] constructs it.

use alloc::boxed::Box;

/// Callback for coercing a property value before it's stored.
///
/// The callback receives the proposed value and returns the value to store.
pub type CoerceValueCallback<T> = Box<dyn Fn(T) -> T>;

/// How a property value that references another node is treated when the
/// owning node is cloned.
///
/// Only meaningful for node-reference properties; plain values are always
/// copied by value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CopyPolicy {
    /// The referenced node is part of the owner's content and is cloned
    /// along with it.
    #[default]
    Deep,
    /// The referenced node is external or shared. The copy keeps pointing at
    /// the same node, unless that node is itself part of the cloned subtree,
    /// in which case the copy points at its clone.
    Shallow,
}

/// Metadata for a dependency property.
///
/// ```rust
/// use marquee_property::{CopyPolicy, PropertyMetadataBuilder};
///
/// let metadata = PropertyMetadataBuilder::new(1.0_f64)
///     .coerce(|v| v.clamp(0.0, 1.0))
///     .build();
///
/// assert_eq!(metadata.default_value(), &1.0);
/// assert_eq!(metadata.coerce(4.0), 1.0);
/// assert_eq!(metadata.copy_policy(), CopyPolicy::Deep);
/// ```
pub struct PropertyMetadata<T: Clone + 'static> {
    default_value: T,
    copy_policy: CopyPolicy,
    coerce_callback: Option<CoerceValueCallback<T>>,
}

impl<T: Clone + 'static> PropertyMetadata<T> {
    /// Creates new property metadata with the given default value, the
    /// [`CopyPolicy::Deep`] policy and no coercion.
    #[must_use]
    pub fn new(default_value: T) -> Self {
        Self {
            default_value,
            copy_policy: CopyPolicy::Deep,
            coerce_callback: None,
        }
    }

    /// Returns a reference to the default value.
    #[must_use]
    #[inline]
    pub fn default_value(&self) -> &T {
        &self.default_value
    }

    /// Returns the copy policy used when the owner is cloned.
    #[must_use]
    #[inline]
    pub fn copy_policy(&self) -> CopyPolicy {
        self.copy_policy
    }

    /// Coerces a value using the coerce callback if one is set.
    #[inline]
    pub fn coerce(&self, value: T) -> T {
        if let Some(callback) = &self.coerce_callback {
            callback(value)
        } else {
            value
        }
    }

    /// Returns whether a coerce callback is set.
    #[must_use]
    #[inline]
    pub fn has_coerce_callback(&self) -> bool {
        self.coerce_callback.is_some()
    }
}

impl<T: Clone + core::fmt::Debug + 'static> core::fmt::Debug for PropertyMetadata<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyMetadata")
            .field("default_value", &self.default_value)
            .field("copy_policy", &self.copy_policy)
            .field("has_coerce_callback", &self.coerce_callback.is_some())
            .finish()
    }
}

/// Builder for [`PropertyMetadata`].
pub struct PropertyMetadataBuilder<T: Clone + 'static> {
    default_value: T,
    copy_policy: CopyPolicy,
    coerce_callback: Option<CoerceValueCallback<T>>,
}

impl<T: Clone + core::fmt::Debug + 'static> core::fmt::Debug for PropertyMetadataBuilder<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyMetadataBuilder")
            .field("default_value", &self.default_value)
            .field("copy_policy", &self.copy_policy)
            .field("has_coerce_callback", &self.coerce_callback.is_some())
            .finish()
    }
}

impl<T: Clone + 'static> PropertyMetadataBuilder<T> {
    /// Creates a new builder with the given default value.
    #[must_use]
    pub fn new(default_value: T) -> Self {
        Self {
            default_value,
            copy_policy: CopyPolicy::Deep,
            coerce_callback: None,
        }
    }

    /// Sets the copy policy applied when the owner is cloned.
    #[must_use]
    pub fn copy_policy(mut self, policy: CopyPolicy) -> Self {
        self.copy_policy = policy;
        self
    }

    /// Sets a callback to coerce values before they are stored.
    ///
    /// Coercion runs before the equality check, so a write that coerces to
    /// the current value does not notify.
    #[must_use]
    pub fn coerce<F>(mut self, callback: F) -> Self
    where
        F: Fn(T) -> T + 'static,
    {
        self.coerce_callback = Some(Box::new(callback));
        self
    }

    /// Builds the [`PropertyMetadata`].
    #[must_use]
    pub fn build(self) -> PropertyMetadata<T> {
        PropertyMetadata {
            default_value: self.default_value,
            copy_policy: self.copy_policy,
            coerce_callback: self.coerce_callback,
        }
    }
}
