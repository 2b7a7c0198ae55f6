// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Type-erased property value storage.
//!
//! [`ErasedValue`] holds a property value of any `Clone + PartialEq + 'static`
//! type together with its type information, so heterogeneous values can live
//! in one store and still be compared for change suppression.

use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

/// A type-erased property value.
///
/// ```rust
/// use marquee_property::ErasedValue;
///
/// let value = ErasedValue::new(42_i32);
/// assert!(value.is::<i32>());
/// assert_eq!(value.downcast_ref::<i32>(), Some(&42));
/// assert!(value.value_eq(&ErasedValue::new(42_i32)));
/// assert!(!value.value_eq(&ErasedValue::new(42_i64)));
/// ```
pub struct ErasedValue {
    inner: Box<dyn ErasedValueTrait>,
    type_id: TypeId,
    type_name: &'static str,
}

impl ErasedValue {
    /// Creates a new erased value from a concrete value.
    #[must_use]
    pub fn new<T: Clone + PartialEq + 'static>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
            inner: Box::new(value),
        }
    }

    /// Returns the [`TypeId`] of the contained value.
    #[must_use]
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name of the contained value, for diagnostics.
    #[must_use]
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the contained value is of type `T`.
    #[must_use]
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Attempts to downcast to a reference of type `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if self.is::<T>() {
            self.inner.as_any().downcast_ref()
        } else {
            None
        }
    }

    /// Compares two values by value equality.
    ///
    /// Values of different types are never equal.
    #[must_use]
    pub fn value_eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.inner.eq_any(other.inner.as_any())
    }

    /// Clones the contained value into a new [`ErasedValue`].
    #[must_use]
    pub fn clone_value(&self) -> Self {
        Self {
            inner: self.inner.clone_boxed(),
            type_id: self.type_id,
            type_name: self.type_name,
        }
    }
}

impl Clone for ErasedValue {
    fn clone(&self) -> Self {
        self.clone_value()
    }
}

impl PartialEq for ErasedValue {
    fn eq(&self, other: &Self) -> bool {
        self.value_eq(other)
    }
}

impl fmt::Debug for ErasedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedValue")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Equality used for change detection.
///
/// Values that are unequal to themselves, such as NaN, count as equal to one
/// another, so writing one back over itself is not a change.
pub(crate) fn same_value<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b || (a.ne(a) && b.ne(b))
}

trait ErasedValueTrait: Any {
    fn as_any(&self) -> &dyn Any;
    fn eq_any(&self, other: &dyn Any) -> bool;
    fn clone_boxed(&self) -> Box<dyn ErasedValueTrait>;
}

impl<T: Clone + PartialEq + 'static> ErasedValueTrait for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_any(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<T>()
            .is_some_and(|other| same_value(self, other))
    }

    fn clone_boxed(&self) -> Box<dyn ErasedValueTrait> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::string::String;

    #[test]
    fn downcast_checks_type() {
        let value = ErasedValue::new(String::from("hello"));
        assert!(value.is::<String>());
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("hello"));
        assert_eq!(value.downcast_ref::<i32>(), None);
    }

    #[test]
    fn equality_is_by_value() {
        let a = ErasedValue::new(1.5_f64);
        let b = ErasedValue::new(1.5_f64);
        let c = ErasedValue::new(2.5_f64);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn nan_equals_nan() {
        let a = ErasedValue::new(f64::NAN);
        assert!(a.value_eq(&a.clone()));
        assert!(a.value_eq(&ErasedValue::new(-f64::NAN)));
        assert!(!a.value_eq(&ErasedValue::new(0.0_f64)));
        assert!(!ErasedValue::new(0.0_f64).value_eq(&a));
        assert!(!a.value_eq(&ErasedValue::new(f32::NAN)));
    }

    #[test]
    fn clone_is_independent() {
        let value = ErasedValue::new(alloc::vec![1_u8, 2, 3]);
        let copy = value.clone_value();
        assert_eq!(copy.downcast_ref::<alloc::vec::Vec<u8>>().map(|v| v.len()), Some(3));
        assert_eq!(copy, value);
    }

    #[test]
    fn debug_names_the_type() {
        let debug = format!("{:?}", ErasedValue::new(3_u32));
        assert!(debug.contains("u32"), "debug output should name the type: {debug}");
    }
}
