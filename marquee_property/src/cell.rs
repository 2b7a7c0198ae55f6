// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Standalone reactive value cells.
//!
//! [`PropertyCell`] is a reactive property that lives outside the element
//! tree, for view models, settings objects and other collaborators that
//! expose observable values to the skin.

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use crate::id::ObserverId;
use crate::observers::Observers;
use crate::value::same_value;

/// Observer callback of a [`PropertyCell`]: receives the cell and the value
/// it held before the write.
pub type CellCallback<T> = Rc<dyn Fn(&PropertyCell<T>, &T)>;

struct Callback<T>(CellCallback<T>);

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> PartialEq for Callback<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// A single reactive value with equality-based change suppression.
///
/// Writing a value equal to the current one is a no-op. Any other write
/// stores the value and then synchronously invokes every attached observer
/// in attachment order, passing the previous value. Observers run over a
/// snapshot of the list, and may write the cell again.
///
/// ```rust
/// use core::cell::Cell;
/// use std::rc::Rc;
/// use marquee_property::PropertyCell;
///
/// let volume = PropertyCell::new(10_u8);
/// let fired = Rc::new(Cell::new(0));
/// let counter = fired.clone();
/// volume.attach_fn(move |_, _old| counter.set(counter.get() + 1));
///
/// volume.set(10);
/// assert_eq!(fired.get(), 0);
/// volume.set(11);
/// assert_eq!(fired.get(), 1);
/// ```
pub struct PropertyCell<T> {
    value: RefCell<T>,
    observers: RefCell<Observers<Callback<T>>>,
}

impl<T: Clone + PartialEq> PropertyCell<T> {
    /// Creates a cell holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
            observers: RefCell::new(Observers::new()),
        }
    }

    /// Returns a copy of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Runs `f` with a reference to the current value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Writes a value. Returns `true` if it differed and observers ran.
    pub fn set(&self, value: T) -> bool {
        let old = {
            let mut current = self.value.borrow_mut();
            if same_value(&*current, &value) {
                return false;
            }
            core::mem::replace(&mut *current, value)
        };
        let snapshot = self.observers.borrow().snapshot();
        for callback in snapshot {
            (callback.0)(self, &old);
        }
        true
    }

    /// Attaches a callback. Attaching the same `Rc` again returns the same ID.
    pub fn attach(&self, callback: CellCallback<T>) -> ObserverId {
        self.observers.borrow_mut().attach(Callback(callback))
    }

    /// Attaches a closure.
    pub fn attach_fn(&self, callback: impl Fn(&Self, &T) + 'static) -> ObserverId
    where
        T: 'static,
    {
        self.attach(Rc::new(callback))
    }

    /// Detaches a callback by ID. Unknown IDs are ignored.
    pub fn detach(&self, id: ObserverId) -> bool {
        self.observers.borrow_mut().detach(id)
    }

    /// Detaches a callback by identity. Unknown callbacks are ignored.
    pub fn detach_callback(&self, callback: &CellCallback<T>) -> bool {
        self.observers
            .borrow_mut()
            .detach_handler(&Callback(callback.clone()))
    }

    /// Returns the number of attached observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }
}

impl<T: Clone + PartialEq + Default> Default for PropertyCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for PropertyCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyCell")
            .field("value", &self.value.borrow())
            .field("observers", &self.observers.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use core::cell::Cell;

    #[test]
    fn equal_write_fires_nothing() {
        let cell = PropertyCell::new(5_i32);
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        cell.attach_fn(move |_, _| counter.set(counter.get() + 1));

        assert!(!cell.set(cell.get()));
        assert_eq!(fired.get(), 0);
    }

    #[test]
    fn nan_written_over_nan_fires_nothing() {
        let cell = PropertyCell::new(f64::NAN);
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        cell.attach_fn(move |_, _| counter.set(counter.get() + 1));

        assert!(!cell.set(cell.get()));
        assert!(cell.set(1.0));
        assert!(cell.set(f64::NAN));
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn observers_receive_previous_value_in_order() {
        let cell = PropertyCell::new(1_i32);
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ['a', 'b'] {
            let log = log.clone();
            cell.attach_fn(move |c, old| log.borrow_mut().push((tag, *old, c.get())));
        }

        cell.set(2);
        assert_eq!(*log.borrow(), [('a', 1, 2), ('b', 1, 2)]);
    }

    #[test]
    fn detach_is_idempotent() {
        let cell = PropertyCell::new(0_u8);
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let callback: CellCallback<u8> =
            Rc::new(move |_: &PropertyCell<u8>, _: &u8| counter.set(counter.get() + 1));
        let id = cell.attach(callback.clone());
        assert_eq!(cell.attach(callback.clone()), id);

        assert!(cell.detach(id));
        assert!(!cell.detach(id));
        assert!(!cell.detach_callback(&callback));
        cell.set(1);
        assert_eq!(fired.get(), 0);
    }

    #[test]
    fn reentrant_writes_are_tolerated() {
        // Clamp observer: writes the cell again from inside dispatch.
        let cell = Rc::new(PropertyCell::new(0_i32));
        cell.attach_fn(|c, _| {
            if c.get() > 10 {
                c.set(10);
            }
        });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        cell.attach_fn(move |c, old| log.borrow_mut().push((*old, c.get())));

        cell.set(50);
        assert_eq!(cell.get(), 10);
        // The nested write's observers ran first, then the outer write's
        // second observer saw the settled value.
        assert_eq!(*seen.borrow(), [(50, 10), (0, 10)]);
    }

    #[test]
    fn attach_during_dispatch_does_not_run_in_same_fire() {
        let cell = Rc::new(PropertyCell::new(0_u8));
        let late = Rc::new(Cell::new(0));
        let late_counter = late.clone();
        cell.attach_fn(move |c, _| {
            let counter = late_counter.clone();
            c.attach_fn(move |_, _| counter.set(counter.get() + 1));
        });

        cell.set(1);
        assert_eq!(late.get(), 0);
        cell.set(2);
        assert_eq!(late.get(), 1);
    }
}
