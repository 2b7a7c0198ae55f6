// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered observer lists.
//!
//! [`Observers`] is the change-notification list attached to every change
//! source (a property slot, a resource dictionary, the skin registry). It is
//! an ordered set: attaching an equal handler twice yields the same
//! [`ObserverId`], and detaching is idempotent.
//!
//! Dispatch never iterates the live list. Callers take a [`snapshot`] first
//! and invoke the snapshot, so handlers may attach or detach (or write
//! the property again) while a notification is in flight.
//!
//! [`snapshot`]: Observers::snapshot

use smallvec::SmallVec;

use crate::id::ObserverId;

/// An ordered set of observer handlers.
///
/// ```rust
/// use marquee_property::Observers;
///
/// let mut observers = Observers::new();
/// let a = observers.attach('a');
/// let b = observers.attach('b');
/// assert_eq!(observers.attach('a'), a);
///
/// let snapshot = observers.snapshot();
/// observers.detach(a);
/// observers.detach(a);
/// assert_eq!(snapshot.as_slice(), &['a', 'b']);
/// assert_eq!(observers.snapshot().as_slice(), &['b']);
/// assert!(observers.contains(b));
/// ```
#[derive(Clone, Debug)]
pub struct Observers<H> {
    entries: SmallVec<[(ObserverId, H); 2]>,
    next_id: u32,
}

impl<H> Default for Observers<H> {
    fn default() -> Self {
        Self {
            entries: SmallVec::new(),
            next_id: 0,
        }
    }
}

impl<H> Observers<H> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing is attached.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of attached handlers.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if `id` is currently attached.
    #[must_use]
    pub fn contains(&self, id: ObserverId) -> bool {
        self.entries.iter().any(|(eid, _)| *eid == id)
    }

    /// Detaches the handler with the given ID.
    ///
    /// Returns `false` if it was not attached; that is not an error.
    pub fn detach(&mut self, id: ObserverId) -> bool {
        match self.entries.iter().position(|(eid, _)| *eid == id) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Detaches every handler matching `predicate` and returns how many were removed.
    pub fn detach_where(&mut self, mut predicate: impl FnMut(&H) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(_, h)| !predicate(h));
        before - self.entries.len()
    }

    /// Detaches all handlers.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates attached handlers in attachment order.
    pub fn iter(&self) -> impl Iterator<Item = (ObserverId, &H)> + '_ {
        self.entries.iter().map(|(id, h)| (*id, h))
    }
}

impl<H: Clone + PartialEq> Observers<H> {
    /// Attaches a handler and returns its ID.
    ///
    /// If an equal handler is already attached, its existing ID is returned
    /// and the order is unchanged.
    pub fn attach(&mut self, handler: H) -> ObserverId {
        if let Some((id, _)) = self.entries.iter().find(|(_, h)| *h == handler) {
            return *id;
        }
        let id = ObserverId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push((id, handler));
        id
    }

    /// Detaches a handler by equality.
    pub fn detach_handler(&mut self, handler: &H) -> bool {
        self.detach_where(|h| h == handler) > 0
    }

    /// Returns a copy of the attached handlers in attachment order.
    #[must_use]
    pub fn snapshot(&self) -> SmallVec<[H; 4]> {
        self.entries.iter().map(|(_, h)| h.clone()).collect()
    }
}
