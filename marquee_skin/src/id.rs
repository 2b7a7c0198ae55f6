// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handles for nodes, bindings, triggers and element types, plus the
//! generational arena that backs them.

use alloc::vec::Vec;
use core::marker::PhantomData;

/// Identifier for a node in an [`ElementTree`](crate::ElementTree).
///
/// A small, copyable handle made of a slot index and a generation counter.
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On dispose, the slot is freed; any `NodeId` that pointed at it is stale.
/// - On reuse of a freed slot, its generation is incremented, so a stale
///   `NodeId` never aliases a different live node.
///
/// Parent links hold `NodeId`s, never ownership, so the order in which a
/// tree is torn down does not matter: a link to a disposed node simply stops
/// resolving.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

/// Identifier for a dynamic resource binding.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct BindingId(pub(crate) u32, pub(crate) u32);

/// Identifier for an event trigger.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TriggerId(pub(crate) u32, pub(crate) u32);

/// Identifier for a registered [`ElementType`](crate::ElementType).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ElementTypeId(pub(crate) u16);

impl ElementTypeId {
    /// Built-in visual element with a local resource dictionary.
    pub const ELEMENT: Self = Self(0);
    /// Built-in plain dependency object: no visual parent, no resources.
    pub const OBJECT: Self = Self(1);

    /// Returns the registration index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u16 {
        self.0
    }
}

pub(crate) trait ArenaKey: Copy {
    fn from_parts(idx: u32, generation: u32) -> Self;
    fn idx(self) -> usize;
    fn generation(self) -> u32;
}

macro_rules! arena_key {
    ($($ty:ident),*) => {$(
        impl ArenaKey for $ty {
            #[inline]
            fn from_parts(idx: u32, generation: u32) -> Self {
                Self(idx, generation)
            }

            #[inline]
            fn idx(self) -> usize {
                self.0 as usize
            }

            #[inline]
            fn generation(self) -> u32 {
                self.1
            }
        }
    )*};
}

arena_key!(NodeId, BindingId, TriggerId);

#[derive(Debug)]
struct Entry<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage with free-list reuse and generation checks.
#[derive(Debug)]
pub(crate) struct Arena<K, T> {
    slots: Vec<Entry<T>>,
    free: Vec<u32>,
    live: usize,
    _key: PhantomData<fn() -> K>,
}

impl<K, T> Default for Arena<K, T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            _key: PhantomData,
        }
    }
}

impl<K: ArenaKey, T> Arena<K, T> {
    pub(crate) fn insert(&mut self, value: T) -> K {
        self.live += 1;
        if let Some(idx) = self.free.pop() {
            let entry = &mut self.slots[idx as usize];
            entry.generation = entry.generation.wrapping_add(1);
            entry.value = Some(value);
            return K::from_parts(idx, entry.generation);
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "more than u32::MAX live slots is not supported"
        )]
        let idx = self.slots.len() as u32;
        self.slots.push(Entry {
            generation: 1,
            value: Some(value),
        });
        K::from_parts(idx, 1)
    }

    pub(crate) fn get(&self, key: K) -> Option<&T> {
        self.slots
            .get(key.idx())
            .filter(|e| e.generation == key.generation())
            .and_then(|e| e.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.slots
            .get_mut(key.idx())
            .filter(|e| e.generation == key.generation())
            .and_then(|e| e.value.as_mut())
    }

    pub(crate) fn contains(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    pub(crate) fn remove(&mut self, key: K) -> Option<T> {
        let entry = self
            .slots
            .get_mut(key.idx())
            .filter(|e| e.generation == key.generation())?;
        let value = entry.value.take()?;
        #[expect(clippy::cast_possible_truncation, reason = "slot indices fit in u32")]
        self.free.push(key.idx() as u32);
        self.live -= 1;
        Some(value)
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }

    /// Iterates live entries in slot order.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(idx, e)| {
            #[expect(clippy::cast_possible_truncation, reason = "slot indices fit in u32")]
            let key = K::from_parts(idx as u32, e.generation);
            e.value.as_mut().map(|v| (key, v))
        })
    }
}
