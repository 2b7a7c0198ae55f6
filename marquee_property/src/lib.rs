// Copyright 2025 the Marquee Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Marquee Property: reactive dependency properties.
//!
//! This crate provides the property layer of the Marquee skin engine. It
//! knows nothing about element trees; `marquee_skin` builds nodes, resource
//! lookup and bindings on top of it.
//!
//! ## Core Concepts
//!
//! - [`PropertyRegistry`] registers each property once, with a typed
//!   [`Property<T>`] handle, a default value, optional coercion and a
//!   [`CopyPolicy`] used when the owning node is cloned.
//! - [`PropertyStore`] is per-node sparse storage of explicit values.
//! - [`Observers`] is the ordered, idempotent observer list every change
//!   source carries. Dispatch always runs over a snapshot.
//! - [`PropertyCell`] is a standalone reactive value for code living outside
//!   the element tree.
//!
//! ## Quick Start
//!
//! ```rust
//! use marquee_property::{PropertyMetadataBuilder, PropertyRegistry, PropertyStore};
//!
//! let mut registry = PropertyRegistry::new();
//! let opacity = registry.register(
//!     "Opacity",
//!     PropertyMetadataBuilder::new(1.0_f64)
//!         .coerce(|v| v.clamp(0.0, 1.0))
//!         .build(),
//! );
//!
//! let mut store = PropertyStore::new();
//! assert_eq!(store.get_effective(opacity, &registry), Some(1.0));
//!
//! let coerced = registry.get_metadata(opacity).unwrap().coerce(2.0);
//! store.set(opacity, coerced);
//! assert_eq!(store.get(opacity), Some(&1.0));
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod cell;
mod id;
mod metadata;
mod observers;
mod registry;
mod store;
mod value;

pub use cell::{CellCallback, PropertyCell};
pub use id::{ObserverId, Property, PropertyId};
pub use metadata::{CoerceValueCallback, CopyPolicy, PropertyMetadata, PropertyMetadataBuilder};
pub use observers::Observers;
pub use registry::{PropertyRegistration, PropertyRegistry};
pub use store::PropertyStore;
pub use value::ErasedValue;
