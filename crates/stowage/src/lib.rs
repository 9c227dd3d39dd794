// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Stowage - type-directed binary serialization
//!
//! Converts arbitrarily nested values (aggregates, sequences, strings,
//! tuples, fixed arrays, owning pointers) into a flat byte buffer and back.
//! Every type contributes one traversal routine that runs in three modes:
//! sizing, packing and unpacking. Running the same routine in each mode keeps
//! the producer and consumer byte-synchronized.
//!
//! ## Quick Start
//!
//! ```rust
//! use stowage::{Reconstruct, Serialize};
//!
//! #[derive(Debug, Default, PartialEq, Serialize, Reconstruct)]
//! struct Reading {
//!     sensor: String,
//!     samples: Vec<f32>,
//!     origin: (i32, i32),
//! }
//!
//! let mut reading = Reading {
//!     sensor: "thermo-3".into(),
//!     samples: vec![20.5, 21.0],
//!     origin: (4, -2),
//! };
//!
//! let (buffer, size) = stowage::serialize(&mut reading)?;
//! assert_eq!(size, stowage::size_of(&mut reading)?);
//!
//! let back = stowage::deserialize::<Reading>(buffer.as_slice())?;
//! assert_eq!(*back, reading);
//! # Ok::<(), stowage::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +-------------------------------------------------------------------+
//! |  interface   serialize / deserialize / size_of / count_leaf_calls |
//! +-------------------------------------------------------------------+
//! |  dispatch    Serialize / SerializePartial routines per type       |
//! |  lifecycle   construct-then-populate, reconstruction registry     |
//! +-------------------------------------------------------------------+
//! |  ser         Sizer | Packer | Unpacker | Counter                  |
//! |  classify    ByteCopy leaves vs structured types                  |
//! +-------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Serialize`] | Full traversal routine of a type |
//! | [`SerializePartial`] | Traversal of a declared subset of fields |
//! | [`Reconstruct`] | How a type is constructed before population |
//! | [`ByteCopy`] | Marker for types copied verbatim |
//! | [`Serializer`] | Strategy driven by traversal routines |
//! | [`Buffer`] | Writable output region |
//!
//! ## Wire Format
//!
//! Native endianness, no alignment padding, no type tags. Container lengths
//! are a `u64` prefix. The format is meant for same-architecture exchange
//! and is not self-describing.
//!
//! ## Features
//!
//! - `derive` (default): `#[derive(Serialize, SerializePartial, ByteCopy,
//!   Reconstruct)]`.

// Lets derive output name `::stowage` from inside this crate's own tests.
extern crate self as stowage;

pub mod buffer;
pub mod classify;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod interface;
pub mod lifecycle;
pub mod ser;

pub use buffer::{Buffer, ManagedBuffer, UserBuffer};
pub use classify::{classify, is_byte_copyable, ByteCopy, Classification};
pub use dispatch::{Full, Partial, Serialize, SerializePartial, Traversal};
pub use error::{Error, Result};
pub use interface::{
    count_leaf_calls, deserialize, deserialize_from, deserialize_in_place, deserialize_partial,
    deserialize_value, serialize, serialize_partial, serialize_partial_with, serialize_with,
    size_of, size_of_partial,
};
pub use lifecycle::{
    descriptor_of, register_reconstructor, unregister_reconstructor, Descriptor, ExternalFn,
    IntrinsicFn, Reconstruct, Reconstructor,
};
pub use ser::{Counter, Mode, Packer, Serializer, SerializerState, Sizer, Unpacker};

#[cfg(feature = "derive")]
pub use stowage_codegen::{ByteCopy, Reconstruct, Serialize, SerializePartial};
