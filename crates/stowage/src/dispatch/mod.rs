// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Traversal dispatcher.
//!
//! A type takes part in serialization by implementing [`Serialize`]: its
//! traversal routine issues one dispatch call per field, element or slot, in
//! an order that depends only on the type's shape. The same routine runs
//! under every [`Serializer`], which is what keeps the sizing, packing and
//! unpacking passes byte-synchronized.
//!
//! # Dispatch rules
//!
//! - **Leaf** (`BYTE_COPYABLE`): one contiguous copy of
//!   `size_of::<T>() * count` bytes.
//! - **Aggregate**: one [`Serializer::field`] call per field, declaration
//!   order (`#[derive(Serialize)]` generates exactly this).
//! - **Ordered container**: a length prefix, then the elements.
//! - **Tuple / pair**: one call per slot, no prefix.
//! - **Fixed array**: elements back to back, no prefix.
//! - **Owning pointer**: the pointee's routine; on unpack the pointee is
//!   reconstructed first.
//!
//! # Example
//!
//! ```rust
//! use stowage::{Reconstruct, Reconstructor, Result, Serialize, Serializer};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Sample {
//!     id: u32,
//!     readings: Vec<f64>,
//! }
//!
//! impl Serialize for Sample {
//!     fn serialize<S: Serializer>(&mut self, s: &mut S) -> Result<()> {
//!         s.field(&mut self.id)?;
//!         s.field(&mut self.readings)
//!     }
//! }
//!
//! impl Reconstruct for Sample {
//!     fn reconstructor() -> Reconstructor<Self> {
//!         Reconstructor::DefaultConstruct(Sample::default)
//!     }
//! }
//!
//! let mut sample = Sample { id: 7, readings: vec![0.5, 1.5] };
//! let (buffer, size) = stowage::serialize(&mut sample)?;
//! let back = stowage::deserialize::<Sample>(&buffer.as_slice()[..size])?;
//! assert_eq!(*back, sample);
//! # Ok::<(), stowage::Error>(())
//! ```

mod containers;
mod primitives;
mod tuples;

pub use containers::serialize_len;

use crate::error::Result;
use crate::ser::Serializer;

/// Full traversal routine of a type.
pub trait Serialize {
    /// Compile-time classification: `true` only for byte-copyable leaves
    /// (set by [`impl_leaf!`](crate::impl_leaf)) and for fixed arrays of them.
    /// Claiming `true` for any other type is a logic error.
    const BYTE_COPYABLE: bool = false;

    /// Visit this value's constituents in their fixed order.
    fn serialize<S: Serializer>(&mut self, s: &mut S) -> Result<()>;

    /// Visit `items` back to back. Leaves override this with one contiguous
    /// copy of the whole slice.
    fn serialize_slice<S: Serializer>(items: &mut [Self], s: &mut S) -> Result<()>
    where
        Self: Sized,
    {
        for item in items.iter_mut() {
            item.serialize(s)?;
        }
        Ok(())
    }
}

/// Partial traversal routine: visits a declared subset of an aggregate's
/// fields. Opt-in per type; leaves and standard containers forward to their
/// element's partial routine.
pub trait SerializePartial {
    fn serialize_partial<S: Serializer>(&mut self, s: &mut S) -> Result<()>;

    fn serialize_partial_slice<S: Serializer>(items: &mut [Self], s: &mut S) -> Result<()>
    where
        Self: Sized,
    {
        for item in items.iter_mut() {
            item.serialize_partial(s)?;
        }
        Ok(())
    }
}

/// Selects which routine (full or partial) a generic container drives for
/// its elements.
pub trait Traversal<T> {
    fn visit<S: Serializer>(value: &mut T, s: &mut S) -> Result<()>;

    fn visit_slice<S: Serializer>(items: &mut [T], s: &mut S) -> Result<()>;
}

/// Drives [`Serialize`].
#[derive(Debug)]
pub enum Full {}

/// Drives [`SerializePartial`].
#[derive(Debug)]
pub enum Partial {}

impl<T: Serialize> Traversal<T> for Full {
    #[inline]
    fn visit<S: Serializer>(value: &mut T, s: &mut S) -> Result<()> {
        value.serialize(s)
    }

    #[inline]
    fn visit_slice<S: Serializer>(items: &mut [T], s: &mut S) -> Result<()> {
        T::serialize_slice(items, s)
    }
}

impl<T: SerializePartial> Traversal<T> for Partial {
    #[inline]
    fn visit<S: Serializer>(value: &mut T, s: &mut S) -> Result<()> {
        value.serialize_partial(s)
    }

    #[inline]
    fn visit_slice<S: Serializer>(items: &mut [T], s: &mut S) -> Result<()> {
        T::serialize_partial_slice(items, s)
    }
}

/// Implement [`Serialize`], [`SerializePartial`] and
/// [`Reconstruct`](crate::Reconstruct) for byte-copyable types.
///
/// Each listed type must implement [`ByteCopy`](crate::ByteCopy); the
/// generated code does not compile otherwise. `#[derive(ByteCopy)]` invokes
/// this macro for you.
///
/// ```rust
/// use stowage::ByteCopy;
///
/// #[derive(Clone, Copy)]
/// #[repr(transparent)]
/// struct Ticks(u64);
///
/// // SAFETY: a transparent wrapper around u64.
/// unsafe impl ByteCopy for Ticks {}
/// stowage::impl_leaf!(Ticks);
///
/// assert!(stowage::is_byte_copyable::<Ticks>());
/// ```
#[macro_export]
macro_rules! impl_leaf {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::Serialize for $ty {
                const BYTE_COPYABLE: bool = true;

                #[inline]
                fn serialize<S: $crate::Serializer>(&mut self, s: &mut S) -> $crate::Result<()> {
                    $crate::Serializer::contiguous_typed(s, ::core::slice::from_mut(self))
                }

                #[inline]
                fn serialize_slice<S: $crate::Serializer>(
                    items: &mut [Self],
                    s: &mut S,
                ) -> $crate::Result<()> {
                    $crate::Serializer::contiguous_typed(s, items)
                }
            }

            impl $crate::SerializePartial for $ty {
                #[inline]
                fn serialize_partial<S: $crate::Serializer>(
                    &mut self,
                    s: &mut S,
                ) -> $crate::Result<()> {
                    $crate::Serializer::contiguous_typed(s, ::core::slice::from_mut(self))
                }

                #[inline]
                fn serialize_partial_slice<S: $crate::Serializer>(
                    items: &mut [Self],
                    s: &mut S,
                ) -> $crate::Result<()> {
                    $crate::Serializer::contiguous_typed(s, items)
                }
            }

            impl $crate::Reconstruct for $ty {
                fn reconstructor() -> $crate::Reconstructor<Self> {
                    $crate::Reconstructor::Leaf($crate::classify::zeroed::<Self>)
                }
            }
        )*
    };
}

impl_leaf!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);
