// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type classifier: byte-copyable leaves versus structured types.
//!
//! Classification is a compile-time fact carried by the
//! [`Serialize::BYTE_COPYABLE`] constant. A type is byte-copyable when it is a
//! raw arithmetic scalar or a [`ByteCopy`] type registered as a leaf, or a
//! fixed array of such elements; everything else is
//! decomposed through its traversal routine.
//!
//! Because the classification is an associated constant, it cannot differ
//! between the sizing, packing and unpacking passes of the same type.

use crate::dispatch::Serialize;

/// Marker for types whose in-memory representation may be copied verbatim.
///
/// A `ByteCopy` type becomes a [`Serialize`] leaf and a
/// [`Reconstruct`](crate::Reconstruct) leaf through
/// [`impl_leaf!`](crate::impl_leaf). Prefer `#[derive(ByteCopy)]`, which
/// checks the requirements below at compile time and emits both.
///
/// # Safety
///
/// Implementors guarantee that:
/// - the type contains no padding bytes,
/// - the type holds no pointers, references or other owned resources,
/// - every bit pattern of `size_of::<Self>()` bytes is a valid value.
pub unsafe trait ByteCopy: Copy + Send + Sync + 'static {}

macro_rules! impl_byte_copy {
    ($($ty:ty),* $(,)?) => {
        $(
            // SAFETY: primitive integers and floats have no padding and accept
            // every bit pattern.
            unsafe impl ByteCopy for $ty {}
        )*
    };
}

impl_byte_copy!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

// SAFETY: array elements are laid out back to back with no padding between
// them, so an array inherits every guarantee of its element type.
unsafe impl<T: ByteCopy, const N: usize> ByteCopy for [T; N] {}

/// Result of classifying a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Copied as raw memory in one contiguous operation.
    ByteCopy,
    /// Decomposed field by field, element by element, or slot by slot.
    Structured,
}

/// Classify `T`.
pub const fn classify<T: Serialize>() -> Classification {
    if T::BYTE_COPYABLE {
        Classification::ByteCopy
    } else {
        Classification::Structured
    }
}

/// Whether `T` is copied verbatim rather than traversed.
pub const fn is_byte_copyable<T: Serialize>() -> bool {
    T::BYTE_COPYABLE
}

/// View a slice of byte-copyable values as raw bytes.
pub fn bytes_of_mut<T: ByteCopy>(items: &mut [T]) -> &mut [u8] {
    let len = core::mem::size_of_val(items);
    // SAFETY: `T: ByteCopy` has no padding, so every byte of the slice is
    // initialized, and every bit pattern is valid, so writes through the byte
    // view cannot produce an invalid `T`. The view borrows `items` mutably for
    // its whole lifetime.
    unsafe { core::slice::from_raw_parts_mut(items.as_mut_ptr().cast::<u8>(), len) }
}

/// An all-zero value of a byte-copyable type.
pub fn zeroed<T: ByteCopy>() -> T {
    // SAFETY: `T: ByteCopy` accepts every bit pattern, including all zeroes.
    unsafe { core::mem::zeroed() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_are_byte_copyable() {
        assert!(is_byte_copyable::<u8>());
        assert!(is_byte_copyable::<i64>());
        assert!(is_byte_copyable::<f64>());
        assert_eq!(classify::<u32>(), Classification::ByteCopy);
    }

    #[test]
    fn test_structured_types() {
        assert!(!is_byte_copyable::<bool>());
        assert!(!is_byte_copyable::<String>());
        assert!(!is_byte_copyable::<Vec<u8>>());
        assert!(!is_byte_copyable::<(u8, u8)>());
        assert_eq!(classify::<Option<u32>>(), Classification::Structured);
    }

    #[test]
    fn test_arrays_inherit_element_classification() {
        assert!(is_byte_copyable::<[u16; 4]>());
        assert!(!is_byte_copyable::<[String; 2]>());
    }

    #[test]
    fn test_classification_is_stable_across_queries() {
        let first = classify::<[f32; 3]>();
        for _ in 0..16 {
            assert_eq!(classify::<[f32; 3]>(), first);
        }
    }

    #[test]
    fn test_bytes_of_mut_covers_whole_slice() {
        let mut values = [0x0102_u16, 0x0304];
        let bytes = bytes_of_mut(&mut values);
        assert_eq!(bytes.len(), 4);
        bytes.copy_from_slice(&[0xAA; 4]);
        assert_eq!(values, [0xAAAA, 0xAAAA]);
    }

    #[test]
    fn test_byte_copy_arrays_view_as_bytes() {
        let mut rows = [[1u8, 2, 3], [4, 5, 6]];
        assert_eq!(bytes_of_mut(&mut rows), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(zeroed::<[u32; 2]>(), [0, 0]);
    }

    #[test]
    fn test_zeroed_scalar() {
        assert_eq!(zeroed::<u64>(), 0);
        assert_eq!(zeroed::<f32>(), 0.0);
    }
}
