// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Top-level operations.
//!
//! Serialization is two-phase: a sizing pass computes the exact byte count,
//! a buffer of that size is obtained, then a packing pass writes into it.
//! Deserialization is one unpacking pass that constructs and populates.
//!
//! Traversal routines take `&mut self` in every mode, so the serialize
//! functions borrow their input mutably as well. Sizing and packing never
//! modify it.

use std::any::type_name;

use crate::buffer::{Buffer, ManagedBuffer};
use crate::config;
use crate::dispatch::{Full, Partial, Serialize, SerializePartial, Traversal};
use crate::error::{Error, Result};
use crate::lifecycle::{self, Reconstruct};
use crate::ser::{Counter, Packer, SerializerState, Sizer, Unpacker};

/// Exact number of bytes `value` serializes to.
pub fn size_of<T: Serialize>(value: &mut T) -> Result<usize> {
    measure::<T, Full>(value)
}

/// Exact number of bytes the partial traversal of `value` produces.
pub fn size_of_partial<T: SerializePartial>(value: &mut T) -> Result<usize> {
    measure::<T, Partial>(value)
}

/// Number of contiguous-copy call sites the traversal of `value` reaches.
///
/// A contiguous copy of a whole leaf array or vector counts once. Comparing
/// this against the expected member count catches traversal routines that
/// skip a field.
pub fn count_leaf_calls<T: Serialize>(value: &mut T) -> Result<usize> {
    let mut counter = Counter::new();
    value.serialize(&mut counter)?;
    log::debug!(
        "[stowage] {} issues {} leaf calls",
        type_name::<T>(),
        counter.count()
    );
    Ok(counter.count())
}

/// Serialize `value` into a freshly allocated buffer.
///
/// Returns the buffer and the number of bytes written, which equals the
/// buffer's size.
pub fn serialize<T: Serialize>(value: &mut T) -> Result<(ManagedBuffer, usize)> {
    pack::<T, Full, _, _>(value, ManagedBuffer::allocate)
}

/// Serialize `value` into a buffer obtained from `alloc`.
///
/// `alloc` receives the exact size computed by the sizing pass and must
/// return a buffer at least that large; only the first `size` bytes are
/// written.
pub fn serialize_with<T, B, F>(value: &mut T, alloc: F) -> Result<(B, usize)>
where
    T: Serialize,
    B: Buffer,
    F: FnOnce(usize) -> Result<B>,
{
    pack::<T, Full, B, F>(value, alloc)
}

/// Serialize only the fields `value`'s partial routine visits.
pub fn serialize_partial<T: SerializePartial>(value: &mut T) -> Result<(ManagedBuffer, usize)> {
    pack::<T, Partial, _, _>(value, ManagedBuffer::allocate)
}

/// Partial counterpart of [`serialize_with`].
pub fn serialize_partial_with<T, B, F>(value: &mut T, alloc: F) -> Result<(B, usize)>
where
    T: SerializePartial,
    B: Buffer,
    F: FnOnce(usize) -> Result<B>,
{
    pack::<T, Partial, B, F>(value, alloc)
}

/// Reconstruct a new `T` from `bytes`, in heap storage.
pub fn deserialize<T: Reconstruct>(bytes: &[u8]) -> Result<Box<T>> {
    check_source::<T>(bytes)?;
    let mut unpacker = Unpacker::new(bytes);
    let value = lifecycle::materialize_boxed::<T, Full, _>(&mut unpacker)?;
    finish::<T>(&unpacker, bytes.len());
    Ok(value)
}

/// Reconstruct a new `T` from the first `size` bytes of `buffer`.
pub fn deserialize_from<T: Reconstruct, B: Buffer>(buffer: &B, size: usize) -> Result<Box<T>> {
    let bytes = buffer.as_bytes();
    match bytes.get(..size) {
        Some(bytes) => deserialize(bytes),
        None => Err(Error::BufferOverrun {
            offset: 0,
            requested: size,
            capacity: bytes.len(),
        }),
    }
}

/// Reconstruct a new `T` from `bytes`, returned by value.
pub fn deserialize_value<T: Reconstruct>(bytes: &[u8]) -> Result<T> {
    check_source::<T>(bytes)?;
    let mut unpacker = Unpacker::new(bytes);
    let value = lifecycle::materialize::<T, Full, _>(&mut unpacker)?;
    finish::<T>(&unpacker, bytes.len());
    Ok(value)
}

/// Populate an existing `target` from `bytes`.
///
/// On error `target` is left in a valid but unspecified state.
pub fn deserialize_in_place<T: Serialize>(bytes: &[u8], target: &mut T) -> Result<()> {
    unpack_into::<T, Full>(bytes, target)
}

/// Populate the fields of `target` that its partial routine visits.
pub fn deserialize_partial<T: SerializePartial>(bytes: &[u8], target: &mut T) -> Result<()> {
    unpack_into::<T, Partial>(bytes, target)
}

fn measure<T, P: Traversal<T>>(value: &mut T) -> Result<usize> {
    let mut sizer = Sizer::new();
    P::visit(value, &mut sizer)?;
    Ok(sizer.size())
}

fn pack<T, P, B, F>(value: &mut T, alloc: F) -> Result<(B, usize)>
where
    P: Traversal<T>,
    B: Buffer,
    F: FnOnce(usize) -> Result<B>,
{
    let size = measure::<T, P>(value)?;

    let limits = config::limits();
    if !limits.allows_buffer(size) {
        log::debug!(
            "[stowage] {} needs {} bytes, limit {}",
            type_name::<T>(),
            size,
            limits.max_buffer_bytes
        );
        return Err(Error::AllocationFailure {
            requested: size,
            reason: format!(
                "serialized size exceeds limit of {} bytes",
                limits.max_buffer_bytes
            ),
        });
    }

    let mut buffer = alloc(size)?;
    if buffer.size() < size {
        return Err(Error::AllocationFailure {
            requested: size,
            reason: format!("supplier returned a {}-byte buffer", buffer.size()),
        });
    }

    let packed = {
        let mut packer = Packer::new(&mut buffer.as_bytes_mut()[..size]);
        P::visit(value, &mut packer)?;
        packer.usage()
    };
    if packed != size {
        log::error!(
            "[stowage] {} sized {} bytes but packed {}",
            type_name::<T>(),
            size,
            packed
        );
        return Err(Error::ClassificationMismatch {
            type_name: type_name::<T>(),
            sized: size,
            packed,
        });
    }

    log::debug!("[stowage] serialized {} ({} bytes)", type_name::<T>(), size);
    Ok((buffer, size))
}

fn unpack_into<T, P: Traversal<T>>(bytes: &[u8], target: &mut T) -> Result<()> {
    check_source::<T>(bytes)?;
    let mut unpacker = Unpacker::new(bytes);
    P::visit(target, &mut unpacker)?;
    finish::<T>(&unpacker, bytes.len());
    Ok(())
}

fn check_source<T>(bytes: &[u8]) -> Result<()> {
    let limits = config::limits();
    if limits.allows_buffer(bytes.len()) {
        return Ok(());
    }
    log::debug!(
        "[stowage] refusing {}-byte source for {}, limit {}",
        bytes.len(),
        type_name::<T>(),
        limits.max_buffer_bytes
    );
    Err(Error::AllocationFailure {
        requested: bytes.len(),
        reason: format!(
            "source exceeds limit of {} bytes",
            limits.max_buffer_bytes
        ),
    })
}

fn finish<T>(unpacker: &Unpacker<'_>, total: usize) {
    if unpacker.is_exhausted() {
        log::debug!("[stowage] deserialized {} ({} bytes)", type_name::<T>(), total);
    } else {
        log::debug!(
            "[stowage] deserialized {} leaving {} of {} bytes unread",
            type_name::<T>(),
            total - unpacker.offset(),
            total
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::UserBuffer;

    #[test]
    fn test_serialize_reports_exact_size() {
        let mut values = vec![1u16, 2, 3];
        let (buffer, size) = serialize(&mut values).expect("Serialize should succeed");
        assert_eq!(size, 8 + 6);
        assert_eq!(buffer.size(), size);
        assert_eq!(size_of(&mut values).expect("Sizing should succeed"), size);
    }

    #[test]
    fn test_serialize_with_user_region() {
        let mut memory = [0xFFu8; 32];
        let mut value = 0x0A0B_0C0D_u32;
        let (_, size) = serialize_with(&mut value, |size| UserBuffer::with_size(&mut memory, size))
            .expect("Serialize should succeed");
        assert_eq!(size, 4);
        assert_eq!(&memory[..4], &0x0A0B_0C0D_u32.to_ne_bytes());
        assert_eq!(memory[4], 0xFF);
    }

    #[test]
    fn test_short_supplier_buffer_is_rejected() {
        let mut value = 7u64;
        let err = serialize_with(&mut value, |_| Ok(vec![0u8; 3])).unwrap_err();
        assert!(matches!(err, Error::AllocationFailure { requested: 8, .. }));
    }

    #[test]
    fn test_supplier_error_is_propagated() {
        let mut value = 7u64;
        let err = serialize_with::<_, Vec<u8>, _>(&mut value, |size| {
            Err(Error::AllocationFailure {
                requested: size,
                reason: "pool exhausted".into(),
            })
        })
        .unwrap_err();
        assert_eq!(
            err,
            Error::AllocationFailure {
                requested: 8,
                reason: "pool exhausted".into(),
            }
        );
    }

    #[test]
    fn test_deserialize_forms_agree() {
        let mut source = (3u8, String::from("three"));
        let (buffer, size) = serialize(&mut source).expect("Serialize should succeed");

        let boxed = deserialize::<(u8, String)>(buffer.as_slice()).expect("Deserialize should succeed");
        let owned = deserialize_value::<(u8, String)>(buffer.as_slice())
            .expect("Deserialize should succeed");
        let from = deserialize_from::<(u8, String), _>(&buffer, size)
            .expect("Deserialize should succeed");
        let mut target = (0u8, String::new());
        deserialize_in_place(buffer.as_slice(), &mut target).expect("Deserialize should succeed");

        assert_eq!(*boxed, source);
        assert_eq!(owned, source);
        assert_eq!(*from, source);
        assert_eq!(target, source);
    }

    #[test]
    fn test_deserialize_from_checks_size() {
        let buffer = vec![0u8; 4];
        let err = deserialize_from::<u32, _>(&buffer, 5).unwrap_err();
        assert_eq!(
            err,
            Error::BufferOverrun {
                offset: 0,
                requested: 5,
                capacity: 4,
            }
        );
    }

    #[test]
    fn test_trailing_bytes_are_tolerated() {
        let bytes = [1u8, 0, 0, 0, 0xEE, 0xEE];
        let value = deserialize_value::<u8>(&bytes).expect("Deserialize should succeed");
        assert_eq!(value, 1);
    }

    #[test]
    fn test_count_leaf_calls() {
        let mut value = (1u32, vec![1u8, 2, 3], String::from("ab"));
        // u32, vec prefix, vec body, string prefix, string body
        assert_eq!(count_leaf_calls(&mut value).expect("Count should succeed"), 5);
    }
}
