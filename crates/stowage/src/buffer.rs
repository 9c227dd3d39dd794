// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Output buffers.
//!
//! The engine only needs a writable byte region of a known size. Callers
//! either let [`serialize`](crate::serialize) allocate a [`ManagedBuffer`],
//! or hand [`serialize_with`](crate::serialize_with) a supplier that returns
//! any [`Buffer`], such as a [`UserBuffer`] over memory they already own.

use crate::error::{Error, Result};

/// A writable byte region.
pub trait Buffer {
    /// The whole region, read-only.
    fn as_bytes(&self) -> &[u8];

    /// The whole region, writable.
    fn as_bytes_mut(&mut self) -> &mut [u8];

    /// Size of the region in bytes.
    fn size(&self) -> usize {
        self.as_bytes().len()
    }
}

/// Heap buffer allocated by the engine, zero-filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedBuffer {
    bytes: Box<[u8]>,
}

impl ManagedBuffer {
    /// Allocate `size` zeroed bytes, reporting failure instead of aborting.
    pub fn allocate(size: usize) -> Result<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(size)
            .map_err(|e| Error::AllocationFailure {
                requested: size,
                reason: e.to_string(),
            })?;
        bytes.resize(size, 0);
        Ok(Self {
            bytes: bytes.into_boxed_slice(),
        })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes.into_vec()
    }
}

impl Buffer for ManagedBuffer {
    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl From<Vec<u8>> for ManagedBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }
}

impl AsRef<[u8]> for ManagedBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Caller-owned memory exposed as a [`Buffer`].
#[derive(Debug)]
pub struct UserBuffer<'a> {
    bytes: &'a mut [u8],
}

impl<'a> UserBuffer<'a> {
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes }
    }

    /// Borrow the first `size` bytes of `bytes`, failing if the region is
    /// smaller.
    pub fn with_size(bytes: &'a mut [u8], size: usize) -> Result<Self> {
        let capacity = bytes.len();
        match bytes.get_mut(..size) {
            Some(bytes) => Ok(Self { bytes }),
            None => Err(Error::AllocationFailure {
                requested: size,
                reason: format!("user region holds only {} bytes", capacity),
            }),
        }
    }
}

impl Buffer for UserBuffer<'_> {
    fn as_bytes(&self) -> &[u8] {
        &*self.bytes
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.bytes
    }
}

impl Buffer for Vec<u8> {
    fn as_bytes(&self) -> &[u8] {
        self
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_managed_buffer_is_zeroed() {
        let buffer = ManagedBuffer::allocate(16).expect("Allocation should succeed");
        assert_eq!(buffer.size(), 16);
        assert!(buffer.as_slice().iter().all(|&b| b == 0));
        assert_eq!(buffer.into_vec().len(), 16);
    }

    #[test]
    fn test_managed_buffer_reports_impossible_allocation() {
        let err = ManagedBuffer::allocate(usize::MAX).unwrap_err();
        assert!(matches!(
            err,
            Error::AllocationFailure {
                requested: usize::MAX,
                ..
            }
        ));
    }

    #[test]
    fn test_user_buffer_views_caller_memory() {
        let mut memory = [0u8; 8];
        {
            let mut buffer = UserBuffer::with_size(&mut memory, 4).expect("Region should fit");
            assert_eq!(buffer.size(), 4);
            buffer.as_bytes_mut().copy_from_slice(&[1, 2, 3, 4]);
        }
        assert_eq!(memory, [1, 2, 3, 4, 0, 0, 0, 0]);
        assert!(UserBuffer::with_size(&mut memory, 9).is_err());
    }
}
