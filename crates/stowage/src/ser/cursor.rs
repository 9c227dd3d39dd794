// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounds-checked read/write cursors over a byte region.

use crate::error::{Error, Result};

/// Generate common cursor methods (offset, remaining, capacity, overrun)
///
/// Shared by `CursorMut` and `Cursor`; both report overruns with the same
/// error shape.
macro_rules! impl_cursor_common {
    () => {
        pub fn offset(&self) -> usize {
            self.offset
        }

        pub fn remaining(&self) -> usize {
            self.buffer.len().saturating_sub(self.offset)
        }

        pub fn capacity(&self) -> usize {
            self.buffer.len()
        }

        fn check(&self, len: usize) -> Result<usize> {
            match self.offset.checked_add(len) {
                Some(end) if end <= self.buffer.len() => Ok(end),
                _ => Err(Error::BufferOverrun {
                    offset: self.offset,
                    requested: len,
                    capacity: self.buffer.len(),
                }),
            }
        }
    };
}

/// Mutable cursor for writing
pub struct CursorMut<'a> {
    buffer: &'a mut [u8],
    offset: usize,
}

impl<'a> CursorMut<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    /// Copy `data` at the cursor and advance past it.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        let end = self.check(data.len())?;
        self.buffer[self.offset..end].copy_from_slice(data);
        self.offset = end;
        Ok(())
    }

    impl_cursor_common!();
}

/// Immutable cursor for reading
pub struct Cursor<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.check(len)?;
        let slice = &self.buffer[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    impl_cursor_common!();

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }
}
