// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Unpacking pass.

use super::cursor::Cursor;
use super::{Mode, Sealed, Serializer, SerializerState};
use crate::config::{self, Limits};
use crate::error::{Error, Result};

/// Reads leaves back from a source region into the values being populated.
///
/// Non-leaf values are materialized by the lifecycle resolver before the
/// traversal reaches their fields; the unpacker itself only copies bytes.
pub struct Unpacker<'a> {
    cursor: Cursor<'a>,
    limits: Limits,
    depth: u32,
}

impl<'a> Unpacker<'a> {
    /// Unpacker reading from the start of `region`.
    pub fn new(region: &'a [u8]) -> Self {
        log::trace!("[Unpacker] region size={}", region.len());
        Self {
            cursor: Cursor::new(region),
            limits: *config::limits(),
            depth: 0,
        }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.cursor.offset()
    }

    /// Current nesting depth of values being materialized.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Whether every byte of the region has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_eof()
    }
}

impl SerializerState for Unpacker<'_> {
    fn mode(&self) -> Mode {
        Mode::Unpacking
    }

    fn usage(&self) -> usize {
        self.cursor.offset()
    }
}

impl Sealed for Unpacker<'_> {}

impl Serializer for Unpacker<'_> {
    fn contiguous_bytes(&mut self, bytes: &mut [u8]) -> Result<()> {
        log::trace!(
            "[Unpacker] offset={} len={} capacity={}",
            self.cursor.offset(),
            bytes.len(),
            self.cursor.capacity()
        );
        let src = self.cursor.read_bytes(bytes.len())?;
        bytes.copy_from_slice(src);
        Ok(())
    }

    fn limits(&self) -> &Limits {
        &self.limits
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.cursor.remaining())
    }

    fn descend(&mut self) -> Result<()> {
        let next = self.depth.saturating_add(1);
        if !self.limits.allows_depth(next) {
            log::debug!(
                "[Unpacker] nesting depth {} exceeds limit {} at offset {}",
                next,
                self.limits.max_depth,
                self.cursor.offset()
            );
            return Err(Error::InvalidData {
                offset: self.cursor.offset(),
                reason: format!("nesting deeper than {} levels", self.limits.max_depth),
            });
        }
        self.depth = next;
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpacker_reads_in_write_order() {
        let mut region = Vec::new();
        region.extend_from_slice(&7_u16.to_ne_bytes());
        region.extend_from_slice(&(-3_i32).to_ne_bytes());

        let mut unpacker = Unpacker::new(&region);
        let mut a = [0u16];
        let mut b = [0i32];
        unpacker.contiguous_typed(&mut a).expect("Unpack should succeed");
        unpacker.contiguous_typed(&mut b).expect("Unpack should succeed");
        assert_eq!((a[0], b[0]), (7, -3));
        assert!(unpacker.is_exhausted());
        assert_eq!(unpacker.remaining(), Some(0));
    }

    #[test]
    fn test_unpacker_truncated_input() {
        let region = [1u8, 2, 3];
        let mut unpacker = Unpacker::new(&region);
        let mut target = [0u64];
        let err = unpacker.contiguous_typed(&mut target).unwrap_err();
        assert_eq!(
            err,
            Error::BufferOverrun {
                offset: 0,
                requested: 8,
                capacity: 3,
            }
        );
        assert_eq!(target[0], 0);
    }

    #[test]
    fn test_unpacker_depth_is_bounded() {
        let mut unpacker = Unpacker::new(&[]);
        unpacker.limits.max_depth = 2;
        unpacker.descend().expect("Depth 1 should be allowed");
        unpacker.descend().expect("Depth 2 should be allowed");
        assert!(matches!(
            unpacker.descend(),
            Err(Error::InvalidData { offset: 0, .. })
        ));
        assert_eq!(unpacker.depth(), 2);
        unpacker.ascend();
        unpacker.ascend();
        assert_eq!(unpacker.depth(), 0);
        unpacker.descend().expect("Depth 1 should be allowed again");
    }
}
