// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Packing pass.

use super::cursor::CursorMut;
use super::{Mode, Sealed, Serializer, SerializerState};
use crate::config::{self, Limits};
use crate::error::Result;

/// Writes traversed leaves into a destination region.
///
/// The region is normally sized exactly to the sizing pass result; writing
/// past its end fails with [`Error::BufferOverrun`](crate::Error::BufferOverrun)
/// and aborts the pass.
pub struct Packer<'a> {
    cursor: CursorMut<'a>,
    limits: Limits,
}

impl<'a> Packer<'a> {
    /// Packer writing from the start of `region`.
    pub fn new(region: &'a mut [u8]) -> Self {
        log::trace!("[Packer] region size={}", region.len());
        Self {
            cursor: CursorMut::new(region),
            limits: *config::limits(),
        }
    }

    /// Bytes written so far.
    pub fn offset(&self) -> usize {
        self.cursor.offset()
    }
}

impl SerializerState for Packer<'_> {
    fn mode(&self) -> Mode {
        Mode::Packing
    }

    fn usage(&self) -> usize {
        self.cursor.offset()
    }
}

impl Sealed for Packer<'_> {}

impl Serializer for Packer<'_> {
    fn contiguous_bytes(&mut self, bytes: &mut [u8]) -> Result<()> {
        log::trace!(
            "[Packer] offset={} len={} capacity={}",
            self.cursor.offset(),
            bytes.len(),
            self.cursor.capacity()
        );
        self.cursor.write_bytes(bytes)
    }

    fn limits(&self) -> &Limits {
        &self.limits
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.cursor.remaining())
    }
}
