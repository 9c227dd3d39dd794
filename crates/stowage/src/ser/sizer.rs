// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sizing pass.

use super::{Mode, Sealed, Serializer, SerializerState};
use crate::config::{self, Limits};
use crate::error::{Error, Result};

/// Accumulates the number of bytes a traversal would write.
///
/// Never touches a buffer. The total after one full traversal is the exact
/// size the packing pass will need.
#[derive(Debug)]
pub struct Sizer {
    size: usize,
    limits: Limits,
}

impl Sizer {
    /// Sizer starting from zero, with the current limits snapshot.
    pub fn new() -> Self {
        Self {
            size: 0,
            limits: *config::limits(),
        }
    }

    /// Total bytes counted so far.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Default for Sizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SerializerState for Sizer {
    fn mode(&self) -> Mode {
        Mode::Sizing
    }

    fn usage(&self) -> usize {
        self.size
    }
}

impl Sealed for Sizer {}

impl Serializer for Sizer {
    fn contiguous_bytes(&mut self, bytes: &mut [u8]) -> Result<()> {
        self.size = self
            .size
            .checked_add(bytes.len())
            .ok_or_else(|| Error::AllocationFailure {
                requested: usize::MAX,
                reason: "serialized size overflows usize".into(),
            })?;
        Ok(())
    }

    fn limits(&self) -> &Limits {
        &self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizer_accumulates_element_bytes() {
        let mut sizer = Sizer::new();
        sizer
            .contiguous_typed(&mut [1u32, 2, 3])
            .expect("Sizing should succeed");
        sizer
            .contiguous_typed(&mut [0u8])
            .expect("Sizing should succeed");
        assert_eq!(sizer.size(), 13);
        assert_eq!(sizer.usage(), 13);
    }

    #[test]
    fn test_sizer_does_not_modify_source() {
        let mut values = [0xABCD_u16; 2];
        let mut sizer = Sizer::new();
        sizer
            .contiguous_typed(&mut values)
            .expect("Sizing should succeed");
        assert_eq!(values, [0xABCD; 2]);
    }
}
