// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Leaf call-site counter.
//!
//! Produces a syntactic count of contiguous-copy calls issued by a type's
//! traversal routine. Tests compare the count against the number of members a
//! type is expected to serialize, catching routines that silently drop a
//! member after the type grows. A contiguous copy of many elements counts
//! once.

use super::{Mode, Sealed, Serializer, SerializerState};
use crate::config::{self, Limits};
use crate::error::Result;

/// Counts contiguous-copy call sites instead of bytes.
#[derive(Debug)]
pub struct Counter {
    num_units: usize,
    limits: Limits,
}

impl Counter {
    /// Counter starting from zero, with the current limits snapshot.
    pub fn new() -> Self {
        Self {
            num_units: 0,
            limits: *config::limits(),
        }
    }

    /// Leaf call sites reached so far.
    pub fn count(&self) -> usize {
        self.num_units
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

impl SerializerState for Counter {
    // Walks existing values like the sizing pass and never touches a buffer.
    fn mode(&self) -> Mode {
        Mode::Sizing
    }

    fn usage(&self) -> usize {
        self.num_units
    }
}

impl Sealed for Counter {}

impl Serializer for Counter {
    fn contiguous_bytes(&mut self, _bytes: &mut [u8]) -> Result<()> {
        self.num_units += 1;
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
    fn test_counter_counts_calls_not_elements() {
        let mut counter = Counter::new();
        counter
            .contiguous_typed(&mut [0u64; 32])
            .expect("Count should succeed");
        counter
            .contiguous_typed(&mut [0u8])
            .expect("Count should succeed");
        assert_eq!(counter.count(), 2);
    }
}
