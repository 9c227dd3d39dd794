// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serializer modes.
//!
//! One traversal, several strategies. Every traversal routine is written
//! against the [`Serializer`] trait, whose single primitive is
//! [`contiguous_bytes`](Serializer::contiguous_bytes):
//!
//! | Strategy     | Mode        | `contiguous_bytes(bytes)`                      |
//! |--------------|-------------|------------------------------------------------|
//! | [`Sizer`]    | `Sizing`    | adds `bytes.len()` to a running total          |
//! | [`Packer`]   | `Packing`   | copies `bytes` to the write cursor, advances   |
//! | [`Unpacker`] | `Unpacking` | fills `bytes` from the read cursor, advances   |
//! | [`Counter`]  | `Sizing`    | counts the call (one per leaf call site)       |
//!
//! Strategies are sealed: the engine's correctness relies on sizing and
//! packing never writing through the slices they are handed.

pub mod counter;
pub mod cursor;
pub mod packer;
pub mod sizer;
pub mod unpacker;

pub use counter::Counter;
pub use cursor::{Cursor, CursorMut};
pub use packer::Packer;
pub use sizer::Sizer;
pub use unpacker::Unpacker;

use crate::classify::{bytes_of_mut, ByteCopy};
use crate::config::Limits;
use crate::dispatch::{Serialize, SerializePartial};
use crate::error::{Error, Result};

/// Pass a serializer runs in. Fixed for the serializer's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Computes the number of bytes a value needs.
    Sizing,
    /// Writes bytes into a destination region.
    Packing,
    /// Reads bytes back and populates values.
    Unpacking,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Sizing => write!(f, "sizing"),
            Mode::Packing => write!(f, "packing"),
            Mode::Unpacking => write!(f, "unpacking"),
        }
    }
}

/// Read-only view of a serializer, handed to external reconstruction
/// routines.
pub trait SerializerState {
    /// Mode of this serializer.
    fn mode(&self) -> Mode;

    /// Bytes counted (sizing), written (packing) or consumed (unpacking) so
    /// far. For the counter, the number of leaf calls.
    fn usage(&self) -> usize;
}

mod private {
    pub trait Sealed {}
}

pub(crate) use private::Sealed;

/// Strategy driven by traversal routines.
pub trait Serializer: SerializerState + Sealed + Sized {
    /// Contiguous-copy primitive: size-accumulate, copy out, or copy in.
    fn contiguous_bytes(&mut self, bytes: &mut [u8]) -> Result<()>;

    /// Limits snapshot taken when the serializer was created.
    fn limits(&self) -> &Limits;

    /// Bytes left in the underlying region, if the serializer has one.
    fn remaining(&self) -> Option<usize> {
        None
    }

    /// Copy `items.len()` elements of `size_of::<T>()` bytes in one operation.
    fn contiguous_typed<T: ByteCopy>(&mut self, items: &mut [T]) -> Result<()> {
        self.contiguous_bytes(bytes_of_mut(items))
    }

    /// Dispatch one field through its full traversal routine.
    fn field<T: Serialize>(&mut self, value: &mut T) -> Result<()> {
        value.serialize(self)
    }

    /// Dispatch one field through its partial traversal routine.
    fn partial_field<T: SerializePartial>(&mut self, value: &mut T) -> Result<()> {
        value.serialize_partial(self)
    }

    fn is_sizing(&self) -> bool {
        self.mode() == Mode::Sizing
    }

    fn is_packing(&self) -> bool {
        self.mode() == Mode::Packing
    }

    fn is_unpacking(&self) -> bool {
        self.mode() == Mode::Unpacking
    }

    /// Fail with [`Error::ModeMismatch`] unless this serializer runs in
    /// `expected` mode.
    fn require_mode(&self, expected: Mode) -> Result<()> {
        let actual = self.mode();
        if actual == expected {
            Ok(())
        } else {
            Err(Error::ModeMismatch { expected, actual })
        }
    }

    /// Enter one level of nested materialization. Only the unpacker tracks
    /// depth; it fails once [`Limits::max_depth`] would be exceeded.
    fn descend(&mut self) -> Result<()> {
        Ok(())
    }

    /// Leave a level entered with [`Serializer::descend`].
    fn ascend(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Sizing.to_string(), "sizing");
        assert_eq!(Mode::Packing.to_string(), "packing");
        assert_eq!(Mode::Unpacking.to_string(), "unpacking");
    }

    #[test]
    fn test_require_mode() {
        let sizer = Sizer::new();
        assert!(sizer.require_mode(Mode::Sizing).is_ok());
        assert_eq!(
            sizer.require_mode(Mode::Unpacking),
            Err(Error::ModeMismatch {
                expected: Mode::Unpacking,
                actual: Mode::Sizing,
            })
        );
    }

    #[test]
    fn test_mode_predicates() {
        let mut region = [0u8; 4];
        let packer = Packer::new(&mut region);
        assert!(packer.is_packing());
        assert!(!packer.is_sizing());
        assert!(!packer.is_unpacking());

        let unpacker = Unpacker::new(&[]);
        assert!(unpacker.is_unpacking());
    }
}
