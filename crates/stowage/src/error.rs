// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy shared by every pass.
//!
//! None of these errors is recoverable inside a single serialize or
//! deserialize call: producer and consumer must stay byte-synchronized, so the
//! first failure aborts the whole operation.

use crate::ser::Mode;

/// Errors returned by stowage operations.
///
/// # Example
///
/// ```rust
/// use stowage::{deserialize_value, Error};
///
/// // Four bytes cannot hold a u64.
/// match deserialize_value::<u64>(&[0u8; 4]) {
///     Err(Error::BufferOverrun { offset, requested, capacity }) => {
///         assert_eq!((offset, requested, capacity), (0, 8, 4));
///     }
///     other => panic!("unexpected result: {:?}", other),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The packer or unpacker cursor would move past the end of its region.
    BufferOverrun {
        /// Cursor position when the copy was attempted.
        offset: usize,
        /// Bytes the copy needed.
        requested: usize,
        /// Total size of the region.
        capacity: usize,
    },
    /// No construction strategy could be resolved for a type being unpacked.
    MissingReconstructor {
        /// `core::any::type_name` of the type.
        type_name: &'static str,
    },
    /// Sizing and packing of the same value visited different byte counts.
    ///
    /// This is an internal-consistency failure: the traversal of `type_name`
    /// is not a pure function of its shape.
    ClassificationMismatch {
        /// Top-level type being serialized.
        type_name: &'static str,
        /// Bytes reported by the sizing pass.
        sized: usize,
        /// Bytes written by the packing pass.
        packed: usize,
    },
    /// A buffer (or a container decoded from a stream) could not be provided.
    AllocationFailure {
        /// Size requested, in bytes or elements depending on `reason`.
        requested: usize,
        /// What refused the request.
        reason: String,
    },
    /// A reconstruction routine returned a reference that does not point at
    /// the storage slot it was handed.
    InvalidReconstruction {
        /// Type whose routine misbehaved.
        type_name: &'static str,
    },
    /// Bytes in the stream do not form a valid value for the target type.
    InvalidData {
        /// Stream offset of the offending bytes.
        offset: usize,
        /// Description of the violation.
        reason: String,
    },
    /// An operation reserved for one mode ran inside another.
    ModeMismatch {
        /// Mode the operation needs.
        expected: Mode,
        /// Mode of the serializer it ran on.
        actual: Mode,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::BufferOverrun {
                offset,
                requested,
                capacity,
            } => write!(
                f,
                "buffer overrun: {} bytes requested at offset {} (capacity {})",
                requested, offset, capacity
            ),
            Error::MissingReconstructor { type_name } => {
                write!(f, "no reconstruction strategy for {}", type_name)
            }
            Error::ClassificationMismatch {
                type_name,
                sized,
                packed,
            } => write!(
                f,
                "traversal of {} diverged between passes: sized {} bytes, packed {}",
                type_name, sized, packed
            ),
            Error::AllocationFailure { requested, reason } => {
                write!(f, "allocation of {} failed: {}", requested, reason)
            }
            Error::InvalidReconstruction { type_name } => write!(
                f,
                "reconstruction routine for {} did not initialize the supplied slot",
                type_name
            ),
            Error::InvalidData { offset, reason } => {
                write!(f, "invalid data at offset {}: {}", offset, reason)
            }
            Error::ModeMismatch { expected, actual } => {
                write!(f, "operation requires {} mode, serializer is {}", expected, actual)
            }
        }
    }
}

impl std::error::Error for Error {}

/// Convenient alias for results using the crate [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_variants() {
        let err = Error::BufferOverrun {
            offset: 12,
            requested: 8,
            capacity: 16,
        };
        assert_eq!(
            err.to_string(),
            "buffer overrun: 8 bytes requested at offset 12 (capacity 16)"
        );

        let err = Error::MissingReconstructor { type_name: "Foo" };
        assert_eq!(err.to_string(), "no reconstruction strategy for Foo");

        let err = Error::ClassificationMismatch {
            type_name: "Bar",
            sized: 4,
            packed: 8,
        };
        assert_eq!(
            err.to_string(),
            "traversal of Bar diverged between passes: sized 4 bytes, packed 8"
        );

        let err = Error::ModeMismatch {
            expected: Mode::Unpacking,
            actual: Mode::Packing,
        };
        assert_eq!(
            err.to_string(),
            "operation requires unpacking mode, serializer is packing"
        );
    }

    #[test]
    fn test_error_is_std_error() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>(_: &E) {}
        assert_error(&Error::InvalidData {
            offset: 0,
            reason: "bad tag".into(),
        });
    }
}
