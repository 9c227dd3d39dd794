// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Standard containers: ordered sequences, strings, options, owning pointers
//! and fixed arrays.
//!
//! Wire shapes:
//!
//! ```text
//! Vec / VecDeque / LinkedList : u64 length | element * length
//! String                      : u64 length | utf-8 bytes
//! Option                      : u8 tag (0 = None, 1 = Some) | value if Some
//! Box                         : pointee
//! [T; N]                      : element * N
//! ```

use std::collections::{LinkedList, VecDeque};
use std::mem::MaybeUninit;

use super::{Full, Partial, Serialize, SerializePartial, Traversal};
use crate::config::LengthPrefix;
use crate::error::{Error, Result};
use crate::lifecycle::{self, Reconstruct, Reconstructor};
use crate::ser::{Serializer, SerializerState};

/// Dispatch a container length through the leaf path.
///
/// Sizing and packing return `len` unchanged. Unpacking returns the decoded
/// length after checking it against the configured container limit.
pub fn serialize_len<S: Serializer>(s: &mut S, len: usize) -> Result<usize> {
    let mut prefix = [len as LengthPrefix];
    s.contiguous_typed(&mut prefix)?;
    if !s.is_unpacking() {
        return Ok(len);
    }

    let decoded = prefix[0];
    let limit = s.limits().max_container_len;
    if !s.limits().allows_container(decoded) {
        log::debug!(
            "[dispatch] container length {} exceeds limit {}",
            decoded,
            limit
        );
        return Err(Error::AllocationFailure {
            requested: usize::try_from(decoded).unwrap_or(usize::MAX),
            reason: format!("container length exceeds limit of {} elements", limit),
        });
    }
    usize::try_from(decoded).map_err(|_| Error::AllocationFailure {
        requested: usize::MAX,
        reason: format!("container length {} does not fit in usize", decoded),
    })
}

// ---------------------------------------------------------------------------
// Ordered sequences
// ---------------------------------------------------------------------------

fn serialize_vec<T, P, S>(vec: &mut Vec<T>, s: &mut S) -> Result<()>
where
    T: Reconstruct,
    P: Traversal<T>,
    S: Serializer,
{
    let len = serialize_len(s, vec.len())?;
    if s.is_unpacking() {
        *vec = lifecycle::unpack_elements::<T, P, S>(s, len)?;
        Ok(())
    } else {
        P::visit_slice(vec, s)
    }
}

fn serialize_deque<T, P, S>(deque: &mut VecDeque<T>, s: &mut S) -> Result<()>
where
    T: Reconstruct,
    P: Traversal<T>,
    S: Serializer,
{
    let len = serialize_len(s, deque.len())?;
    if s.is_unpacking() {
        *deque = lifecycle::unpack_elements::<T, P, S>(s, len)?.into();
        Ok(())
    } else {
        P::visit_slice(deque.make_contiguous(), s)
    }
}

fn serialize_list<T, P, S>(list: &mut LinkedList<T>, s: &mut S) -> Result<()>
where
    T: Reconstruct,
    P: Traversal<T>,
    S: Serializer,
{
    let len = serialize_len(s, list.len())?;
    if s.is_unpacking() {
        *list = lifecycle::unpack_elements::<T, P, S>(s, len)?
            .into_iter()
            .collect();
        Ok(())
    } else {
        for item in list.iter_mut() {
            P::visit(item, s)?;
        }
        Ok(())
    }
}

macro_rules! impl_sequence {
    ($container:ident, $routine:ident) => {
        impl<T: Reconstruct> Serialize for $container<T> {
            fn serialize<S: Serializer>(&mut self, s: &mut S) -> Result<()> {
                $routine::<T, Full, S>(self, s)
            }
        }

        impl<T: Reconstruct + SerializePartial> SerializePartial for $container<T> {
            fn serialize_partial<S: Serializer>(&mut self, s: &mut S) -> Result<()> {
                $routine::<T, Partial, S>(self, s)
            }
        }

        impl<T: Reconstruct> Reconstruct for $container<T> {
            fn reconstructor() -> Reconstructor<Self> {
                Reconstructor::DefaultConstruct($container::new)
            }
        }
    };
}

impl_sequence!(Vec, serialize_vec);
impl_sequence!(VecDeque, serialize_deque);
impl_sequence!(LinkedList, serialize_list);

// ---------------------------------------------------------------------------
// String
// ---------------------------------------------------------------------------

impl Serialize for String {
    fn serialize<S: Serializer>(&mut self, s: &mut S) -> Result<()> {
        let len = serialize_len(s, self.len())?;
        if !s.is_unpacking() {
            // SAFETY: sizing, packing and counting serializers only read the
            // slice they are handed, so the bytes stay valid UTF-8. The
            // serializer set is sealed.
            let bytes = unsafe { self.as_mut_vec() };
            return s.contiguous_bytes(bytes);
        }

        lifecycle::check_leaf_budget::<u8, S>(s, len)?;
        let start = s.usage();
        let mut bytes = vec![0u8; len];
        s.contiguous_bytes(&mut bytes)?;
        *self = String::from_utf8(bytes).map_err(|e| Error::InvalidData {
            offset: start + e.utf8_error().valid_up_to(),
            reason: format!("string is not valid utf-8: {}", e.utf8_error()),
        })?;
        Ok(())
    }
}

impl SerializePartial for String {
    fn serialize_partial<S: Serializer>(&mut self, s: &mut S) -> Result<()> {
        self.serialize(s)
    }
}

impl Reconstruct for String {
    fn reconstructor() -> Reconstructor<Self> {
        Reconstructor::DefaultConstruct(String::new)
    }
}

// ---------------------------------------------------------------------------
// Option
// ---------------------------------------------------------------------------

const TAG_NONE: u8 = 0;
const TAG_SOME: u8 = 1;

fn serialize_option<T, P, S>(option: &mut Option<T>, s: &mut S) -> Result<()>
where
    T: Reconstruct,
    P: Traversal<T>,
    S: Serializer,
{
    let mut tag = [if option.is_some() { TAG_SOME } else { TAG_NONE }];
    s.contiguous_typed(&mut tag)?;

    if !s.is_unpacking() {
        return match option {
            Some(value) => P::visit(value, s),
            None => Ok(()),
        };
    }

    match tag[0] {
        TAG_NONE => {
            *option = None;
            Ok(())
        }
        TAG_SOME => match option {
            Some(value) => P::visit(value, s),
            None => {
                *option = Some(lifecycle::materialize::<T, P, S>(s)?);
                Ok(())
            }
        },
        other => Err(Error::InvalidData {
            offset: s.usage() - 1,
            reason: format!("invalid option tag {}", other),
        }),
    }
}

impl<T: Reconstruct> Serialize for Option<T> {
    fn serialize<S: Serializer>(&mut self, s: &mut S) -> Result<()> {
        serialize_option::<T, Full, S>(self, s)
    }
}

impl<T: Reconstruct + SerializePartial> SerializePartial for Option<T> {
    fn serialize_partial<S: Serializer>(&mut self, s: &mut S) -> Result<()> {
        serialize_option::<T, Partial, S>(self, s)
    }
}

impl<T: Reconstruct> Reconstruct for Option<T> {
    fn reconstructor() -> Reconstructor<Self> {
        Reconstructor::DefaultConstruct(|| None)
    }
}

// ---------------------------------------------------------------------------
// Box
// ---------------------------------------------------------------------------

impl<T: Serialize> Serialize for Box<T> {
    #[inline]
    fn serialize<S: Serializer>(&mut self, s: &mut S) -> Result<()> {
        (**self).serialize(s)
    }
}

impl<T: SerializePartial> SerializePartial for Box<T> {
    #[inline]
    fn serialize_partial<S: Serializer>(&mut self, s: &mut S) -> Result<()> {
        (**self).serialize_partial(s)
    }
}

impl<T: Reconstruct> Reconstruct for Box<T> {
    fn reconstructor() -> Reconstructor<Self> {
        Reconstructor::Composite
    }

    fn construct_in<'a>(
        slot: &'a mut MaybeUninit<Self>,
        state: &dyn SerializerState,
    ) -> Result<&'a mut Self> {
        if let Some(routine) = lifecycle::registry::lookup::<Self>() {
            return lifecycle::run_external(slot, state, routine);
        }
        let pointee = lifecycle::construct_boxed::<T>(state)?;
        Ok(slot.write(pointee))
    }
}

// ---------------------------------------------------------------------------
// Fixed arrays
// ---------------------------------------------------------------------------

impl<T: Serialize, const N: usize> Serialize for [T; N] {
    const BYTE_COPYABLE: bool = T::BYTE_COPYABLE;

    #[inline]
    fn serialize<S: Serializer>(&mut self, s: &mut S) -> Result<()> {
        T::serialize_slice(self, s)
    }
}

impl<T: SerializePartial, const N: usize> SerializePartial for [T; N] {
    #[inline]
    fn serialize_partial<S: Serializer>(&mut self, s: &mut S) -> Result<()> {
        T::serialize_partial_slice(self, s)
    }
}

impl<T: Reconstruct, const N: usize> Reconstruct for [T; N] {
    fn reconstructor() -> Reconstructor<Self> {
        Reconstructor::Composite
    }

    fn construct_in<'a>(
        slot: &'a mut MaybeUninit<Self>,
        state: &dyn SerializerState,
    ) -> Result<&'a mut Self> {
        if let Some(routine) = lifecycle::registry::lookup::<Self>() {
            return lifecycle::run_external(slot, state, routine);
        }
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(lifecycle::construct::<T>(state)?);
        }
        let array = <[T; N]>::try_from(items).map_err(|_| Error::InvalidReconstruction {
            type_name: std::any::type_name::<Self>(),
        })?;
        Ok(slot.write(array))
    }
}
