// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scalars that are not byte-copyable because not every bit pattern is a
//! valid value, plus zero-sized markers.

use std::marker::PhantomData;

use super::{Serialize, SerializePartial};
use crate::error::{Error, Result};
use crate::lifecycle::{Reconstruct, Reconstructor};
use crate::ser::Serializer;

impl Serialize for bool {
    fn serialize<S: Serializer>(&mut self, s: &mut S) -> Result<()> {
        let mut byte = [u8::from(*self)];
        s.contiguous_typed(&mut byte)?;
        if s.is_unpacking() {
            *self = match byte[0] {
                0 => false,
                1 => true,
                other => {
                    return Err(Error::InvalidData {
                        offset: s.usage() - 1,
                        reason: format!("invalid bool byte {:#04x}", other),
                    })
                }
            };
        }
        Ok(())
    }
}

impl Serialize for char {
    fn serialize<S: Serializer>(&mut self, s: &mut S) -> Result<()> {
        let mut code = [u32::from(*self)];
        s.contiguous_typed(&mut code)?;
        if s.is_unpacking() {
            *self = char::from_u32(code[0]).ok_or_else(|| Error::InvalidData {
                offset: s.usage() - 4,
                reason: format!("invalid char scalar value {:#x}", code[0]),
            })?;
        }
        Ok(())
    }
}

impl Serialize for () {
    fn serialize<S: Serializer>(&mut self, _s: &mut S) -> Result<()> {
        Ok(())
    }
}

impl<T: ?Sized> Serialize for PhantomData<T> {
    fn serialize<S: Serializer>(&mut self, _s: &mut S) -> Result<()> {
        Ok(())
    }
}

macro_rules! partial_is_full {
    ($($ty:ty),*) => {
        $(
            impl SerializePartial for $ty {
                #[inline]
                fn serialize_partial<S: Serializer>(&mut self, s: &mut S) -> Result<()> {
                    self.serialize(s)
                }
            }
        )*
    };
}

partial_is_full!(bool, char, ());

impl<T: ?Sized> SerializePartial for PhantomData<T> {
    fn serialize_partial<S: Serializer>(&mut self, _s: &mut S) -> Result<()> {
        Ok(())
    }
}

impl Reconstruct for bool {
    fn reconstructor() -> Reconstructor<Self> {
        Reconstructor::DefaultConstruct(bool::default)
    }
}

impl Reconstruct for char {
    fn reconstructor() -> Reconstructor<Self> {
        Reconstructor::DefaultConstruct(char::default)
    }
}

impl Reconstruct for () {
    fn reconstructor() -> Reconstructor<Self> {
        Reconstructor::DefaultConstruct(|| ())
    }
}

impl<T: ?Sized + 'static> Reconstruct for PhantomData<T> {
    fn reconstructor() -> Reconstructor<Self> {
        Reconstructor::DefaultConstruct(|| PhantomData)
    }
}
