// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tuples up to arity 12: one dispatch per slot, in slot order, no prefix.

use std::mem::MaybeUninit;

use super::{Serialize, SerializePartial};
use crate::error::Result;
use crate::lifecycle::{self, Reconstruct, Reconstructor};
use crate::ser::{Serializer, SerializerState};

macro_rules! impl_tuple {
    ($($name:ident . $idx:tt),+) => {
        impl<$($name: Serialize),+> Serialize for ($($name,)+) {
            fn serialize<S: Serializer>(&mut self, s: &mut S) -> Result<()> {
                $( s.field(&mut self.$idx)?; )+
                Ok(())
            }
        }

        impl<$($name: SerializePartial),+> SerializePartial for ($($name,)+) {
            fn serialize_partial<S: Serializer>(&mut self, s: &mut S) -> Result<()> {
                $( s.partial_field(&mut self.$idx)?; )+
                Ok(())
            }
        }

        impl<$($name: Reconstruct),+> Reconstruct for ($($name,)+) {
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
                Ok(slot.write(($(lifecycle::construct::<$name>(state)?,)+)))
            }
        }
    };
}

impl_tuple!(A.0);
impl_tuple!(A.0, B.1);
impl_tuple!(A.0, B.1, C.2);
impl_tuple!(A.0, B.1, C.2, D.3);
impl_tuple!(A.0, B.1, C.2, D.3, E.4);
impl_tuple!(A.0, B.1, C.2, D.3, E.4, F.5);
impl_tuple!(A.0, B.1, C.2, D.3, E.4, F.5, G.6);
impl_tuple!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7);
impl_tuple!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7, I.8);
impl_tuple!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7, I.8, J.9);
impl_tuple!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7, I.8, J.9, K.10);
impl_tuple!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7, I.8, J.9, K.10, L.11);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ser::{Counter, Packer, Sizer, Unpacker};

    #[test]
    fn test_pair_has_no_prefix() {
        let mut pair = (1u8, 2u32);
        let mut sizer = Sizer::new();
        pair.serialize(&mut sizer).expect("Sizing should succeed");
        assert_eq!(sizer.size(), 5);
    }

    #[test]
    fn test_tuple_slot_order() {
        let mut triple = (0x11u8, 0x2222u16, 0x33u8);
        let mut region = [0u8; 4];
        triple
            .serialize(&mut Packer::new(&mut region))
            .expect("Pack should succeed");
        let mut expected = vec![0x11];
        expected.extend_from_slice(&0x2222u16.to_ne_bytes());
        expected.push(0x33);
        assert_eq!(region.to_vec(), expected);
    }

    #[test]
    fn test_mixed_tuple_roundtrip() {
        let mut value = (-7i32, 2.5f32, String::from("tuple"));
        let mut sizer = Sizer::new();
        value.serialize(&mut sizer).expect("Sizing should succeed");
        let mut region = vec![0u8; sizer.size()];
        value
            .serialize(&mut Packer::new(&mut region))
            .expect("Pack should succeed");

        let mut unpacker = Unpacker::new(&region);
        let back = lifecycle::materialize::<(i32, f32, String), crate::dispatch::Full, _>(
            &mut unpacker,
        )
        .expect("Unpack should succeed");
        assert_eq!(back, value);
    }

    #[test]
    fn test_twelve_slots_count() {
        let mut wide = (0u8, 1u8, 2u8, 3u8, 4u8, 5u8, 6u8, 7u8, 8u8, 9u8, 10u8, 11u8);
        let mut counter = Counter::new();
        wide.serialize(&mut counter).expect("Count should succeed");
        assert_eq!(counter.count(), 12);
    }
}
