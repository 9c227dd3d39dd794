// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Reconstruction resolution: external registry, intrinsic routines, default
// construction, and the failure modes between them.
//
// The registry is process-wide, so every test registers its own type.

use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

use stowage::{
    deserialize, deserialize_value, descriptor_of, register_reconstructor, serialize,
    unregister_reconstructor, Descriptor, Error, Mode, Reconstruct, Reconstructor, Serialize,
    Serializer, SerializerState,
};

/// No default construction; only an external routine can build it.
#[derive(Debug, PartialEq, Serialize, Reconstruct)]
#[stowage(reconstruct = "external")]
struct Sentinel {
    value: i32,
}

fn sentinel_hundred<'s>(
    _: &dyn SerializerState,
    slot: &'s mut MaybeUninit<Sentinel>,
) -> &'s mut Sentinel {
    slot.write(Sentinel { value: 100 })
}

#[test]
fn external_routine_then_traversal_overwrites() {
    register_reconstructor::<Sentinel>(sentinel_hundred);
    assert_eq!(descriptor_of::<Sentinel>(), Descriptor::External);

    let mut source = Sentinel { value: 43 };
    let (buffer, _) = serialize(&mut source).unwrap();
    let back = deserialize::<Sentinel>(buffer.as_slice()).unwrap();
    assert_eq!(back.value, 43);
}

#[derive(Debug, Serialize, Reconstruct)]
#[stowage(reconstruct = "external")]
struct Unregistered {
    value: u8,
}

#[test]
fn external_without_registration_is_missing() {
    assert_eq!(descriptor_of::<Unregistered>(), Descriptor::Missing);

    let err = deserialize_value::<Unregistered>(&[1]).unwrap_err();
    assert_eq!(
        err,
        Error::MissingReconstructor {
            type_name: std::any::type_name::<Unregistered>(),
        }
    );

    // Inside a container the failure surfaces the same way.
    let mut bytes = 1u64.to_ne_bytes().to_vec();
    bytes.push(1);
    let err = deserialize_value::<Vec<Unregistered>>(&bytes).unwrap_err();
    assert!(matches!(err, Error::MissingReconstructor { .. }));
}

/// Intrinsic by default; the registry wins when populated.
#[derive(Debug, PartialEq, Serialize, Reconstruct)]
#[stowage(reconstruct = "intrinsic")]
struct Layered {
    value: u32,
    #[stowage(skip)]
    built_by: &'static str,
}

impl Layered {
    fn reconstruct(slot: &mut MaybeUninit<Self>) -> &mut Self {
        slot.write(Layered {
            value: 0,
            built_by: "intrinsic",
        })
    }
}

fn layered_external<'s>(
    state: &dyn SerializerState,
    slot: &'s mut MaybeUninit<Layered>,
) -> &'s mut Layered {
    assert_eq!(state.mode(), Mode::Unpacking);
    slot.write(Layered {
        value: 0,
        built_by: "external",
    })
}

#[test]
fn registry_takes_precedence_over_intrinsic() {
    let mut source = Layered {
        value: 5,
        built_by: "caller",
    };
    let (buffer, _) = serialize(&mut source).unwrap();

    let back = deserialize::<Layered>(buffer.as_slice()).unwrap();
    assert_eq!(back.built_by, "intrinsic");

    register_reconstructor::<Layered>(layered_external);
    assert_eq!(descriptor_of::<Layered>(), Descriptor::External);
    let back = deserialize::<Layered>(buffer.as_slice()).unwrap();
    assert_eq!((back.value, back.built_by), (5, "external"));

    assert!(unregister_reconstructor::<Layered>());
    assert_eq!(descriptor_of::<Layered>(), Descriptor::Intrinsic);
    let back = deserialize::<Layered>(buffer.as_slice()).unwrap();
    assert_eq!(back.built_by, "intrinsic");
}

static ELEMENT_BUILDS: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, PartialEq, Serialize, Reconstruct)]
#[stowage(reconstruct = "external")]
struct Counted {
    id: u16,
}

fn counted_external<'s>(
    _: &dyn SerializerState,
    slot: &'s mut MaybeUninit<Counted>,
) -> &'s mut Counted {
    ELEMENT_BUILDS.fetch_add(1, Ordering::SeqCst);
    slot.write(Counted { id: u16::MAX })
}

#[test]
fn each_container_element_is_reconstructed() {
    register_reconstructor::<Counted>(counted_external);

    let mut source = vec![Counted { id: 1 }, Counted { id: 2 }, Counted { id: 3 }];
    let (buffer, _) = serialize(&mut source).unwrap();
    let back = deserialize_value::<Vec<Counted>>(buffer.as_slice()).unwrap();

    assert_eq!(back, source);
    assert_eq!(ELEMENT_BUILDS.load(Ordering::SeqCst), 3);
}

#[derive(Debug, PartialEq, Serialize, Reconstruct)]
struct Pair {
    left: u8,
    right: u8,
}

impl Default for Pair {
    fn default() -> Self {
        Pair {
            left: 0xAA,
            right: 0xBB,
        }
    }
}

fn pair_tuple_external<'s>(
    _: &dyn SerializerState,
    slot: &'s mut MaybeUninit<(Pair, u8)>,
) -> &'s mut (Pair, u8) {
    slot.write((Pair { left: 1, right: 1 }, 1))
}

#[test]
fn composite_types_consult_the_registry() {
    assert_eq!(descriptor_of::<(Pair, u8)>(), Descriptor::Composite);
    register_reconstructor::<(Pair, u8)>(pair_tuple_external);
    assert_eq!(descriptor_of::<(Pair, u8)>(), Descriptor::External);

    let mut source = (Pair { left: 7, right: 8 }, 9u8);
    let (buffer, _) = serialize(&mut source).unwrap();
    let back = deserialize_value::<(Pair, u8)>(buffer.as_slice()).unwrap();
    assert_eq!(back, source);
    unregister_reconstructor::<(Pair, u8)>();
}

/// Hand-written impl whose routine returns storage it does not own.
#[derive(Debug)]
struct Rogue(u8);

impl Serialize for Rogue {
    fn serialize<S: Serializer>(&mut self, s: &mut S) -> stowage::Result<()> {
        s.field(&mut self.0)
    }
}

impl Reconstruct for Rogue {
    fn reconstructor() -> Reconstructor<Self> {
        Reconstructor::Intrinsic(|_slot| Box::leak(Box::new(Rogue(0))))
    }
}

#[test]
fn routine_returning_foreign_storage_is_rejected() {
    let err = deserialize::<Rogue>(&[3]).unwrap_err();
    assert!(matches!(err, Error::InvalidReconstruction { .. }));
}

#[test]
fn failed_population_releases_constructed_value() {
    // Two elements announced, bytes for one.
    let mut bytes = 2u64.to_ne_bytes().to_vec();
    bytes.extend_from_slice(&1u64.to_ne_bytes());
    bytes.push(b'x');
    let err = deserialize_value::<Vec<String>>(&bytes).unwrap_err();
    assert!(matches!(err, Error::BufferOverrun { .. }));
}
