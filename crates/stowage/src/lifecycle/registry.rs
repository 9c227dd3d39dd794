// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! External reconstruction registry.
//!
//! Lets code outside a type supply its reconstruction routine, for types the
//! caller does not own or whose construction needs outside context. Entries
//! are keyed by `TypeId` and take precedence over the type's intrinsic and
//! default-construct strategies.
//!
//! The registry is process-wide. Registration is expected at startup; lookups
//! on the unpacking path are lock-free reads of a sharded map.

use std::any::{type_name, Any, TypeId};
use std::mem::MaybeUninit;
use std::sync::OnceLock;

use dashmap::DashMap;

use crate::ser::SerializerState;

/// External reconstruction routine. Receives the unpacking serializer's state
/// and the reserved slot; must initialize the slot and return it.
pub type ExternalFn<T> = for<'s> fn(&dyn SerializerState, &'s mut MaybeUninit<T>) -> &'s mut T;

struct Entry {
    type_name: &'static str,
    routine: Box<dyn Any + Send + Sync>,
}

fn entries() -> &'static DashMap<TypeId, Entry> {
    static REGISTRY: OnceLock<DashMap<TypeId, Entry>> = OnceLock::new();
    REGISTRY.get_or_init(DashMap::new)
}

/// Register `routine` as the external reconstructor of `T`.
///
/// Returns `true` if it replaced an earlier registration.
pub fn register_reconstructor<T: 'static>(routine: ExternalFn<T>) -> bool {
    let replaced = entries()
        .insert(
            TypeId::of::<T>(),
            Entry {
                type_name: type_name::<T>(),
                routine: Box::new(routine),
            },
        )
        .is_some();
    if replaced {
        log::warn!(
            "[stowage::registry] replaced external reconstructor for {}",
            type_name::<T>()
        );
    } else {
        log::debug!(
            "[stowage::registry] registered external reconstructor for {}",
            type_name::<T>()
        );
    }
    replaced
}

/// Remove the external reconstructor of `T`. Returns `true` if one existed.
pub fn unregister_reconstructor<T: 'static>() -> bool {
    match entries().remove(&TypeId::of::<T>()) {
        Some((_, entry)) => {
            log::debug!(
                "[stowage::registry] removed external reconstructor for {}",
                entry.type_name
            );
            true
        }
        None => false,
    }
}

/// Registered routine for `T`, if any.
pub fn lookup<T: 'static>() -> Option<ExternalFn<T>> {
    let entry = entries().get(&TypeId::of::<T>())?;
    entry.routine.downcast_ref::<ExternalFn<T>>().copied()
}

/// Whether an external reconstructor is registered for `T`.
pub fn contains<T: 'static>() -> bool {
    entries().contains_key(&TypeId::of::<T>())
}

/// Number of types with an external reconstructor.
pub fn registered_count() -> usize {
    entries().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe(u32);
    struct Other;

    fn make_probe<'s>(_: &dyn SerializerState, slot: &'s mut MaybeUninit<Probe>) -> &'s mut Probe {
        slot.write(Probe(5))
    }

    fn make_probe_again<'s>(
        _: &dyn SerializerState,
        slot: &'s mut MaybeUninit<Probe>,
    ) -> &'s mut Probe {
        slot.write(Probe(6))
    }

    #[test]
    fn test_register_lookup_unregister() {
        assert!(lookup::<Other>().is_none());

        assert!(!register_reconstructor::<Probe>(make_probe));
        assert!(contains::<Probe>());
        assert!(!contains::<Other>());

        let routine = lookup::<Probe>().expect("Probe should be registered");
        let state = crate::ser::Sizer::new();
        let mut slot = MaybeUninit::uninit();
        assert_eq!(routine(&state, &mut slot).0, 5);

        assert!(register_reconstructor::<Probe>(make_probe_again));
        let routine = lookup::<Probe>().expect("Probe should be registered");
        assert_eq!(routine(&state, &mut slot).0, 6);

        assert!(unregister_reconstructor::<Probe>());
        assert!(!unregister_reconstructor::<Probe>());
        assert!(lookup::<Probe>().is_none());
    }
}
