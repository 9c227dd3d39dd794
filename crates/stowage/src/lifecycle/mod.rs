// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lifecycle and reconstruction resolver.
//!
//! On the unpacking path every non-leaf value is first *constructed* into a
//! reserved slot, then *populated* by its traversal routine. Construction never
//! reads the byte stream, so the population order is the same as the packing
//! order.
//!
//! How a value is constructed is resolved per type, in this order:
//!
//! 1. **Leaf**: byte-copyable types are zero-filled and skip resolution.
//! 2. **External**: a routine registered with
//!    [`register_reconstructor`]; it also receives the serializer state.
//! 3. **Intrinsic**: [`Reconstructor::Intrinsic`], a routine owned by the type.
//! 4. **Default construct**: [`Reconstructor::DefaultConstruct`].
//!
//! A type declaring [`Reconstructor::External`] with nothing registered fails
//! with [`Error::MissingReconstructor`]. Composite types (tuples, arrays,
//! `Box`) consult the registry, then construct slot by slot.
//!
//! Reconstruction routines write into a `MaybeUninit<T>` and return the
//! reference they initialized. A returned reference that does not point at the
//! reserved slot is rejected with [`Error::InvalidReconstruction`].

pub mod registry;

pub use registry::{register_reconstructor, registered_count, unregister_reconstructor, ExternalFn};

use std::any::type_name;
use std::mem::MaybeUninit;

use crate::dispatch::{Serialize, Traversal};
use crate::error::{Error, Result};
use crate::ser::{Mode, Serializer, SerializerState};

/// Intrinsic reconstruction routine: initializes the slot and returns it.
pub type IntrinsicFn<T> = for<'s> fn(&'s mut MaybeUninit<T>) -> &'s mut T;

/// How a type is brought into existence before population.
pub enum Reconstructor<T> {
    /// Byte-copyable leaf: produce a filler value, bytes are overwritten.
    Leaf(fn() -> T),
    /// Type-owned placement routine.
    Intrinsic(IntrinsicFn<T>),
    /// Default construction.
    DefaultConstruct(fn() -> T),
    /// Requires a routine in the external registry.
    External,
    /// Constructed slot by slot by the type's own `construct_in`.
    Composite,
}

impl<T> Clone for Reconstructor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Reconstructor<T> {}

impl<T> std::fmt::Debug for Reconstructor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Reconstructor::Leaf(_) => "Leaf",
            Reconstructor::Intrinsic(_) => "Intrinsic",
            Reconstructor::DefaultConstruct(_) => "DefaultConstruct",
            Reconstructor::External => "External",
            Reconstructor::Composite => "Composite",
        })
    }
}

/// Strategy the resolver will pick for a type, given the current registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Descriptor {
    Leaf,
    External,
    Intrinsic,
    DefaultConstruct,
    Composite,
    /// Declared external, nothing registered.
    Missing,
}

/// Types that can be brought into existence during unpacking.
///
/// Most types only provide [`reconstructor`](Reconstruct::reconstructor);
/// composite types override [`construct_in`](Reconstruct::construct_in).
pub trait Reconstruct: Serialize + Sized + 'static {
    fn reconstructor() -> Reconstructor<Self>;

    /// Construct an unpopulated value in `slot` and return it.
    ///
    /// Types overriding this must report [`Reconstructor::Composite`];
    /// container elements of any other kind are built straight from the
    /// resolution chain.
    fn construct_in<'a>(
        slot: &'a mut MaybeUninit<Self>,
        state: &dyn SerializerState,
    ) -> Result<&'a mut Self> {
        resolve_in(slot, state)
    }
}

/// Default resolution chain: leaf, external, intrinsic, default construct.
pub fn resolve_in<'a, T: Reconstruct>(
    slot: &'a mut MaybeUninit<T>,
    state: &dyn SerializerState,
) -> Result<&'a mut T> {
    let reconstructor = T::reconstructor();
    if let Reconstructor::Leaf(fill) = reconstructor {
        return Ok(slot.write(fill()));
    }
    resolve_with(slot, state, reconstructor, registry::lookup::<T>())
}

/// Resolution chain with the registry lookup already done.
fn resolve_with<'a, T: 'static>(
    slot: &'a mut MaybeUninit<T>,
    state: &dyn SerializerState,
    reconstructor: Reconstructor<T>,
    external: Option<ExternalFn<T>>,
) -> Result<&'a mut T> {
    if let Some(routine) = external {
        return run_external(slot, state, routine);
    }

    match reconstructor {
        Reconstructor::Intrinsic(routine) => {
            log::trace!("[lifecycle] {} via intrinsic", type_name::<T>());
            let produced: *mut T = routine(&mut *slot);
            verify_slot(slot, produced)
        }
        Reconstructor::DefaultConstruct(make) | Reconstructor::Leaf(make) => {
            Ok(slot.write(make()))
        }
        Reconstructor::External | Reconstructor::Composite => {
            log::debug!("[lifecycle] no reconstructor for {}", type_name::<T>());
            Err(Error::MissingReconstructor {
                type_name: type_name::<T>(),
            })
        }
    }
}

/// Run a registered external routine against `slot`.
pub fn run_external<'a, T: 'static>(
    slot: &'a mut MaybeUninit<T>,
    state: &dyn SerializerState,
    routine: ExternalFn<T>,
) -> Result<&'a mut T> {
    log::trace!("[lifecycle] {} via external registry", type_name::<T>());
    let produced: *mut T = routine(state, &mut *slot);
    verify_slot(slot, produced)
}

fn verify_slot<'a, T>(slot: &'a mut MaybeUninit<T>, produced: *mut T) -> Result<&'a mut T> {
    if std::ptr::eq(produced, slot.as_mut_ptr()) {
        // SAFETY: the routine returned a `&mut T` to the slot's own storage,
        // which it can only obtain once the slot holds a valid `T`.
        Ok(unsafe { slot.assume_init_mut() })
    } else {
        log::debug!(
            "[lifecycle] {} routine returned a reference outside its slot",
            type_name::<T>()
        );
        Err(Error::InvalidReconstruction {
            type_name: type_name::<T>(),
        })
    }
}

/// Construct an unpopulated `T` on the stack.
pub fn construct<T: Reconstruct>(state: &dyn SerializerState) -> Result<T> {
    let mut slot = MaybeUninit::<T>::uninit();
    let produced: *mut T = T::construct_in(&mut slot, state)?;
    if !std::ptr::eq(produced, slot.as_ptr()) {
        return Err(Error::InvalidReconstruction {
            type_name: type_name::<T>(),
        });
    }
    // SAFETY: `construct_in` returned a reference to the slot itself.
    Ok(unsafe { slot.assume_init() })
}

/// Construct an unpopulated `T` directly in heap storage.
pub fn construct_boxed<T: Reconstruct>(state: &dyn SerializerState) -> Result<Box<T>> {
    let mut slot = Box::<T>::new_uninit();
    let produced: *mut T = T::construct_in(&mut *slot, state)?;
    if !std::ptr::eq(produced, MaybeUninit::as_ptr(&*slot)) {
        return Err(Error::InvalidReconstruction {
            type_name: type_name::<T>(),
        });
    }
    // SAFETY: `construct_in` returned a reference to the boxed slot itself.
    Ok(unsafe { slot.assume_init() })
}

/// Construct then populate a `T` from an unpacking serializer.
pub fn materialize<T, P, S>(s: &mut S) -> Result<T>
where
    T: Reconstruct,
    P: Traversal<T>,
    S: Serializer,
{
    s.require_mode(Mode::Unpacking)?;
    nested::<T, P, S, _>(s, construct::<T>)
}

/// Build a value one nesting level down, then populate it.
fn nested<T, P, S, F>(s: &mut S, build: F) -> Result<T>
where
    P: Traversal<T>,
    S: Serializer,
    F: FnOnce(&dyn SerializerState) -> Result<T>,
{
    s.descend()?;
    let result = build(&*s).and_then(|mut value| {
        P::visit(&mut value, s)?;
        Ok(value)
    });
    s.ascend();
    result
}

/// Construct then populate a `T` in heap storage.
pub fn materialize_boxed<T, P, S>(s: &mut S) -> Result<Box<T>>
where
    T: Reconstruct,
    P: Traversal<T>,
    S: Serializer,
{
    s.require_mode(Mode::Unpacking)?;
    s.descend()?;
    let result = construct_boxed::<T>(&*s).and_then(|mut value| {
        P::visit(&mut *value, s)?;
        Ok(value)
    });
    s.ascend();
    result
}

/// Unpack `len` consecutive elements.
///
/// Byte-copyable elements are constructed up front and filled by one
/// contiguous copy; others are materialized one at a time.
pub fn unpack_elements<T, P, S>(s: &mut S, len: usize) -> Result<Vec<T>>
where
    T: Reconstruct,
    P: Traversal<T>,
    S: Serializer,
{
    s.require_mode(Mode::Unpacking)?;
    if T::BYTE_COPYABLE {
        check_leaf_budget::<T, S>(s, len)?;
        let mut items = reserve::<T>(len)?;
        for _ in 0..len {
            items.push(construct::<T>(&*s)?);
        }
        P::visit_slice(&mut items, s)?;
        return Ok(items);
    }

    // Never trust the prefix for capacity: every element needs at least one
    // byte of input unless it is zero-sized.
    let hint = match s.remaining() {
        Some(remaining) => len.min(remaining),
        None => len,
    };
    let mut items = reserve::<T>(hint)?;

    // One registry lookup per container, not per element. Composites resolve
    // through their own `construct_in`.
    let reconstructor = T::reconstructor();
    if let Reconstructor::Composite = reconstructor {
        for _ in 0..len {
            items.push(nested::<T, P, S, _>(s, construct::<T>)?);
        }
        return Ok(items);
    }
    let external = registry::lookup::<T>();
    for _ in 0..len {
        items.push(nested::<T, P, S, _>(s, |state| {
            let mut slot = MaybeUninit::<T>::uninit();
            resolve_with(&mut slot, state, reconstructor, external)?;
            // SAFETY: `resolve_with` only succeeds once the slot holds a `T`.
            Ok(unsafe { slot.assume_init() })
        })?);
    }
    Ok(items)
}

/// Fail with [`Error::BufferOverrun`] unless `len` leaves of `T` fit in the
/// bytes left in the source.
pub fn check_leaf_budget<T, S: Serializer>(s: &S, len: usize) -> Result<()> {
    let Some(remaining) = s.remaining() else {
        return Ok(());
    };
    let offset = s.usage();
    let requested = len
        .checked_mul(std::mem::size_of::<T>())
        .unwrap_or(usize::MAX);
    if requested > remaining {
        log::debug!(
            "[lifecycle] {} x {} needs {} bytes, {} left",
            len,
            type_name::<T>(),
            requested,
            remaining
        );
        return Err(Error::BufferOverrun {
            offset,
            requested,
            capacity: offset + remaining,
        });
    }
    Ok(())
}

fn reserve<T>(capacity: usize) -> Result<Vec<T>> {
    let mut items = Vec::new();
    items
        .try_reserve_exact(capacity)
        .map_err(|e| Error::AllocationFailure {
            requested: capacity.saturating_mul(std::mem::size_of::<T>()),
            reason: e.to_string(),
        })?;
    Ok(items)
}

/// Report the strategy the resolver would use for `T` right now.
pub fn descriptor_of<T: Reconstruct>() -> Descriptor {
    match T::reconstructor() {
        Reconstructor::Leaf(_) => Descriptor::Leaf,
        _ if registry::contains::<T>() => Descriptor::External,
        Reconstructor::Intrinsic(_) => Descriptor::Intrinsic,
        Reconstructor::DefaultConstruct(_) => Descriptor::DefaultConstruct,
        Reconstructor::Composite => Descriptor::Composite,
        Reconstructor::External => Descriptor::Missing,
    }
}
