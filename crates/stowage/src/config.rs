// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Engine configuration.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: wire-format constants shared by every pass.
//! - **Level 2 (Dynamic)**: [`Limits`], a process-wide snapshot consulted at the
//!   start of each top-level call and whenever a container length is decoded.
//!
//! Limits are swapped atomically (`ArcSwap`), so readers never block and a
//! call that is already running keeps the snapshot it started with.
//!
//! # Example
//!
//! ```rust
//! use stowage::config::{limits, set_limits, Limits};
//!
//! let previous = limits();
//! set_limits(Limits {
//!     max_container_len: 1024,
//!     ..*previous
//! });
//! assert_eq!(limits().max_container_len, 1024);
//! set_limits(*previous);
//! ```

use arc_swap::ArcSwap;
use std::sync::{Arc, OnceLock};

// =======================================================================
// Wire format
// =======================================================================

/// Type used to encode container lengths ahead of their elements.
pub type LengthPrefix = u64;

/// Size in bytes of a container length prefix.
pub const LENGTH_PREFIX_BYTES: usize = core::mem::size_of::<LengthPrefix>();

/// Size in bytes of the presence tag written before an `Option` payload.
pub const OPTION_TAG_BYTES: usize = 1;

/// Size in bytes of the variant index written before an enum payload.
pub const VARIANT_TAG_BYTES: usize = 4;

// =======================================================================
// Default limits
// =======================================================================

/// Largest buffer a top-level call will request (4 GiB).
pub const DEFAULT_MAX_BUFFER_BYTES: u64 = 1 << 32;

/// Largest container length accepted while unpacking (2^28 elements).
pub const DEFAULT_MAX_CONTAINER_LEN: u64 = 1 << 28;

/// Deepest chain of nested values materialized while unpacking.
pub const DEFAULT_MAX_DEPTH: u32 = 128;

/// Environment override for [`Limits::max_buffer_bytes`].
pub const ENV_MAX_BUFFER_BYTES: &str = "STOWAGE_MAX_BUFFER_BYTES";

/// Environment override for [`Limits::max_container_len`].
pub const ENV_MAX_CONTAINER_LEN: &str = "STOWAGE_MAX_CONTAINER_LEN";

/// Environment override for [`Limits::max_depth`].
pub const ENV_MAX_DEPTH: &str = "STOWAGE_MAX_DEPTH";

/// Resource limits applied by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Upper bound on the size of a buffer requested from a supplier.
    pub max_buffer_bytes: u64,
    /// Upper bound on a decoded container length.
    pub max_container_len: u64,
    /// Upper bound on nested materialization while unpacking.
    pub max_depth: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
            max_container_len: DEFAULT_MAX_CONTAINER_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Limits {
    /// Defaults overridden by `STOWAGE_MAX_BUFFER_BYTES`,
    /// `STOWAGE_MAX_CONTAINER_LEN` and `STOWAGE_MAX_DEPTH` when they hold
    /// valid integers.
    pub fn from_env() -> Self {
        let mut limits = Self::default();
        if let Some(v) = read_env_u64(ENV_MAX_BUFFER_BYTES) {
            limits.max_buffer_bytes = v;
        }
        if let Some(v) = read_env_u64(ENV_MAX_CONTAINER_LEN) {
            limits.max_container_len = v;
        }
        if let Some(v) = read_env_u64(ENV_MAX_DEPTH) {
            limits.max_depth = u32::try_from(v).unwrap_or(u32::MAX);
        }
        limits
    }

    /// Whether a buffer of `bytes` may be requested.
    pub fn allows_buffer(&self, bytes: usize) -> bool {
        u64::try_from(bytes).map_or(false, |b| b <= self.max_buffer_bytes)
    }

    /// Whether a decoded container of `len` elements may be materialized.
    pub fn allows_container(&self, len: u64) -> bool {
        len <= self.max_container_len
    }

    /// Whether a value may be materialized at nesting `depth`.
    pub fn allows_depth(&self, depth: u32) -> bool {
        depth <= self.max_depth
    }
}

fn read_env_u64(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("[stowage::config] ignoring {}={:?}: not an integer", key, raw);
            None
        }
    }
}

fn store() -> &'static ArcSwap<Limits> {
    static LIMITS: OnceLock<ArcSwap<Limits>> = OnceLock::new();
    LIMITS.get_or_init(|| ArcSwap::from_pointee(Limits::from_env()))
}

/// Current limits snapshot.
pub fn limits() -> Arc<Limits> {
    store().load_full()
}

/// Replace the process-wide limits.
pub fn set_limits(limits: Limits) {
    log::debug!("[stowage::config] limits updated: {:?}", limits);
    store().store(Arc::new(limits));
}
