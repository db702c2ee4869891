//! Identifier types.
//!
//! Every [`CompletionRegistry`](crate::registry::CompletionRegistry) gets a
//! process-unique [`RegistryId`]. Handles carry the id of the registry that
//! allocated them so a handle presented to the wrong registry is caught
//! instead of silently aliasing an unrelated slot.

use core::fmt;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_REGISTRY_ID: AtomicU32 = AtomicU32::new(1);

/// A process-unique identifier for a completion registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryId(u32);

impl RegistryId {
    /// Allocates a fresh identifier.
    ///
    /// Identifiers are never reused within a process.
    ///
    /// # Panics
    ///
    /// Panics once every `u32` identifier has been handed out.
    #[must_use]
    pub fn next() -> Self {
        take_next(&NEXT_REGISTRY_ID)
            .map(Self)
            .unwrap_or_else(|| panic!("registry id space exhausted"))
    }

    /// Creates a registry ID for testing purposes.
    #[doc(hidden)]
    #[must_use]
    pub const fn new_for_test(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw identifier value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// Takes the counter's current value and advances it, refusing to wrap.
fn take_next(counter: &AtomicU32) -> Option<u32> {
    counter
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1))
        .ok()
}

impl fmt::Debug for RegistryId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegistryId({})", self.0)
    }
}

impl fmt::Display for RegistryId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reg{}", self.0)
    }
}
