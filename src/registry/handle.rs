//! Result handles.
//!
//! A handle names one slot inside one registry and nothing else: it owns no
//! data and keeps nothing alive. [`RawHandle`] is the untyped identity;
//! [`ResultHandle<T>`] adds the result type at compile time.

use crate::types::RegistryId;
use crate::util::ArenaIndex;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

/// Untyped identity of a slot: the owning registry plus the slot index.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawHandle {
    registry: RegistryId,
    index: ArenaIndex,
}

impl RawHandle {
    /// Creates a handle from its parts (internal use).
    #[inline]
    #[must_use]
    #[cfg_attr(feature = "test-internals", visibility::make(pub))]
    pub(crate) const fn from_parts(registry: RegistryId, index: ArenaIndex) -> Self {
        Self { registry, index }
    }

    /// Returns the id of the registry that allocated this handle.
    #[inline]
    #[must_use]
    pub const fn registry_id(self) -> RegistryId {
        self.registry
    }

    /// Returns the slot index within the owning registry.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index.index()
    }

    #[inline]
    pub(crate) const fn arena_index(self) -> ArenaIndex {
        self.index
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawHandle({}:{})", self.registry.as_u32(), self.index.index())
    }
}

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.registry, self.index.index())
    }
}

/// A typed handle to a slot that will hold a `T` once completed.
///
/// Copy, comparable and hashable regardless of `T`.
pub struct ResultHandle<T> {
    raw: RawHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ResultHandle<T> {
    /// Gives an untyped handle a result type (internal use).
    #[inline]
    #[must_use]
    #[cfg_attr(feature = "test-internals", visibility::make(pub))]
    pub(crate) const fn from_raw(raw: RawHandle) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Returns the untyped identity of this handle.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> RawHandle {
        self.raw
    }

    /// Returns the id of the registry that allocated this handle.
    #[inline]
    #[must_use]
    pub const fn registry_id(self) -> RegistryId {
        self.raw.registry_id()
    }

    /// Returns the slot index within the owning registry.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.raw.index()
    }
}

impl<T> Clone for ResultHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ResultHandle<T> {}

impl<T> PartialEq for ResultHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for ResultHandle<T> {}

impl<T> Hash for ResultHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for ResultHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ResultHandle<{}>({}:{})",
            core::any::type_name::<T>(),
            self.raw.registry_id().as_u32(),
            self.raw.index()
        )
    }
}

impl<T> From<ResultHandle<T>> for RawHandle {
    fn from(handle: ResultHandle<T>) -> Self {
        handle.raw
    }
}
