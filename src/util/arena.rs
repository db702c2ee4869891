//! Append-only arena for completion slots.
//!
//! The arena hands out dense `u32` indices that stay valid for as long as the
//! arena exists. There is no removal: a slot lives exactly as long as its
//! owning registry, so late copies of a future can always find it.
//!
//! # Design
//!
//! - Elements are stored in a `Vec`; the index is the insertion position
//! - Growth is amortized by the `Vec`, so insertion never fails short of
//!   exhausting the `u32` index space
//! - No unsafe code; relies on bounds checking

use core::fmt;

/// A stable index into an [`Arena`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArenaIndex(u32);

impl ArenaIndex {
    /// Creates a new arena index (primarily for testing).
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index value.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ArenaIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArenaIndex({})", self.0)
    }
}

/// A grow-only arena with stable indices.
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Creates a new empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Creates a new arena with room for `capacity` elements.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the arena holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Inserts a value and returns its index.
    pub fn insert(&mut self, value: T) -> ArenaIndex {
        self.insert_with(|_| value)
    }

    /// Inserts a value produced by `f` and returns its index.
    ///
    /// The closure receives the index the value will live at, so records can
    /// embed their own identity without a second pass.
    pub fn insert_with<F>(&mut self, f: F) -> ArenaIndex
    where
        F: FnOnce(ArenaIndex) -> T,
    {
        let index = ArenaIndex(u32::try_from(self.slots.len()).expect("arena overflow"));
        self.slots.push(f(index));
        index
    }

    /// Returns a reference to the value at `index`, or `None` if the index
    /// was never handed out by this arena.
    #[must_use]
    pub fn get(&self, index: ArenaIndex) -> Option<&T> {
        self.slots.get(index.0 as usize)
    }

    /// Returns true if `index` refers to an element of this arena.
    #[must_use]
    pub fn contains(&self, index: ArenaIndex) -> bool {
        self.get(index).is_some()
    }

    /// Iterates over all elements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ArenaIndex, &T)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, value)| (ArenaIndex(i as u32), value))
    }
}
