//! Internal utilities.
//!
//! These utilities are intentionally minimal and dependency-free.

pub mod arena;

pub use arena::{Arena, ArenaIndex};
