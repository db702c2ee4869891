//! Core value types.
//!
//! - [`id`]: Identifier types (`RegistryId`)

pub mod id;

pub use id::RegistryId;
