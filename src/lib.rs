//! Settle: handle-based completion registry and copyable future values.
//!
//! # Overview
//!
//! An asynchronous operation reserves a slot in a [`CompletionRegistry`] and
//! gets back a typed [`ResultHandle`]. Callers hold a [`FutureValue`], a
//! cheap, copyable view of that slot. The producer completes the slot exactly
//! once, with a value or with a [`Status`], from any thread, and every copy of
//! the future observes the same result.
//!
//! # Core Guarantees
//!
//! - **Single completion**: a slot moves from pending to completed once and never back
//! - **Consistent observation**: every copy of a future sees the same outcome
//! - **Exact errors**: failure codes and messages are reported exactly as supplied
//! - **Typed handles**: a handle can only be completed or queried with its own type
//! - **Shared sentinel**: [`invalid_future`] returns one cached, already failed future
//!
//! # Module Structure
//!
//! - [`registry`]: The completion registry, handles, and the shared default registry
//! - [`future`]: Caller-facing future values
//! - [`resolved`]: Already-resolved futures and the invalid-state sentinel
//! - [`status`]: Error codes and statuses
//! - [`error`](mod@error): Misuse and observation errors
//! - [`config`]: Registry configuration (env vars, optional TOML)
//! - [`types`]: Identifiers
//! - [`util`]: Internal utilities (append-only arena)
//! - [`tracing_compat`]: Optional tracing integration (requires `tracing-integration` feature)
//!
//! # Example
//!
//! ```
//! use settle::{Code, CompletionRegistry, FutureStatus};
//!
//! let registry = CompletionRegistry::default();
//! let handle = registry.allocate::<String>();
//! let future = registry.future(handle);
//! assert_eq!(future.status(), FutureStatus::Pending);
//!
//! registry.complete_failure(handle, Code::NotFound, "no such document");
//! assert_eq!(future.error_code(), Code::NotFound);
//! assert_eq!(future.error_message(), "no such document");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]

pub mod config;
pub mod error;
pub mod future;
pub mod registry;
pub mod resolved;
pub mod status;
pub mod tracing_compat;
pub mod types;
pub mod util;

// ── Test-only modules ───────────────────────────────────────────────────
#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

// Re-exports for convenient access to core types
pub use config::{ConfigError, RegistryConfig};
pub use error::FutureError;
pub use future::{FutureStatus, FutureValue};
pub use registry::{
    CompletionRegistry, Outcome, RawHandle, ResultHandle, SlotSnapshot, SlotStatus,
    shared_registry,
};
pub use resolved::{INVALID_STATE_MESSAGE, failed_future, invalid_future, successful_future};
pub use status::{Code, Status};
pub use types::RegistryId;
