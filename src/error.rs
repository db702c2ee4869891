//! Error types for registry and future misuse.
//!
//! Operational failures are not errors in this sense: they are data carried
//! by a completed slot as a [`Status`]. [`FutureError`] describes the ways a
//! caller can break the completion protocol (double completion, a handle from
//! another registry, reading a result that is not there).
//!
//! The panicking APIs (`complete_success`, `result`, ...) treat every
//! `FutureError` as fatal; the `try_` variants hand it back instead.

use crate::registry::RawHandle;
use crate::status::Status;
use crate::types::RegistryId;

/// Misuse of a completion registry or future value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FutureError {
    /// The slot was already completed; a slot completes exactly once.
    #[error("slot {handle} was already completed")]
    AlreadyCompleted {
        /// The slot that was completed twice.
        handle: RawHandle,
    },
    /// The handle was allocated by a different registry.
    #[error("handle {handle} does not belong to registry {registry}")]
    ForeignHandle {
        /// The offending handle.
        handle: RawHandle,
        /// The registry it was presented to.
        registry: RegistryId,
    },
    /// The slot was allocated for a different result type.
    #[error("slot {handle} holds `{stored}`, not `{requested}`")]
    TypeMismatch {
        /// The slot being accessed.
        handle: RawHandle,
        /// Type the slot was allocated for.
        stored: &'static str,
        /// Type the caller asked for.
        requested: &'static str,
    },
    /// The API-function index is outside the registry's last-result table.
    #[error("function index {fn_idx} is out of range (registry tracks {count})")]
    FunctionIndexOutOfRange {
        /// The requested index.
        fn_idx: usize,
        /// Number of tracked function indices.
        count: usize,
    },
    /// The future has not completed yet.
    #[error("future is still pending")]
    Pending,
    /// The future has no backing registry.
    #[error("future is invalid (no backing registry)")]
    Invalid,
    /// The future completed with a failure.
    #[error("future failed: {0}")]
    Failed(Status),
    /// The future completed successfully but carries no result value.
    #[error("future completed without a result value")]
    NoPayload,
}

impl FutureError {
    /// Returns the failure status if this error wraps an operational failure.
    #[must_use]
    pub fn status(&self) -> Option<&Status> {
        match self {
            Self::Failed(status) => Some(status),
            _ => None,
        }
    }

    /// Returns true if this error indicates a broken completion protocol
    /// rather than a state the caller can legitimately observe.
    #[must_use]
    pub const fn is_misuse(&self) -> bool {
        matches!(
            self,
            Self::AlreadyCompleted { .. }
                | Self::ForeignHandle { .. }
                | Self::TypeMismatch { .. }
                | Self::FunctionIndexOutOfRange { .. }
        )
    }
}

impl From<Status> for FutureError {
    fn from(status: Status) -> Self {
        Self::Failed(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Code;
    use crate::util::ArenaIndex;

    fn raw(registry: u32, index: u32) -> RawHandle {
        RawHandle::from_parts(RegistryId::new_for_test(registry), ArenaIndex::new(index))
    }

    #[test]
    fn display_messages() {
        let err = FutureError::AlreadyCompleted { handle: raw(1, 2) };
        assert_eq!(err.to_string(), "slot Reg1#2 was already completed");

        let err = FutureError::ForeignHandle {
            handle: raw(1, 0),
            registry: RegistryId::new_for_test(4),
        };
        assert_eq!(err.to_string(), "handle Reg1#0 does not belong to registry Reg4");

        let err = FutureError::Failed(Status::new(Code::NotFound, "gone"));
        assert_eq!(err.to_string(), "future failed: NOT_FOUND: gone");
    }

    #[test]
    fn misuse_classification() {
        assert!(FutureError::AlreadyCompleted { handle: raw(1, 0) }.is_misuse());
        assert!(
            FutureError::FunctionIndexOutOfRange {
                fn_idx: 3,
                count: 1
            }
            .is_misuse()
        );
        assert!(!FutureError::Pending.is_misuse());
        assert!(!FutureError::Failed(Status::new(Code::Internal, "x")).is_misuse());
    }

    #[test]
    fn status_accessor_and_from() {
        let err: FutureError = Status::new(Code::Cancelled, "stop").into();
        assert_eq!(err.status().map(Status::code), Some(Code::Cancelled));
        assert!(FutureError::NoPayload.status().is_none());
    }
}
