//! Future values.
//!
//! A [`FutureValue<T>`] is the caller-facing view of one registry slot: a
//! registry reference plus a result handle. Copies are cheap and all of them
//! observe the same completion. There is no blocking wait here; callers poll
//! [`is_completed`](FutureValue::is_completed) or register
//! [`on_completion`](FutureValue::on_completion).

use crate::error::FutureError;
use crate::registry::{CompletionRegistry, Outcome, ResultHandle, SlotSnapshot};
use crate::status::{Code, Status};
use core::fmt;
use std::sync::Arc;

/// Observable state of a [`FutureValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FutureStatus {
    /// The operation finished, successfully or not.
    Complete,
    /// The operation has not finished yet.
    Pending,
    /// The future is not backed by any registry.
    Invalid,
}

/// A shared, copyable handle to an eventually completed result.
pub struct FutureValue<T> {
    backing: Option<(CompletionRegistry, ResultHandle<T>)>,
}

impl<T> FutureValue<T> {
    pub(crate) fn new(registry: CompletionRegistry, handle: ResultHandle<T>) -> Self {
        Self {
            backing: Some((registry, handle)),
        }
    }

    /// Returns a future with no backing registry; its status is
    /// [`FutureStatus::Invalid`].
    #[must_use]
    pub const fn invalid() -> Self {
        Self { backing: None }
    }

    /// Returns the backing registry, if any.
    #[must_use]
    pub fn registry(&self) -> Option<&CompletionRegistry> {
        self.backing.as_ref().map(|(registry, _)| registry)
    }

    /// Returns the result handle, if any.
    #[must_use]
    pub fn handle(&self) -> Option<ResultHandle<T>> {
        self.backing.as_ref().map(|(_, handle)| *handle)
    }
}

impl<T: Send + Sync + 'static> FutureValue<T> {
    fn snapshot(&self) -> Option<SlotSnapshot<T>> {
        let (registry, handle) = self.backing.as_ref()?;
        Some(registry.query(*handle))
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> FutureStatus {
        match self.snapshot() {
            None => FutureStatus::Invalid,
            Some(SlotSnapshot::Pending) => FutureStatus::Pending,
            Some(SlotSnapshot::Completed(_)) => FutureStatus::Complete,
        }
    }

    /// Returns true once the operation has finished, successfully or not.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status() == FutureStatus::Complete
    }

    /// Returns true if the future completed successfully.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self.snapshot(), Some(SlotSnapshot::Completed(outcome)) if outcome.is_ok())
    }

    /// Returns the outcome if the future has completed.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome<T>> {
        self.snapshot()?.into_outcome()
    }

    /// Returns the success value.
    ///
    /// # Panics
    ///
    /// Panics if the future is invalid, pending, failed, or completed without
    /// a value. Check [`is_completed`](Self::is_completed) and
    /// [`is_ok`](Self::is_ok) first, or use [`try_result`](Self::try_result).
    #[must_use]
    pub fn result(&self) -> Arc<T> {
        self.try_result()
            .unwrap_or_else(|err| panic!("result() is not available: {err}"))
    }

    /// Returns the success value, or why there is none.
    pub fn try_result(&self) -> Result<Arc<T>, FutureError> {
        match self.snapshot() {
            None => Err(FutureError::Invalid),
            Some(SlotSnapshot::Pending) => Err(FutureError::Pending),
            Some(SlotSnapshot::Completed(Outcome::Success(value))) => Ok(value),
            Some(SlotSnapshot::Completed(Outcome::Failure(status))) if status.is_ok() => {
                Err(FutureError::NoPayload)
            }
            Some(SlotSnapshot::Completed(Outcome::Failure(status))) => {
                Err(FutureError::Failed(status))
            }
        }
    }

    /// Returns the completion status: the failure code and message, or
    /// `Code::Ok` with an empty message for a success.
    ///
    /// # Panics
    ///
    /// Panics if the future is invalid or still pending.
    #[must_use]
    pub fn error(&self) -> Status {
        match self.snapshot() {
            None => panic!("error() called on an invalid future"),
            Some(SlotSnapshot::Pending) => panic!("error() called on a pending future"),
            Some(SlotSnapshot::Completed(outcome)) => outcome.status(),
        }
    }

    /// Shorthand for `self.error().code()`.
    #[must_use]
    pub fn error_code(&self) -> Code {
        self.error().code()
    }

    /// Shorthand for the message of [`error`](Self::error).
    #[must_use]
    pub fn error_message(&self) -> String {
        let status = self.error();
        status.message().to_string()
    }

    /// Runs `callback` once this future completes, or immediately if it
    /// already has. An invalid future never completes, so the callback is
    /// dropped without running.
    pub fn on_completion<F>(&self, callback: F)
    where
        F: FnOnce(&Self) + Send + 'static,
    {
        if let Some((registry, handle)) = &self.backing {
            registry.on_completion(*handle, callback);
        }
    }
}

impl<T> Default for FutureValue<T> {
    fn default() -> Self {
        Self::invalid()
    }
}

impl<T> Clone for FutureValue<T> {
    fn clone(&self) -> Self {
        Self {
            backing: self.backing.clone(),
        }
    }
}

impl<T> PartialEq for FutureValue<T> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.backing, &other.backing) {
            (None, None) => true,
            (Some((ra, ha)), Some((rb, hb))) => ra.ptr_eq(rb) && ha == hb,
            _ => false,
        }
    }
}

impl<T> Eq for FutureValue<T> {}

impl<T> fmt::Debug for FutureValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.backing {
            None => f.write_str("FutureValue(<invalid>)"),
            Some((registry, handle)) => f
                .debug_struct("FutureValue")
                .field("registry", &registry.label())
                .field("handle", handle)
                .finish(),
        }
    }
}
