//! Result slots and their observable outcomes.
//!
//! A slot is published exactly once through a `OnceLock`. Readers never take
//! a lock: they either see no completion or a fully written one. Callbacks
//! are serialized against publication by a small per-slot mutex so that a
//! callback registered concurrently with completion runs exactly once.
//!
//! A panicking callback does not stop the others: each runs under
//! `catch_unwind`, and the first panic is handed back to the completer to
//! resume once every callback has run.

use crate::status::Status;
use crate::tracing_compat::error;
use core::any::{Any, TypeId};
use core::fmt;
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

pub(crate) type Payload = Arc<dyn Any + Send + Sync>;
pub(crate) type Callback = Box<dyn FnOnce(&Completion) + Send>;
/// Payload of a panic raised by a completion callback.
pub(crate) type CallbackPanic = Box<dyn Any + Send>;

/// Untyped completion stored in a slot.
pub(crate) enum Completion {
    Success(Payload),
    Failure(Status),
}

impl Completion {
    pub(crate) fn status(&self) -> Status {
        match self {
            Self::Success(_) => Status::ok(),
            Self::Failure(status) => status.clone(),
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(_) => f.write_str("Success(..)"),
            Self::Failure(status) => f.debug_tuple("Failure").field(status).finish(),
        }
    }
}

pub(crate) struct Slot {
    /// `None` for detached slots that never carry a payload and may be
    /// viewed as any result type.
    type_id: Option<TypeId>,
    type_name: &'static str,
    completion: OnceLock<Completion>,
    callbacks: Mutex<SmallVec<[Callback; 1]>>,
}

impl Slot {
    pub(crate) fn typed<T: 'static>() -> Self {
        Self::with_tag(Some(TypeId::of::<T>()), core::any::type_name::<T>())
    }

    pub(crate) fn detached() -> Self {
        Self::with_tag(None, "<detached>")
    }

    fn with_tag(type_id: Option<TypeId>, type_name: &'static str) -> Self {
        Self {
            type_id,
            type_name,
            completion: OnceLock::new(),
            callbacks: Mutex::new(SmallVec::new()),
        }
    }

    pub(crate) fn accepts<T: 'static>(&self) -> bool {
        self.type_id.is_none_or(|id| id == TypeId::of::<T>())
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn is_completed(&self) -> bool {
        self.completion.get().is_some()
    }

    pub(crate) fn completion(&self) -> Option<&Completion> {
        self.completion.get()
    }

    /// Publishes `completion` and runs pending callbacks on this thread.
    ///
    /// Every callback runs even if an earlier one panics. Returns the first
    /// callback panic, if any, for the caller to resume, or the rejected
    /// completion if the slot was already completed.
    pub(crate) fn complete(
        &self,
        completion: Completion,
    ) -> Result<Option<CallbackPanic>, Completion> {
        let callbacks = {
            let mut callbacks = self.callbacks.lock();
            self.completion.set(completion)?;
            std::mem::take(&mut *callbacks)
        };
        let mut first_panic = None;
        if let Some(done) = self.completion.get() {
            for callback in callbacks {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(done))) {
                    error!(slot_type = self.type_name, "completion callback panicked");
                    first_panic.get_or_insert(payload);
                }
            }
        }
        Ok(first_panic)
    }

    /// Runs `callback` once the slot completes, or right away if it already has.
    pub(crate) fn on_completion(&self, callback: Callback) {
        let mut callbacks = self.callbacks.lock();
        if let Some(done) = self.completion.get() {
            drop(callbacks);
            callback(done);
        } else {
            callbacks.push(callback);
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_callbacks(&self) -> usize {
        self.callbacks.lock().len()
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("type_name", &self.type_name)
            .field("completion", &self.completion.get())
            .finish_non_exhaustive()
    }
}

/// Whether a slot has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotStatus {
    /// No completion has been published yet.
    Pending,
    /// The slot holds its final outcome.
    Completed,
}

/// The final outcome of a completed slot, viewed as result type `T`.
pub enum Outcome<T> {
    /// Completed with a value.
    Success(Arc<T>),
    /// Completed with an error code and message.
    ///
    /// A failure whose code is `Code::Ok` is a payload-free success, used by
    /// operations that have no result value.
    Failure(Status),
}

impl<T> Outcome<T> {
    /// Returns true if the outcome is a success, with or without a value.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        match self {
            Self::Success(_) => true,
            Self::Failure(status) => status.is_ok(),
        }
    }

    /// Returns the success value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&Arc<T>> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Returns the completion status (`Code::Ok` for successes).
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Self::Success(_) => Status::ok(),
            Self::Failure(status) => status.clone(),
        }
    }
}

impl<T> Clone for Outcome<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Success(value) => Self::Success(Arc::clone(value)),
            Self::Failure(status) => Self::Failure(status.clone()),
        }
    }
}

impl<T: PartialEq> PartialEq for Outcome<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Success(a), Self::Success(b)) => a == b,
            (Self::Failure(a), Self::Failure(b)) => a == b,
            _ => false,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(value) => f.debug_tuple("Success").field(value).finish(),
            Self::Failure(status) => f.debug_tuple("Failure").field(status).finish(),
        }
    }
}

/// A consistent snapshot of a slot: either fully pending or fully completed.
pub enum SlotSnapshot<T> {
    /// Not completed yet.
    Pending,
    /// Completed with the contained outcome.
    Completed(Outcome<T>),
}

impl<T> SlotSnapshot<T> {
    /// Returns the slot status.
    #[must_use]
    pub fn status(&self) -> SlotStatus {
        match self {
            Self::Pending => SlotStatus::Pending,
            Self::Completed(_) => SlotStatus::Completed,
        }
    }

    /// Returns true if the slot has completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Returns the outcome, if completed.
    #[must_use]
    pub fn outcome(&self) -> Option<&Outcome<T>> {
        match self {
            Self::Pending => None,
            Self::Completed(outcome) => Some(outcome),
        }
    }

    /// Consumes the snapshot, returning the outcome if completed.
    #[must_use]
    pub fn into_outcome(self) -> Option<Outcome<T>> {
        match self {
            Self::Pending => None,
            Self::Completed(outcome) => Some(outcome),
        }
    }
}

impl<T> Clone for SlotSnapshot<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Pending => Self::Pending,
            Self::Completed(outcome) => Self::Completed(outcome.clone()),
        }
    }
}

impl<T: PartialEq> PartialEq for SlotSnapshot<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Pending, Self::Pending) => true,
            (Self::Completed(a), Self::Completed(b)) => a == b,
            _ => false,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SlotSnapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Completed(outcome) => f.debug_tuple("Completed").field(outcome).finish(),
        }
    }
}
