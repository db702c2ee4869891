//! The completion registry.
//!
//! A [`CompletionRegistry`] owns an arena of result slots shared by every
//! future value and every in-flight operation that refers to it. The
//! registry is a cheap, cloneable handle over reference-counted state:
//! cloning retains it, dropping a clone releases it, and slot storage is
//! freed when the last clone goes away.
//!
//! # Slot lifecycle
//!
//! ```text
//! allocate() ──► Pending ──complete_success()──► Completed(Success(T))
//!                   │
//!                   └────complete_failure()────► Completed(Failure(code, msg))
//! ```
//!
//! A slot completes exactly once. A second completion, a handle presented to
//! a registry that did not allocate it, or a result-type mismatch is misuse:
//! the plain methods panic, the `try_` methods return a [`FutureError`].
//!
//! Slots are never reclaimed before the registry itself, so a future value
//! copied long after completion still observes the outcome.
//!
//! # Concurrency
//!
//! Allocation takes the arena write lock for the duration of a push.
//! Completion and queries only hold the read lock long enough to locate the
//! slot; the outcome itself is published through a per-slot `OnceLock`, so a
//! query sees either nothing or the whole outcome. Distinct slots complete
//! independently.

mod handle;
mod shared;
mod slot;

pub use handle::{RawHandle, ResultHandle};
pub use shared::shared_registry;
pub use slot::{Outcome, SlotSnapshot, SlotStatus};

use crate::config::RegistryConfig;
use crate::error::FutureError;
use crate::future::FutureValue;
use crate::status::{Code, Status};
use crate::tracing_compat::{debug, trace};
use crate::types::RegistryId;
use crate::util::Arena;
use core::fmt;
use parking_lot::{Mutex, RwLock};
use slot::{Completion, Slot};
use std::sync::{Arc, Weak};

struct RegistryInner {
    id: RegistryId,
    label: String,
    slots: RwLock<Arena<Arc<Slot>>>,
    /// Most recent handle allocated per API-function index.
    last_results: Mutex<Vec<Option<RawHandle>>>,
}

/// Shared, reference-counted store of result slots.
#[derive(Clone)]
pub struct CompletionRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for CompletionRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl CompletionRegistry {
    /// Creates a registry from `config`.
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        let id = RegistryId::next();
        debug!(
            registry = %id,
            label = %config.label,
            initial_capacity = config.initial_capacity,
            last_result_count = config.last_result_count,
            "completion registry created"
        );
        Self {
            inner: Arc::new(RegistryInner {
                id,
                label: config.label,
                slots: RwLock::new(Arena::with_capacity(config.initial_capacity)),
                last_results: Mutex::new(vec![None; config.last_result_count]),
            }),
        }
    }

    /// Creates a registry with default settings and the given label.
    #[must_use]
    pub fn with_label(label: impl Into<String>) -> Self {
        Self::new(RegistryConfig::default().label(label))
    }

    /// Returns this registry's process-unique id.
    #[must_use]
    pub fn id(&self) -> RegistryId {
        self.inner.id
    }

    /// Returns the label used in log events.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Returns the number of slots ever allocated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.slots.read().len()
    }

    /// Returns true if no slot has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.slots.read().is_empty()
    }

    /// Returns the number of slots that have not completed.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner
            .slots
            .read()
            .iter()
            .filter(|(_, slot)| !slot.is_completed())
            .count()
    }

    /// Returns the number of live references to the shared registry state.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Returns true if both values refer to the same registry.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------------
    // Allocation
    // ------------------------------------------------------------------

    /// Reserves a new pending slot for a result of type `T`.
    pub fn allocate<T: Send + Sync + 'static>(&self) -> ResultHandle<T> {
        let raw = self.insert_slot(Slot::typed::<T>());
        trace!(
            registry = %self.inner.id,
            slot = raw.index(),
            result_type = core::any::type_name::<T>(),
            "slot allocated"
        );
        ResultHandle::from_raw(raw)
    }

    /// Reserves a slot and records it as the latest result of API function
    /// `fn_idx`.
    ///
    /// # Panics
    ///
    /// Panics if `fn_idx` is not below the configured `last_result_count`.
    pub fn allocate_for<T: Send + Sync + 'static>(&self, fn_idx: usize) -> ResultHandle<T> {
        self.try_allocate_for(fn_idx)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Fallible form of [`allocate_for`](Self::allocate_for).
    pub fn try_allocate_for<T: Send + Sync + 'static>(
        &self,
        fn_idx: usize,
    ) -> Result<ResultHandle<T>, FutureError> {
        let mut last_results = self.inner.last_results.lock();
        let count = last_results.len();
        let entry = last_results
            .get_mut(fn_idx)
            .ok_or(FutureError::FunctionIndexOutOfRange { fn_idx, count })?;
        let handle = self.allocate::<T>();
        *entry = Some(handle.raw());
        Ok(handle)
    }

    /// Returns the most recent future allocated for API function `fn_idx`.
    ///
    /// Returns `None` if nothing was allocated for that index yet, the index
    /// is out of range, or the slot holds a different result type.
    #[must_use]
    pub fn last_result<T: Send + Sync + 'static>(&self, fn_idx: usize) -> Option<FutureValue<T>> {
        let raw = (*self.inner.last_results.lock().get(fn_idx)?)?;
        self.typed_slot::<T>(raw).ok()?;
        Some(self.future(ResultHandle::from_raw(raw)))
    }

    /// Reserves a slot that carries no payload and may be viewed as any
    /// result type. Only ever completed with a failure.
    pub(crate) fn allocate_detached(&self) -> RawHandle {
        self.insert_slot(Slot::detached())
    }

    fn insert_slot(&self, slot: Slot) -> RawHandle {
        let index = self.inner.slots.write().insert(Arc::new(slot));
        RawHandle::from_parts(self.inner.id, index)
    }

    // ------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------

    /// Completes the slot with `value`.
    ///
    /// # Panics
    ///
    /// Panics if the slot already completed or the handle belongs to another
    /// registry. If a completion callback panics, the first such panic is
    /// resumed here once the slot is published and every callback has run.
    pub fn complete_success<T: Send + Sync + 'static>(&self, handle: ResultHandle<T>, value: T) {
        if let Err(err) = self.try_complete_success(handle, value) {
            panic!("{err}");
        }
    }

    /// Fallible form of [`complete_success`](Self::complete_success).
    pub fn try_complete_success<T: Send + Sync + 'static>(
        &self,
        handle: ResultHandle<T>,
        value: T,
    ) -> Result<(), FutureError> {
        let slot = self.typed_slot::<T>(handle.raw())?;
        self.publish(handle.raw(), &slot, Completion::Success(Arc::new(value)))
    }

    /// Completes the slot by constructing the result in place.
    ///
    /// The registry default-initializes the storage and hands `writer` a
    /// mutable reference to it. The result is published only after `writer`
    /// returns, so a panicking writer leaves the slot pending.
    ///
    /// # Panics
    ///
    /// Panics if the slot already completed or the handle belongs to another
    /// registry.
    pub fn complete_success_with<T, F>(&self, handle: ResultHandle<T>, writer: F)
    where
        T: Default + Send + Sync + 'static,
        F: FnOnce(&mut T),
    {
        if let Err(err) = self.try_complete_success_with(handle, writer) {
            panic!("{err}");
        }
    }

    /// Fallible form of [`complete_success_with`](Self::complete_success_with).
    ///
    /// The writer is not invoked if the slot is already completed.
    pub fn try_complete_success_with<T, F>(
        &self,
        handle: ResultHandle<T>,
        writer: F,
    ) -> Result<(), FutureError>
    where
        T: Default + Send + Sync + 'static,
        F: FnOnce(&mut T),
    {
        let slot = self.typed_slot::<T>(handle.raw())?;
        if slot.is_completed() {
            return Err(FutureError::AlreadyCompleted {
                handle: handle.raw(),
            });
        }
        let mut value = T::default();
        writer(&mut value);
        self.publish(handle.raw(), &slot, Completion::Success(Arc::new(value)))
    }

    /// Completes the slot with an error code and message.
    ///
    /// `Code::Ok` is accepted and records a success without a result value,
    /// which is how operations with no payload report success.
    ///
    /// # Panics
    ///
    /// Panics if the slot already completed or the handle belongs to another
    /// registry.
    pub fn complete_failure<T: Send + Sync + 'static>(
        &self,
        handle: ResultHandle<T>,
        code: Code,
        message: impl Into<String>,
    ) {
        if let Err(err) = self.try_complete_failure(handle, code, message) {
            panic!("{err}");
        }
    }

    /// Fallible form of [`complete_failure`](Self::complete_failure).
    pub fn try_complete_failure<T: Send + Sync + 'static>(
        &self,
        handle: ResultHandle<T>,
        code: Code,
        message: impl Into<String>,
    ) -> Result<(), FutureError> {
        let slot = self.typed_slot::<T>(handle.raw())?;
        self.publish(
            handle.raw(),
            &slot,
            Completion::Failure(Status::new(code, message)),
        )
    }

    pub(crate) fn complete_detached(&self, raw: RawHandle, status: Status) -> Result<(), FutureError> {
        let slot = self.slot(raw)?;
        self.publish(raw, &slot, Completion::Failure(status))
    }

    /// Publishes `completion`. A panic raised by a completion callback is
    /// resumed here, after the slot is complete and every callback has run.
    fn publish(&self, raw: RawHandle, slot: &Slot, completion: Completion) -> Result<(), FutureError> {
        let callback_panic = slot
            .complete(completion)
            .map_err(|_| FutureError::AlreadyCompleted { handle: raw })?;
        debug!(
            registry = %self.inner.id,
            label = %self.inner.label,
            slot = raw.index(),
            code = ?slot.completion().map(|done| done.status().code()),
            "slot completed"
        );
        if let Some(payload) = callback_panic {
            std::panic::resume_unwind(payload);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    /// Returns a consistent snapshot of the slot.
    ///
    /// # Panics
    ///
    /// Panics if the handle belongs to another registry.
    #[must_use]
    pub fn query<T: Send + Sync + 'static>(&self, handle: ResultHandle<T>) -> SlotSnapshot<T> {
        self.try_query(handle).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Fallible form of [`query`](Self::query).
    pub fn try_query<T: Send + Sync + 'static>(
        &self,
        handle: ResultHandle<T>,
    ) -> Result<SlotSnapshot<T>, FutureError> {
        let slot = self.typed_slot::<T>(handle.raw())?;
        let Some(completion) = slot.completion() else {
            return Ok(SlotSnapshot::Pending);
        };
        let outcome = match completion {
            Completion::Success(payload) => {
                let value = Arc::clone(payload).downcast::<T>().map_err(|_| {
                    FutureError::TypeMismatch {
                        handle: handle.raw(),
                        stored: slot.type_name(),
                        requested: core::any::type_name::<T>(),
                    }
                })?;
                Outcome::Success(value)
            }
            Completion::Failure(status) => Outcome::Failure(status.clone()),
        };
        Ok(SlotSnapshot::Completed(outcome))
    }

    /// Wraps `handle` in a future value that shares this registry.
    #[must_use]
    pub fn future<T>(&self, handle: ResultHandle<T>) -> FutureValue<T> {
        FutureValue::new(self.clone(), handle)
    }

    /// Runs `callback` once the slot completes, on the completing thread, or
    /// immediately if it already has.
    ///
    /// The callback does not keep the registry alive; if every other reference
    /// is dropped before completion, it never runs. A panicking callback does
    /// not prevent the others from running; its panic surfaces from the call
    /// that completed the slot.
    ///
    /// # Panics
    ///
    /// Panics if the handle belongs to another registry.
    pub fn on_completion<T, F>(&self, handle: ResultHandle<T>, callback: F)
    where
        T: Send + Sync + 'static,
        F: FnOnce(&FutureValue<T>) + Send + 'static,
    {
        let slot = self
            .typed_slot::<T>(handle.raw())
            .unwrap_or_else(|err| panic!("{err}"));
        let registry: Weak<RegistryInner> = Arc::downgrade(&self.inner);
        slot.on_completion(Box::new(move |_: &Completion| {
            if let Some(inner) = registry.upgrade() {
                callback(&FutureValue::new(Self { inner }, handle));
            }
        }));
    }

    // ------------------------------------------------------------------
    // Slot lookup
    // ------------------------------------------------------------------

    fn slot(&self, raw: RawHandle) -> Result<Arc<Slot>, FutureError> {
        let foreign = || FutureError::ForeignHandle {
            handle: raw,
            registry: self.inner.id,
        };
        if raw.registry_id() != self.inner.id {
            return Err(foreign());
        }
        self.inner
            .slots
            .read()
            .get(raw.arena_index())
            .cloned()
            .ok_or_else(foreign)
    }

    fn typed_slot<T: 'static>(&self, raw: RawHandle) -> Result<Arc<Slot>, FutureError> {
        let slot = self.slot(raw)?;
        if slot.accepts::<T>() {
            Ok(slot)
        } else {
            Err(FutureError::TypeMismatch {
                handle: raw,
                stored: slot.type_name(),
                requested: core::any::type_name::<T>(),
            })
        }
    }
}

impl fmt::Debug for CompletionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionRegistry")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .field("slots", &self.len())
            .finish()
    }
}
