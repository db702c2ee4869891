//! Already-resolved futures.
//!
//! Helpers for operations that can answer synchronously and for objects that
//! can no longer perform any operation. All of them allocate on the
//! [`shared_registry`].

use crate::future::FutureValue;
use crate::registry::{RawHandle, ResultHandle, shared_registry};
use crate::status::{Code, Status};
use crate::tracing_compat::debug;
use std::sync::OnceLock;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

/// Message carried by [`invalid_future`].
///
/// One message covers both an owning object that has been destroyed and a
/// platform with no real backing implementation.
pub const INVALID_STATE_MESSAGE: &str = "This instance is in an invalid state. This could either \
     because the underlying Firestore instance has been destructed or because you're running on \
     an unsupported platform.";

static INVALID_STATE: OnceLock<RawHandle> = OnceLock::new();

#[cfg(test)]
static INVALID_STATE_BUILDS: AtomicUsize = AtomicUsize::new(0);

/// Returns a future that has already completed with `value`.
pub fn successful_future<T: Send + Sync + 'static>(value: T) -> FutureValue<T> {
    let registry = shared_registry();
    let handle = registry.allocate::<T>();
    registry.complete_success(handle, value);
    registry.future(handle)
}

/// Returns a future that has already failed with `code` and `message`.
pub fn failed_future<T: Send + Sync + 'static>(
    code: Code,
    message: impl Into<String>,
) -> FutureValue<T> {
    let registry = shared_registry();
    let handle = registry.allocate::<T>();
    registry.complete_failure(handle, code, message);
    registry.future(handle)
}

/// Returns the cached future for an object in an invalid state.
///
/// Every call, for every `T`, returns a copy of the same process-wide future,
/// completed with `Code::FailedPrecondition` and [`INVALID_STATE_MESSAGE`].
/// Callers that need to tell a destroyed owner apart from an unsupported
/// platform must check that themselves before reaching for this.
pub fn invalid_future<T: Send + Sync + 'static>() -> FutureValue<T> {
    let registry = shared_registry();
    let raw = *INVALID_STATE.get_or_init(|| {
        #[cfg(test)]
        INVALID_STATE_BUILDS.fetch_add(1, Ordering::SeqCst);

        let raw = registry.allocate_detached();
        if let Err(err) =
            registry.complete_detached(raw, Status::failed_precondition(INVALID_STATE_MESSAGE))
        {
            // A freshly allocated slot cannot already be complete.
            unreachable!("invalid-state sentinel: {err}");
        }
        debug!(handle = %raw, "invalid-state future cached");
        raw
    });
    registry.future(ResultHandle::from_raw(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::future::FutureStatus;
    use std::sync::Barrier;

    fn init_test(name: &str) {
        crate::test_utils::init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn successful_future_holds_value() {
        init_test("successful_future_holds_value");
        let future = successful_future(42_i32);
        let completed = future.is_completed();
        crate::assert_with_log!(completed, "completed", true, completed);
        let value = *future.result();
        crate::assert_with_log!(value == 42, "value", 42, value);
        crate::assert_with_log!(future.is_ok(), "is ok", true, future.is_ok());
        crate::test_complete!("successful_future_holds_value");
    }

    #[test]
    fn successful_future_moves_non_clone_values() {
        struct Token(u32);

        let future = successful_future(Token(7));
        assert_eq!(future.result().0, 7);
    }

    #[test]
    fn failed_future_holds_error() {
        init_test("failed_future_holds_error");
        let future = failed_future::<i32>(Code::Aborted, "boom");
        let error = future.error();
        crate::assert_with_log!(
            error == Status::new(Code::Aborted, "boom"),
            "error",
            Status::new(Code::Aborted, "boom"),
            error
        );
        crate::assert_with_log!(
            future.try_result().is_err(),
            "result rejected",
            true,
            future.try_result().is_err()
        );
        crate::test_complete!("failed_future_holds_error");
    }

    #[test]
    fn invalid_future_is_fixed_failure() {
        let future = invalid_future::<String>();
        assert_eq!(future.status(), FutureStatus::Complete);
        assert_eq!(future.error_code(), Code::FailedPrecondition);
        assert_eq!(future.error_message(), INVALID_STATE_MESSAGE);
    }

    #[test]
    fn invalid_future_is_shared_across_types() {
        let a = invalid_future::<u8>();
        let b = invalid_future::<u8>();
        assert_eq!(a, b);

        let raw_a = a.handle().map(ResultHandle::raw);
        let raw_c = invalid_future::<Vec<String>>().handle().map(ResultHandle::raw);
        assert_eq!(raw_a, raw_c);
    }

    #[test]
    fn invalid_future_is_built_once_under_contention() {
        const THREADS: usize = 16;
        let barrier = Barrier::new(THREADS);

        let futures: Vec<FutureValue<u64>> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        invalid_future::<u64>()
                    })
                })
                .collect();
            workers
                .into_iter()
                .map(|w| w.join().expect("worker panicked"))
                .collect()
        });

        assert!(futures.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(INVALID_STATE_BUILDS.load(Ordering::SeqCst), 1);
    }
}
