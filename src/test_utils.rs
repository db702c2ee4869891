//! Test utilities for settle.
//!
//! This module provides shared helpers for unit and integration tests:
//! - Consistent tracing-based logging initialization
//! - Phase/section macros for readable test output
//! - Future assertion macros
//!
//! # Example
//! ```
//! use settle::test_utils::init_test_logging;
//!
//! init_test_logging();
//! settle::test_phase!("doc example");
//! let future = settle::successful_future(5_u8);
//! settle::assert_future_ok!(future, 5);
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
///
/// The first call wins; later calls are no-ops.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log a section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {} ---", $name);
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            test = %$name,
            $($key = %$value,)*
            "test completed successfully: {}",
            $name
        );
    };
}

/// Log before assertions for context.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        tracing::debug!(
            expected = ?$expected,
            actual = ?$actual,
            "Asserting: {}",
            $msg
        );
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}

/// Assert that a future completed successfully with a specific value.
#[macro_export]
macro_rules! assert_future_ok {
    ($future:expr, $expected:expr) => {
        match $future.outcome() {
            Some($crate::Outcome::Success(v)) => assert_eq!(*v, $expected),
            other => unreachable!("expected Success({:?}), got {:?}", $expected, other),
        }
    };
}

/// Assert that a future failed with a specific code.
#[macro_export]
macro_rules! assert_future_failed {
    ($future:expr, $code:expr) => {
        match $future.outcome() {
            Some($crate::Outcome::Failure(status)) => assert_eq!(status.code(), $code),
            other => unreachable!("expected Failure({:?}), got {:?}", $code, other),
        }
    };
    ($future:expr, $code:expr, $message:expr) => {
        match $future.outcome() {
            Some($crate::Outcome::Failure(status)) => {
                assert_eq!(status.code(), $code);
                assert_eq!(status.message(), $message);
            }
            other => unreachable!("expected Failure({:?}), got {:?}", $code, other),
        }
    };
}
