//! Test utilities.
//!
//! Shared helpers for unit and integration tests:
//! - Consistent tracing-based logging initialization
//! - Phase/section macros for readable test output
//! - Microtask runtime constructors and settle-and-inspect helpers
//!
//! # Example
//! ```
//! use thenable::test_utils::{init_test_logging, settle, test_runtime};
//! use thenable::{PromiseState, Value};
//!
//! init_test_logging();
//! let runtime = test_runtime();
//! let promise = runtime.resolved(1).then(None, None);
//! assert_eq!(settle(&runtime, &promise), PromiseState::Fulfilled(Value::Int(1)));
//! ```

use crate::promise::{Promise, PromiseState};
use crate::runtime::{Runtime, RuntimeBuilder};
use std::sync::Once;
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();

/// Step limit used by test runtimes so runaway chains fail instead of hang.
pub const TEST_DRAIN_STEP_LIMIT: u64 = 100_000;

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

/// Creates a microtask runtime with [`TEST_DRAIN_STEP_LIMIT`].
#[must_use]
pub fn test_runtime() -> Runtime {
    RuntimeBuilder::microtask()
        .drain_step_limit(TEST_DRAIN_STEP_LIMIT)
        .build()
        .expect("failed to build test runtime")
}

/// Drains `runtime` and returns the resulting state of `promise`.
///
/// Panics if the drain hits the step limit.
pub fn settle(runtime: &Runtime, promise: &Promise) -> PromiseState {
    let report = runtime.run_until_idle();
    assert!(
        report.idle,
        "microtask queue not idle after {} steps",
        report.steps
    );
    promise.state()
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
}

/// Assert that a promise state is fulfilled with `expected`.
#[macro_export]
macro_rules! assert_fulfilled {
    ($state:expr, $expected:expr) => {
        match $state {
            $crate::PromiseState::Fulfilled(v) => assert_eq!(v, $crate::Value::from($expected)),
            other => unreachable!("expected fulfilled({:?}), got {:?}", $expected, other),
        }
    };
}

/// Assert that a promise state is rejected with `expected`.
#[macro_export]
macro_rules! assert_rejected {
    ($state:expr, $expected:expr) => {
        match $state {
            $crate::PromiseState::Rejected(r) => assert_eq!(r, $crate::Value::from($expected)),
            other => unreachable!("expected rejected({:?}), got {:?}", $expected, other),
        }
    };
}
