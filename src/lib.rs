//! Thenable: interoperable single-assignment promises for Rust.
//!
//! # Overview
//!
//! A [`Promise`] starts pending, is settled exactly once with a value or a
//! reason, and runs any number of continuations after settlement, even
//! ones registered late. Resolving a promise with another promise, or with
//! any foreign object exposing a `then` capability, makes it adopt that
//! value's outcome instead of holding it, so chains flatten to arbitrary
//! depth.
//!
//! # Core Guarantees
//!
//! - **Single settlement**: only the first resolve/reject has any effect
//! - **Always async**: continuations never run inside the call that
//!   registered them or the call that settled the source
//! - **Ordered**: continuations on one promise run in registration order
//! - **No escaping failures**: errors and panics in user callbacks become
//!   rejections
//! - **Injected scheduling**: all deferral goes through an explicit
//!   [`Scheduler`]; there is no global runtime
//!
//! # Module Structure
//!
//! - [`promise`]: The state machine, resolution procedure, and `then`
//! - [`value`]: Dynamic values and the foreign-thenable seam
//! - [`scheduler`]: Scheduler trait, microtask queue, worker thread
//! - [`runtime`]: Promise factory, configuration, and builder
//! - [`error`](mod@error): Error types
//! - [`tracing_compat`]: Optional tracing integration (requires `tracing-integration` feature)
//!
//! # Example
//!
//! ```
//! use thenable::{PromiseState, Runtime, Value};
//!
//! let runtime = Runtime::with_microtasks();
//! let derived = runtime
//!     .resolved(5)
//!     .on_fulfilled(|v| Ok(Value::Int(v.as_int().unwrap_or_default() + 1)));
//!
//! assert!(derived.is_pending());
//! runtime.run_until_idle();
//! assert_eq!(derived.state(), PromiseState::Fulfilled(Value::Int(6)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod error;
pub mod promise;
pub mod runtime;
pub mod scheduler;
pub mod tracing_compat;
pub mod value;

// ── Test-only modules ───────────────────────────────────────────────────
#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

pub use error::{BuildError, PromiseError};
#[cfg(feature = "config-file")]
pub use error::ConfigError;
pub use promise::{Handler, Promise, PromiseId, PromiseState, Rejecter, Resolver, Settled};
pub use runtime::{Deferred, Runtime, RuntimeBuilder, RuntimeConfig, SchedulerKind};
pub use scheduler::{DrainReport, MicrotaskQueue, Scheduler, ThreadScheduler, Work};
pub use value::{HostObject, Object, ThenFn, Value};
