//! Deferred, order-preserving execution of reactions.
//!
//! Every continuation a promise runs crosses a [`Scheduler`]. The contract
//! is small:
//!
//! - **Never synchronous**: submitted work runs after the submitting call
//!   returns, never inside it.
//! - **FIFO**: work submitted A-then-B runs A-then-B.
//!
//! Two implementations are provided:
//!
//! - [`MicrotaskQueue`]: a deterministic queue the host drains explicitly.
//! - [`ThreadScheduler`]: a dedicated worker thread that drains continuously.
//!
//! Hosts with their own deferral primitive can pass any
//! `Fn(Work) + Send + Sync` closure as a scheduler.

pub mod microtask;
pub mod thread;

pub use microtask::{DrainReport, MicrotaskQueue};
pub use thread::{DEFAULT_THREAD_NAME, ThreadScheduler};

/// A unit of deferred work.
pub type Work = Box<dyn FnOnce() + Send + 'static>;

/// The injected capability that defers work to a later turn.
pub trait Scheduler: Send + Sync {
    /// Submits `work` to run after the current call stack unwinds.
    fn schedule(&self, work: Work);
}

impl<F> Scheduler for F
where
    F: Fn(Work) + Send + Sync,
{
    fn schedule(&self, work: Work) {
        self(work);
    }
}
