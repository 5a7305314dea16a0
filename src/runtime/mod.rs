//! Promise factory bound to an injected scheduler.
//!
//! A [`Runtime`] is the explicit module boundary for creating promises. It
//! carries the one piece of process-wide state the promise machinery needs,
//! the [`Scheduler`], and hands it to every promise it creates; derived
//! promises inherit it from their source. There is no ambient global
//! runtime.
//!
//! The adapter surface used by conformance harnesses lives here too:
//! [`Runtime::resolved`], [`Runtime::rejected`] and [`Runtime::deferred`].

pub mod builder;
pub mod config;

pub use builder::RuntimeBuilder;
pub use config::{RuntimeConfig, SchedulerKind};

use crate::promise::{self, Promise, Rejecter, Resolver};
use crate::scheduler::{DrainReport, MicrotaskQueue, Scheduler};
use crate::value::Value;
use core::fmt;
use std::sync::Arc;

/// A pending promise together with its raw settlement capabilities.
#[derive(Debug, Clone)]
pub struct Deferred {
    /// The pending promise.
    pub promise: Promise,
    /// Resolves `promise`.
    pub resolve: Resolver,
    /// Rejects `promise`.
    pub reject: Rejecter,
}

/// Creates promises that schedule through one scheduler.
#[derive(Clone)]
pub struct Runtime {
    scheduler: Arc<dyn Scheduler>,
    microtasks: Option<Arc<MicrotaskQueue>>,
    config: RuntimeConfig,
}

impl Runtime {
    /// Creates a runtime around a host-provided scheduler.
    #[must_use]
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            microtasks: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Creates a runtime backed by a fresh [`MicrotaskQueue`].
    #[must_use]
    pub fn with_microtasks() -> Self {
        let queue = Arc::new(MicrotaskQueue::new());
        let scheduler: Arc<dyn Scheduler> = queue.clone();
        Self {
            scheduler,
            microtasks: Some(queue),
            config: RuntimeConfig::default(),
        }
    }

    /// Returns a builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a promise, running `initializer` synchronously.
    ///
    /// See [`Promise::create_with`].
    pub fn create<F>(&self, initializer: F) -> Promise
    where
        F: FnOnce(Resolver, Rejecter) -> Result<(), Value>,
    {
        Promise::create_with(Arc::clone(&self.scheduler), initializer)
    }

    /// Creates a promise resolved with `value`.
    ///
    /// `value` goes through the resolution procedure, so passing a promise
    /// or thenable yields a promise that adopts it.
    pub fn resolved(&self, value: impl Into<Value>) -> Promise {
        let value = value.into();
        self.create(move |resolve, _| {
            resolve.resolve(value);
            Ok(())
        })
    }

    /// Creates a promise already rejected with `reason`.
    pub fn rejected(&self, reason: impl Into<Value>) -> Promise {
        let reason = reason.into();
        self.create(move |_, reject| {
            reject.reject(reason);
            Ok(())
        })
    }

    /// Creates a pending promise and exposes its capabilities.
    ///
    /// ```
    /// use thenable::{PromiseState, Runtime, Value};
    ///
    /// let runtime = Runtime::with_microtasks();
    /// let deferred = runtime.deferred();
    /// assert!(deferred.promise.is_pending());
    /// deferred.resolve.resolve("done");
    /// assert_eq!(deferred.promise.state(), PromiseState::Fulfilled(Value::from("done")));
    /// ```
    pub fn deferred(&self) -> Deferred {
        let promise = Promise::pending(Arc::clone(&self.scheduler));
        let (resolve, reject) = promise::capabilities(&promise);
        Deferred {
            promise,
            resolve,
            reject,
        }
    }

    /// Returns the scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    /// Returns the microtask queue, when this runtime is host-drained.
    #[must_use]
    pub fn microtasks(&self) -> Option<&Arc<MicrotaskQueue>> {
        self.microtasks.as_ref()
    }

    /// Returns the configuration this runtime was built with.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Drains the microtask queue, honouring `drain_step_limit`.
    ///
    /// Runtimes without a microtask queue drain themselves; this reports
    /// zero steps for them.
    pub fn run_until_idle(&self) -> DrainReport {
        match (&self.microtasks, self.config.drain_step_limit) {
            (Some(queue), Some(limit)) => queue.run_until_idle_bounded(limit),
            (Some(queue), None) => queue.run_until_idle(),
            (None, _) => DrainReport {
                steps: 0,
                idle: true,
            },
        }
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("microtasks", &self.microtasks)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
