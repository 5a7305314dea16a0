//! Builder for [`Runtime`].

use super::Runtime;
use super::config::{RuntimeConfig, SchedulerKind};
use crate::error::BuildError;
use crate::scheduler::{MicrotaskQueue, Scheduler, ThreadScheduler};
use crate::tracing_compat::debug;
use std::sync::Arc;

/// Builder for a [`Runtime`].
///
/// ```
/// use thenable::RuntimeBuilder;
///
/// let runtime = RuntimeBuilder::microtask()
///     .drain_step_limit(1_000)
///     .build()
///     .unwrap();
/// assert!(runtime.microtasks().is_some());
/// ```
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct RuntimeBuilder {
    config: RuntimeConfig,
}

impl RuntimeBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for a host-drained microtask runtime.
    pub fn microtask() -> Self {
        Self::new().scheduler(SchedulerKind::Microtask)
    }

    /// Creates a builder for a runtime with its own scheduler thread.
    pub fn thread() -> Self {
        Self::new().scheduler(SchedulerKind::Thread)
    }

    /// Selects the scheduler kind.
    pub fn scheduler(mut self, kind: SchedulerKind) -> Self {
        self.config.scheduler = kind;
        self
    }

    /// Sets the scheduler thread name.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Bounds each `run_until_idle` call to `steps` work items.
    pub fn drain_step_limit(mut self, steps: u64) -> Self {
        self.config.drain_step_limit = Some(steps);
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the runtime, spawning the scheduler thread if configured.
    pub fn build(self) -> Result<Runtime, BuildError> {
        let mut config = self.config;
        config.normalize();
        debug!(scheduler = ?config.scheduler, "building runtime");
        let runtime = match config.scheduler {
            SchedulerKind::Microtask => {
                let queue = Arc::new(MicrotaskQueue::new());
                let scheduler: Arc<dyn Scheduler> = queue.clone();
                Runtime {
                    scheduler,
                    microtasks: Some(queue),
                    config,
                }
            }
            SchedulerKind::Thread => {
                let scheduler: Arc<dyn Scheduler> =
                    Arc::new(ThreadScheduler::with_name(config.thread_name.clone())?);
                Runtime {
                    scheduler,
                    microtasks: None,
                    config,
                }
            }
        };
        Ok(runtime)
    }
}
