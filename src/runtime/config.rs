//! Runtime configuration types.
//!
//! In most cases you should use [`RuntimeBuilder`](super::builder::RuntimeBuilder)
//! rather than filling in a [`RuntimeConfig`] by hand.
//!
//! # Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | `scheduler` | `microtask` |
//! | `thread_name` | `"thenable-scheduler"` |
//! | `drain_step_limit` | `None` (unbounded) |

use crate::scheduler::DEFAULT_THREAD_NAME;
use serde::{Deserialize, Serialize};

/// Which scheduler a runtime dispatches reactions through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerKind {
    /// A host-drained [`MicrotaskQueue`](crate::MicrotaskQueue).
    #[default]
    Microtask,
    /// A dedicated [`ThreadScheduler`](crate::ThreadScheduler) worker.
    Thread,
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Scheduler backing the runtime.
    pub scheduler: SchedulerKind,
    /// Worker thread name when `scheduler` is `thread`.
    pub thread_name: String,
    /// Upper bound on work items run by one
    /// [`Runtime::run_until_idle`](crate::Runtime::run_until_idle) call.
    pub drain_step_limit: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerKind::Microtask,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            drain_step_limit: None,
        }
    }
}

impl RuntimeConfig {
    /// Normalize configuration values to safe defaults.
    pub fn normalize(&mut self) {
        if self.thread_name.is_empty() {
            self.thread_name = DEFAULT_THREAD_NAME.to_string();
        }
        if self.drain_step_limit == Some(0) {
            self.drain_step_limit = Some(1);
        }
    }

    /// Parses a configuration from TOML.
    ///
    /// ```
    /// use thenable::{RuntimeConfig, SchedulerKind};
    ///
    /// let config = RuntimeConfig::from_toml_str(
    ///     "scheduler = \"thread\"\nthread_name = \"reactions\"",
    /// )
    /// .unwrap();
    /// assert_eq!(config.scheduler, SchedulerKind::Thread);
    /// assert_eq!(config.thread_name, "reactions");
    /// ```
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(source: &str) -> Result<Self, crate::error::ConfigError> {
        let mut config: Self = toml::from_str(source)?;
        config.normalize();
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::error::ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
