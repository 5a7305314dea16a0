//! Error types.
//!
//! Rejections are ordinary [`Value`](crate::Value)s. Most reasons are
//! supplied by user code and pass through untouched; the variants of
//! [`PromiseError`] are the reasons this crate produces itself.
//!
//! [`BuildError`] and `ConfigError` cover the host-facing setup surface
//! and never flow through a promise.

use crate::promise::PromiseId;
use thiserror::Error;

/// A rejection reason generated by the promise machinery itself.
///
/// # Example
///
/// ```
/// use thenable::PromiseError;
///
/// let err = PromiseError::panicked("boom");
/// assert!(err.is_panic());
/// assert!(err.to_string().contains("boom"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromiseError {
    /// A promise was resolved with itself.
    #[error("promise {promise} cannot be resolved with itself")]
    SelfResolution {
        /// The promise that would have adopted itself.
        promise: PromiseId,
    },
    /// A user callable panicked instead of returning.
    #[error("callback panicked: {message}")]
    Panicked {
        /// The panic message, when it was a string.
        message: String,
    },
}

impl PromiseError {
    /// Creates a self-resolution error for `promise`.
    #[must_use]
    pub const fn self_resolution(promise: PromiseId) -> Self {
        Self::SelfResolution { promise }
    }

    /// Creates a panic error with the given message.
    #[must_use]
    pub fn panicked(message: impl Into<String>) -> Self {
        Self::Panicked {
            message: message.into(),
        }
    }

    /// Builds a panic error from a `catch_unwind` payload.
    #[must_use]
    pub fn from_panic_payload(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::panicked(message)
    }

    /// Returns `true` for a self-resolution error.
    #[must_use]
    pub const fn is_self_resolution(&self) -> bool {
        matches!(self, Self::SelfResolution { .. })
    }

    /// Returns `true` for a caught panic.
    #[must_use]
    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked { .. })
    }
}

/// Error returned when a [`Runtime`](crate::Runtime) cannot be built.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The scheduler worker thread could not be spawned.
    #[error("failed to spawn scheduler thread: {0}")]
    SpawnFailed(#[from] std::io::Error),
}

/// Error returned when loading a runtime configuration file fails.
#[cfg(feature = "config-file")]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML for [`RuntimeConfig`](crate::RuntimeConfig).
    #[error("invalid runtime config: {0}")]
    Parse(#[from] toml::de::Error),
}
