//! Tracing compatibility layer for structured logging.
//!
//! This module provides one logging interface whether or not the
//! `tracing-integration` feature is enabled:
//!
//! - **With feature enabled**: re-exports from the `tracing` crate.
//! - **Without feature**: no-op macros that expand to nothing.
//!
//! # Usage
//!
//! ```rust,ignore
//! use thenable::tracing_compat::{debug, trace};
//!
//! trace!(promise = %id, "promise settled");
//! debug!(reason = %reason, "calling then raised");
//! ```
//!
//! # Feature Flag
//!
//! ```toml
//! thenable = { version = "0.1", features = ["tracing-integration"] }
//! ```

#[cfg(feature = "tracing-integration")]
pub use tracing::{Level, debug, error, info, trace, warn};

// When tracing is disabled, provide no-op macros
#[cfg(not(feature = "tracing-integration"))]
mod noop {
    //! No-op implementations when tracing is disabled.

    /// No-op trace-level logging macro.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// No-op debug-level logging macro.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// No-op info-level logging macro.
    #[macro_export]
    macro_rules! info {
        ($($arg:tt)*) => {};
    }

    /// No-op warn-level logging macro.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }

    /// No-op error-level logging macro.
    #[macro_export]
    macro_rules! error {
        ($($arg:tt)*) => {};
    }

    pub use crate::{debug, error, info, trace, warn};
}

#[cfg(not(feature = "tracing-integration"))]
pub use noop::*;

/// Returns whether tracing integration is compiled in.
#[inline]
#[must_use]
pub const fn is_tracing_enabled() -> bool {
    cfg!(feature = "tracing-integration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macros_accept_structured_fields() {
        let id = 7_u64;
        trace!(promise = %id, "trace");
        debug!(promise = id, "debug");
        info!("info");
        warn!(reason = ?"x", "warn");
        error!("error {}", id);
    }

    #[test]
    fn tracing_flag_matches_feature() {
        assert_eq!(
            is_tracing_enabled(),
            cfg!(feature = "tracing-integration")
        );
    }
}
