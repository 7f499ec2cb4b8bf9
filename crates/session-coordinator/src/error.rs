//! Error types for session coordination.
//!
//! Lifecycle operations never return errors: misuse is defined as a
//! no-op and bad tokens fail closed into a timeout. The only fallible
//! surface is configuration construction.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced while building a [`crate::SessionConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The warning window must be shorter than the inactivity timeout.
    #[error("warning window {warning:?} must be shorter than the inactivity timeout {timeout:?}")]
    WarningNotShorter {
        timeout: Duration,
        warning: Duration,
    },

    /// Every configured duration must be non-zero.
    #[error("{field} must be non-zero")]
    ZeroDuration { field: &'static str },
}

/// Result type for configuration construction.
pub type ConfigResult<T> = Result<T, ConfigError>;
