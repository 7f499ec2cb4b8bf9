//! Session timing configuration.

use crate::error::{ConfigError, ConfigResult};
use std::time::Duration;

/// Idle time after which the session logs out.
pub const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Warning window before the idle logout; the warning begins at the
/// 17-minute mark.
pub const INACTIVITY_WARNING: Duration = Duration::from_secs(3 * 60);

/// How often the token branch re-validates the armed token.
pub const REVALIDATION_INTERVAL: Duration = Duration::from_secs(30);

/// Timing configuration for a session run.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Idle time after which the session logs out.
    pub inactivity_timeout: Duration,
    /// Window before the idle logout during which the countdown runs.
    pub inactivity_warning: Duration,
    /// Period of the token re-validation tick.
    pub revalidation_interval: Duration,
}

impl SessionConfig {
    /// Build a validated configuration.
    pub fn new(
        inactivity_timeout: Duration,
        inactivity_warning: Duration,
        revalidation_interval: Duration,
    ) -> ConfigResult<Self> {
        for (field, value) in [
            ("inactivity_timeout", inactivity_timeout),
            ("inactivity_warning", inactivity_warning),
            ("revalidation_interval", revalidation_interval),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration { field });
            }
        }
        if inactivity_warning >= inactivity_timeout {
            return Err(ConfigError::WarningNotShorter {
                timeout: inactivity_timeout,
                warning: inactivity_warning,
            });
        }

        Ok(Self {
            inactivity_timeout,
            inactivity_warning,
            revalidation_interval,
        })
    }

    /// Production defaults with environment overrides, for switching
    /// between test and production timings without a rebuild.
    ///
    /// Unparsable values fall back to the compiled defaults.
    pub fn from_env() -> ConfigResult<Self> {
        Self::new(
            env_secs("SESSION_INACTIVITY_TIMEOUT_SECS").unwrap_or(INACTIVITY_TIMEOUT),
            env_secs("SESSION_INACTIVITY_WARNING_SECS").unwrap_or(INACTIVITY_WARNING),
            env_secs("SESSION_TOKEN_REVALIDATE_SECS").unwrap_or(REVALIDATION_INTERVAL),
        )
    }

    /// Delay from the last activity to the warning deadline.
    pub fn warn_after(&self) -> Duration {
        self.inactivity_timeout - self.inactivity_warning
    }

    /// Whole seconds in the warning window; the countdown starts here.
    pub fn warning_seconds(&self) -> u64 {
        self.inactivity_warning.as_secs()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout: INACTIVITY_TIMEOUT,
            inactivity_warning: INACTIVITY_WARNING,
            revalidation_interval: REVALIDATION_INTERVAL,
        }
    }
}

fn env_secs(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .map(Duration::from_secs)
}
