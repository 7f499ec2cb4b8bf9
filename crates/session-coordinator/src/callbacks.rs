//! Host-facing notifications.

use std::fmt;
use std::sync::Arc;

/// Which branch drove the terminal logout. For host log messaging only;
/// the teardown path is identical either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutCause {
    /// The user idled past the inactivity deadline.
    Inactivity,
    /// The bearer token expired, or was invalid when armed.
    TokenExpired,
}

impl fmt::Display for TimeoutCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutCause::Inactivity => write!(f, "inactivity"),
            TimeoutCause::TokenExpired => write!(f, "token-expired"),
        }
    }
}

type WarningFn = dyn Fn(bool) + Send + Sync;
type TickFn = dyn Fn(u64) + Send + Sync;
type TimeoutFn = dyn Fn(TimeoutCause) + Send + Sync;

/// Callbacks a host registers on the coordinator.
///
/// Defaults are no-ops, so a host registers only what it renders. All
/// three are invoked synchronously from timer expiry.
#[derive(Clone)]
pub struct SessionCallbacks {
    pub(crate) warning: Arc<WarningFn>,
    pub(crate) countdown_tick: Arc<TickFn>,
    pub(crate) timeout: Arc<TimeoutFn>,
}

impl SessionCallbacks {
    /// Callbacks that discard every notification.
    pub fn new() -> Self {
        Self {
            warning: Arc::new(|_| {}),
            countdown_tick: Arc::new(|_| {}),
            timeout: Arc::new(|_| {}),
        }
    }

    /// Called with `true` on entering the warning phase and `false` when
    /// the warning is dismissed by an extend.
    pub fn on_warning(mut self, f: impl Fn(bool) + Send + Sync + 'static) -> Self {
        self.warning = Arc::new(f);
        self
    }

    /// Called once per second during the warning phase with the seconds
    /// remaining until logout.
    pub fn on_countdown_tick(mut self, f: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.countdown_tick = Arc::new(f);
        self
    }

    /// Called exactly once per run when either branch reaches its
    /// deadline.
    pub fn on_timeout(mut self, f: impl Fn(TimeoutCause) + Send + Sync + 'static) -> Self {
        self.timeout = Arc::new(f);
        self
    }
}

impl Default for SessionCallbacks {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCallbacks").finish_non_exhaustive()
    }
}
