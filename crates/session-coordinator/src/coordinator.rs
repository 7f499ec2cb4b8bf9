//! The session coordinator: composes the two watchdogs and drives a
//! single authoritative logout decision.

use crate::callbacks::{SessionCallbacks, TimeoutCause};
use crate::config::SessionConfig;
use crate::inactivity::{InactivityWatchdog, SessionPhase};
use crate::token_watch::TokenWatchdog;
use activity_signal::ActivitySource;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// One-shot latch guaranteeing at most one terminal notification per run.
///
/// Firing tears the whole run down (both watchdogs disarmed, activity
/// listeners dropped) before the host hears about it, so the losing
/// branch can never fire late and no timer outlives the run.
#[derive(Clone)]
pub(crate) struct Trip {
    inner: Arc<TripInner>,
}

struct TripInner {
    fired: Mutex<bool>,
    teardown: Box<dyn Fn() + Send + Sync>,
    notify: Arc<dyn Fn(TimeoutCause) + Send + Sync>,
}

impl Trip {
    fn new(
        teardown: impl Fn() + Send + Sync + 'static,
        notify: Arc<dyn Fn(TimeoutCause) + Send + Sync>,
    ) -> Self {
        Self {
            inner: Arc::new(TripInner {
                fired: Mutex::new(false),
                teardown: Box::new(teardown),
                notify,
            }),
        }
    }

    pub fn fire(&self, cause: TimeoutCause) {
        {
            let mut fired = self.inner.fired.lock().unwrap();
            if *fired {
                return;
            }
            *fired = true;
        }
        tracing::warn!(cause = %cause, "Session deadline reached, logging out");
        (self.inner.teardown)();
        (self.inner.notify)(cause);
    }
}

/// Point-in-time view of the coordinator, for host diagnostics.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub running: bool,
    /// Phase of the inactivity branch.
    pub phase: SessionPhase,
    /// Idle time left before logout, floored at zero.
    pub remaining_idle: Duration,
    /// Expiry instant of the armed token, when one is armed.
    pub token_expires_at: Option<DateTime<Utc>>,
}

/// Client-resident session-lifecycle coordinator.
///
/// One instance per login, owned by the host's session context, never a
/// process-wide static. Lifecycle methods must be called from within a
/// tokio runtime, and none of them returns an error: misuse is defined
/// as a no-op, and an unusable token fails closed into a timeout.
pub struct SessionCoordinator {
    callbacks: SessionCallbacks,
    activity: Arc<dyn ActivitySource>,
    inactivity: InactivityWatchdog,
    token: TokenWatchdog,
    running: Arc<Mutex<bool>>,
}

impl SessionCoordinator {
    pub fn new(
        config: SessionConfig,
        callbacks: SessionCallbacks,
        activity: Arc<dyn ActivitySource>,
    ) -> Self {
        Self {
            inactivity: InactivityWatchdog::new(config.clone(), callbacks.clone()),
            token: TokenWatchdog::new(config),
            callbacks,
            activity,
            running: Arc::new(Mutex::new(false)),
        }
    }

    /// Begin monitoring. The inactivity branch always arms; the token
    /// branch arms only when a token is supplied. An invalid or expired
    /// token trips the timeout immediately (fail closed). A no-op while
    /// already running.
    pub fn start(&self, token: Option<&str>) {
        {
            let mut running = self.running.lock().unwrap();
            if *running {
                tracing::warn!("start() while already running ignored");
                return;
            }
            *running = true;
        }

        let run_id = Uuid::new_v4();
        tracing::info!(
            run_id = %run_id,
            has_token = token.is_some(),
            "Session monitoring started"
        );

        let pulses = self.inactivity.clone();
        self.activity.subscribe(Arc::new(move || pulses.on_pulse()));

        let trip = Trip::new(self.teardown_fn(), Arc::clone(&self.callbacks.timeout));
        self.inactivity.arm(trip.clone());
        self.token.arm(token, trip);
    }

    /// Cancel every pending deadline in both branches and drop the
    /// activity listeners. Idempotent, and safe to call from inside the
    /// timeout callback.
    pub fn stop(&self) {
        let was_running = {
            let mut running = self.running.lock().unwrap();
            std::mem::replace(&mut *running, false)
        };
        if !was_running {
            return;
        }
        tracing::info!("Session monitoring stopped");
        self.activity.unsubscribe();
        self.inactivity.disarm();
        self.token.disarm();
    }

    /// Dismiss a running warning countdown. A no-op in any other state;
    /// never touches the token branch.
    pub fn extend(&self) {
        self.inactivity.extend();
    }

    /// Hand over a refreshed token. Recomputes the token deadline;
    /// never touches the inactivity branch.
    pub fn update_token(&self, token: &str) {
        if !self.is_running() {
            return;
        }
        self.token.update(token);
    }

    pub fn is_running(&self) -> bool {
        *self.running.lock().unwrap()
    }

    /// Point-in-time snapshot for host diagnostics.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            running: self.is_running(),
            phase: self.inactivity.phase(),
            remaining_idle: self.inactivity.remaining_idle(),
            token_expires_at: self.token.expires_at(),
        }
    }

    /// Teardown closure handed to the run's trip latch. Captures clones,
    /// not `self`, so firing from a timer task needs no back-reference.
    fn teardown_fn(&self) -> impl Fn() + Send + Sync + 'static {
        let running = Arc::clone(&self.running);
        let activity = Arc::clone(&self.activity);
        let inactivity = self.inactivity.clone();
        let token = self.token.clone();
        move || {
            *running.lock().unwrap() = false;
            activity.unsubscribe();
            inactivity.disarm();
            token.disarm();
        }
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}
