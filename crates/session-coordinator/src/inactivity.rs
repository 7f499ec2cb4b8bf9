//! The inactivity watchdog: sliding-window idle detection with a
//! warning/countdown phase.
//!
//! While Active, every debounced activity pulse reschedules both idle
//! deadlines from the new last-activity instant. Once the warning fires,
//! pulses are ignored; only an explicit extend dismisses the countdown.

use crate::callbacks::{SessionCallbacks, TimeoutCause};
use crate::config::SessionConfig;
use crate::coordinator::Trip;
use crate::timer::TimerHandle;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Phase of the inactivity branch. Exactly one holds at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Watching for idleness; activity pulses slide the deadlines.
    Active,
    /// Countdown running; only an explicit extend leaves this phase.
    Warning,
    /// Torn down, inert until the next start.
    Stopped,
}

#[derive(Clone)]
pub(crate) struct InactivityWatchdog {
    shared: Arc<Shared>,
}

struct Shared {
    config: SessionConfig,
    callbacks: SessionCallbacks,
    state: Mutex<State>,
}

struct State {
    phase: SessionPhase,
    last_activity: Instant,
    /// Bumped on every (re)schedule; deadline callbacks carry the epoch
    /// they were scheduled under and stand down if it moved on. Covers
    /// the sliver where a replaced timer was already mid-fire when its
    /// handle was aborted.
    epoch: u64,
    warn_timer: Option<TimerHandle>,
    logout_timer: Option<TimerHandle>,
    countdown: Option<TimerHandle>,
    seconds_remaining: u64,
    trip: Option<Trip>,
}

impl InactivityWatchdog {
    pub fn new(config: SessionConfig, callbacks: SessionCallbacks) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                callbacks,
                state: Mutex::new(State {
                    phase: SessionPhase::Stopped,
                    last_activity: Instant::now(),
                    epoch: 0,
                    warn_timer: None,
                    logout_timer: None,
                    countdown: None,
                    seconds_remaining: 0,
                    trip: None,
                }),
            }),
        }
    }

    /// Enter Active and schedule both idle deadlines from now.
    pub fn arm(&self, trip: Trip) {
        let mut state = self.shared.state.lock().unwrap();
        state.phase = SessionPhase::Active;
        state.trip = Some(trip);
        state.countdown = None;
        state.seconds_remaining = 0;
        state.last_activity = Instant::now();
        self.shared.schedule_idle_timers(&mut state);
    }

    /// Cancel every pending deadline and go inert.
    pub fn disarm(&self) {
        let mut state = self.shared.state.lock().unwrap();
        state.phase = SessionPhase::Stopped;
        state.warn_timer = None;
        state.logout_timer = None;
        state.countdown = None;
        state.trip = None;
    }

    /// A debounced activity pulse. Slides the idle window while Active;
    /// ignored during Warning and after teardown.
    pub fn on_pulse(&self) {
        let mut state = self.shared.state.lock().unwrap();
        if state.phase != SessionPhase::Active {
            return;
        }
        state.last_activity = Instant::now();
        self.shared.schedule_idle_timers(&mut state);
        tracing::trace!("Idle deadlines reset by activity");
    }

    /// Explicit acknowledgement from the warning modal: dismiss the
    /// countdown and re-enter Active from now.
    pub fn extend(&self) {
        let mut state = self.shared.state.lock().unwrap();
        if state.phase != SessionPhase::Warning {
            return;
        }
        state.phase = SessionPhase::Active;
        state.countdown = None;
        state.seconds_remaining = 0;
        state.last_activity = Instant::now();
        self.shared.schedule_idle_timers(&mut state);
        drop(state);

        tracing::info!("Session extended from the warning modal");
        (self.shared.callbacks.warning)(false);
    }

    pub fn phase(&self) -> SessionPhase {
        self.shared.state.lock().unwrap().phase
    }

    /// Idle time left before logout, floored at zero.
    pub fn remaining_idle(&self) -> Duration {
        let state = self.shared.state.lock().unwrap();
        match state.phase {
            SessionPhase::Stopped => Duration::ZERO,
            SessionPhase::Warning => Duration::from_secs(state.seconds_remaining),
            SessionPhase::Active => self
                .shared
                .config
                .inactivity_timeout
                .saturating_sub(state.last_activity.elapsed()),
        }
    }
}

impl Shared {
    /// (Re)schedule the warning and logout deadlines from now. Replacing
    /// the handles aborts whatever was pending.
    fn schedule_idle_timers(self: &Arc<Self>, state: &mut State) {
        state.epoch += 1;
        let epoch = state.epoch;
        let on_warn = Arc::clone(self);
        state.warn_timer = Some(TimerHandle::one_shot(self.config.warn_after(), move || {
            on_warn.enter_warning(epoch);
        }));
        let on_logout = Arc::clone(self);
        state.logout_timer = Some(TimerHandle::one_shot(
            self.config.inactivity_timeout,
            move || {
                on_logout.idle_deadline_reached(epoch);
            },
        ));
    }

    fn enter_warning(self: Arc<Self>, epoch: u64) {
        let mut state = self.state.lock().unwrap();
        if state.phase != SessionPhase::Active || state.epoch != epoch {
            return;
        }
        state.phase = SessionPhase::Warning;
        state.warn_timer = None;
        state.seconds_remaining = self.config.warning_seconds();
        let initial = state.seconds_remaining;
        let ticker = Arc::clone(&self);
        state.countdown = Some(TimerHandle::repeating(Duration::from_secs(1), move || {
            ticker.countdown_tick();
        }));
        drop(state);

        tracing::info!(seconds_remaining = initial, "Idle warning started");
        (self.callbacks.warning)(true);
        (self.callbacks.countdown_tick)(initial);
    }

    fn countdown_tick(self: &Arc<Self>) {
        let mut state = self.state.lock().unwrap();
        // The final second belongs to the logout deadline, which emits
        // the terminal zero itself.
        if state.phase != SessionPhase::Warning || state.seconds_remaining <= 1 {
            return;
        }
        state.seconds_remaining -= 1;
        let remaining = state.seconds_remaining;
        drop(state);

        (self.callbacks.countdown_tick)(remaining);
    }

    fn idle_deadline_reached(self: Arc<Self>, epoch: u64) {
        let (countdown_exhausted, trip) = {
            let mut state = self.state.lock().unwrap();
            if state.epoch != epoch {
                return;
            }
            match state.phase {
                SessionPhase::Stopped => return,
                SessionPhase::Warning => {
                    state.seconds_remaining = 0;
                    (true, state.trip.clone())
                }
                SessionPhase::Active => (false, state.trip.clone()),
            }
        };

        if countdown_exhausted {
            (self.callbacks.countdown_tick)(0);
        }
        if let Some(trip) = trip {
            tracing::info!("Idle deadline reached, logging out");
            trip.fire(TimeoutCause::Inactivity);
        }
    }
}
