//! The token-expiry watchdog: silent and activity-independent.
//!
//! Valid → Expired, nothing else. The deadline comes from the token's
//! expiry claim, never from user behavior, and expiry produces no
//! user-facing warning, only the terminal timeout.

use crate::callbacks::TimeoutCause;
use crate::config::SessionConfig;
use crate::coordinator::Trip;
use crate::timer::TimerHandle;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// Phase of the token branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenPhase {
    /// No token armed; the branch is asleep.
    Dormant,
    /// A deadline is scheduled from the token's expiry claim.
    Valid,
    /// The token lapsed; the trip has been pulled.
    Expired,
}

#[derive(Clone)]
pub(crate) struct TokenWatchdog {
    shared: Arc<Shared>,
}

struct Shared {
    config: SessionConfig,
    state: Mutex<State>,
}

struct State {
    phase: TokenPhase,
    /// Bumped on every re-arm; the deadline callback carries the epoch
    /// it was scheduled under and stands down if the token was replaced
    /// while it was already mid-fire.
    epoch: u64,
    /// Latest token handed over by the host.
    slot: Option<String>,
    /// Token the current deadline was computed from.
    armed_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    expiry_timer: Option<TimerHandle>,
    revalidate: Option<TimerHandle>,
    trip: Option<Trip>,
}

impl TokenWatchdog {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(State {
                    phase: TokenPhase::Dormant,
                    epoch: 0,
                    slot: None,
                    armed_token: None,
                    expires_at: None,
                    expiry_timer: None,
                    revalidate: None,
                    trip: None,
                }),
            }),
        }
    }

    /// Arm from the token the session started with. `None` leaves the
    /// branch dormant until an update supplies one.
    pub fn arm(&self, token: Option<&str>, trip: Trip) {
        let fired = {
            let mut state = self.shared.state.lock().unwrap();
            state.trip = Some(trip);
            state.slot = token.map(str::to_owned);
            state.armed_token = None;
            self.shared.rearm_locked(&mut state)
        };
        if let Some(trip) = fired {
            trip.fire(TimeoutCause::TokenExpired);
        }
    }

    /// Replace the armed token with a refreshed one and recompute the
    /// deadline. Fails closed on an unusable replacement.
    pub fn update(&self, token: &str) {
        let fired = {
            let mut state = self.shared.state.lock().unwrap();
            if state.trip.is_none() {
                return;
            }
            state.slot = Some(token.to_owned());
            self.shared.rearm_locked(&mut state)
        };
        if let Some(trip) = fired {
            trip.fire(TimeoutCause::TokenExpired);
        }
    }

    /// Cancel every pending deadline and go dormant.
    pub fn disarm(&self) {
        let mut state = self.shared.state.lock().unwrap();
        state.phase = TokenPhase::Dormant;
        state.slot = None;
        state.armed_token = None;
        state.expires_at = None;
        state.expiry_timer = None;
        state.revalidate = None;
        state.trip = None;
    }

    /// Expiry instant of the armed token, when one is armed.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.shared.state.lock().unwrap().expires_at
    }
}

impl Shared {
    /// Recompute the deadline from the slot. The caller fires the
    /// returned trip outside the lock.
    fn rearm_locked(self: &Arc<Self>, state: &mut State) -> Option<Trip> {
        state.epoch += 1;
        let Some(token) = state.slot.clone() else {
            state.phase = TokenPhase::Dormant;
            state.armed_token = None;
            state.expires_at = None;
            state.expiry_timer = None;
            return None;
        };

        let info = token_claims::inspect(&token);
        state.expires_at = info.expires_at;
        state.armed_token = Some(token);
        if info.is_expired {
            // Malformed and expired collapse into the same fail-closed
            // outcome.
            state.phase = TokenPhase::Expired;
            state.expiry_timer = None;
            tracing::warn!(valid = info.is_valid, "Armed token is unusable, failing closed");
            return state.trip.clone();
        }

        state.phase = TokenPhase::Valid;
        let epoch = state.epoch;
        let deadline = Arc::clone(self);
        state.expiry_timer = Some(TimerHandle::one_shot(
            info.time_until_expiration,
            move || {
                deadline.deadline_reached(epoch);
            },
        ));
        if state.revalidate.is_none() {
            let sweep = Arc::clone(self);
            state.revalidate = Some(TimerHandle::repeating(
                self.config.revalidation_interval,
                move || {
                    sweep.revalidate();
                },
            ));
        }
        tracing::debug!(
            expires_in_secs = info.time_until_expiration.as_secs(),
            "Token deadline armed"
        );
        None
    }

    fn deadline_reached(self: Arc<Self>, epoch: u64) {
        let trip = {
            let mut state = self.state.lock().unwrap();
            if state.phase != TokenPhase::Valid || state.epoch != epoch {
                return;
            }
            state.phase = TokenPhase::Expired;
            state.trip.clone()
        };
        if let Some(trip) = trip {
            tracing::info!("Auth token expired, logging out silently");
            trip.fire(TimeoutCause::TokenExpired);
        }
    }

    /// Periodic sweep: pick up a token replaced mid-flight, and fail
    /// closed if the armed one lapsed under us.
    fn revalidate(self: &Arc<Self>) {
        let fired = {
            let mut state = self.state.lock().unwrap();
            if state.slot != state.armed_token {
                tracing::debug!("Token changed since arming, recomputing deadline");
                self.rearm_locked(&mut state)
            } else if state.phase == TokenPhase::Valid
                && state
                    .armed_token
                    .as_deref()
                    .is_some_and(token_claims::is_expired)
            {
                state.phase = TokenPhase::Expired;
                state.expiry_timer = None;
                state.trip.clone()
            } else {
                None
            }
        };
        if let Some(trip) = fired {
            trip.fire(TimeoutCause::TokenExpired);
        }
    }
}
