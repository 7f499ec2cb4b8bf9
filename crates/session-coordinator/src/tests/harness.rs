//! Shared fixtures: a recording callback sink, token fabrication, and
//! virtual-clock helpers.

use crate::{SessionCallbacks, SessionConfig, SessionCoordinator, TimeoutCause};
use activity_signal::{ActivityKind, ActivitySource, PulseBus};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every notification the coordinator emits.
#[derive(Default)]
pub struct Recorder {
    warnings: Mutex<Vec<bool>>,
    ticks: Mutex<Vec<u64>>,
    timeouts: Mutex<Vec<TimeoutCause>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn callbacks(self: &Arc<Self>) -> SessionCallbacks {
        let on_warning = Arc::clone(self);
        let on_tick = Arc::clone(self);
        let on_timeout = Arc::clone(self);
        SessionCallbacks::new()
            .on_warning(move |active| on_warning.warnings.lock().unwrap().push(active))
            .on_countdown_tick(move |seconds| on_tick.ticks.lock().unwrap().push(seconds))
            .on_timeout(move |cause| on_timeout.timeouts.lock().unwrap().push(cause))
    }

    pub fn warning_events(&self) -> Vec<bool> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn tick_values(&self) -> Vec<u64> {
        self.ticks.lock().unwrap().clone()
    }

    pub fn timeout_causes(&self) -> Vec<TimeoutCause> {
        self.timeouts.lock().unwrap().clone()
    }

    pub fn timeout_count(&self) -> usize {
        self.timeouts.lock().unwrap().len()
    }
}

/// A coordinator under test together with its pulse bus and recorder.
pub struct TestSession {
    pub bus: Arc<PulseBus>,
    pub recorder: Arc<Recorder>,
    pub coordinator: SessionCoordinator,
}

impl TestSession {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let bus = Arc::new(PulseBus::new());
        let recorder = Recorder::new();
        let coordinator = SessionCoordinator::new(
            config,
            recorder.callbacks(),
            bus.clone() as Arc<dyn ActivitySource>,
        );
        Self {
            bus,
            recorder,
            coordinator,
        }
    }

    /// Start monitoring and let the spawned timer tasks register their
    /// deadlines.
    pub async fn start(&self, token: Option<&str>) {
        self.coordinator.start(token);
        settle().await;
    }

    /// Inject one raw activity event and let the listener deliver it.
    pub async fn pulse(&self) {
        self.bus.emit(ActivityKind::Pointer);
        settle().await;
    }
}

/// Yield enough times for spawned timer and listener tasks to observe
/// the current virtual instant.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// Let `duration` of virtual time elapse, then settle.
pub async fn run_for(duration: Duration) {
    tokio::time::sleep(duration).await;
    settle().await;
}

pub fn minutes(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

pub fn seconds(s: u64) -> Duration {
    Duration::from_secs(s)
}

/// Fabricate a bearer token whose `exp` lies `expires_in` seconds from
/// the wall clock now (negative for one already expired).
pub fn token_expiring_in(expires_in: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + expires_in;
    token_with_claims(serde_json::json!({ "sub": "user-17", "exp": exp }))
}

pub fn token_with_claims(claims: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());
    format!("{header}.{payload}.fabricated-signature")
}
