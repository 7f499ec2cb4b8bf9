//! Normalized user-activity pulses for idle tracking.
//!
//! Host adapters translate concrete interaction events (pointer, keyboard,
//! scroll, touch) into [`PulseBus::emit`] calls; subscribers receive a
//! single debounced "the user did something" pulse at most once per
//! rolling one-second window, however many raw events arrive.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Raw events are collapsed to at most one pulse per subscriber per window.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(1);

/// Interaction classes that count as user activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    /// Mouse press, movement, click.
    Pointer,
    /// Key press.
    Keyboard,
    /// Scroll in any scroll container.
    Scroll,
    /// Touch start.
    Touch,
}

/// Callback invoked for each effective (debounced) pulse.
pub type PulseHandler = Arc<dyn Fn() + Send + Sync>;

/// Source of normalized activity pulses.
///
/// The seam between the session coordinator and whatever concrete event
/// APIs the host wires up; tests inject synthetic pulses through it.
pub trait ActivitySource: Send + Sync {
    /// Register a handler for debounced pulses.
    fn subscribe(&self, handler: PulseHandler);

    /// Remove every handler registered on this source.
    fn unsubscribe(&self);
}

/// In-process activity source backed by a broadcast channel.
///
/// Each subscription owns a forwarding task; `unsubscribe` aborts them
/// all, so repeated subscribe/unsubscribe cycles leave nothing behind.
pub struct PulseBus {
    raw: broadcast::Sender<ActivityKind>,
    listeners: Mutex<Vec<JoinHandle<()>>>,
}

impl PulseBus {
    pub fn new() -> Self {
        let (raw, _) = broadcast::channel(64);
        Self {
            raw,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Push one raw interaction event onto the bus.
    pub fn emit(&self, kind: ActivityKind) {
        // No subscribers is fine; the pulse just has no audience.
        let _ = self.raw.send(kind);
    }

    /// Number of live listener tasks.
    pub fn listener_count(&self) -> usize {
        let mut listeners = self.listeners.lock().unwrap();
        listeners.retain(|task| !task.is_finished());
        listeners.len()
    }
}

impl ActivitySource for PulseBus {
    fn subscribe(&self, handler: PulseHandler) {
        let mut rx = self.raw.subscribe();
        let task = tokio::spawn(async move {
            let mut last_pulse: Option<Instant> = None;
            loop {
                match rx.recv().await {
                    Ok(kind) => {
                        let now = Instant::now();
                        let within_window = last_pulse
                            .is_some_and(|at| now.duration_since(at) < DEBOUNCE_WINDOW);
                        if within_window {
                            continue;
                        }
                        last_pulse = Some(now);
                        tracing::trace!(?kind, "Activity pulse");
                        handler();
                    }
                    // Dropped raw events are benign: the debounce already
                    // collapses bursts.
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        self.listeners.lock().unwrap().push(task);
    }

    fn unsubscribe(&self) {
        let mut listeners = self.listeners.lock().unwrap();
        for task in listeners.drain(..) {
            task.abort();
        }
    }
}

impl Default for PulseBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PulseBus {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_handler() -> (PulseHandler, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let handler: PulseHandler = Arc::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (handler, count)
    }

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_one_pulse() {
        let bus = PulseBus::new();
        let (handler, count) = counting_handler();
        bus.subscribe(handler);
        settle().await;

        for _ in 0..5 {
            bus.emit(ActivityKind::Pointer);
        }
        settle().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pulse_passes_after_window_elapses() {
        let bus = PulseBus::new();
        let (handler, count) = counting_handler();
        bus.subscribe(handler);
        settle().await;

        bus.emit(ActivityKind::Keyboard);
        settle().await;
        tokio::time::sleep(DEBOUNCE_WINDOW).await;
        bus.emit(ActivityKind::Keyboard);
        settle().await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn mixed_kinds_share_one_window() {
        let bus = PulseBus::new();
        let (handler, count) = counting_handler();
        bus.subscribe(handler);
        settle().await;

        bus.emit(ActivityKind::Pointer);
        bus.emit(ActivityKind::Keyboard);
        bus.emit(ActivityKind::Scroll);
        bus.emit(ActivityKind::Touch);
        settle().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unsubscribe_stops_delivery() {
        let bus = PulseBus::new();
        let (handler, count) = counting_handler();
        bus.subscribe(handler);
        settle().await;

        bus.emit(ActivityKind::Pointer);
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        bus.unsubscribe();
        settle().await;
        assert_eq!(bus.listener_count(), 0);

        tokio::time::sleep(DEBOUNCE_WINDOW).await;
        bus.emit(ActivityKind::Pointer);
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn each_subscriber_receives_pulses() {
        let bus = PulseBus::new();
        let (first, first_count) = counting_handler();
        let (second, second_count) = counting_handler();
        bus.subscribe(first);
        bus.subscribe(second);
        settle().await;

        bus.emit(ActivityKind::Scroll);
        settle().await;

        assert_eq!(first_count.load(Ordering::SeqCst), 1);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_cycles_leak_no_listeners() {
        let bus = PulseBus::new();

        for _ in 0..10 {
            let (handler, _count) = counting_handler();
            bus.subscribe(handler);
            settle().await;
            assert_eq!(bus.listener_count(), 1);

            bus.unsubscribe();
            settle().await;
            assert_eq!(bus.listener_count(), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn emit_without_subscribers_is_a_noop() {
        let bus = PulseBus::new();
        bus.emit(ActivityKind::Pointer);
        settle().await;
        assert_eq!(bus.listener_count(), 0);
    }
}
