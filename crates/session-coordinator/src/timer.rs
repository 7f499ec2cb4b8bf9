//! Scheduled-deadline primitives.
//!
//! Every deadline in the coordinator is owned by exactly one
//! [`TimerHandle`]; cancelling the handle (or dropping it) aborts the
//! underlying task, so teardown can cancel unconditionally and a stale
//! deadline can never fire after its owner let go.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

/// Owning handle for one scheduled deadline or repeating tick.
#[derive(Debug)]
pub(crate) struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Run `f` once after `delay`.
    pub fn one_shot<F>(delay: Duration, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let task = tokio::spawn(async move {
            sleep(delay).await;
            f();
        });
        Self { task }
    }

    /// Run `f` every `period`, first at one `period` from now.
    pub fn repeating<F>(period: Duration, mut f: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                f();
            }
        });
        Self { task }
    }

    /// Cancel the deadline. Idempotent; a callback that is already
    /// executing is responsible for re-checking state before acting.
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        (count, move || {
            seen.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn one_shot_fires_after_delay() {
        let (count, f) = counter();
        let _timer = TimerHandle::one_shot(Duration::from_secs(5), f);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_one_shot_never_fires() {
        let (count, f) = counter();
        let timer = TimerHandle::one_shot(Duration::from_secs(5), f);
        tokio::task::yield_now().await;

        timer.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_one_shot_never_fires() {
        let (count, f) = counter();
        {
            let _timer = TimerHandle::one_shot(Duration::from_secs(5), f);
            tokio::task::yield_now().await;
        }

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeating_ticks_once_per_period() {
        let (count, f) = counter();
        let _timer = TimerHandle::repeating(Duration::from_secs(1), f);

        tokio::time::sleep(Duration::from_millis(5500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_repeating_stops_ticking() {
        let (count, f) = counter();
        let timer = TimerHandle::repeating(Duration::from_secs(1), f);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        timer.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
