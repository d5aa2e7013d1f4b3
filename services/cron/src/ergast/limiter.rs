use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, sleep_until, Instant};

use crate::config::Limits;

/// Sliding-window throttle with a sustained cap and a burst cap.
///
/// The timestamp log is locked for the whole wait so concurrent callers are
/// admitted one at a time, in the order they queued on the mutex.
pub struct SlidingWindowLimiter {
    burst_limit: usize,
    burst_window: Duration,
    sustained_limit: usize,
    sustained_window: Duration,
    step: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new(
        burst_limit: usize,
        burst_window: Duration,
        sustained_limit: usize,
        sustained_window: Duration,
        step: Duration,
    ) -> Self {
        Self {
            burst_limit: burst_limit.max(1),
            burst_window,
            sustained_limit: sustained_limit.max(1),
            sustained_window,
            step,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    pub fn from_limits(limits: &Limits) -> Self {
        Self::new(
            limits.burst_limit,
            limits.burst_window,
            limits.sustained_limit,
            limits.sustained_window,
            limits.throttle_step,
        )
    }

    /// Waits until another request is allowed, then records it.
    pub async fn acquire(&self) {
        let mut timestamps = self.timestamps.lock().await;
        self.prune(&mut timestamps, Instant::now());

        if timestamps.len() >= self.sustained_limit {
            if let Some(&oldest) = timestamps.front() {
                let until = oldest + self.sustained_window;
                tracing::warn!(
                    wait_secs = until.saturating_duration_since(Instant::now()).as_secs(),
                    "Hourly Ergast rate limit reached, waiting"
                );
                sleep_until(until).await;
                self.prune(&mut timestamps, Instant::now());
            }
        }

        while self.in_burst(&timestamps, Instant::now()) >= self.burst_limit {
            tracing::trace!("Ergast burst limit reached, backing off");
            sleep(self.step).await;
        }

        timestamps.push_back(Instant::now());
    }

    /// Requests recorded inside the sustained window.
    pub async fn recorded(&self) -> usize {
        let mut timestamps = self.timestamps.lock().await;
        self.prune(&mut timestamps, Instant::now());
        timestamps.len()
    }

    fn prune(&self, timestamps: &mut VecDeque<Instant>, now: Instant) {
        while timestamps
            .front()
            .is_some_and(|&t| now.saturating_duration_since(t) >= self.sustained_window)
        {
            timestamps.pop_front();
        }
    }

    fn in_burst(&self, timestamps: &VecDeque<Instant>, now: Instant) -> usize {
        timestamps
            .iter()
            .rev()
            .take_while(|&&t| now.saturating_duration_since(t) < self.burst_window)
            .count()
    }
}
