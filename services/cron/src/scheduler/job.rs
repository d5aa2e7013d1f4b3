use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::SessionReminderScheduler;
use crate::config::Limits;

pub const JOB_NAME: &str = "SessionNotifications";

/// Seconds from `now_ms` (unix millis) until the next wall-clock minute.
pub fn secs_until_next_minute(now_ms: i64) -> u64 {
    let into_minute = (now_ms / 1000).rem_euclid(60) as u64;
    60 - into_minute
}

/// Drives `scheduler` on a fixed interval aligned to wall-clock minutes.
///
/// Each tick runs in its own task; overlapping ticks are turned away by the
/// scheduler's run guard.
pub fn start(scheduler: Arc<SessionReminderScheduler>, limits: &Limits) -> JoinHandle<()> {
    let run_on_start = limits.run_on_start;
    // tokio intervals panic on a zero period
    let period = limits.tick_interval.max(Duration::from_secs(1));

    tokio::spawn(async move {
        tracing::info!(job = JOB_NAME, period_secs = period.as_secs(), "Starting job");

        if run_on_start {
            spawn_tick(&scheduler);
        }

        let now_ms = scheduler.clock.now().timestamp_millis();
        let delay = Duration::from_secs(secs_until_next_minute(now_ms));
        let mut ticker = interval_at(Instant::now() + delay, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            spawn_tick(&scheduler);
        }
    })
}

fn spawn_tick(scheduler: &Arc<SessionReminderScheduler>) {
    let scheduler = Arc::clone(scheduler);
    tokio::spawn(async move {
        let outcome = scheduler.run_tick().await;
        tracing::debug!(job = JOB_NAME, ?outcome, "Tick finished");
    });
}
