use chrono::{DateTime, Utc};

/// Wall-clock source for session arithmetic and Discord reset timestamps.
///
/// Waiting is done on tokio's monotonic clock; this is only consulted for
/// "what time is it" questions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time, used outside of tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
