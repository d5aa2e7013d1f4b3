use reqwest::header::HeaderMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::clock::Clock;

/// Discord's view of one route bucket, as reported by the last response.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitRecord {
    pub limit: u32,
    pub remaining: u32,
    /// Unix timestamp (seconds, fractional) at which the bucket refills.
    pub reset_at: f64,
    pub reset_after: f64,
    pub bucket: String,
}

impl RateLimitRecord {
    /// Reads the `x-ratelimit-*` headers; `None` unless all of them are present.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
            headers.get(name)?.to_str().ok().map(str::trim)
        }

        Some(Self {
            limit: header(headers, "x-ratelimit-limit")?.parse().ok()?,
            remaining: header(headers, "x-ratelimit-remaining")?.parse().ok()?,
            reset_at: header(headers, "x-ratelimit-reset")?.parse().ok()?,
            reset_after: header(headers, "x-ratelimit-reset-after")?.parse().ok()?,
            bucket: header(headers, "x-ratelimit-bucket")?.to_string(),
        })
    }

    /// Time left until the bucket refills, if the next request must wait for it.
    pub fn wait_before_next(&self, now_unix: f64) -> Option<Duration> {
        if self.remaining > 1 || self.reset_at <= now_unix {
            return None;
        }
        Duration::try_from_secs_f64(self.reset_at - now_unix).ok()
    }
}

/// Per-channel bookkeeping of Discord rate-limit headers.
pub struct ChannelRateLimiter {
    records: Mutex<HashMap<String, RateLimitRecord>>,
    buffer: Duration,
    clock: Arc<dyn Clock>,
}

impl ChannelRateLimiter {
    pub fn new(buffer: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            buffer,
            clock,
        }
    }

    /// Sleeps until the channel's bucket resets when it is about to run dry.
    pub async fn check_rate_limit(&self, channel_id: &str) {
        let wait = {
            let Ok(records) = self.records.lock() else {
                return;
            };
            let now = self.clock.now().timestamp_millis() as f64 / 1000.0;
            records
                .get(&key(channel_id))
                .and_then(|record| record.wait_before_next(now))
        };

        if let Some(wait) = wait {
            let wait = wait + self.buffer;
            tracing::debug!(
                channel_id,
                wait_ms = wait.as_millis() as u64,
                "Rate limit approaching for channel, waiting before sending"
            );
            tokio::time::sleep(wait).await;
        }
    }

    pub fn update_from_headers(&self, headers: &HeaderMap, channel_id: &str) {
        let Some(record) = RateLimitRecord::from_headers(headers) else {
            return;
        };
        if let Ok(mut records) = self.records.lock() {
            records.insert(key(channel_id), record);
        }
    }

    pub fn record(&self, channel_id: &str) -> Option<RateLimitRecord> {
        self.records.lock().ok()?.get(&key(channel_id)).cloned()
    }
}

fn key(channel_id: &str) -> String {
    format!("channel:{channel_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn parses_complete_header_set() {
        let record = RateLimitRecord::from_headers(&headers(&[
            ("x-ratelimit-limit", "5"),
            ("x-ratelimit-remaining", "0"),
            ("x-ratelimit-reset", "1740000000.25"),
            ("x-ratelimit-reset-after", "1.25"),
            ("x-ratelimit-bucket", "abcd1234"),
        ]))
        .unwrap();
        assert_eq!(record.limit, 5);
        assert_eq!(record.remaining, 0);
        assert_eq!(record.reset_at, 1_740_000_000.25);
        assert_eq!(record.bucket, "abcd1234");
    }

    #[test]
    fn incomplete_headers_are_ignored() {
        assert!(RateLimitRecord::from_headers(&headers(&[
            ("x-ratelimit-limit", "5"),
            ("x-ratelimit-remaining", "4"),
        ]))
        .is_none());
        assert!(RateLimitRecord::from_headers(&headers(&[
            ("x-ratelimit-limit", "5"),
            ("x-ratelimit-remaining", "-1"),
            ("x-ratelimit-reset", "1"),
            ("x-ratelimit-reset-after", "1"),
            ("x-ratelimit-bucket", "b"),
        ]))
        .is_none());
    }

    #[test]
    fn only_waits_when_nearly_exhausted_and_reset_is_ahead() {
        let record = RateLimitRecord {
            limit: 5,
            remaining: 1,
            reset_at: 102.0,
            reset_after: 2.0,
            bucket: "b".into(),
        };
        assert_eq!(record.wait_before_next(100.0), Some(Duration::from_secs(2)));
        assert_eq!(record.wait_before_next(102.0), None);
        let plenty = RateLimitRecord { remaining: 2, ..record };
        assert_eq!(plenty.wait_before_next(100.0), None);
    }
}
