use std::sync::Arc;
use std::time::Duration;

use super::limiter::ChannelRateLimiter;
use super::message::ReminderMessage;
use super::rest::{DeliveryResponse, MessageDelivery};
use crate::clock::Clock;
use crate::config::Limits;
use crate::errors::DeliveryError;

/// Delivers reminders while honouring each channel's rate limit.
pub struct ReminderSender {
    delivery: Arc<dyn MessageDelivery>,
    limiter: ChannelRateLimiter,
    max_attempts: u32,
    default_retry_after: Duration,
}

impl ReminderSender {
    pub fn new(delivery: Arc<dyn MessageDelivery>, limits: &Limits, clock: Arc<dyn Clock>) -> Self {
        Self {
            delivery,
            limiter: ChannelRateLimiter::new(limits.channel_reset_buffer, clock),
            max_attempts: limits.max_delivery_attempts.max(1),
            default_retry_after: limits.default_retry_after,
        }
    }

    pub fn limiter(&self) -> &ChannelRateLimiter {
        &self.limiter
    }

    /// Posts `message`, retrying 429 responses after the server-given delay
    /// up to `max_attempts` in total.
    pub async fn send(
        &self,
        channel_id: &str,
        message: &ReminderMessage,
    ) -> Result<DeliveryResponse, DeliveryError> {
        let mut attempts = 0;
        let mut waited_retry_after = false;

        loop {
            attempts += 1;
            // The stored bucket came from the 429 we just waited out.
            if !waited_retry_after {
                self.limiter.check_rate_limit(channel_id).await;
            }

            let response = self.delivery.post_message(channel_id, message).await?;
            self.limiter.update_from_headers(&response.headers, channel_id);

            if response.is_rate_limited() {
                if attempts >= self.max_attempts {
                    return Err(DeliveryError::RateLimited { attempts });
                }
                let wait = response.retry_after().unwrap_or(self.default_retry_after);
                tracing::warn!(
                    channel_id,
                    retry_after_ms = wait.as_millis() as u64,
                    "Rate limited when sending to channel"
                );
                tokio::time::sleep(wait).await;
                waited_retry_after = true;
                continue;
            }

            if !response.is_success() {
                return Err(DeliveryError::Rejected {
                    status: response.status,
                    body: response.body,
                });
            }

            return Ok(response);
        }
    }
}
