use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use std::time::Duration;

use super::message::ReminderMessage;
use crate::errors::DeliveryError;

/// What came back from a message post, successful or not.
#[derive(Debug, Clone)]
pub struct DeliveryResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl DeliveryResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Server-provided back-off: the `retry-after` header, else the JSON body's
    /// `retry_after` field.
    pub fn retry_after(&self) -> Option<Duration> {
        let from_header = self
            .headers
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok());
        let seconds = from_header.or_else(|| {
            serde_json::from_str::<serde_json::Value>(&self.body)
                .ok()?
                .get("retry_after")?
                .as_f64()
        })?;
        Duration::try_from_secs_f64(seconds).ok()
    }
}

/// Posts messages to a destination channel.
#[async_trait]
pub trait MessageDelivery: Send + Sync {
    async fn post_message(
        &self,
        channel_id: &str,
        message: &ReminderMessage,
    ) -> Result<DeliveryResponse, DeliveryError>;
}

/// Discord REST API client authenticated with a bot token.
pub struct DiscordRest {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl DiscordRest {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(crate::USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl MessageDelivery for DiscordRest {
    async fn post_message(
        &self,
        channel_id: &str,
        message: &ReminderMessage,
    ) -> Result<DeliveryResponse, DeliveryError> {
        let response = self
            .client
            .post(format!("{}/channels/{channel_id}/messages", self.base_url))
            .header(AUTHORIZATION, format!("Bot {}", self.token))
            .json(message)
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok(DeliveryResponse {
            status,
            headers,
            body,
        })
    }
}
