//! Reminder delivery to Discord channels.

pub mod flags;
pub mod limiter;
pub mod message;
pub mod rest;
pub mod sender;

pub use limiter::{ChannelRateLimiter, RateLimitRecord};
pub use message::{MentionTarget, ReminderMessage};
pub use rest::{DeliveryResponse, DiscordRest, MessageDelivery};
pub use sender::ReminderSender;
