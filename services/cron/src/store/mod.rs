//! Guild configuration and sent-notification persistence.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use postgres_models::models::Guild;
use std::collections::{HashMap, HashSet};

use crate::discord::MentionTarget;
use crate::errors::StoreError;
use crate::scheduler::session::SessionKind;

pub use memory::{InMemoryGuildConfigStore, InMemorySentNotificationStore};
pub use postgres::{PgGuildConfigStore, PgSentNotificationStore};

/// Reminder settings of a guild that has both a channel and a lead time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildSettings {
    pub guild_id: String,
    pub channel_id: String,
    pub reminder_minutes: i64,
    pub mention: Option<MentionTarget>,
}

impl GuildSettings {
    /// `None` for guilds that have not finished configuring reminders.
    pub fn from_row(guild: Guild) -> Option<Self> {
        let channel_id = guild.notifications_channel_id?;
        let reminder_minutes = i64::from(guild.reminder_minutes?);
        let mention = MentionTarget::resolve(
            &guild.id,
            guild.reminder_mention_everyone.unwrap_or(false),
            guild.reminder_mention_role_id.as_deref(),
        );
        Some(Self {
            guild_id: guild.id,
            channel_id,
            reminder_minutes,
            mention,
        })
    }
}

/// Identity of one reminder: at most one is ever delivered per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationKey {
    pub guild_id: String,
    pub reminder_type_id: String,
    pub event_id: String,
}

impl NotificationKey {
    pub fn new(
        guild_id: impl Into<String>,
        reminder_type_id: impl Into<String>,
        event_id: impl Into<String>,
    ) -> Self {
        Self {
            guild_id: guild_id.into(),
            reminder_type_id: reminder_type_id.into(),
            event_id: event_id.into(),
        }
    }
}

#[async_trait]
pub trait GuildConfigStore: Send + Sync {
    /// Guilds with both a notification channel and a lead time.
    async fn list_configured_guilds(&self) -> Result<Vec<GuildSettings>, StoreError>;

    /// Reminder type id for every known session kind.
    async fn reminder_type_ids(&self) -> Result<HashMap<SessionKind, String>, StoreError>;

    async fn enabled_reminder_types(&self, guild_id: &str) -> Result<HashSet<String>, StoreError>;

    /// Enabled reminder types of every guild, in one query.
    async fn all_enabled_reminder_types(
        &self,
    ) -> Result<HashMap<String, HashSet<String>>, StoreError>;
}

#[async_trait]
pub trait SentNotificationStore: Send + Sync {
    /// The subset of `keys` that has already been recorded.
    async fn find_sent(
        &self,
        keys: &[NotificationKey],
    ) -> Result<HashSet<NotificationKey>, StoreError>;

    /// Records a delivered reminder. Recording an existing key is a no-op.
    async fn record_sent(&self, key: &NotificationKey) -> Result<(), StoreError>;

    /// Records `key` unless it exists; returns whether this call inserted it.
    async fn try_claim(&self, key: &NotificationKey) -> Result<bool, StoreError>;
}
