use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use postgres_models::models::{Guild, GuildReminderType, NewSentNotification, ReminderType};
use postgres_models::schema::{guild_reminder_types, guilds, reminder_types, sent_notifications};
use postgres_models::DbPool;
use std::collections::{HashMap, HashSet};

use super::{GuildConfigStore, GuildSettings, NotificationKey, SentNotificationStore};
use crate::errors::StoreError;
use crate::scheduler::session::SessionKind;

#[derive(Clone)]
pub struct PgGuildConfigStore {
    pool: DbPool,
}

impl PgGuildConfigStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuildConfigStore for PgGuildConfigStore {
    async fn list_configured_guilds(&self) -> Result<Vec<GuildSettings>, StoreError> {
        let mut conn = self.pool.get().await?;
        let rows = guilds::table
            .filter(guilds::notifications_channel_id.is_not_null())
            .filter(guilds::reminder_minutes.is_not_null())
            .select(Guild::as_select())
            .load::<Guild>(&mut *conn)
            .await?;

        Ok(rows.into_iter().filter_map(GuildSettings::from_row).collect())
    }

    async fn reminder_type_ids(&self) -> Result<HashMap<SessionKind, String>, StoreError> {
        let mut conn = self.pool.get().await?;
        let rows = reminder_types::table
            .select(ReminderType::as_select())
            .load::<ReminderType>(&mut *conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match SessionKind::from_session_id(&row.session_id) {
                Some(kind) => Some((kind, row.id)),
                None => {
                    tracing::warn!(session_id = %row.session_id, "Unknown reminder type session");
                    None
                }
            })
            .collect())
    }

    async fn enabled_reminder_types(&self, guild_id: &str) -> Result<HashSet<String>, StoreError> {
        let mut conn = self.pool.get().await?;
        let ids = guild_reminder_types::table
            .filter(guild_reminder_types::guild_id.eq(guild_id))
            .select(guild_reminder_types::reminder_type_id)
            .load::<String>(&mut *conn)
            .await?;

        Ok(ids.into_iter().collect())
    }

    async fn all_enabled_reminder_types(
        &self,
    ) -> Result<HashMap<String, HashSet<String>>, StoreError> {
        let mut conn = self.pool.get().await?;
        let rows = guild_reminder_types::table
            .select(GuildReminderType::as_select())
            .load::<GuildReminderType>(&mut *conn)
            .await?;

        let mut enabled: HashMap<String, HashSet<String>> = HashMap::new();
        for row in rows {
            enabled
                .entry(row.guild_id)
                .or_default()
                .insert(row.reminder_type_id);
        }
        Ok(enabled)
    }
}

/// Narrows rows selected by per-column `IN` filters down to the requested keys.
///
/// The filters match any combination of the requested columns, so a row for
/// `(g1, r1, e2)` comes back when `(g1, r1, e1)` and `(g2, r2, e2)` are asked for.
fn exact_matches(
    rows: Vec<(String, String, String)>,
    keys: &[NotificationKey],
) -> HashSet<NotificationKey> {
    let wanted: HashSet<&NotificationKey> = keys.iter().collect();
    rows.into_iter()
        .map(|(guild_id, reminder_type_id, event_id)| {
            NotificationKey::new(guild_id, reminder_type_id, event_id)
        })
        .filter(|key| wanted.contains(key))
        .collect()
}

#[derive(Clone)]
pub struct PgSentNotificationStore {
    pool: DbPool,
}

impl PgSentNotificationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SentNotificationStore for PgSentNotificationStore {
    async fn find_sent(
        &self,
        keys: &[NotificationKey],
    ) -> Result<HashSet<NotificationKey>, StoreError> {
        if keys.is_empty() {
            return Ok(HashSet::new());
        }

        let guild_ids: HashSet<&str> = keys.iter().map(|k| k.guild_id.as_str()).collect();
        let type_ids: HashSet<&str> = keys.iter().map(|k| k.reminder_type_id.as_str()).collect();
        let event_ids: HashSet<&str> = keys.iter().map(|k| k.event_id.as_str()).collect();

        let mut conn = self.pool.get().await?;
        let rows = sent_notifications::table
            .filter(sent_notifications::guild_id.eq_any(guild_ids))
            .filter(sent_notifications::reminder_type_id.eq_any(type_ids))
            .filter(sent_notifications::event_id.eq_any(event_ids))
            .select((
                sent_notifications::guild_id,
                sent_notifications::reminder_type_id,
                sent_notifications::event_id,
            ))
            .load::<(String, String, String)>(&mut *conn)
            .await?;

        Ok(exact_matches(rows, keys))
    }

    async fn record_sent(&self, key: &NotificationKey) -> Result<(), StoreError> {
        self.try_claim(key).await.map(|_| ())
    }

    async fn try_claim(&self, key: &NotificationKey) -> Result<bool, StoreError> {
        let row = NewSentNotification::new(
            key.guild_id.clone(),
            key.reminder_type_id.clone(),
            key.event_id.clone(),
        );

        let mut conn = self.pool.get().await?;
        let inserted = diesel::insert_into(sent_notifications::table)
            .values(&row)
            .on_conflict_do_nothing()
            .execute(&mut *conn)
            .await?;

        Ok(inserted == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(guild_id: &str, reminder_type_id: &str, event_id: &str) -> (String, String, String) {
        (guild_id.into(), reminder_type_id.into(), event_id.into())
    }

    #[test]
    fn cross_product_rows_are_not_reported_as_sent() {
        let keys = vec![
            NotificationKey::new("g1", "r1", "e1"),
            NotificationKey::new("g2", "r2", "e2"),
        ];
        let rows = vec![row("g1", "r1", "e2"), row("g2", "r1", "e1")];

        assert!(exact_matches(rows, &keys).is_empty());
    }

    #[test]
    fn exact_rows_are_kept() {
        let keys = vec![NotificationKey::new("g1", "r1", "e1")];
        let rows = vec![row("g1", "r1", "e1"), row("g1", "r1", "e2")];

        let sent = exact_matches(rows, &keys);
        assert_eq!(sent.len(), 1);
        assert!(sent.contains(&NotificationKey::new("g1", "r1", "e1")));
    }

    #[test]
    fn no_rows_means_nothing_sent() {
        let keys = vec![NotificationKey::new("g1", "r1", "e1")];
        assert!(exact_matches(Vec::new(), &keys).is_empty());
    }
}
