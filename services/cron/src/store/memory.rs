use async_trait::async_trait;
use postgres_models::models::ReminderType;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{GuildConfigStore, GuildSettings, NotificationKey, SentNotificationStore};
use crate::errors::StoreError;
use crate::scheduler::session::SessionKind;

fn poisoned() -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

/// Guild configuration held in process memory.
pub struct InMemoryGuildConfigStore {
    guilds: Mutex<Vec<GuildSettings>>,
    reminder_types: Mutex<Vec<ReminderType>>,
    enabled: Mutex<HashMap<String, HashSet<String>>>,
}

impl Default for InMemoryGuildConfigStore {
    fn default() -> Self {
        Self {
            guilds: Mutex::new(vec![]),
            reminder_types: Mutex::new(ReminderType::defaults()),
            enabled: Mutex::new(HashMap::new()),
        }
    }
}

impl InMemoryGuildConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a guild and enables the given session kinds for it.
    pub fn insert_guild(&self, settings: GuildSettings, kinds: &[SessionKind]) {
        let type_ids: HashSet<String> = {
            let types = self.reminder_types.lock().unwrap_or_else(|e| e.into_inner());
            types
                .iter()
                .filter(|t| kinds.iter().any(|k| k.session_id() == t.session_id))
                .map(|t| t.id.clone())
                .collect()
        };
        self.enabled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(settings.guild_id.clone(), type_ids);
        self.guilds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(settings);
    }
}

#[async_trait]
impl GuildConfigStore for InMemoryGuildConfigStore {
    async fn list_configured_guilds(&self) -> Result<Vec<GuildSettings>, StoreError> {
        Ok(self.guilds.lock().map_err(|_| poisoned())?.clone())
    }

    async fn reminder_type_ids(&self) -> Result<HashMap<SessionKind, String>, StoreError> {
        let types = self.reminder_types.lock().map_err(|_| poisoned())?;
        Ok(types
            .iter()
            .filter_map(|t| Some((SessionKind::from_session_id(&t.session_id)?, t.id.clone())))
            .collect())
    }

    async fn enabled_reminder_types(&self, guild_id: &str) -> Result<HashSet<String>, StoreError> {
        let enabled = self.enabled.lock().map_err(|_| poisoned())?;
        Ok(enabled.get(guild_id).cloned().unwrap_or_default())
    }

    async fn all_enabled_reminder_types(
        &self,
    ) -> Result<HashMap<String, HashSet<String>>, StoreError> {
        Ok(self.enabled.lock().map_err(|_| poisoned())?.clone())
    }
}

/// Sent-notification set held in process memory.
#[derive(Default)]
pub struct InMemorySentNotificationStore {
    sent: Mutex<HashSet<NotificationKey>>,
}

impl InMemorySentNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &NotificationKey) -> bool {
        self.sent
            .lock()
            .map(|sent| sent.contains(key))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SentNotificationStore for InMemorySentNotificationStore {
    async fn find_sent(
        &self,
        keys: &[NotificationKey],
    ) -> Result<HashSet<NotificationKey>, StoreError> {
        let sent = self.sent.lock().map_err(|_| poisoned())?;
        Ok(keys.iter().filter(|k| sent.contains(*k)).cloned().collect())
    }

    async fn record_sent(&self, key: &NotificationKey) -> Result<(), StoreError> {
        self.sent.lock().map_err(|_| poisoned())?.insert(key.clone());
        Ok(())
    }

    async fn try_claim(&self, key: &NotificationKey) -> Result<bool, StoreError> {
        Ok(self.sent.lock().map_err(|_| poisoned())?.insert(key.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn maps_default_reminder_types() {
        let store = InMemoryGuildConfigStore::new();
        let ids = store.reminder_type_ids().await.unwrap();
        assert_eq!(ids.len(), 7);
        assert_eq!(ids[&SessionKind::GrandPrix], "7");
        assert_eq!(ids[&SessionKind::FreePractice1], "1");
    }

    #[tokio::test]
    async fn claims_are_exclusive() {
        let store = InMemorySentNotificationStore::new();
        let key = NotificationKey::new("g", "7", "1120-grandPrix");
        assert!(store.try_claim(&key).await.unwrap());
        assert!(!store.try_claim(&key).await.unwrap());
        assert_eq!(store.find_sent(&[key.clone()]).await.unwrap().len(), 1);
    }
}
