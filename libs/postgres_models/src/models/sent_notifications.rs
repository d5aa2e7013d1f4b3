use crate::schema::sent_notifications;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = sent_notifications)]
pub struct NewSentNotification {
    pub guild_id: String,
    pub reminder_type_id: String,
    pub event_id: String,
}

impl NewSentNotification {
    pub fn new(guild_id: String, reminder_type_id: String, event_id: String) -> Self {
        Self {
            guild_id,
            reminder_type_id,
            event_id,
        }
    }
}
