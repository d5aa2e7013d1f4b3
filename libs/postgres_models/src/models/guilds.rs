use crate::schema::{guild_reminder_types, guilds};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = guilds)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Guild {
    pub id: String,
    pub notifications_channel_id: Option<String>,
    pub reminder_minutes: Option<i32>,
    pub reminder_mention_everyone: Option<bool>,
    pub reminder_mention_role_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = guild_reminder_types)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GuildReminderType {
    pub guild_id: String,
    pub reminder_type_id: String,
}
