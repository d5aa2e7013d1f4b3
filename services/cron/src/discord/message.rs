use chrono::{DateTime, Utc};
use serde::Serialize;

use super::flags::flag_emoji;
use crate::scheduler::session::SessionKind;

pub const REMINDER_COLOR: u32 = 0xdf3939;

/// Sentinel stored in `reminder_mention_role_id` for a broadcast mention.
pub const EVERYONE_SENTINEL: &str = "everyone";

/// Who a reminder pings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MentionTarget {
    Everyone,
    Role(String),
}

impl MentionTarget {
    /// Normalizes a guild's mention settings.
    ///
    /// Discord gives the `@everyone` role the guild's own id, so a role id
    /// equal to `guild_id` is the same broadcast as the `"everyone"` sentinel.
    pub fn resolve(guild_id: &str, mention_everyone: bool, role_id: Option<&str>) -> Option<Self> {
        if mention_everyone {
            return Some(Self::Everyone);
        }
        match role_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) if id == EVERYONE_SENTINEL || id == guild_id => Some(Self::Everyone),
            Some(id) => Some(Self::Role(id.to_string())),
            None => None,
        }
    }

    pub fn content(&self) -> String {
        match self {
            Self::Everyone => "@everyone".to_string(),
            Self::Role(id) => format!("<@&{id}>"),
        }
    }

    pub fn describe(target: Option<&Self>) -> String {
        match target {
            Some(Self::Everyone) => "with @everyone mention".to_string(),
            Some(Self::Role(id)) => format!("with role <@&{id}> mention"),
            None => "without mention".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    pub title: String,
    pub description: String,
    pub color: u32,
}

/// Body of a `POST /channels/{id}/messages` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}

impl ReminderMessage {
    pub fn session_reminder(
        race_name: &str,
        country_code: Option<&str>,
        session: SessionKind,
        starts_at: DateTime<Utc>,
        mention: Option<&MentionTarget>,
    ) -> Self {
        let title = match country_code.and_then(flag_emoji) {
            Some(flag) => format!("{flag} {race_name}"),
            None => race_name.to_string(),
        };
        let description = format!(
            "**{}** is starting <t:{}:R>",
            session.display_name(),
            starts_at.timestamp()
        );

        Self {
            content: mention.map(MentionTarget::content),
            embeds: vec![Embed {
                author: Some(EmbedAuthor {
                    name: "Session Reminder".to_string(),
                }),
                title,
                description,
                color: REMINDER_COLOR,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn guild_id_role_is_everyone() {
        let from_guild_id = MentionTarget::resolve("81384788765712384", false, Some("81384788765712384"));
        let from_sentinel = MentionTarget::resolve("81384788765712384", false, Some("everyone"));
        assert_eq!(from_guild_id, Some(MentionTarget::Everyone));
        assert_eq!(from_guild_id, from_sentinel);
        assert_eq!(from_guild_id.unwrap().content(), "@everyone");
    }

    #[test]
    fn resolves_roles_and_absence() {
        assert_eq!(
            MentionTarget::resolve("1", false, Some("42")),
            Some(MentionTarget::Role("42".into()))
        );
        assert_eq!(MentionTarget::resolve("1", false, None), None);
        assert_eq!(MentionTarget::resolve("1", false, Some("  ")), None);
        assert_eq!(MentionTarget::resolve("1", true, Some("42")), Some(MentionTarget::Everyone));
        assert_eq!(MentionTarget::Role("42".into()).content(), "<@&42>");
    }

    #[test]
    fn builds_reminder_embed() {
        let starts_at = Utc.with_ymd_and_hms(2025, 3, 16, 4, 0, 0).unwrap();
        let message = ReminderMessage::session_reminder(
            "Formula 1 Louis Vuitton Australian Grand Prix 2025",
            Some("AUS"),
            SessionKind::GrandPrix,
            starts_at,
            Some(&MentionTarget::Role("42".into())),
        );

        assert_eq!(message.content.as_deref(), Some("<@&42>"));
        let embed = &message.embeds[0];
        assert!(embed.title.starts_with("\u{1F1E6}\u{1F1FA} Formula 1"));
        assert_eq!(embed.description, format!("**Grand Prix** is starting <t:{}:R>", starts_at.timestamp()));
        assert_eq!(embed.author.as_ref().unwrap().name, "Session Reminder");

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["embeds"][0]["color"], REMINDER_COLOR);
    }

    #[test]
    fn no_mention_omits_content() {
        let message = ReminderMessage::session_reminder(
            "Emilia Romagna Grand Prix",
            None,
            SessionKind::Qualifying,
            Utc::now(),
            None,
        );
        assert_eq!(message.embeds[0].title, "Emilia Romagna Grand Prix");
        let json = serde_json::to_value(&message).unwrap();
        assert!(json.get("content").is_none());
    }
}
