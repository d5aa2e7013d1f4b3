pub mod guilds;
pub mod reminder_types;
pub mod sent_notifications;

pub use guilds::{Guild, GuildReminderType};
pub use reminder_types::ReminderType;
pub use sent_notifications::NewSentNotification;
