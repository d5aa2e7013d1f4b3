use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

use super::session::{RaceWeekend, SessionKind};
use crate::discord::MentionTarget;
use crate::store::{GuildSettings, NotificationKey};

/// A reminder that is due for one guild and one session.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub key: NotificationKey,
    pub channel_id: String,
    pub race_name: String,
    pub country_code: Option<String>,
    pub session: SessionKind,
    pub starts_at: DateTime<Utc>,
    pub mention: Option<MentionTarget>,
}

/// Races with at least one session starting within `window_minutes` of `now`.
pub fn upcoming_races(
    races: Vec<RaceWeekend>,
    now: DateTime<Utc>,
    window_minutes: i64,
) -> Vec<RaceWeekend> {
    races
        .into_iter()
        .filter(|race| race.has_session_within(now, window_minutes))
        .collect()
}

/// Every (race, session, guild) combination that should be reminded now.
///
/// A session qualifies for a guild when it has not started, the guild enabled
/// its reminder type and it starts within the guild's lead time. The lead time
/// is capped at `max_minutes`.
pub fn collect_candidates(
    races: &[RaceWeekend],
    guilds: &[GuildSettings],
    reminder_type_ids: &HashMap<SessionKind, String>,
    enabled: &HashMap<String, HashSet<String>>,
    now: DateTime<Utc>,
    max_minutes: i64,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for race in races {
        for session in &race.sessions {
            let Some(reminder_type_id) = reminder_type_ids.get(&session.kind) else {
                continue;
            };
            let diff = session.minutes_until(now);
            if diff <= 0.0 {
                continue;
            }

            for guild in guilds {
                let lead = guild.reminder_minutes.min(max_minutes) as f64;
                if diff > lead {
                    continue;
                }
                let is_enabled = enabled
                    .get(&guild.guild_id)
                    .is_some_and(|types| types.contains(reminder_type_id));
                if !is_enabled {
                    continue;
                }

                candidates.push(Candidate {
                    key: NotificationKey::new(
                        guild.guild_id.as_str(),
                        reminder_type_id.as_str(),
                        session.event_id(),
                    ),
                    channel_id: guild.channel_id.clone(),
                    race_name: race.official_name.clone(),
                    country_code: race.country_code.clone(),
                    session: session.kind,
                    starts_at: session.scheduled_at,
                    mention: guild.mention.clone(),
                });
            }
        }
    }

    candidates
}

/// Groups candidates by destination channel, keeping the order in which
/// channels and their candidates were first seen.
pub fn group_by_channel(candidates: Vec<Candidate>) -> Vec<(String, Vec<Candidate>)> {
    let mut groups: Vec<(String, Vec<Candidate>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        match index.get(&candidate.channel_id) {
            Some(&i) => groups[i].1.push(candidate),
            None => {
                index.insert(candidate.channel_id.clone(), groups.len());
                groups.push((candidate.channel_id.clone(), vec![candidate]));
            }
        }
    }

    groups
}
