use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::SourceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    FreePractice1,
    FreePractice2,
    FreePractice3,
    Qualifying,
    SprintQualifying,
    SprintRace,
    GrandPrix,
}

impl SessionKind {
    pub const ALL: [SessionKind; 7] = [
        SessionKind::GrandPrix,
        SessionKind::FreePractice1,
        SessionKind::FreePractice2,
        SessionKind::FreePractice3,
        SessionKind::Qualifying,
        SessionKind::SprintQualifying,
        SessionKind::SprintRace,
    ];

    /// Stable identifier stored in `reminder_types.session_id` and used in event ids.
    pub fn session_id(&self) -> &'static str {
        match self {
            Self::FreePractice1 => "freePractice1",
            Self::FreePractice2 => "freePractice2",
            Self::FreePractice3 => "freePractice3",
            Self::Qualifying => "qualifying",
            Self::SprintQualifying => "sprintQualifying",
            Self::SprintRace => "sprintRace",
            Self::GrandPrix => "grandPrix",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FreePractice1 => "Free Practice 1",
            Self::FreePractice2 => "Free Practice 2",
            Self::FreePractice3 => "Free Practice 3",
            Self::Qualifying => "Qualifying",
            Self::SprintQualifying => "Sprint Qualifying",
            Self::SprintRace => "Sprint Race",
            Self::GrandPrix => "Grand Prix",
        }
    }

    pub fn from_session_id(session_id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.session_id() == session_id)
    }
}

/// One timed part of a race weekend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub race_id: String,
    pub kind: SessionKind,
    pub scheduled_at: DateTime<Utc>,
}

impl SessionEvent {
    /// Builds a session from calendar strings; `None` when date or time is missing
    /// or unreadable.
    pub fn parse(
        race_id: &str,
        kind: SessionKind,
        date: Option<&str>,
        time: Option<&str>,
    ) -> Option<Self> {
        let (Some(date), Some(time)) = (date, time) else {
            tracing::debug!(race_id, session = kind.session_id(), "Session has no start time");
            return None;
        };
        let Some(scheduled_at) = parse_session_start(date, time) else {
            tracing::debug!(race_id, session = kind.session_id(), date, time, "Unreadable session start");
            return None;
        };
        Some(Self {
            race_id: race_id.to_string(),
            kind,
            scheduled_at,
        })
    }

    /// Key used for deduplication: stable across ticks and calendar syncs.
    pub fn event_id(&self) -> String {
        format!("{}-{}", self.race_id, self.kind.session_id())
    }

    pub fn minutes_until(&self, now: DateTime<Utc>) -> f64 {
        (self.scheduled_at - now).num_milliseconds() as f64 / 60_000.0
    }
}

/// Parses `YYYY-MM-DD` plus `HH:MM[:SS][Z]` as a UTC instant.
pub fn parse_session_start(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = time.trim().trim_end_matches('Z');
    let time = NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
        .ok()?;
    Some(date.and_time(time).and_utc())
}

/// A race and the sessions of its weekend that have a known start.
#[derive(Debug, Clone)]
pub struct RaceWeekend {
    pub race_id: String,
    pub official_name: String,
    /// ISO 3166-1 alpha-3 code of the host country.
    pub country_code: Option<String>,
    pub sessions: Vec<SessionEvent>,
}

impl RaceWeekend {
    /// Whether any session starts within `[now, now + window]`.
    ///
    /// A window that overflows the calendar matches nothing.
    pub fn has_session_within(&self, now: DateTime<Utc>, window_minutes: i64) -> bool {
        let Some(horizon) =
            Duration::try_minutes(window_minutes).and_then(|window| now.checked_add_signed(window))
        else {
            return false;
        };
        self.sessions
            .iter()
            .any(|s| s.scheduled_at >= now && s.scheduled_at <= horizon)
    }
}

/// Calendar of race weekends, synced from the racing-data provider.
#[async_trait]
pub trait SessionSource: Send + Sync {
    async fn list_sessions_for_season(&self, year: i32) -> Result<Vec<RaceWeekend>, SourceError>;
}
