use async_trait::async_trait;
use std::sync::Arc;

use super::models::{Race, SessionTime};
use super::ErgastClient;
use crate::discord::flags::alpha3_for_country;
use crate::errors::SourceError;
use crate::scheduler::session::{RaceWeekend, SessionEvent, SessionKind, SessionSource};

/// Session calendar read from the Ergast season schedule.
pub struct ErgastSessionSource {
    client: Arc<ErgastClient>,
}

impl ErgastSessionSource {
    pub fn new(client: Arc<ErgastClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionSource for ErgastSessionSource {
    async fn list_sessions_for_season(&self, year: i32) -> Result<Vec<RaceWeekend>, SourceError> {
        let schedule = self
            .client
            .season_schedule(year)
            .await
            .ok_or(SourceError::Unavailable(year))?;

        Ok(schedule
            .items()
            .map(|races| races.iter().map(race_weekend).collect())
            .unwrap_or_default())
    }
}

fn race_weekend(race: &Race) -> RaceWeekend {
    let race_id = format!("{}-{:0>2}", race.season, race.round);

    let sprint_qualifying = race
        .sprint_qualifying
        .as_ref()
        .or(race.sprint_shootout.as_ref());
    let parts: [(SessionKind, Option<&SessionTime>); 6] = [
        (SessionKind::FreePractice1, race.first_practice.as_ref()),
        (SessionKind::FreePractice2, race.second_practice.as_ref()),
        (SessionKind::FreePractice3, race.third_practice.as_ref()),
        (SessionKind::Qualifying, race.qualifying.as_ref()),
        (SessionKind::SprintQualifying, sprint_qualifying),
        (SessionKind::SprintRace, race.sprint.as_ref()),
    ];

    let mut sessions: Vec<SessionEvent> = SessionEvent::parse(
        &race_id,
        SessionKind::GrandPrix,
        race.date.as_deref(),
        race.time.as_deref(),
    )
    .into_iter()
    .collect();

    sessions.extend(parts.into_iter().filter_map(|(kind, time)| {
        let time = time?;
        SessionEvent::parse(&race_id, kind, time.date.as_deref(), time.time.as_deref())
    }));

    RaceWeekend {
        official_name: race.race_name.clone(),
        country_code: alpha3_for_country(&race.circuit.location.country).map(str::to_string),
        race_id,
        sessions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ergast::models::RacesResponse;

    #[test]
    fn maps_sprint_weekend() {
        let raw = r#"{"MRData":{"total":"1","RaceTable":{"season":"2025","Races":[{"season":"2025","round":"2","raceName":"Chinese Grand Prix",
            "Circuit":{"circuitId":"shanghai","circuitName":"Shanghai International Circuit","Location":{"locality":"Shanghai","country":"China"}},
            "date":"2025-03-23","time":"07:00:00Z","FirstPractice":{"date":"2025-03-21","time":"03:30:00Z"},
            "SprintQualifying":{"date":"2025-03-21","time":"07:30:00Z"},"Sprint":{"date":"2025-03-22","time":"03:00:00Z"},
            "Qualifying":{"date":"2025-03-22"}}]}}}"#;
        let response: RacesResponse = serde_json::from_str(raw).unwrap();
        let weekend = race_weekend(&response.items().unwrap()[0]);

        assert_eq!(weekend.race_id, "2025-02");
        assert_eq!(weekend.country_code.as_deref(), Some("CHN"));
        let kinds: Vec<_> = weekend.sessions.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SessionKind::GrandPrix,
                SessionKind::FreePractice1,
                SessionKind::SprintQualifying,
                SessionKind::SprintRace,
            ]
        );
        assert_eq!(weekend.sessions[0].event_id(), "2025-02-grandPrix");
    }
}
