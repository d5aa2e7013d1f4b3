//! Typed Ergast response envelopes.
//!
//! Every endpoint answers with `{"MRData": {..paging.., "<Name>Table": {..}}}`.
//! The paging fields live on [`MrData`]; each endpoint contributes a
//! [`TableBody`] that knows where its item array is.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErgastResponse<T> {
    #[serde(rename = "MRData")]
    pub mr_data: MrData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MrData<T> {
    #[serde(default)]
    pub xmlns: String,
    #[serde(default)]
    pub series: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub limit: String,
    #[serde(default)]
    pub offset: String,
    #[serde(default)]
    pub total: String,
    #[serde(flatten)]
    pub body: T,
}

impl<T: TableBody> ErgastResponse<T> {
    /// Item count the upstream reports for the whole collection.
    pub fn total(&self) -> usize {
        self.mr_data.total.trim().parse().unwrap_or(0)
    }

    pub fn items(&self) -> Option<&Vec<T::Item>> {
        self.mr_data.body.items()
    }

    pub fn items_mut(&mut self) -> Option<&mut Vec<T::Item>> {
        self.mr_data.body.items_mut()
    }
}

/// The endpoint-specific part of an envelope.
pub trait TableBody: Serialize + DeserializeOwned + Send + Sync + 'static {
    type Item: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// `None` when the response carried no table at all.
    fn items(&self) -> Option<&Vec<Self::Item>>;
    fn items_mut(&mut self) -> Option<&mut Vec<Self::Item>>;
}

macro_rules! table_body {
    ($body:ident, $table_key:literal, $table:ident, $field:ident, $item:ty) => {
        #[derive(Debug, Clone, Default, Serialize, Deserialize)]
        pub struct $body {
            #[serde(rename = $table_key, default, skip_serializing_if = "Option::is_none")]
            pub table: Option<$table>,
        }

        impl TableBody for $body {
            type Item = $item;

            fn items(&self) -> Option<&Vec<$item>> {
                self.table.as_ref().map(|t| &t.$field)
            }

            fn items_mut(&mut self) -> Option<&mut Vec<$item>> {
                self.table.as_mut().map(|t| &mut t.$field)
            }
        }
    };
}

table_body!(DriverTableBody, "DriverTable", DriverTable, drivers, Driver);
table_body!(RaceTableBody, "RaceTable", RaceTable, races, Race);
table_body!(StandingsTableBody, "StandingsTable", StandingsTable, standings_lists, StandingsList);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriverTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(rename = "Drivers", default)]
    pub drivers: Vec<Driver>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub driver_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub url: String,
    pub given_name: String,
    pub family_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub nationality: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RaceTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(rename = "Races", default)]
    pub races: Vec<Race>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    pub season: String,
    pub round: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub race_name: String,
    #[serde(rename = "Circuit")]
    pub circuit: Circuit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(rename = "FirstPractice", default, skip_serializing_if = "Option::is_none")]
    pub first_practice: Option<SessionTime>,
    #[serde(rename = "SecondPractice", default, skip_serializing_if = "Option::is_none")]
    pub second_practice: Option<SessionTime>,
    #[serde(rename = "ThirdPractice", default, skip_serializing_if = "Option::is_none")]
    pub third_practice: Option<SessionTime>,
    #[serde(rename = "Qualifying", default, skip_serializing_if = "Option::is_none")]
    pub qualifying: Option<SessionTime>,
    #[serde(rename = "Sprint", default, skip_serializing_if = "Option::is_none")]
    pub sprint: Option<SessionTime>,
    #[serde(rename = "SprintQualifying", default, skip_serializing_if = "Option::is_none")]
    pub sprint_qualifying: Option<SessionTime>,
    #[serde(rename = "SprintShootout", default, skip_serializing_if = "Option::is_none")]
    pub sprint_shootout: Option<SessionTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Circuit {
    pub circuit_id: String,
    #[serde(default)]
    pub url: String,
    pub circuit_name: String,
    #[serde(rename = "Location")]
    pub location: Location,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub lat: String,
    #[serde(default)]
    pub long: String,
    #[serde(default)]
    pub locality: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constructor {
    pub constructor_id: String,
    #[serde(default)]
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub nationality: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandingsTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
    #[serde(rename = "StandingsLists", default)]
    pub standings_lists: Vec<StandingsList>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingsList {
    pub season: String,
    pub round: String,
    #[serde(rename = "DriverStandings", default, skip_serializing_if = "Option::is_none")]
    pub driver_standings: Option<Vec<DriverStanding>>,
    #[serde(rename = "ConstructorStandings", default, skip_serializing_if = "Option::is_none")]
    pub constructor_standings: Option<Vec<ConstructorStanding>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverStanding {
    #[serde(default)]
    pub position: Option<String>,
    pub position_text: String,
    pub points: String,
    pub wins: String,
    #[serde(rename = "Driver")]
    pub driver: Driver,
    #[serde(rename = "Constructors", default)]
    pub constructors: Vec<Constructor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorStanding {
    #[serde(default)]
    pub position: Option<String>,
    pub position_text: String,
    pub points: String,
    pub wins: String,
    #[serde(rename = "Constructor")]
    pub constructor: Constructor,
}

pub type DriversResponse = ErgastResponse<DriverTableBody>;
pub type RacesResponse = ErgastResponse<RaceTableBody>;
pub type StandingsResponse = ErgastResponse<StandingsTableBody>;
