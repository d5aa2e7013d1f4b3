use crate::schema::reminder_types;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = reminder_types)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReminderType {
    pub id: String,
    pub session_id: String,
    pub name: String,
}

impl ReminderType {
    pub fn new(id: &str, session_id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            session_id: session_id.to_string(),
            name: name.to_string(),
        }
    }

    /// Rows seeded by the initial migration.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("1", "freePractice1", "Free Practice 1"),
            Self::new("2", "freePractice2", "Free Practice 2"),
            Self::new("3", "freePractice3", "Free Practice 3"),
            Self::new("4", "sprintQualifying", "Sprint Qualifying"),
            Self::new("5", "sprintRace", "Sprint Race"),
            Self::new("6", "qualifying", "Qualifying"),
            Self::new("7", "grandPrix", "Grand Prix"),
        ]
    }
}
