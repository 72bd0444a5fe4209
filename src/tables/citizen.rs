// src/tables/citizen.rs

use chrono::{DateTime, Utc};

use super::{Position, parse_position, parse_timestamp};
use crate::store::Record;

/// A row of the citizens table
#[derive(Debug, Clone, PartialEq)]
pub struct Citizen {
    pub record_id: String,
    pub citizen_id: Option<String>,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub social_class: Option<String>,
    pub ducats: f64,
    /// Last meal; `None` when never recorded or unparsable
    pub ate_at: Option<DateTime<Utc>>,
    pub in_venice: bool,
    pub position: Option<Position>,
}

impl Citizen {
    /// Rows without a username cannot own problems and are skipped
    pub fn from_record(record: &Record) -> Option<Self> {
        let username = record.text("Username")?;
        Some(Self {
            record_id: record.id.clone(),
            citizen_id: record.text("CitizenId"),
            username,
            first_name: record.text("FirstName"),
            last_name: record.text("LastName"),
            social_class: record.text("SocialClass"),
            ducats: record.number("Ducats").unwrap_or(0.0),
            ate_at: parse_timestamp(record, "AteAt"),
            in_venice: record.flag("InVenice"),
            position: parse_position(record, "Position"),
        })
    }

    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.username.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::record;
    use serde_json::json;

    #[test]
    fn test_from_record() {
        let r = record(
            "recC1",
            json!({
                "CitizenId": "ctz_1",
                "Username": "marco",
                "FirstName": "Marco",
                "LastName": "Polo",
                "SocialClass": "Popolani",
                "Ducats": 120.5,
                "AteAt": "2025-06-01T08:00:00.000Z",
                "InVenice": true,
                "Position": "{\"lat\":45.44,\"lng\":12.32}"
            }),
        );
        let c = Citizen::from_record(&r).unwrap();
        assert_eq!(c.username, "marco");
        assert_eq!(c.display_name(), "Marco Polo");
        assert_eq!(c.social_class.as_deref(), Some("Popolani"));
        assert!(c.in_venice);
        assert!(c.ate_at.is_some());
        assert!(c.position.is_some());
    }

    #[test]
    fn test_missing_username_is_skipped() {
        let r = record("recC2", json!({ "FirstName": "Nobody" }));
        assert!(Citizen::from_record(&r).is_none());
    }

    #[test]
    fn test_defaults() {
        let c = Citizen::from_record(&record("recC3", json!({ "Username": "lucia" }))).unwrap();
        assert!(!c.in_venice);
        assert_eq!(c.ducats, 0.0);
        assert_eq!(c.display_name(), "lucia");
    }
}
