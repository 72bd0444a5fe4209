// src/tables/mod.rs
// Typed rows for the tables the problem service reads and writes.
// Each table has exactly one conversion from a store record; external field
// names live only in these modules.

pub mod building;
pub mod citizen;
pub mod contract;
pub mod problem;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::store::Record;

pub use building::{Building, BuildingCategory};
pub use citizen::Citizen;
pub use contract::Contract;
pub use problem::{Problem, ProblemStatus, Severity};

/// Map coordinates of a citizen or building
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

/// Parse a `Position` field; stored either as JSON text or as an object.
/// Malformed values are logged and dropped.
pub(crate) fn parse_position(record: &Record, field: &str) -> Option<Position> {
    let value = record.fields.get(field)?;
    let parsed = match value {
        Value::Null => return None,
        Value::String(s) if s.trim().is_empty() => return None,
        Value::String(s) => serde_json::from_str::<Position>(s),
        other => serde_json::from_value::<Position>(other.clone()),
    };
    match parsed {
        Ok(position) => Some(position),
        Err(e) => {
            warn!("Record {}: unparsable {} {:?}: {}", record.id, field, value, e);
            None
        }
    }
}

/// Parse an RFC 3339 timestamp field; malformed values are logged and dropped
pub(crate) fn parse_timestamp(record: &Record, field: &str) -> Option<DateTime<Utc>> {
    let raw = record.text(field)?;
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            warn!("Record {}: unparsable {} '{}': {}", record.id, field, raw, e);
            None
        }
    }
}

#[cfg(test)]
pub(crate) fn record(id: &str, fields: Value) -> Record {
    Record {
        id: id.to_string(),
        fields: fields.as_object().cloned().unwrap_or_default(),
        created_time: None,
    }
}
