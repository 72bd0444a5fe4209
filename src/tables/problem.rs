// src/tables/problem.rs
// Problem rows: the only table this service writes.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use super::{Position, parse_position, parse_timestamp};
use crate::store::{Fields, Record};

/// Store field names of the problems table
pub mod field {
    pub const PROBLEM_ID: &str = "ProblemId";
    pub const CITIZEN: &str = "Citizen";
    pub const ASSET_TYPE: &str = "AssetType";
    pub const ASSET: &str = "Asset";
    pub const SEVERITY: &str = "Severity";
    pub const STATUS: &str = "Status";
    pub const TITLE: &str = "Title";
    pub const TYPE: &str = "Type";
    pub const LOCATION: &str = "Location";
    pub const POSITION: &str = "Position";
    pub const DESCRIPTION: &str = "Description";
    pub const SOLUTIONS: &str = "Solutions";
    pub const NOTES: &str = "Notes";
    pub const CREATED_AT: &str = "CreatedAt";
    pub const UPDATED_AT: &str = "UpdatedAt";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemStatus {
    #[default]
    Active,
    Resolved,
}

impl ProblemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemStatus::Active => "active",
            ProblemStatus::Resolved => "resolved",
        }
    }
}

impl FromStr for ProblemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ProblemStatus::Active),
            "resolved" => Ok(ProblemStatus::Resolved),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

impl fmt::Display for ProblemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected issue attributed to one citizen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub problem_id: String,
    pub citizen: String,
    pub asset_type: String,
    pub asset: String,
    pub severity: Severity,
    pub status: ProblemStatus,
    pub title: String,
    #[serde(rename = "type")]
    pub problem_type: Option<String>,
    pub location: Option<String>,
    pub position: Option<Position>,
    pub description: Option<String>,
    pub solutions: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Store id, present on problems read back from the table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

impl Problem {
    /// Store fields for an insert. `UpdatedAt` is store-managed and never written.
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        let mut put = |name: &str, value: Option<&str>| {
            if let Some(v) = value {
                fields.insert(name.to_string(), Value::String(v.to_string()));
            }
        };

        put(field::PROBLEM_ID, Some(&self.problem_id));
        put(field::CITIZEN, Some(&self.citizen));
        put(field::ASSET_TYPE, Some(&self.asset_type));
        put(field::ASSET, Some(&self.asset));
        put(field::SEVERITY, Some(self.severity.as_str()));
        put(field::STATUS, Some(self.status.as_str()));
        put(field::TITLE, Some(&self.title));
        put(field::TYPE, self.problem_type.as_deref());
        put(field::LOCATION, self.location.as_deref());
        put(field::DESCRIPTION, self.description.as_deref());
        put(field::SOLUTIONS, self.solutions.as_deref());
        put(field::NOTES, self.notes.as_deref());

        let position = self
            .position
            .as_ref()
            .and_then(|p| serde_json::to_string(p).ok());
        put(field::POSITION, position.as_deref());

        let created_at = self
            .created_at
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true));
        put(field::CREATED_AT, created_at.as_deref());

        fields
    }

    /// Read a stored row. Malformed fields fall back per field; only a row
    /// without a problem id is rejected.
    pub fn from_record(record: &Record) -> Option<Self> {
        let Some(problem_id) = record.text(field::PROBLEM_ID) else {
            warn!("Record {}: problem row without {}", record.id, field::PROBLEM_ID);
            return None;
        };

        let severity = record
            .text(field::SEVERITY)
            .map(|s| {
                s.parse().unwrap_or_else(|e| {
                    warn!("Record {}: {}", record.id, e);
                    Severity::default()
                })
            })
            .unwrap_or_default();
        let status = record
            .text(field::STATUS)
            .map(|s| {
                s.parse().unwrap_or_else(|e| {
                    warn!("Record {}: {}", record.id, e);
                    ProblemStatus::default()
                })
            })
            .unwrap_or_default();

        Some(Self {
            problem_id,
            citizen: record.text(field::CITIZEN).unwrap_or_default(),
            asset_type: record.text(field::ASSET_TYPE).unwrap_or_default(),
            asset: record.text(field::ASSET).unwrap_or_default(),
            severity,
            status,
            title: record.text(field::TITLE).unwrap_or_default(),
            problem_type: record.text(field::TYPE),
            location: record.text(field::LOCATION),
            position: parse_position(record, field::POSITION),
            description: record.text(field::DESCRIPTION),
            solutions: record.text(field::SOLUTIONS),
            notes: record.text(field::NOTES),
            created_at: parse_timestamp(record, field::CREATED_AT),
            updated_at: parse_timestamp(record, field::UPDATED_AT),
            record_id: Some(record.id.clone()),
        })
    }
}
