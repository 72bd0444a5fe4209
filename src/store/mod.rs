// src/store/mod.rs

//! Remote table store abstraction.
//! Everything that reads or writes rows goes through [`TableStore`]; business
//! logic never talks HTTP directly.

pub mod airtable;
pub mod formula;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

pub use airtable::{AirtableConfig, AirtableStore};
pub use formula::{Filter, Literal};
pub use memory::MemoryStore;

/// Max records per create/update/destroy call accepted by the store
pub const MAX_BATCH_SIZE: usize = 10;

/// Field map of a single row, keyed by the store's field names
pub type Fields = Map<String, Value>;

/// A stored row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(rename = "createdTime", default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
}

impl Record {
    /// String value of a field, `None` when missing, null or empty
    pub fn text(&self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            // linked-record fields come back as arrays of ids
            Value::Array(items) => items.first().and_then(|v| v.as_str()).map(str::to_string),
            _ => None,
        }
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        match self.fields.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Checkbox value; a missing checkbox is unchecked
    pub fn flag(&self, field: &str) -> bool {
        match self.fields.get(field) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

/// An update for an existing row; only the given fields change
#[derive(Debug, Clone, Serialize)]
pub struct RecordUpdate {
    pub id: String,
    pub fields: Fields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Parameters of a select
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filter: Option<Filter>,
    pub sort: Vec<Sort>,
    /// Restrict the returned fields; empty means all fields
    pub fields: Vec<String>,
    pub max_records: Option<usize>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filtered(filter: Filter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(Sort {
            field: field.into(),
            direction,
        });
        self
    }
}

/// Trait for any table backend (Airtable, in-memory, ...).
///
/// Mutating calls accept at most [`MAX_BATCH_SIZE`] records; callers chunk.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Select every row of `table` matching the query, following pagination.
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Record>>;

    /// Insert rows, returning them with their assigned ids.
    async fn create(&self, table: &str, rows: Vec<Fields>) -> Result<Vec<Record>>;

    /// Patch rows by id, returning the updated rows.
    async fn update(&self, table: &str, updates: Vec<RecordUpdate>) -> Result<Vec<Record>>;

    /// Delete rows by id, returning the deleted ids.
    async fn destroy(&self, table: &str, ids: &[String]) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(fields: Value) -> Record {
        Record {
            id: "rec1".to_string(),
            fields: fields.as_object().cloned().unwrap(),
            created_time: None,
        }
    }

    #[test]
    fn test_text_accessor() {
        let r = record(json!({ "Name": "Ca' d'Oro", "Empty": "", "Wages": 12, "Link": ["recX"] }));
        assert_eq!(r.text("Name").as_deref(), Some("Ca' d'Oro"));
        assert_eq!(r.text("Empty"), None);
        assert_eq!(r.text("Missing"), None);
        assert_eq!(r.text("Wages").as_deref(), Some("12"));
        assert_eq!(r.text("Link").as_deref(), Some("recX"));
    }

    #[test]
    fn test_number_and_flag_accessors() {
        let r = record(json!({ "Wages": 12.5, "Rent": "30", "InVenice": true, "Bad": "x" }));
        assert_eq!(r.number("Wages"), Some(12.5));
        assert_eq!(r.number("Rent"), Some(30.0));
        assert_eq!(r.number("Bad"), None);
        assert!(r.flag("InVenice"));
        assert!(!r.flag("Missing"));
    }

    #[test]
    fn test_query_builder() {
        let q = Query {
            max_records: Some(5),
            ..Query::filtered(Filter::eq("Status", "active"))
        }
        .sort_by("CreatedAt", SortDirection::Desc);
        assert!(q.filter.is_some());
        assert_eq!(q.sort[0].direction.as_str(), "desc");
        assert_eq!(q.max_records, Some(5));
    }
}
