// src/store/memory.rs
// In-process table store with the same contract as the remote one.
// Seeded from a JSON fixture for local runs; also the backend for tests.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tokio::sync::RwLock;

use super::{Fields, MAX_BATCH_SIZE, Query, Record, RecordUpdate, SortDirection, TableStore};
use crate::error::{Result, SerenissimaError};

/// One fixture row: `{ "id"?: "...", "fields": { ... } }`
#[derive(Debug, Deserialize)]
struct FixtureRow {
    id: Option<String>,
    #[serde(default)]
    fields: Fields,
}

/// Table store kept in memory
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Record>>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture of the form `{ "<table>": [ { "id"?, "fields" } ] }`
    pub fn from_fixture(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_fixture_str(&raw)
    }

    pub fn from_fixture_str(raw: &str) -> Result<Self> {
        let fixture: HashMap<String, Vec<FixtureRow>> = serde_json::from_str(raw)?;
        let mut store = Self::new();
        let mut tables = HashMap::new();
        for (table, rows) in fixture {
            let records: Vec<Record> = rows
                .into_iter()
                .map(|row| Record {
                    id: row.id.unwrap_or_else(|| store.allocate_id()),
                    fields: row.fields,
                    created_time: Some(now_string()),
                })
                .collect();
            tables.insert(table, records);
        }
        *store.tables.get_mut() = tables;
        Ok(store)
    }

    /// Insert rows without the batch limit; for seeding
    pub async fn seed(&self, table: &str, rows: Vec<Fields>) -> Vec<Record> {
        let records: Vec<Record> = rows
            .into_iter()
            .map(|fields| Record {
                id: self.allocate_id(),
                fields,
                created_time: Some(now_string()),
            })
            .collect();
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .extend(records.clone());
        records
    }

    /// Every row of a table in insertion order
    pub async fn rows(&self, table: &str) -> Vec<Record> {
        self.tables.read().await.get(table).cloned().unwrap_or_default()
    }

    fn allocate_id(&self) -> String {
        let n = self.next_id.fetch_add(1, AtomicOrdering::Relaxed) + 1;
        format!("rec{n:014}")
    }

    fn check_batch(size: usize) -> Result<()> {
        if size > MAX_BATCH_SIZE {
            return Err(SerenissimaError::BatchTooLarge {
                size,
                limit: MAX_BATCH_SIZE,
            });
        }
        Ok(())
    }
}

fn now_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => value_text(x).cmp(&value_text(y)),
    }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Record>> {
        let tables = self.tables.read().await;
        let mut records: Vec<Record> = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| query.filter.as_ref().is_none_or(|f| f.matches(&r.fields)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(tables);

        if !query.sort.is_empty() {
            records.sort_by(|a, b| {
                for sort in &query.sort {
                    let ord = compare_values(a.fields.get(&sort.field), b.fields.get(&sort.field));
                    let ord = match sort.direction {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        if !query.fields.is_empty() {
            for record in &mut records {
                record.fields.retain(|k, _| query.fields.contains(k));
            }
        }

        if let Some(max) = query.max_records {
            records.truncate(max);
        }

        Ok(records)
    }

    async fn create(&self, table: &str, rows: Vec<Fields>) -> Result<Vec<Record>> {
        Self::check_batch(rows.len())?;
        Ok(self.seed(table, rows).await)
    }

    async fn update(&self, table: &str, updates: Vec<RecordUpdate>) -> Result<Vec<Record>> {
        Self::check_batch(updates.len())?;

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        let mut updated = Vec::with_capacity(updates.len());
        for update in updates {
            let row = rows
                .iter_mut()
                .find(|r| r.id == update.id)
                .ok_or_else(|| SerenissimaError::store(404, format!("record {} not found", update.id)))?;
            row.fields.extend(update.fields);
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn destroy(&self, table: &str, ids: &[String]) -> Result<Vec<String>> {
        Self::check_batch(ids.len())?;

        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };
        let mut deleted = Vec::new();
        rows.retain(|r| {
            if ids.contains(&r.id) {
                deleted.push(r.id.clone());
                false
            } else {
                true
            }
        });
        Ok(deleted)
    }
}
