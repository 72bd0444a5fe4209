// src/store/airtable.rs
// Airtable REST API client

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use super::{Fields, MAX_BATCH_SIZE, Query, Record, RecordUpdate, TableStore};
use crate::error::{Result, SerenissimaError};
use crate::http::{DEFAULT_TIMEOUT, create_client};

/// Public Airtable REST root
pub const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";

/// Rows per list page (Airtable maximum)
const PAGE_SIZE: usize = 100;

/// Connection settings for one Airtable base
#[derive(Debug, Clone)]
pub struct AirtableConfig {
    pub api_key: String,
    pub base_id: String,
    pub api_url: String,
    pub timeout: Duration,
}

impl AirtableConfig {
    pub fn new(api_key: impl Into<String>, base_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_id: base_id.into(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

/// Table store backed by the Airtable REST API
pub struct AirtableStore {
    config: AirtableConfig,
    http_client: reqwest::Client,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<Record>,
    offset: Option<String>,
}

#[derive(Deserialize)]
struct RecordsResponse {
    #[serde(default)]
    records: Vec<Record>,
}

#[derive(Deserialize)]
struct DeletedRecord {
    id: String,
    #[serde(default)]
    deleted: bool,
}

#[derive(Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    records: Vec<DeletedRecord>,
}

impl AirtableStore {
    /// Create a store; fails when the credentials are blank.
    pub fn new(config: AirtableConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(SerenissimaError::Config("Airtable API key is empty".to_string()));
        }
        if config.base_id.trim().is_empty() {
            return Err(SerenissimaError::Config("Airtable base id is empty".to_string()));
        }

        let http_client = create_client(config.timeout);
        Ok(Self { config, http_client })
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.base_id,
            urlencoding::encode(table)
        )
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

/// Translate a [`Query`] into Airtable list parameters (without paging)
fn list_params(query: &Query) -> Vec<(String, String)> {
    let mut params = Vec::new();

    if let Some(ref filter) = query.filter {
        params.push(("filterByFormula".to_string(), filter.to_formula()));
    }
    for (i, sort) in query.sort.iter().enumerate() {
        params.push((format!("sort[{i}][field]"), sort.field.clone()));
        params.push((format!("sort[{i}][direction]"), sort.direction.as_str().to_string()));
    }
    for field in &query.fields {
        params.push(("fields[]".to_string(), field.clone()));
    }
    if let Some(max) = query.max_records {
        params.push(("maxRecords".to_string(), max.to_string()));
    }
    params.push(("pageSize".to_string(), PAGE_SIZE.to_string()));

    params
}

/// Decode a success body, or turn an error status into a store error
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    Err(SerenissimaError::store(status.as_u16(), error_message(&body)))
}

/// Airtable errors look like `{"error": {"type": .., "message": ..}}` or
/// `{"error": "NOT_FOUND"}`; fall back to the raw body.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    match &value["error"] {
        Value::String(kind) => kind.clone(),
        Value::Object(obj) => {
            let kind = obj.get("type").and_then(Value::as_str).unwrap_or("ERROR");
            match obj.get("message").and_then(Value::as_str) {
                Some(message) => format!("{kind}: {message}"),
                None => kind.to_string(),
            }
        }
        _ => body.to_string(),
    }
}

#[async_trait]
impl TableStore for AirtableStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Record>> {
        let url = self.table_url(table);
        let params = list_params(query);

        let mut records = Vec::new();
        let mut offset: Option<String> = None;
        loop {
            let mut page_params = params.clone();
            if let Some(ref o) = offset {
                page_params.push(("offset".to_string(), o.clone()));
            }

            let response = self
                .http_client
                .get(&url)
                .bearer_auth(&self.config.api_key)
                .query(&page_params)
                .send()
                .await?;
            let page: ListResponse = read_json(response).await?;
            records.extend(page.records);

            if let Some(max) = query.max_records {
                if records.len() >= max {
                    records.truncate(max);
                    break;
                }
            }
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        debug!("Selected {} records from {}", records.len(), table);
        Ok(records)
    }

    async fn create(&self, table: &str, rows: Vec<Fields>) -> Result<Vec<Record>> {
        Self::check_batch(rows.len())?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<Value> = rows.into_iter().map(|fields| json!({ "fields": fields })).collect();
        let body = json!({ "records": records, "typecast": true });

        let response = self
            .http_client
            .post(self.table_url(table))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;
        let created: RecordsResponse = read_json(response).await?;

        debug!("Created {} records in {}", created.records.len(), table);
        Ok(created.records)
    }

    async fn update(&self, table: &str, updates: Vec<RecordUpdate>) -> Result<Vec<Record>> {
        Self::check_batch(updates.len())?;
        if updates.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({ "records": updates, "typecast": true });
        let response = self
            .http_client
            .patch(self.table_url(table))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;
        let updated: RecordsResponse = read_json(response).await?;

        Ok(updated.records)
    }

    async fn destroy(&self, table: &str, ids: &[String]) -> Result<Vec<String>> {
        Self::check_batch(ids.len())?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let params: Vec<(&str, &str)> = ids.iter().map(|id| ("records[]", id.as_str())).collect();
        let response = self
            .http_client
            .delete(self.table_url(table))
            .bearer_auth(&self.config.api_key)
            .query(&params)
            .send()
            .await?;
        let deleted: DeleteResponse = read_json(response).await?;

        Ok(deleted
            .records
            .into_iter()
            .filter(|r| r.deleted)
            .map(|r| r.id)
            .collect())
    }
}
