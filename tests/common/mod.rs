// tests/common/mod.rs
// Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tower::ServiceExt;

use serenissima::api::create_router;
use serenissima::problems::{ProblemService, ServiceSettings};
use serenissima::state::AppState;
use serenissima::store::{Fields, MemoryStore, Query, Record, RecordUpdate, TableStore};
use serenissima::{Result, SerenissimaError};

/// A small Venice: marco is hungry, housed and employed by lucia, and owns
/// an empty shop; lucia is fed, housed and runs the bakery.
pub const WORLD: &str = r#"{
  "CITIZENS": [
    { "fields": { "Username": "marco", "FirstName": "Marco", "LastName": "Polo",
                  "SocialClass": "Popolani", "InVenice": true, "AteAt": "2025-05-31T06:00:00Z" } },
    { "fields": { "Username": "lucia", "FirstName": "Lucia", "LastName": "Dandolo",
                  "SocialClass": "Cittadini", "InVenice": true, "AteAt": "2025-06-01T10:00:00Z" } }
  ],
  "BUILDINGS": [
    { "fields": { "BuildingId": "home_marco", "Category": "home", "Owner": "lucia",
                  "Occupant": "marco", "RentPrice": 40 } },
    { "fields": { "BuildingId": "home_lucia", "Category": "home", "Owner": "lucia",
                  "Occupant": "lucia" } },
    { "fields": { "BuildingId": "bakery", "Name": "Forno", "Category": "business", "Owner": "lucia",
                  "RunBy": "lucia", "Occupant": "marco", "Wages": 30, "RentPrice": 0 } },
    { "fields": { "BuildingId": "shop_marco", "Category": "business", "Owner": "marco",
                  "RunBy": "marco", "Wages": 20, "Position": "{\"lat\": 45.43, \"lng\": 12.33}" } },
    { "fields": { "BuildingId": "workshop_lucia", "Category": "business", "Owner": "lucia",
                  "RunBy": "lucia", "Occupant": "lucia", "Wages": 25 } }
  ],
  "CONTRACTS": [
    { "fields": { "ContractId": "c1", "SellerBuilding": "bakery", "Status": "active" } },
    { "fields": { "ContractId": "c2", "SellerBuilding": "shop_marco", "Status": "active" } },
    { "fields": { "ContractId": "c3", "BuyerBuilding": "workshop_lucia", "Status": "active" } }
  ],
  "PROBLEMS": []
}"#;

pub fn world() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::from_fixture_str(WORLD).unwrap())
}

pub fn app_over(store: Arc<dyn TableStore>) -> Router {
    let service = ProblemService::new(store, ServiceSettings::default())
        .with_clock(Arc::new(|| Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()));
    create_router(AppState::new(service))
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Active PROBLEMS rows as (ProblemId, Citizen, Title), sorted
pub async fn active_rows(store: &MemoryStore) -> Vec<(String, String, String)> {
    let mut rows: Vec<_> = store
        .rows("PROBLEMS")
        .await
        .iter()
        .filter(|r| r.text("Status").as_deref() == Some("active"))
        .map(|r| {
            (
                r.text("ProblemId").unwrap_or_default(),
                r.text("Citizen").unwrap_or_default(),
                r.text("Title").unwrap_or_default(),
            )
        })
        .collect();
    rows.sort();
    rows
}

/// Memory store with switchable outages
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_select: AtomicBool,
    /// Fail selects on the PROBLEMS table only
    pub fail_problems_select: AtomicBool,
    pub fail_destroy: AtomicBool,
    pub fail_create: AtomicBool,
}

impl FlakyStore {
    pub fn over(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    fn outage(flag: &AtomicBool) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(SerenissimaError::store(503, "service unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl TableStore for FlakyStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Record>> {
        Self::outage(&self.fail_select)?;
        if table == "PROBLEMS" {
            Self::outage(&self.fail_problems_select)?;
        }
        self.inner.select(table, query).await
    }

    async fn create(&self, table: &str, rows: Vec<Fields>) -> Result<Vec<Record>> {
        Self::outage(&self.fail_create)?;
        self.inner.create(table, rows).await
    }

    async fn update(&self, table: &str, updates: Vec<RecordUpdate>) -> Result<Vec<Record>> {
        self.inner.update(table, updates).await
    }

    async fn destroy(&self, table: &str, ids: &[String]) -> Result<Vec<String>> {
        Self::outage(&self.fail_destroy)?;
        self.inner.destroy(table, ids).await
    }
}
