// src/problems/service.rs
// Detect-then-reconcile orchestration plus read access to stored problems

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::{
    DetectionSettings, Detector, ProblemKind, ProblemReconciler, ProblemSet, Snapshot, Sources,
    detector_for,
};
use crate::error::Result;
use crate::store::{Fields, Filter, MAX_BATCH_SIZE, Query, Record, RecordUpdate, SortDirection, TableStore};
use crate::tables::problem::field;
use crate::tables::{Building, Citizen, Contract, Problem, ProblemStatus};

/// Source of "now" for snapshots
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Table names and tuning for the service
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub problems_table: String,
    pub citizens_table: String,
    pub buildings_table: String,
    pub contracts_table: String,
    pub batch_size: usize,
    /// Partitions reconciled at the same time
    pub max_concurrency: usize,
    pub detection: DetectionSettings,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            problems_table: "PROBLEMS".to_string(),
            citizens_table: "CITIZENS".to_string(),
            buildings_table: "BUILDINGS".to_string(),
            contracts_table: "CONTRACTS".to_string(),
            batch_size: MAX_BATCH_SIZE,
            max_concurrency: 4,
            detection: DetectionSettings::default(),
        }
    }
}

/// Summary returned by a detection run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub success: bool,
    pub processed_user: String,
    pub problem_type: String,
    pub problem_count: usize,
    pub problems: ProblemSet,
    pub saved: bool,
    pub saved_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_error: Option<String>,
}

/// Filters for listing stored problems
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemQuery {
    pub citizen: Option<String>,
    pub asset_type: Option<String>,
    pub status: Option<ProblemStatus>,
    pub title: Option<String>,
}

impl ProblemQuery {
    fn to_filter(&self) -> Option<Filter> {
        let mut parts = Vec::new();
        if let Some(ref citizen) = self.citizen {
            parts.push(Filter::eq(field::CITIZEN, citizen));
        }
        if let Some(ref asset_type) = self.asset_type {
            parts.push(Filter::eq(field::ASSET_TYPE, asset_type));
        }
        if let Some(status) = self.status {
            parts.push(Filter::eq(field::STATUS, status.as_str()));
        }
        if let Some(ref title) = self.title {
            parts.push(Filter::eq(field::TITLE, title));
        }
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Filter::And(parts)),
        }
    }
}

/// Outcome of persisting one detection
struct Persisted {
    saved_count: usize,
    error: Option<String>,
}

/// Partition key: (citizen, title)
type Partition = (String, String);

pub struct ProblemService {
    store: Arc<dyn TableStore>,
    settings: ServiceSettings,
    reconciler: ProblemReconciler,
    clock: Clock,
}

impl ProblemService {
    pub fn new(store: Arc<dyn TableStore>, settings: ServiceSettings) -> Self {
        let reconciler =
            ProblemReconciler::new(store.clone(), settings.problems_table.clone(), settings.batch_size);
        Self {
            store,
            settings,
            reconciler,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock, e.g. to make repeated runs comparable
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Fetch the tables named by `sources` concurrently
    pub async fn load_snapshot(&self, sources: Sources) -> Result<Snapshot> {
        let now = (self.clock)();
        let s = &self.settings;

        let (citizens, buildings, contracts) = tokio::try_join!(
            self.load_table(sources.citizens, &s.citizens_table, Citizen::from_record),
            self.load_table(sources.buildings, &s.buildings_table, |r| Some(Building::from_record(r))),
            self.load_table(sources.contracts, &s.contracts_table, |r| Some(Contract::from_record(r))),
        )?;
        debug!(
            "Loaded snapshot: {} citizens, {} buildings, {} contracts",
            citizens.len(),
            buildings.len(),
            contracts.len()
        );
        Ok(Snapshot::new(now, citizens, buildings, contracts))
    }

    async fn load_table<T>(
        &self,
        wanted: bool,
        table: &str,
        parse: impl Fn(&Record) -> Option<T>,
    ) -> Result<Vec<T>> {
        if !wanted {
            return Ok(Vec::new());
        }
        let rows = self.store.select(table, &Query::all()).await?;
        Ok(rows.iter().filter_map(parse).collect())
    }

    /// Run one detector without persisting
    pub async fn detect(&self, kind: ProblemKind, scope: Option<&str>) -> Result<ProblemSet> {
        let detector = detector_for(kind, &self.settings.detection);
        let snapshot = self.load_snapshot(detector.sources()).await?;
        Ok(detector.detect(&snapshot, scope))
    }

    /// Detect one category and, when `persist` is set, reconcile the result.
    /// Detection failures are errors; persistence failures are reported.
    pub async fn run(&self, kind: ProblemKind, scope: Option<&str>, persist: bool) -> Result<DetectionReport> {
        self.run_detectors(kind.slug(), vec![detector_for(kind, &self.settings.detection)], scope, persist)
            .await
    }

    /// Every detector against one snapshot
    pub async fn run_all(&self, scope: Option<&str>, persist: bool) -> Result<DetectionReport> {
        let detectors = ProblemKind::ALL
            .into_iter()
            .map(|kind| detector_for(kind, &self.settings.detection))
            .collect();
        self.run_detectors("all", detectors, scope, persist).await
    }

    async fn run_detectors(
        &self,
        label: &str,
        detectors: Vec<Box<dyn Detector>>,
        scope: Option<&str>,
        persist: bool,
    ) -> Result<DetectionReport> {
        let sources = detectors
            .iter()
            .fold(Sources::default(), |acc, d| acc.union(d.sources()));
        let snapshot = self.load_snapshot(sources).await?;

        let mut problems = ProblemSet::new();
        for detector in &detectors {
            let found = detector.detect(&snapshot, scope);
            debug!("{} detector found {} problems", detector.kind(), found.len());
            problems.extend(found);
        }
        let titles: Vec<&'static str> = detectors.iter().flat_map(|d| d.titles().iter().copied()).collect();

        let persisted = if persist {
            self.persist(&titles, scope, &problems).await
        } else {
            Persisted {
                saved_count: 0,
                error: None,
            }
        };

        info!(
            "Detected {} {} problems for {}; saved {}",
            problems.len(),
            label,
            scope.unwrap_or("all citizens"),
            persisted.saved_count
        );

        Ok(DetectionReport {
            success: true,
            processed_user: scope.unwrap_or("all").to_string(),
            problem_type: label.to_string(),
            problem_count: problems.len(),
            problems,
            saved: persist && persisted.error.is_none(),
            saved_count: persisted.saved_count,
            save_error: persisted.error,
        })
    }

    async fn persist(&self, titles: &[&str], scope: Option<&str>, problems: &ProblemSet) -> Persisted {
        let partitions = self.plan_partitions(titles, scope, problems).await;
        debug!(
            "Reconciling {} partitions in batches of {}",
            partitions.len(),
            self.reconciler.batch_size()
        );

        let results: Vec<(Partition, Result<usize>)> = stream::iter(partitions)
            .map(|(partition, set)| async move {
                let result = self.reconciler.reconcile(&partition.0, &set, &partition.1).await;
                (partition, result)
            })
            .buffer_unordered(self.settings.max_concurrency.max(1))
            .collect()
            .await;

        let mut saved_count = 0;
        let mut failures = Vec::new();
        for ((citizen, title), result) in results {
            match result {
                Ok(inserted) => saved_count += inserted,
                Err(e) => {
                    error!("Failed to save '{}' problems for {}: {}", title, citizen, e);
                    failures.push(format!("{citizen}/{title}: {e}"));
                }
            }
        }
        failures.sort();

        Persisted {
            saved_count,
            error: (!failures.is_empty()).then(|| failures.join("; ")),
        }
    }

    /// Group detected problems by (citizen, title) and add empty partitions
    /// for everything that must be cleared: the scoped user's titles, or
    /// every partition currently holding active problems with these titles.
    /// The stale lookup belongs to the purge step, so a failed lookup only
    /// skips the clearing and the detected partitions are still written.
    async fn plan_partitions(
        &self,
        titles: &[&str],
        scope: Option<&str>,
        problems: &ProblemSet,
    ) -> BTreeMap<Partition, ProblemSet> {
        let mut partitions: BTreeMap<Partition, ProblemSet> = BTreeMap::new();
        for (id, problem) in problems {
            partitions
                .entry((problem.citizen.clone(), problem.title.clone()))
                .or_default()
                .insert(id.clone(), problem.clone());
        }

        match scope {
            Some(username) => {
                for title in titles {
                    partitions
                        .entry((username.to_string(), title.to_string()))
                        .or_default();
                }
            }
            None => {
                let query = Query {
                    fields: vec![field::CITIZEN.to_string(), field::TITLE.to_string()],
                    ..Query::filtered(Filter::and([
                        Filter::eq(field::STATUS, ProblemStatus::Active.as_str()),
                        Filter::or(titles.iter().map(|t| Filter::eq(field::TITLE, *t))),
                    ]))
                };
                match self.store.select(&self.settings.problems_table, &query).await {
                    Ok(records) => {
                        for record in records {
                            if let (Some(citizen), Some(title)) =
                                (record.text(field::CITIZEN), record.text(field::TITLE))
                            {
                                partitions.entry((citizen, title)).or_default();
                            }
                        }
                    }
                    Err(e) => warn!(
                        "Failed to look up stale problem partitions, saving detected ones only: {}",
                        e
                    ),
                }
            }
        }

        partitions
    }

    /// Stored problems matching the query, newest first
    pub async fn list(&self, query: &ProblemQuery) -> Result<Vec<Problem>> {
        let select = Query {
            filter: query.to_filter(),
            ..Query::all()
        }
        .sort_by(field::CREATED_AT, SortDirection::Desc);
        let rows = self.store.select(&self.settings.problems_table, &select).await?;
        Ok(rows.iter().filter_map(Problem::from_record).collect())
    }

    /// The active row for an id, else its newest resolved row
    pub async fn get(&self, problem_id: &str) -> Result<Option<Problem>> {
        let select = Query::filtered(Filter::eq(field::PROBLEM_ID, problem_id))
            .sort_by(field::CREATED_AT, SortDirection::Desc);
        let rows = self.store.select(&self.settings.problems_table, &select).await?;
        let mut problems: Vec<Problem> = rows.iter().filter_map(Problem::from_record).collect();
        let pick = problems
            .iter()
            .position(|p| p.status == ProblemStatus::Active)
            .unwrap_or(0);
        Ok((!problems.is_empty()).then(|| problems.swap_remove(pick)))
    }

    /// Mark every active row of a stored problem resolved; detectors never
    /// touch it again. Resolving an already resolved problem returns it as is.
    pub async fn resolve(&self, problem_id: &str) -> Result<Option<Problem>> {
        let select = Query::filtered(Filter::and([
            Filter::eq(field::PROBLEM_ID, problem_id),
            Filter::eq(field::STATUS, ProblemStatus::Active.as_str()),
        ]));
        let active = self.store.select(&self.settings.problems_table, &select).await?;
        if active.is_empty() {
            return self.get(problem_id).await;
        }

        let mut fields = Fields::new();
        fields.insert(
            field::STATUS.to_string(),
            serde_json::Value::String(ProblemStatus::Resolved.as_str().to_string()),
        );
        let updates: Vec<RecordUpdate> = active
            .into_iter()
            .map(|record| RecordUpdate {
                id: record.id,
                fields: fields.clone(),
            })
            .collect();

        let mut resolved = Vec::with_capacity(updates.len());
        for chunk in updates.chunks(MAX_BATCH_SIZE) {
            resolved.extend(
                self.store
                    .update(&self.settings.problems_table, chunk.to_vec())
                    .await?,
            );
        }

        info!("Resolved {} rows of problem {}", resolved.len(), problem_id);
        Ok(resolved.first().and_then(Problem::from_record))
    }
}
