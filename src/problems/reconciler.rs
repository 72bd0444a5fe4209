// src/problems/reconciler.rs
// Replace the active problems of one (citizen, title) partition.
//
// Purge then insert, never update in place. A failed purge is logged and
// insertion still runs, so an outage can leave old and new rows side by side.
// A failed insert is returned to the caller.

use std::sync::Arc;
use tracing::{debug, error, warn};

use super::ProblemSet;
use crate::error::{Result, SerenissimaError};
use crate::store::{Fields, Filter, MAX_BATCH_SIZE, Query, TableStore};
use crate::tables::problem::field;
use crate::tables::{Problem, ProblemStatus};

pub struct ProblemReconciler {
    store: Arc<dyn TableStore>,
    table: String,
    batch_size: usize,
}

impl ProblemReconciler {
    /// `batch_size` is clamped to what the store accepts per call
    pub fn new(store: Arc<dyn TableStore>, table: impl Into<String>, batch_size: usize) -> Self {
        Self {
            store,
            table: table.into(),
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Make the stored active problems for (`citizen`, `title`) equal `problems`.
    /// Returns the number of records inserted.
    pub async fn reconcile(&self, citizen: &str, problems: &ProblemSet, title: &str) -> Result<usize> {
        if let Some(stray) = problems
            .values()
            .find(|p| p.citizen != citizen || p.title != title)
        {
            return Err(SerenissimaError::InvalidInput(format!(
                "problem {} belongs to ({}, {}), not ({}, {})",
                stray.problem_id, stray.citizen, stray.title, citizen, title
            )));
        }

        match self.purge(citizen, title).await {
            Ok(removed) => debug!("Purged {} active '{}' problems for {}", removed, title, citizen),
            Err(e) => warn!(
                "Failed to purge active '{}' problems for {}, inserting anyway: {}",
                title, citizen, e
            ),
        }

        if problems.is_empty() {
            return Ok(0);
        }
        self.insert(problems).await
    }

    async fn purge(&self, citizen: &str, title: &str) -> Result<usize> {
        let query = Query {
            fields: vec![field::PROBLEM_ID.to_string()],
            ..Query::filtered(Filter::and([
                Filter::eq(field::CITIZEN, citizen),
                Filter::eq(field::TITLE, title),
                Filter::eq(field::STATUS, ProblemStatus::Active.as_str()),
            ]))
        };
        let existing = self.store.select(&self.table, &query).await?;
        let ids: Vec<String> = existing.into_iter().map(|r| r.id).collect();

        let mut removed = 0;
        for chunk in ids.chunks(self.batch_size) {
            removed += self.store.destroy(&self.table, chunk).await?.len();
        }
        Ok(removed)
    }

    async fn insert(&self, problems: &ProblemSet) -> Result<usize> {
        let rows: Vec<Fields> = problems.values().map(Problem::to_fields).collect();

        let mut inserted = 0;
        for chunk in rows.chunks(self.batch_size) {
            match self.store.create(&self.table, chunk.to_vec()).await {
                Ok(created) => inserted += created.len(),
                Err(e) => {
                    let first = serde_json::to_string(&chunk[0]).unwrap_or_default();
                    error!(
                        "Failed to create problem batch of {} in {} (first record: {}): {}",
                        chunk.len(),
                        self.table,
                        first,
                        e
                    );
                    return Err(e);
                }
            }
        }

        debug!("Inserted {} problems into {}", inserted, self.table);
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Record, RecordUpdate};
    use crate::tables::Severity;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TABLE: &str = "PROBLEMS";

    /// Memory store that counts mutating calls and can be told to fail
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        creates: AtomicUsize,
        destroys: AtomicUsize,
        fail_select: bool,
        fail_create: bool,
    }

    #[async_trait]
    impl TableStore for CountingStore {
        async fn select(&self, table: &str, query: &Query) -> Result<Vec<Record>> {
            if self.fail_select {
                return Err(SerenissimaError::store(503, "store outage"));
            }
            self.inner.select(table, query).await
        }

        async fn create(&self, table: &str, rows: Vec<Fields>) -> Result<Vec<Record>> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            if self.fail_create {
                return Err(SerenissimaError::store(422, "INVALID_VALUE_FOR_COLUMN"));
            }
            self.inner.create(table, rows).await
        }

        async fn update(&self, table: &str, updates: Vec<RecordUpdate>) -> Result<Vec<Record>> {
            self.inner.update(table, updates).await
        }

        async fn destroy(&self, table: &str, ids: &[String]) -> Result<Vec<String>> {
            self.destroys.fetch_add(1, Ordering::SeqCst);
            self.inner.destroy(table, ids).await
        }
    }

    fn problem(citizen: &str, title: &str, n: usize) -> Problem {
        Problem {
            problem_id: format!("{title}_{citizen}_{n}"),
            citizen: citizen.to_string(),
            asset_type: "citizen".to_string(),
            asset: citizen.to_string(),
            severity: Severity::Low,
            status: ProblemStatus::Active,
            title: title.to_string(),
            problem_type: None,
            location: None,
            position: None,
            description: None,
            solutions: None,
            notes: None,
            created_at: None,
            updated_at: None,
            record_id: None,
        }
    }

    fn set(citizen: &str, title: &str, n: usize) -> ProblemSet {
        (0..n)
            .map(|i| problem(citizen, title, i))
            .map(|p| (p.problem_id.clone(), p))
            .collect()
    }

    async fn active(store: &CountingStore, citizen: &str, title: &str) -> Vec<Record> {
        store
            .inner
            .select(
                TABLE,
                &Query::filtered(Filter::and([
                    Filter::eq(field::CITIZEN, citizen),
                    Filter::eq(field::TITLE, title),
                    Filter::eq(field::STATUS, "active"),
                ])),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_batch_boundaries() {
        for n in [0usize, 1, 10, 11, 25] {
            let store = Arc::new(CountingStore::default());
            let reconciler = ProblemReconciler::new(store.clone(), TABLE, 10);

            // first run fills the partition
            let inserted = reconciler.reconcile("marco", &set("marco", "Hungry Citizen", n), "Hungry Citizen").await.unwrap();
            assert_eq!(inserted, n);
            assert_eq!(store.creates.load(Ordering::SeqCst), n.div_ceil(10), "creates for n={n}");
            assert_eq!(store.destroys.load(Ordering::SeqCst), 0);

            // second run purges all n and inserts n again
            store.creates.store(0, Ordering::SeqCst);
            reconciler.reconcile("marco", &set("marco", "Hungry Citizen", n), "Hungry Citizen").await.unwrap();
            assert_eq!(store.destroys.load(Ordering::SeqCst), n.div_ceil(10), "destroys for n={n}");
            assert_eq!(store.creates.load(Ordering::SeqCst), n.div_ceil(10));

            let rows = active(&store, "marco", "Hungry Citizen").await;
            assert_eq!(rows.len(), n);
            let mut ids: Vec<_> = rows.iter().map(|r| r.text("ProblemId").unwrap()).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), n);
        }
    }

    #[tokio::test]
    async fn test_empty_set_clears_partition() {
        let store = Arc::new(CountingStore::default());
        let reconciler = ProblemReconciler::new(store.clone(), TABLE, 10);
        reconciler.reconcile("marco", &set("marco", "Workless Citizen", 3), "Workless Citizen").await.unwrap();

        let inserted = reconciler.reconcile("marco", &ProblemSet::new(), "Workless Citizen").await.unwrap();
        assert_eq!(inserted, 0);
        assert!(active(&store, "marco", "Workless Citizen").await.is_empty());
    }

    #[tokio::test]
    async fn test_partitions_are_isolated() {
        let store = Arc::new(CountingStore::default());
        let reconciler = ProblemReconciler::new(store.clone(), TABLE, 10);
        reconciler.reconcile("marco", &set("marco", "Hungry Citizen", 2), "Hungry Citizen").await.unwrap();
        reconciler.reconcile("marco", &set("marco", "Workless Citizen", 1), "Workless Citizen").await.unwrap();
        reconciler.reconcile("lucia", &set("lucia", "Hungry Citizen", 1), "Hungry Citizen").await.unwrap();

        reconciler.reconcile("marco", &ProblemSet::new(), "Hungry Citizen").await.unwrap();

        assert!(active(&store, "marco", "Hungry Citizen").await.is_empty());
        assert_eq!(active(&store, "marco", "Workless Citizen").await.len(), 1);
        assert_eq!(active(&store, "lucia", "Hungry Citizen").await.len(), 1);
    }

    #[tokio::test]
    async fn test_resolved_problems_survive() {
        let store = Arc::new(CountingStore::default());
        store
            .inner
            .seed(
                TABLE,
                vec![json!({ "ProblemId": "old", "Citizen": "marco", "Title": "Hungry Citizen", "Status": "resolved" })
                    .as_object()
                    .cloned()
                    .unwrap()],
            )
            .await;
        let reconciler = ProblemReconciler::new(store.clone(), TABLE, 10);
        reconciler.reconcile("marco", &set("marco", "Hungry Citizen", 1), "Hungry Citizen").await.unwrap();
        assert_eq!(store.inner.rows(TABLE).await.len(), 2);
    }

    #[tokio::test]
    async fn test_purge_failure_still_inserts() {
        let store = Arc::new(CountingStore::default());
        let reconciler = ProblemReconciler::new(store.clone(), TABLE, 10);
        reconciler.reconcile("marco", &set("marco", "Hungry Citizen", 1), "Hungry Citizen").await.unwrap();

        let outage = Arc::new(CountingStore {
            fail_select: true,
            ..CountingStore::default()
        });
        // carry the existing row over to the failing store
        outage.inner.seed(TABLE, store.inner.rows(TABLE).await.into_iter().map(|r| r.fields).collect()).await;
        let reconciler = ProblemReconciler::new(outage.clone(), TABLE, 10);

        let inserted = reconciler.reconcile("marco", &set("marco", "Hungry Citizen", 1), "Hungry Citizen").await.unwrap();
        assert_eq!(inserted, 1);
        // old and new coexist
        assert_eq!(outage.inner.rows(TABLE).await.len(), 2);
    }

    #[tokio::test]
    async fn test_insert_failure_is_returned() {
        let store = Arc::new(CountingStore {
            fail_create: true,
            ..CountingStore::default()
        });
        let reconciler = ProblemReconciler::new(store.clone(), TABLE, 10);
        let result = reconciler.reconcile("marco", &set("marco", "Hungry Citizen", 15), "Hungry Citizen").await;
        assert!(matches!(result, Err(SerenissimaError::Store { status: 422, .. })));
        // stops at the first failing batch
        assert_eq!(store.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_foreign_problem_rejected() {
        let store = Arc::new(CountingStore::default());
        let reconciler = ProblemReconciler::new(store.clone(), TABLE, 10);
        let mut problems = set("marco", "Hungry Citizen", 1);
        let stray = problem("lucia", "Hungry Citizen", 9);
        problems.insert(stray.problem_id.clone(), stray);

        let result = reconciler.reconcile("marco", &problems, "Hungry Citizen").await;
        assert!(matches!(result, Err(SerenissimaError::InvalidInput(_))));
        assert_eq!(store.creates.load(Ordering::SeqCst), 0);
        assert_eq!(store.destroys.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_batch_size_clamped() {
        let store: Arc<dyn TableStore> = Arc::new(MemoryStore::new());
        assert_eq!(ProblemReconciler::new(store.clone(), TABLE, 50).batch_size(), 10);
        assert_eq!(ProblemReconciler::new(store, TABLE, 0).batch_size(), 1);
    }
}
