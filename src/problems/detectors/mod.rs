// src/problems/detectors/mod.rs

//! One detector per problem category.
//! Detectors never write; the same snapshot always yields the same problems.

mod contracts;
mod homeless;
mod hungry;
mod rent;
mod vacant;
mod wages;
mod workless;

use chrono::Duration;

use super::{ProblemKind, ProblemSet, Snapshot, Sources};
use crate::tables::{Problem, ProblemStatus, Severity};

pub use contracts::NoContractsDetector;
pub use homeless::HomelessDetector;
pub use hungry::HungryDetector;
pub use rent::ZeroRentDetector;
pub use vacant::VacantDetector;
pub use wages::ZeroWagesDetector;
pub use workless::WorklessDetector;

/// Knobs shared by the detectors
#[derive(Debug, Clone)]
pub struct DetectionSettings {
    /// A citizen whose last meal is older than this is hungry
    pub hunger_threshold: Duration,
    /// Social classes never flagged as workless
    pub workless_exempt_classes: Vec<String>,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            hunger_threshold: Duration::hours(24),
            workless_exempt_classes: vec!["Nobili".to_string()],
        }
    }
}

/// A rule-based scan producing problems of one category
pub trait Detector: Send + Sync {
    fn kind(&self) -> ProblemKind;

    /// Every title this detector can emit; the reconciliation partitions it owns
    fn titles(&self) -> &'static [&'static str];

    fn sources(&self) -> Sources;

    /// All problems in the snapshot, whoever they are attributed to
    fn scan(&self, snapshot: &Snapshot) -> Vec<Problem>;

    /// Problems keyed by id, restricted to those attributed to `scope` when given
    fn detect(&self, snapshot: &Snapshot, scope: Option<&str>) -> ProblemSet {
        self.scan(snapshot)
            .into_iter()
            .filter(|p| scope.is_none_or(|username| p.citizen == username))
            .map(|p| (p.problem_id.clone(), p))
            .collect()
    }
}

pub fn detector_for(kind: ProblemKind, settings: &DetectionSettings) -> Box<dyn Detector> {
    match kind {
        ProblemKind::Homeless => Box::new(HomelessDetector),
        ProblemKind::Hungry => Box::new(HungryDetector::new(settings.hunger_threshold)),
        ProblemKind::Workless => {
            Box::new(WorklessDetector::new(settings.workless_exempt_classes.clone()))
        }
        ProblemKind::Vacant => Box::new(VacantDetector),
        ProblemKind::ZeroWages => Box::new(ZeroWagesDetector),
        ProblemKind::NoContracts => Box::new(NoContractsDetector),
        ProblemKind::ZeroRent => Box::new(ZeroRentDetector),
    }
}

/// An active problem stamped with the snapshot clock; payload fields unset
fn new_problem(
    snapshot: &Snapshot,
    problem_id: String,
    citizen: &str,
    asset_type: &str,
    asset: &str,
    title: &str,
    severity: Severity,
) -> Problem {
    Problem {
        problem_id,
        citizen: citizen.to_string(),
        asset_type: asset_type.to_string(),
        asset: asset.to_string(),
        severity,
        status: ProblemStatus::Active,
        title: title.to_string(),
        problem_type: None,
        location: None,
        position: None,
        description: None,
        solutions: None,
        notes: None,
        created_at: Some(snapshot.now),
        updated_at: None,
        record_id: None,
    }
}
