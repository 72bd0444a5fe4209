// src/problems/detectors/vacant.rs

use super::{Detector, new_problem};
use crate::problems::{ProblemKind, Snapshot, Sources};
use crate::tables::{Problem, Severity};

pub const VACANT_HOME: &str = "Vacant Home";
pub const VACANT_BUSINESS: &str = "Vacant Business";

/// Owned homes and businesses nobody occupies
pub struct VacantDetector;

impl Detector for VacantDetector {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Vacant
    }

    fn titles(&self) -> &'static [&'static str] {
        &[VACANT_HOME, VACANT_BUSINESS]
    }

    fn sources(&self) -> Sources {
        Sources::BUILDINGS
    }

    fn scan(&self, snapshot: &Snapshot) -> Vec<Problem> {
        let mut problems = Vec::new();

        for building in &snapshot.buildings {
            if building.occupant.is_some() {
                continue;
            }
            let Some(ref owner) = building.owner else {
                continue;
            };
            let (title, severity, kind, remedy) = if building.is_home() {
                (
                    VACANT_HOME,
                    Severity::Low,
                    "vacant_home",
                    "Lower the rent to attract a tenant, or move in yourself.",
                )
            } else if building.is_business() {
                (
                    VACANT_BUSINESS,
                    Severity::Medium,
                    "vacant_business",
                    "Offer competitive wages to attract a worker, or run the business yourself.",
                )
            } else {
                continue;
            };

            let name = building.display_name();
            let mut problem = new_problem(
                snapshot,
                format!("vacant_{}", building.building_id),
                owner,
                "building",
                &building.building_id,
                title,
                severity,
            );
            problem.problem_type = Some(kind.to_string());
            problem.location = Some(name.clone());
            problem.position = building.position;
            problem.description = Some(format!(
                "{name} stands empty. A vacant building earns nothing while its upkeep \
                 continues."
            ));
            problem.solutions = Some(remedy.to_string());
            problems.push(problem);
        }

        problems
    }
}
