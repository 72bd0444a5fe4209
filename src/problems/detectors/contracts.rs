// src/problems/detectors/contracts.rs

use super::{Detector, new_problem};
use crate::problems::{ProblemKind, Snapshot, Sources};
use crate::tables::{Problem, Severity};

pub const NO_ACTIVE_CONTRACTS: &str = "No Active Contracts";

/// Running businesses that neither buy nor sell under any active contract
pub struct NoContractsDetector;

impl Detector for NoContractsDetector {
    fn kind(&self) -> ProblemKind {
        ProblemKind::NoContracts
    }

    fn titles(&self) -> &'static [&'static str] {
        &[NO_ACTIVE_CONTRACTS]
    }

    fn sources(&self) -> Sources {
        Sources::BUILDINGS_AND_CONTRACTS
    }

    fn scan(&self, snapshot: &Snapshot) -> Vec<Problem> {
        let active: Vec<_> = snapshot
            .contracts
            .iter()
            .filter(|c| c.is_active_at(snapshot.now))
            .collect();

        snapshot
            .buildings
            .iter()
            .filter(|b| b.is_business())
            .filter(|b| !active.iter().any(|c| c.involves_building(&b.building_id)))
            .filter_map(|building| {
                let operator = building.operator()?;
                let name = building.display_name();
                let mut problem = new_problem(
                    snapshot,
                    format!("no_contracts_{}", building.building_id),
                    operator,
                    "building",
                    &building.building_id,
                    NO_ACTIVE_CONTRACTS,
                    Severity::Medium,
                );
                problem.problem_type = Some("no_active_contracts".to_string());
                problem.location = Some(name.clone());
                problem.position = building.position;
                problem.description = Some(format!(
                    "{name} has no active contracts. Without buyers or suppliers it \
                     earns no income."
                ));
                problem.solutions = Some(
                    "Create sell contracts for what the business produces and import \
                     contracts for the inputs it needs."
                        .to_string(),
                );
                Some(problem)
            })
            .collect()
    }
}
