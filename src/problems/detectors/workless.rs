// src/problems/detectors/workless.rs

use super::{Detector, new_problem};
use crate::problems::{ProblemKind, Snapshot, Sources};
use crate::tables::{Citizen, Problem, Severity};

pub const WORKLESS_CITIZEN: &str = "Workless Citizen";

/// Residents without a workplace, except the exempt social classes
pub struct WorklessDetector {
    exempt_classes: Vec<String>,
}

impl WorklessDetector {
    pub fn new(exempt_classes: Vec<String>) -> Self {
        Self { exempt_classes }
    }

    fn is_exempt(&self, citizen: &Citizen) -> bool {
        citizen.social_class.as_deref().is_some_and(|class| {
            self.exempt_classes
                .iter()
                .any(|exempt| exempt.eq_ignore_ascii_case(class))
        })
    }
}

impl Detector for WorklessDetector {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Workless
    }

    fn titles(&self) -> &'static [&'static str] {
        &[WORKLESS_CITIZEN]
    }

    fn sources(&self) -> Sources {
        Sources::CITIZENS_AND_BUILDINGS
    }

    fn scan(&self, snapshot: &Snapshot) -> Vec<Problem> {
        snapshot
            .residents()
            .filter(|c| !self.is_exempt(c))
            .filter(|c| snapshot.workplace_of(&c.username).is_none())
            .map(|citizen| {
                let name = citizen.display_name();
                let mut problem = new_problem(
                    snapshot,
                    format!("workless_{}", citizen.username),
                    &citizen.username,
                    "citizen",
                    &citizen.username,
                    WORKLESS_CITIZEN,
                    Severity::Low,
                );
                problem.problem_type = Some("workless_citizen".to_string());
                problem.location = Some(name.clone());
                problem.position = citizen.position;
                problem.description = Some(format!(
                    "{name} has no job. Without wages they will struggle to pay for \
                     food and rent."
                ));
                problem.solutions = Some(
                    "Look for businesses advertising wages, or start a business of \
                     your own."
                        .to_string(),
                );
                problem
            })
            .collect()
    }
}
