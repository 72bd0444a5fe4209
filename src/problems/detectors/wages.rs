// src/problems/detectors/wages.rs

use super::{Detector, new_problem};
use crate::problems::{ProblemKind, Snapshot, Sources};
use crate::tables::{Problem, Severity};

pub const ZERO_WAGES_BUSINESS: &str = "Zero Wages Business";

/// Businesses paying no wages, reported to whoever runs them
pub struct ZeroWagesDetector;

impl Detector for ZeroWagesDetector {
    fn kind(&self) -> ProblemKind {
        ProblemKind::ZeroWages
    }

    fn titles(&self) -> &'static [&'static str] {
        &[ZERO_WAGES_BUSINESS]
    }

    fn sources(&self) -> Sources {
        Sources::BUILDINGS
    }

    fn scan(&self, snapshot: &Snapshot) -> Vec<Problem> {
        snapshot
            .buildings
            .iter()
            .filter(|b| b.is_business())
            .filter(|b| b.wages.is_none_or(|w| w <= 0.0))
            .filter_map(|building| {
                let operator = building.operator()?;
                let name = building.display_name();
                let mut problem = new_problem(
                    snapshot,
                    format!("zero_wages_{}", building.building_id),
                    operator,
                    "building",
                    &building.building_id,
                    ZERO_WAGES_BUSINESS,
                    Severity::Medium,
                );
                problem.problem_type = Some("zero_wages_business".to_string());
                problem.location = Some(name.clone());
                problem.position = building.position;
                problem.description = Some(format!(
                    "{name} offers no wages. No citizen will work there for nothing, \
                     so the business cannot produce."
                ));
                problem.solutions =
                    Some("Set a wage comparable to similar businesses nearby.".to_string());
                Some(problem)
            })
            .collect()
    }
}
