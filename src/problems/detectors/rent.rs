// src/problems/detectors/rent.rs

use super::{Detector, new_problem};
use crate::problems::{ProblemKind, Snapshot, Sources};
use crate::tables::{Problem, Severity};

pub const ZERO_RENT_AMOUNT: &str = "Zero Rent Amount";

/// Leased homes and businesses whose tenant pays no rent
pub struct ZeroRentDetector;

impl Detector for ZeroRentDetector {
    fn kind(&self) -> ProblemKind {
        ProblemKind::ZeroRent
    }

    fn titles(&self) -> &'static [&'static str] {
        &[ZERO_RENT_AMOUNT]
    }

    fn sources(&self) -> Sources {
        Sources::BUILDINGS
    }

    fn scan(&self, snapshot: &Snapshot) -> Vec<Problem> {
        let mut problems = Vec::new();

        for building in &snapshot.buildings {
            if !(building.is_home() || building.is_business()) {
                continue;
            }
            let (Some(owner), Some(occupant)) = (&building.owner, &building.occupant) else {
                continue;
            };
            if owner == occupant || building.rent_price.is_some_and(|rent| rent > 0.0) {
                continue;
            }

            let name = building.display_name();
            let mut problem = new_problem(
                snapshot,
                format!("zero_rent_{}", building.building_id),
                owner,
                "building",
                &building.building_id,
                ZERO_RENT_AMOUNT,
                Severity::Low,
            );
            problem.problem_type = Some("zero_rent_amount".to_string());
            problem.location = Some(name.clone());
            problem.position = building.position;
            problem.description = Some(format!(
                "{occupant} occupies {name} without paying rent. The building earns \
                 you nothing."
            ));
            problem.solutions =
                Some("Set a rent price in line with similar buildings in the district.".to_string());
            problems.push(problem);
        }

        problems
    }
}
