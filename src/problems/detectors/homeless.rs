// src/problems/detectors/homeless.rs

use super::{Detector, new_problem};
use crate::problems::{ProblemKind, Snapshot, Sources};
use crate::tables::{Problem, Severity};

pub const HOMELESS_CITIZEN: &str = "Homeless Citizen";
pub const HOMELESS_EMPLOYEE: &str = "Homeless Employee";

/// Residents without a home; their employer is told too
pub struct HomelessDetector;

impl Detector for HomelessDetector {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Homeless
    }

    fn titles(&self) -> &'static [&'static str] {
        &[HOMELESS_CITIZEN, HOMELESS_EMPLOYEE]
    }

    fn sources(&self) -> Sources {
        Sources::CITIZENS_AND_BUILDINGS
    }

    fn scan(&self, snapshot: &Snapshot) -> Vec<Problem> {
        let mut problems = Vec::new();

        for citizen in snapshot.residents() {
            if snapshot.home_of(&citizen.username).is_some() {
                continue;
            }
            let name = citizen.display_name();

            let mut problem = new_problem(
                snapshot,
                format!("homeless_{}", citizen.username),
                &citizen.username,
                "citizen",
                &citizen.username,
                HOMELESS_CITIZEN,
                Severity::Medium,
            );
            problem.problem_type = Some("homeless_citizen".to_string());
            problem.location = Some(name.clone());
            problem.position = citizen.position;
            problem.description = Some(format!(
                "{name} has no home in Venice. Homeless citizens sleep rough, \
                 lose productivity and are at risk of leaving the city."
            ));
            problem.solutions = Some(
                "Find a vacant home on the housing market, or ask a landlord for a lease \
                 at a rent you can afford."
                    .to_string(),
            );
            problems.push(problem);

            let Some(workplace) = snapshot.workplace_of(&citizen.username) else {
                continue;
            };
            let Some(employer) = workplace.operator() else {
                continue;
            };
            if employer == citizen.username {
                continue;
            }

            let mut problem = new_problem(
                snapshot,
                format!("homeless-employee_{}", citizen.username),
                employer,
                "citizen",
                &citizen.username,
                HOMELESS_EMPLOYEE,
                Severity::Low,
            );
            problem.problem_type = Some("homeless_employee".to_string());
            problem.location = Some(workplace.display_name());
            problem.position = workplace.position.or(citizen.position);
            problem.description = Some(format!(
                "{name}, who works at {}, has no home. Homeless employees may \
                 work less reliably.",
                workplace.display_name()
            ));
            problem.solutions = Some(
                "Raise wages so your employee can afford housing, or offer them a home \
                 you own."
                    .to_string(),
            );
            problems.push(problem);
        }

        problems
    }
}
