// src/problems/detectors/hungry.rs

use chrono::Duration;

use super::{Detector, new_problem};
use crate::problems::{ProblemKind, Snapshot, Sources};
use crate::tables::{Citizen, Problem, Severity};

pub const HUNGRY_CITIZEN: &str = "Hungry Citizen";
pub const HUNGRY_EMPLOYEE: &str = "Hungry Employee";

/// Residents who have not eaten within the threshold
pub struct HungryDetector {
    threshold: Duration,
}

impl HungryDetector {
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    /// Hours since the last meal, `None` when no meal is on record
    fn hours_without_food(&self, snapshot: &Snapshot, citizen: &Citizen) -> Option<i64> {
        citizen.ate_at.map(|ate| (snapshot.now - ate).num_hours())
    }

    fn is_hungry(&self, snapshot: &Snapshot, citizen: &Citizen) -> bool {
        match citizen.ate_at {
            None => true,
            Some(ate) => snapshot.now - ate > self.threshold,
        }
    }
}

impl Detector for HungryDetector {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Hungry
    }

    fn titles(&self) -> &'static [&'static str] {
        &[HUNGRY_CITIZEN, HUNGRY_EMPLOYEE]
    }

    fn sources(&self) -> Sources {
        Sources::CITIZENS_AND_BUILDINGS
    }

    fn scan(&self, snapshot: &Snapshot) -> Vec<Problem> {
        let mut problems = Vec::new();

        for citizen in snapshot.residents() {
            if !self.is_hungry(snapshot, citizen) {
                continue;
            }
            let name = citizen.display_name();
            let hours = self.hours_without_food(snapshot, citizen);
            let since = match hours {
                Some(h) => format!("has not eaten for {h} hours"),
                None => "has no recorded meal".to_string(),
            };
            // starving: more than twice the threshold without food
            let severity = match citizen.ate_at {
                Some(ate) if snapshot.now - ate > self.threshold * 2 => Severity::High,
                _ => Severity::Medium,
            };

            let mut problem = new_problem(
                snapshot,
                format!("hungry_{}", citizen.username),
                &citizen.username,
                "citizen",
                &citizen.username,
                HUNGRY_CITIZEN,
                severity,
            );
            problem.problem_type = Some("hungry_citizen".to_string());
            problem.location = Some(name.clone());
            problem.position = citizen.position;
            problem.description = Some(format!(
                "{name} {since}. Hunger reduces a citizen's productivity and mood."
            ));
            problem.solutions = Some(
                "Buy food at a market stall, tavern or bakery, and make sure you keep \
                 enough ducats for daily meals."
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
                format!("hungry-employee_{}", citizen.username),
                employer,
                "citizen",
                &citizen.username,
                HUNGRY_EMPLOYEE,
                Severity::Low,
            );
            problem.problem_type = Some("hungry_employee".to_string());
            problem.location = Some(workplace.display_name());
            problem.position = workplace.position.or(citizen.position);
            problem.description = Some(format!(
                "{name}, who works at {}, {since}. Hungry employees produce less.",
                workplace.display_name()
            ));
            problem.solutions = Some(
                "Pay wages high enough to cover food, or check that food is for sale \
                 near your business."
                    .to_string(),
            );
            problems.push(problem);
        }

        problems
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use serde_json::json;

    fn detector() -> HungryDetector {
        HungryDetector::new(Duration::hours(24))
    }

    #[test]
    fn test_threshold() {
        let snap = snapshot(
            vec![
                citizen("fed", json!({ "AteAt": "2025-06-01T08:00:00Z" })),
                citizen("peckish", json!({ "AteAt": "2025-05-31T06:00:00Z" })),
                citizen("starving", json!({ "AteAt": "2025-05-29T06:00:00Z" })),
                citizen("never", json!({ "AteAt": null })),
                citizen("garbled", json!({ "AteAt": "last tuesday" })),
            ],
            vec![],
            vec![],
        );
        let problems = detector().detect(&snap, None);

        assert!(!problems.contains_key("hungry_fed"));
        assert_eq!(problems["hungry_peckish"].severity, Severity::Medium);
        assert_eq!(problems["hungry_starving"].severity, Severity::High);
        assert!(problems["hungry_never"].description.as_deref().unwrap().contains("no recorded meal"));
        assert!(problems.contains_key("hungry_garbled"));
        assert!(problems.values().all(|p| p.title == HUNGRY_CITIZEN));
    }

    #[test]
    fn test_hungry_employee_goes_to_operator() {
        let snap = snapshot(
            vec![citizen("marco", json!({ "AteAt": null }))],
            vec![building(
                "shop_1",
                json!({ "Category": "business", "Occupant": "marco", "Owner": "lucia" }),
            )],
            vec![],
        );
        let problems = detector().detect(&snap, Some("lucia"));
        assert_eq!(problems.len(), 1);
        let p = &problems["hungry-employee_marco"];
        assert_eq!(p.title, HUNGRY_EMPLOYEE);
        assert_eq!(p.asset, "marco");
    }
}
