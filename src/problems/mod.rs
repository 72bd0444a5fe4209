// src/problems/mod.rs

//! Problem detection and persistence.
//!
//! Detectors are pure functions over a [`Snapshot`]; the reconciler makes the
//! stored active problems of one (citizen, title) partition equal a fresh
//! detection result; the service glues both to the table store.

pub mod detectors;
pub mod reconciler;
pub mod service;
pub mod snapshot;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::tables::Problem;

pub use detectors::{DetectionSettings, Detector, detector_for};
pub use reconciler::ProblemReconciler;
pub use service::{DetectionReport, ProblemQuery, ProblemService, ServiceSettings};
pub use snapshot::{Snapshot, Sources};

/// Detection output keyed by problem id
pub type ProblemSet = BTreeMap<String, Problem>;

/// Problem categories, one detector and one route each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProblemKind {
    Homeless,
    Hungry,
    Workless,
    Vacant,
    ZeroWages,
    NoContracts,
    ZeroRent,
}

impl ProblemKind {
    pub const ALL: [ProblemKind; 7] = [
        ProblemKind::Homeless,
        ProblemKind::Hungry,
        ProblemKind::Workless,
        ProblemKind::Vacant,
        ProblemKind::ZeroWages,
        ProblemKind::NoContracts,
        ProblemKind::ZeroRent,
    ];

    /// Route segment and report label
    pub fn slug(&self) -> &'static str {
        match self {
            ProblemKind::Homeless => "homeless",
            ProblemKind::Hungry => "hungry",
            ProblemKind::Workless => "workless",
            ProblemKind::Vacant => "vacant",
            ProblemKind::ZeroWages => "zero-wages",
            ProblemKind::NoContracts => "no-contracts",
            ProblemKind::ZeroRent => "zero-rent",
        }
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ProblemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        ProblemKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == normalized)
            .ok_or_else(|| format!("unknown problem category '{s}'"))
    }
}
