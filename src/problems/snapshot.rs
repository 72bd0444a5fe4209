// src/problems/snapshot.rs
// Entity state fetched once per request and handed to detectors

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::tables::{Building, Citizen, Contract};

/// Which tables a detector reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sources {
    pub citizens: bool,
    pub buildings: bool,
    pub contracts: bool,
}

impl Sources {
    pub const CITIZENS_AND_BUILDINGS: Sources = Sources {
        citizens: true,
        buildings: true,
        contracts: false,
    };
    pub const BUILDINGS: Sources = Sources {
        citizens: false,
        buildings: true,
        contracts: false,
    };
    pub const BUILDINGS_AND_CONTRACTS: Sources = Sources {
        citizens: false,
        buildings: true,
        contracts: true,
    };

    pub fn union(self, other: Sources) -> Sources {
        Sources {
            citizens: self.citizens || other.citizens,
            buildings: self.buildings || other.buildings,
            contracts: self.contracts || other.contracts,
        }
    }
}

/// Immutable view of the world at `now`
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub now: DateTime<Utc>,
    pub citizens: Vec<Citizen>,
    pub buildings: Vec<Building>,
    pub contracts: Vec<Contract>,
    homes: HashMap<String, usize>,
    workplaces: HashMap<String, usize>,
}

impl Snapshot {
    pub fn new(
        now: DateTime<Utc>,
        citizens: Vec<Citizen>,
        buildings: Vec<Building>,
        contracts: Vec<Contract>,
    ) -> Self {
        let mut homes = HashMap::new();
        let mut workplaces = HashMap::new();
        for (idx, building) in buildings.iter().enumerate() {
            let Some(ref occupant) = building.occupant else {
                continue;
            };
            // first building wins so lookups stay stable across runs
            if building.is_home() {
                homes.entry(occupant.clone()).or_insert(idx);
            } else if building.is_business() {
                workplaces.entry(occupant.clone()).or_insert(idx);
            }
        }

        Self {
            now,
            citizens,
            buildings,
            contracts,
            homes,
            workplaces,
        }
    }

    /// Citizens currently in the city
    pub fn residents(&self) -> impl Iterator<Item = &Citizen> {
        self.citizens.iter().filter(|c| c.in_venice)
    }

    /// The home a citizen occupies
    pub fn home_of(&self, username: &str) -> Option<&Building> {
        self.homes.get(username).map(|&idx| &self.buildings[idx])
    }

    /// The business a citizen works at
    pub fn workplace_of(&self, username: &str) -> Option<&Building> {
        self.workplaces.get(username).map(|&idx| &self.buildings[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::record;
    use serde_json::json;

    #[test]
    fn test_occupancy_index() {
        let buildings = vec![
            Building::from_record(&record(
                "recB1",
                json!({ "BuildingId": "home_1", "Category": "home", "Occupant": "marco" }),
            )),
            Building::from_record(&record(
                "recB2",
                json!({ "BuildingId": "shop_1", "Category": "business", "Occupant": "marco" }),
            )),
            Building::from_record(&record(
                "recB3",
                json!({ "BuildingId": "dock_1", "Category": "transport", "Occupant": "lucia" }),
            )),
        ];
        let snapshot = Snapshot::new(Utc::now(), Vec::new(), buildings, Vec::new());

        assert_eq!(snapshot.home_of("marco").unwrap().building_id, "home_1");
        assert_eq!(snapshot.workplace_of("marco").unwrap().building_id, "shop_1");
        assert!(snapshot.home_of("lucia").is_none());
        assert!(snapshot.workplace_of("lucia").is_none());
    }

    #[test]
    fn test_sources_union() {
        let all = Sources::CITIZENS_AND_BUILDINGS.union(Sources::BUILDINGS_AND_CONTRACTS);
        assert!(all.citizens && all.buildings && all.contracts);
    }
}
