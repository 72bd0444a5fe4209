// src/tables/building.rs

use super::{Position, parse_position};
use crate::store::Record;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildingCategory {
    Home,
    Business,
    Other(String),
}

impl BuildingCategory {
    fn parse(raw: Option<String>) -> Self {
        let raw = raw.unwrap_or_default();
        if raw.eq_ignore_ascii_case("home") {
            BuildingCategory::Home
        } else if raw.eq_ignore_ascii_case("business") {
            BuildingCategory::Business
        } else {
            BuildingCategory::Other(raw)
        }
    }
}

/// A row of the buildings table
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub record_id: String,
    pub building_id: String,
    pub name: Option<String>,
    pub building_type: Option<String>,
    pub category: BuildingCategory,
    pub owner: Option<String>,
    pub run_by: Option<String>,
    pub occupant: Option<String>,
    pub wages: Option<f64>,
    pub rent_price: Option<f64>,
    pub position: Option<Position>,
}

impl Building {
    pub fn from_record(record: &Record) -> Self {
        Self {
            record_id: record.id.clone(),
            building_id: record.text("BuildingId").unwrap_or_else(|| record.id.clone()),
            name: record.text("Name"),
            building_type: record.text("Type"),
            category: BuildingCategory::parse(record.text("Category")),
            owner: record.text("Owner"),
            run_by: record.text("RunBy"),
            occupant: record.text("Occupant"),
            wages: record.number("Wages"),
            rent_price: record.number("RentPrice"),
            position: parse_position(record, "Position"),
        }
    }

    pub fn is_home(&self) -> bool {
        self.category == BuildingCategory::Home
    }

    pub fn is_business(&self) -> bool {
        self.category == BuildingCategory::Business
    }

    /// The citizen running the business: `RunBy`, else the owner
    pub fn operator(&self) -> Option<&str> {
        self.run_by.as_deref().or(self.owner.as_deref())
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.building_type.clone())
            .unwrap_or_else(|| self.building_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::record;
    use serde_json::json;

    #[test]
    fn test_from_record() {
        let b = Building::from_record(&record(
            "recB1",
            json!({
                "BuildingId": "bld_bakery_1",
                "Name": "Forno di Rialto",
                "Type": "bakery",
                "Category": "Business",
                "Owner": "lucia",
                "RunBy": "marco",
                "Occupant": "giulia",
                "Wages": 40,
                "RentPrice": "120"
            }),
        ));
        assert_eq!(b.building_id, "bld_bakery_1");
        assert!(b.is_business());
        assert_eq!(b.operator(), Some("marco"));
        assert_eq!(b.wages, Some(40.0));
        assert_eq!(b.rent_price, Some(120.0));
    }

    #[test]
    fn test_fallbacks() {
        let b = Building::from_record(&record(
            "recB2",
            json!({ "Category": "home", "Owner": "lucia", "Type": "canal_house" }),
        ));
        assert_eq!(b.building_id, "recB2");
        assert!(b.is_home());
        assert_eq!(b.operator(), Some("lucia"));
        assert_eq!(b.display_name(), "canal_house");

        let b = Building::from_record(&record("recB3", json!({ "Category": "transport" })));
        assert_eq!(b.category, BuildingCategory::Other("transport".to_string()));
        assert_eq!(b.operator(), None);
    }
}
