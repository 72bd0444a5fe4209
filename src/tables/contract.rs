// src/tables/contract.rs

use chrono::{DateTime, Utc};

use super::parse_timestamp;
use crate::store::Record;

/// A row of the contracts table
#[derive(Debug, Clone, PartialEq)]
pub struct Contract {
    pub record_id: String,
    pub contract_id: String,
    pub contract_type: Option<String>,
    pub buyer: Option<String>,
    pub seller: Option<String>,
    pub buyer_building: Option<String>,
    pub seller_building: Option<String>,
    pub resource_type: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
}

impl Contract {
    pub fn from_record(record: &Record) -> Self {
        Self {
            record_id: record.id.clone(),
            contract_id: record.text("ContractId").unwrap_or_else(|| record.id.clone()),
            contract_type: record.text("Type"),
            buyer: record.text("Buyer"),
            seller: record.text("Seller"),
            buyer_building: record.text("BuyerBuilding"),
            seller_building: record.text("SellerBuilding"),
            resource_type: record.text("ResourceType"),
            status: record.text("Status"),
            created_at: parse_timestamp(record, "CreatedAt"),
            end_at: parse_timestamp(record, "EndAt"),
        }
    }

    /// Active when not marked otherwise and not yet ended at `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        let status_ok = self
            .status
            .as_deref()
            .is_none_or(|s| s.eq_ignore_ascii_case("active"));
        let not_ended = self.end_at.is_none_or(|end| end > now);
        status_ok && not_ended
    }

    pub fn involves_building(&self, building_id: &str) -> bool {
        self.seller_building.as_deref() == Some(building_id)
            || self.buyer_building.as_deref() == Some(building_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::record;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_activity_window() {
        let open = Contract::from_record(&record(
            "recK1",
            json!({ "SellerBuilding": "bld_1", "EndAt": "2025-06-02T00:00:00Z" }),
        ));
        assert!(open.is_active_at(now()));
        assert!(open.involves_building("bld_1"));
        assert!(!open.involves_building("bld_2"));

        let ended = Contract::from_record(&record(
            "recK2",
            json!({ "SellerBuilding": "bld_1", "EndAt": "2025-05-30T00:00:00Z" }),
        ));
        assert!(!ended.is_active_at(now()));

        let cancelled = Contract::from_record(&record(
            "recK3",
            json!({ "BuyerBuilding": "bld_1", "Status": "cancelled" }),
        ));
        assert!(!cancelled.is_active_at(now()));
        assert!(cancelled.involves_building("bld_1"));
    }
}
