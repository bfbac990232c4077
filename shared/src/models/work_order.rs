//! Work Order Model

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::order::Order;

/// Shop-floor station a work order runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Station {
    Cutting,
    Coating,
    Assembly,
}

impl Station {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Station::Cutting => "cutting",
            Station::Coating => "coating",
            Station::Assembly => "assembly",
        }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work order status, forward-only: pending → in_progress → completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl WorkOrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Pending => "pending",
            WorkOrderStatus::InProgress => "in_progress",
            WorkOrderStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of shop-floor work against an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: i64,
    /// Owning order, immutable after creation
    pub order_id: i64,
    pub product: String,
    pub quantity: i64,
    pub station: Station,
    pub status: WorkOrderStatus,
    /// 0..=100, never decreases
    pub progress: u8,
    /// Last operator that moved this work order
    pub operator_id: Option<i64>,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub version: u64,
}

/// Work order with its owning order embedded
///
/// This is the shape returned by the REST surface and carried by
/// `wo_updated` events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderView {
    #[serde(flatten)]
    pub work_order: WorkOrder,
    pub order: Option<Order>,
}

/// Create work order payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WorkOrderCreate {
    /// Planner forms send `OrderId`
    #[serde(alias = "OrderId")]
    pub order_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub product: String,
    #[validate(range(min = 1))]
    pub quantity: i64,
    pub station: Station,
}

/// Status/progress update payload from an operator terminal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkOrderStatusUpdate {
    pub status: Option<WorkOrderStatus>,
    /// Raw requested progress, clamped to 0..=100 by the server
    pub progress: Option<i64>,
    pub operator_id: Option<i64>,
    /// When set, the update fails instead of retrying if the stored version differs
    pub expected_version: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_accepts_planner_alias() {
        let json = r#"{"OrderId":1,"product":"Linear Grill 200x50","quantity":50,"station":"cutting"}"#;
        let create: WorkOrderCreate = serde_json::from_str(json).unwrap();
        assert_eq!(create.order_id, 1);
        assert_eq!(create.station, Station::Cutting);
    }

    #[test]
    fn test_create_validation() {
        let create = WorkOrderCreate {
            order_id: 1,
            product: String::new(),
            quantity: 0,
            station: Station::Coating,
        };
        let errors = create.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("product"));
        assert!(fields.contains_key("quantity"));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&WorkOrderStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
