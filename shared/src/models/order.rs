//! Order Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Order lifecycle status
///
/// Only initialized on creation; the floor never transitions it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    New,
    Production,
    Ready,
}

/// Customer purchase commitment, owner of zero or more work orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer: String,
    /// Promised delivery date (YYYY-MM-DD)
    pub delivery_date: NaiveDate,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: i64,
    pub updated_at: i64,
    pub version: u64,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderCreate {
    #[validate(length(min = 1, max = 200))]
    pub customer: String,
    pub delivery_date: NaiveDate,
    pub status: Option<OrderStatus>,
}
