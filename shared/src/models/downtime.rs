//! Downtime Log Model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// One machine-stoppage incident
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DowntimeLog {
    pub id: i64,
    pub machine: String,
    pub reason: String,
    /// Operator id of whoever raised the alert
    pub reporter: Option<i64>,
    pub is_active: bool,
    pub start_time: i64,
    /// Null while the incident is active
    pub end_time: Option<i64>,
    pub updated_at: i64,
    pub version: u64,
}

/// Report downtime payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DowntimeCreate {
    #[validate(length(min = 1, max = 100))]
    pub machine: String,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
    #[serde(default, alias = "reported_by")]
    pub reporter: Option<i64>,
}
