//! Dashboard statistics

use serde::{Deserialize, Serialize};

/// Overall line state derived from active downtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LineStatus {
    Running,
    Halted,
}

impl LineStatus {
    pub fn from_active_downtime(active: usize) -> Self {
        if active > 0 {
            LineStatus::Halted
        } else {
            LineStatus::Running
        }
    }
}

/// Dashboard KPI snapshot (keys stay camelCase for existing dashboards)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_jobs: usize,
    pub active_downtime: usize,
    /// Completed within the current business day
    pub completed_today: usize,
    pub completed_total: usize,
    pub line_status: LineStatus,
}
