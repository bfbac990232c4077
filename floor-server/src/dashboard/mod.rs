//! Dashboard KPIs
//!
//! Computed on demand from the current store state; nothing is cached.

use chrono::NaiveDate;
use chrono_tz::Tz;
use shared::models::{DashboardStats, DowntimeLog, LineStatus, WorkOrder, WorkOrderStatus};

use crate::core::FloorResult;
use crate::store::Store;
use crate::utils::time::{business_today, day_end_millis, day_start_millis};

#[derive(Clone)]
pub struct DashboardAggregator {
    store: Store,
    tz: Tz,
}

impl DashboardAggregator {
    pub fn new(store: Store, tz: Tz) -> Self {
        Self { store, tz }
    }

    /// Stats for the current business day
    pub async fn stats(&self) -> FloorResult<DashboardStats> {
        self.stats_for(business_today(self.tz)).await
    }

    /// Stats with `completedToday` scoped to `date` in the business time zone
    pub async fn stats_for(&self, date: NaiveDate) -> FloorResult<DashboardStats> {
        let start = day_start_millis(date, self.tz);
        let end = day_end_millis(date, self.tz);

        let work_orders = &self.store.work_orders;
        let active_jobs = work_orders
            .count(&|wo: &WorkOrder| wo.status == WorkOrderStatus::InProgress)
            .await?;
        let completed_total = work_orders
            .count(&|wo: &WorkOrder| wo.status == WorkOrderStatus::Completed)
            .await?;
        let completed_today = work_orders
            .count(&|wo: &WorkOrder| {
                wo.status == WorkOrderStatus::Completed
                    && wo.completed_at.is_some_and(|t| t >= start && t < end)
            })
            .await?;
        let active_downtime = self
            .store
            .downtime_logs
            .count(&|log: &DowntimeLog| log.is_active)
            .await?;

        Ok(DashboardStats {
            active_jobs,
            active_downtime,
            completed_today,
            completed_total,
            line_status: LineStatus::from_active_downtime(active_downtime),
        })
    }
}
