//! Downtime alerts
//!
//! Machine stoppages are reported by operators and resolved by maintenance.
//! The line is `HALTED` while any incident is active.

use std::sync::Arc;

use shared::message::FloorEvent;
use shared::models::{DowntimeCreate, DowntimeLog, LineStatus};
use shared::util::now_millis;
use tokio::sync::Mutex;

use crate::core::{FloorError, FloorResult};
use crate::message::EventHub;
use crate::store::{OrderBy, Store, StoreError};

/// How a second report on a machine with an active incident is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DowntimePolicy {
    /// Every report raises its own incident
    Permissive,
    /// At most one active incident per machine
    SingleActive,
}

#[derive(Clone)]
pub struct DowntimeManager {
    store: Store,
    hub: Arc<EventHub>,
    policy: DowntimePolicy,
    max_retries: u32,
    /// Serializes check-then-insert under `SingleActive`
    report_lock: Arc<Mutex<()>>,
}

impl DowntimeManager {
    pub fn new(store: Store, hub: Arc<EventHub>, policy: DowntimePolicy, max_retries: u32) -> Self {
        Self {
            store,
            hub,
            policy,
            max_retries,
            report_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Raise an active incident and publish `downtime_alert`
    pub async fn report(&self, input: DowntimeCreate) -> FloorResult<DowntimeLog> {
        let machine = input.machine.trim();
        let reason = input.reason.trim();
        if machine.is_empty() {
            return Err(FloorError::validation("machine must not be empty"));
        }
        if reason.is_empty() {
            return Err(FloorError::validation("reason must not be empty"));
        }

        let _guard = match self.policy {
            DowntimePolicy::SingleActive => {
                let guard = self.report_lock.lock().await;
                let existing = self
                    .store
                    .downtime_logs
                    .find_all(
                        &|log: &DowntimeLog| log.is_active && log.machine == machine,
                        OrderBy::IdAsc,
                    )
                    .await?;
                if let Some(active) = existing.first() {
                    return Err(FloorError::DowntimeAlreadyActive {
                        machine: machine.to_string(),
                        active_id: active.id,
                    });
                }
                Some(guard)
            }
            DowntimePolicy::Permissive => None,
        };

        let now = now_millis();
        let log = self
            .store
            .downtime_logs
            .insert(DowntimeLog {
                id: 0,
                machine: machine.to_string(),
                reason: reason.to_string(),
                reporter: input.reporter,
                is_active: true,
                start_time: now,
                end_time: None,
                updated_at: now,
                version: 0,
            })
            .await?;

        tracing::warn!(
            downtime_id = log.id,
            machine = %log.machine,
            reason = %log.reason,
            "Downtime reported"
        );
        self.hub.publish(FloorEvent::DowntimeAlert(log.clone()));
        Ok(log)
    }

    /// Close an incident and publish `downtime_resolved`
    ///
    /// Resolving an already-resolved log returns it unchanged and publishes
    /// nothing.
    pub async fn resolve(&self, id: i64) -> FloorResult<DowntimeLog> {
        let mut attempt = 0;
        loop {
            let current = self
                .store
                .downtime_logs
                .find_by_id(id)
                .await?
                .ok_or(FloorError::DowntimeNotFound(id))?;

            if !current.is_active {
                tracing::debug!(downtime_id = id, "Downtime already resolved");
                return Ok(current);
            }

            let now = now_millis();
            let mut resolved = current.clone();
            resolved.is_active = false;
            resolved.end_time = Some(now);
            resolved.updated_at = now;

            match self
                .store
                .downtime_logs
                .update(id, current.version, resolved)
                .await
            {
                Ok(saved) => {
                    tracing::info!(
                        downtime_id = id,
                        machine = %saved.machine,
                        duration_ms = now - saved.start_time,
                        "Downtime resolved"
                    );
                    self.hub.publish(FloorEvent::DowntimeResolved(saved.clone()));
                    return Ok(saved);
                }
                Err(StoreError::VersionConflict { .. }) if attempt < self.max_retries => {
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Incidents newest first, optionally only the active ones
    pub async fn list(&self, active_only: bool) -> FloorResult<Vec<DowntimeLog>> {
        let mut logs = self
            .store
            .downtime_logs
            .find_all(
                &|log: &DowntimeLog| !active_only || log.is_active,
                OrderBy::IdAsc,
            )
            .await?;
        logs.reverse();
        Ok(logs)
    }

    pub async fn active_count(&self) -> FloorResult<usize> {
        Ok(self
            .store
            .downtime_logs
            .count(&|log: &DowntimeLog| log.is_active)
            .await?)
    }

    pub async fn line_status(&self) -> FloorResult<LineStatus> {
        Ok(LineStatus::from_active_downtime(self.active_count().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(policy: DowntimePolicy) -> (DowntimeManager, crate::message::Subscription) {
        let hub = Arc::new(EventHub::new(16));
        let sub = hub.subscribe();
        (DowntimeManager::new(Store::in_memory(), hub, policy, 3), sub)
    }

    fn report(machine: &str) -> DowntimeCreate {
        DowntimeCreate {
            machine: machine.into(),
            reason: "Blade jammed".into(),
            reporter: Some(101),
        }
    }

    #[tokio::test]
    async fn test_report_and_resolve() {
        let (manager, mut sub) = manager(DowntimePolicy::Permissive);
        assert_eq!(manager.line_status().await.unwrap(), LineStatus::Running);

        let log = manager.report(report("Station-1")).await.unwrap();
        assert!(log.is_active);
        assert!(log.end_time.is_none());
        assert_eq!(manager.active_count().await.unwrap(), 1);
        assert_eq!(manager.line_status().await.unwrap(), LineStatus::Halted);
        assert_eq!(sub.rx.try_recv().unwrap().name(), "downtime_alert");

        let resolved = manager.resolve(log.id).await.unwrap();
        assert!(!resolved.is_active);
        assert!(resolved.end_time.is_some());
        assert_eq!(resolved.version, 2);
        assert_eq!(manager.line_status().await.unwrap(), LineStatus::Running);
        assert_eq!(sub.rx.try_recv().unwrap().name(), "downtime_resolved");
    }

    #[tokio::test]
    async fn test_second_resolve_is_noop() {
        let (manager, mut sub) = manager(DowntimePolicy::Permissive);
        let log = manager.report(report("Station-1")).await.unwrap();
        let first = manager.resolve(log.id).await.unwrap();
        while sub.rx.try_recv().is_ok() {}

        let second = manager.resolve(log.id).await.unwrap();
        assert_eq!(second, first);
        assert!(sub.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_validation_and_not_found() {
        let (manager, _sub) = manager(DowntimePolicy::Permissive);
        let mut blank = report("  ");
        assert!(matches!(
            manager.report(blank.clone()).await,
            Err(FloorError::Validation(_))
        ));
        blank.machine = "Station-1".into();
        blank.reason = String::new();
        assert!(matches!(
            manager.report(blank).await,
            Err(FloorError::Validation(_))
        ));
        assert!(matches!(
            manager.resolve(77).await,
            Err(FloorError::DowntimeNotFound(77))
        ));
    }

    #[tokio::test]
    async fn test_permissive_allows_duplicates() {
        let (manager, _sub) = manager(DowntimePolicy::Permissive);
        manager.report(report("Station-1")).await.unwrap();
        manager.report(report("Station-1")).await.unwrap();
        assert_eq!(manager.active_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_single_active_rejects_duplicates() {
        let (manager, _sub) = manager(DowntimePolicy::SingleActive);
        let first = manager.report(report("Station-1")).await.unwrap();
        let err = manager.report(report("Station-1")).await.unwrap_err();
        assert!(matches!(
            err,
            FloorError::DowntimeAlreadyActive { active_id, .. } if active_id == first.id
        ));

        // Other machines and resolved incidents don't block
        manager.report(report("Station-2")).await.unwrap();
        manager.resolve(first.id).await.unwrap();
        manager.report(report("Station-1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_filters_active() {
        let (manager, _sub) = manager(DowntimePolicy::Permissive);
        let a = manager.report(report("Station-1")).await.unwrap();
        let b = manager.report(report("Station-2")).await.unwrap();
        manager.resolve(a.id).await.unwrap();

        let all: Vec<i64> = manager.list(false).await.unwrap().iter().map(|l| l.id).collect();
        assert_eq!(all, vec![b.id, a.id]);
        let active: Vec<i64> = manager.list(true).await.unwrap().iter().map(|l| l.id).collect();
        assert_eq!(active, vec![b.id]);
    }
}
