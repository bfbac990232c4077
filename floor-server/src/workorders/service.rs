use std::collections::HashMap;
use std::sync::Arc;

use shared::message::FloorEvent;
use shared::models::{
    Order, WorkOrder, WorkOrderCreate, WorkOrderStatus, WorkOrderStatusUpdate, WorkOrderView,
};
use shared::util::now_millis;

use super::machine::{self, TransitionRequest};
use crate::core::{FloorError, FloorResult};
use crate::message::EventHub;
use crate::store::{OrderBy, Store, StoreError};

/// Work order lifecycle: create, read, and operator-driven transitions
///
/// Every successful `create` and `transition` publishes exactly one
/// `wo_updated` event carrying the committed [`WorkOrderView`].
#[derive(Clone)]
pub struct WorkOrderService {
    store: Store,
    hub: Arc<EventHub>,
    max_retries: u32,
}

impl WorkOrderService {
    pub fn new(store: Store, hub: Arc<EventHub>, max_retries: u32) -> Self {
        Self {
            store,
            hub,
            max_retries,
        }
    }

    /// Create a pending work order against an existing order
    pub async fn create(&self, input: WorkOrderCreate) -> FloorResult<WorkOrderView> {
        let product = input.product.trim();
        if product.is_empty() {
            return Err(FloorError::validation("product must not be empty"));
        }
        if input.quantity <= 0 {
            return Err(FloorError::validation(format!(
                "quantity must be positive (got {})",
                input.quantity
            )));
        }
        let order = self
            .store
            .orders
            .find_by_id(input.order_id)
            .await?
            .ok_or_else(|| {
                FloorError::validation(format!("order {} does not exist", input.order_id))
            })?;

        let now = now_millis();
        let work_order = self
            .store
            .work_orders
            .insert(WorkOrder {
                id: 0,
                order_id: order.id,
                product: product.to_string(),
                quantity: input.quantity,
                station: input.station,
                status: WorkOrderStatus::Pending,
                progress: 0,
                operator_id: None,
                started_at: None,
                completed_at: None,
                created_at: now,
                updated_at: now,
                version: 0,
            })
            .await?;

        tracing::info!(
            work_order_id = work_order.id,
            order_id = order.id,
            station = %work_order.station,
            quantity = work_order.quantity,
            "Work order created"
        );

        let view = WorkOrderView {
            work_order,
            order: Some(order),
        };
        self.hub.publish(FloorEvent::WoUpdated(view.clone()));
        Ok(view)
    }

    pub async fn get(&self, id: i64) -> FloorResult<WorkOrderView> {
        let work_order = self
            .store
            .work_orders
            .find_by_id(id)
            .await?
            .ok_or(FloorError::WorkOrderNotFound(id))?;
        self.view(work_order).await
    }

    /// All work orders with their orders, newest-updated first
    pub async fn list(&self) -> FloorResult<Vec<WorkOrderView>> {
        let work_orders = self.store.work_orders.list(OrderBy::UpdatedDesc).await?;
        let orders: HashMap<i64, Order> = self
            .store
            .orders
            .list(OrderBy::IdAsc)
            .await?
            .into_iter()
            .map(|o| (o.id, o))
            .collect();

        Ok(work_orders
            .into_iter()
            .map(|work_order| WorkOrderView {
                order: orders.get(&work_order.order_id).cloned(),
                work_order,
            })
            .collect())
    }

    /// Move a work order's status and/or progress
    ///
    /// Reads, validates against the transition table, and writes with a
    /// version compare-and-swap. Without `expected_version` a lost race is
    /// re-read and re-validated up to `max_retries` times; with it, any
    /// version mismatch fails with [`FloorError::Conflict`].
    pub async fn transition(
        &self,
        id: i64,
        update: WorkOrderStatusUpdate,
    ) -> FloorResult<WorkOrderView> {
        let request = TransitionRequest {
            status: update.status,
            progress: update.progress,
            operator_id: update.operator_id,
        };

        let mut attempt = 0;
        loop {
            let current = self
                .store
                .work_orders
                .find_by_id(id)
                .await?
                .ok_or(FloorError::WorkOrderNotFound(id))?;

            if let Some(expected) = update.expected_version
                && expected != current.version
            {
                return Err(FloorError::Conflict {
                    kind: "WorkOrder",
                    id,
                    expected,
                    actual: current.version,
                });
            }

            let next = machine::apply(&current, &request, now_millis())?;
            // Read before the write so a committed transition always yields its event
            let order = self.store.orders.find_by_id(current.order_id).await?;

            match self
                .store
                .work_orders
                .update(id, current.version, next)
                .await
            {
                Ok(saved) => {
                    tracing::info!(
                        work_order_id = id,
                        from = %current.status,
                        to = %saved.status,
                        progress = saved.progress,
                        version = saved.version,
                        "Work order transitioned"
                    );
                    let view = WorkOrderView {
                        work_order: saved,
                        order,
                    };
                    self.hub.publish(FloorEvent::WoUpdated(view.clone()));
                    return Ok(view);
                }
                Err(e @ StoreError::VersionConflict { .. }) => {
                    if update.expected_version.is_some() || attempt >= self.max_retries {
                        tracing::warn!(
                            work_order_id = id,
                            attempt,
                            error = %e,
                            "Work order transition lost the race"
                        );
                        return Err(e.into());
                    }
                    attempt += 1;
                    tracing::debug!(work_order_id = id, attempt, "Retrying work order transition");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn view(&self, work_order: WorkOrder) -> FloorResult<WorkOrderView> {
        let order = self.store.orders.find_by_id(work_order.order_id).await?;
        Ok(WorkOrderView { work_order, order })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::OrderService;
    use chrono::NaiveDate;
    use shared::models::WorkOrderStatus::{Completed, InProgress, Pending};
    use crate::store::tests::{sample_order, sample_work_order};
    use crate::store::{Filter, MemoryTable, StoreResult, Table};
    use async_trait::async_trait;
    use shared::models::{OrderCreate, Station};
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    struct Fixture {
        service: WorkOrderService,
        sub: crate::message::Subscription,
        order_id: i64,
    }

    async fn fixture(max_retries: u32) -> Fixture {
        let store = Store::in_memory();
        let hub = Arc::new(EventHub::new(64));
        let orders = OrderService::new(store.clone());
        let order = orders
            .create(OrderCreate {
                customer: "ABC Construction".into(),
                delivery_date: NaiveDate::from_ymd_opt(2023, 8, 15).unwrap(),
                status: None,
            })
            .await
            .unwrap();
        let sub = hub.subscribe();
        Fixture {
            service: WorkOrderService::new(store, hub, max_retries),
            sub,
            order_id: order.id,
        }
    }

    fn create_input(order_id: i64) -> WorkOrderCreate {
        WorkOrderCreate {
            order_id,
            product: "Linear Grill 200x50".into(),
            quantity: 50,
            station: Station::Cutting,
        }
    }

    fn update(status: Option<WorkOrderStatus>, progress: Option<i64>) -> WorkOrderStatusUpdate {
        WorkOrderStatusUpdate {
            status,
            progress,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_starts_pending() {
        let mut f = fixture(3).await;
        let view = f.service.create(create_input(f.order_id)).await.unwrap();
        assert_eq!(view.work_order.status, Pending);
        assert_eq!(view.work_order.progress, 0);
        assert_eq!(view.work_order.version, 1);
        assert_eq!(view.order.as_ref().unwrap().customer, "ABC Construction");

        let event = f.sub.rx.try_recv().unwrap();
        assert_eq!(event, FloorEvent::WoUpdated(view));
        assert!(f.sub.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_create_validation() {
        let f = fixture(3).await;

        let mut input = create_input(f.order_id);
        input.product = "   ".into();
        assert!(matches!(
            f.service.create(input).await,
            Err(FloorError::Validation(_))
        ));

        let mut input = create_input(f.order_id);
        input.quantity = 0;
        assert!(matches!(
            f.service.create(input).await,
            Err(FloorError::Validation(_))
        ));

        assert!(matches!(
            f.service.create(create_input(999)).await,
            Err(FloorError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_full_lifecycle_publishes_once_per_step() {
        let mut f = fixture(3).await;
        let id = f.service.create(create_input(f.order_id)).await.unwrap().work_order.id;

        let started = f
            .service
            .transition(id, update(Some(InProgress), Some(45)))
            .await
            .unwrap();
        assert_eq!(started.work_order.progress, 45);

        let done = f
            .service
            .transition(id, update(Some(Completed), None))
            .await
            .unwrap();
        assert_eq!(done.work_order.progress, 100);
        assert!(done.work_order.completed_at.is_some());
        assert_eq!(done.work_order.version, 3);

        let versions: Vec<u64> = std::iter::from_fn(|| f.sub.rx.try_recv().ok())
            .map(|e| e.version())
            .collect();
        assert_eq!(versions, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_transition_errors() {
        let f = fixture(3).await;
        let id = f.service.create(create_input(f.order_id)).await.unwrap().work_order.id;

        assert!(matches!(
            f.service.transition(404, update(Some(InProgress), None)).await,
            Err(FloorError::WorkOrderNotFound(404))
        ));
        assert!(matches!(
            f.service.transition(id, update(Some(Completed), None)).await,
            Err(FloorError::InvalidTransition { .. })
        ));

        f.service
            .transition(id, update(Some(InProgress), None))
            .await
            .unwrap();
        f.service
            .transition(id, update(Some(Completed), None))
            .await
            .unwrap();
        assert!(matches!(
            f.service.transition(id, update(Some(Pending), None)).await,
            Err(FloorError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_stale_expected_version_conflicts() {
        let mut f = fixture(3).await;
        let id = f.service.create(create_input(f.order_id)).await.unwrap().work_order.id;
        f.service
            .transition(id, update(Some(InProgress), Some(10)))
            .await
            .unwrap();
        while f.sub.rx.try_recv().is_ok() {}

        let stale = WorkOrderStatusUpdate {
            progress: Some(50),
            expected_version: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            f.service.transition(id, stale).await,
            Err(FloorError::Conflict {
                expected: 1,
                actual: 2,
                ..
            })
        ));
        // Failed mutations publish nothing
        assert!(f.sub.rx.try_recv().is_err());

        let fresh = WorkOrderStatusUpdate {
            progress: Some(50),
            expected_version: Some(2),
            ..Default::default()
        };
        let view = f.service.transition(id, fresh).await.unwrap();
        assert_eq!(view.work_order.progress, 50);
    }

    /// Orders table that fails every read once `reads_left` is spent
    struct ReadLimitedOrders {
        inner: MemoryTable<Order>,
        reads_left: AtomicUsize,
    }

    #[async_trait]
    impl Table<Order> for ReadLimitedOrders {
        async fn insert(&self, entity: Order) -> StoreResult<Order> {
            self.inner.insert(entity).await
        }

        async fn find_by_id(&self, id: i64) -> StoreResult<Option<Order>> {
            let allowed = self
                .reads_left
                .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |n| {
                    n.checked_sub(1)
                })
                .is_ok();
            if !allowed {
                return Err(StoreError::Io(std::io::Error::other("orders unavailable")));
            }
            self.inner.find_by_id(id).await
        }

        async fn find_all(
            &self,
            filter: Filter<'_, Order>,
            order_by: OrderBy,
        ) -> StoreResult<Vec<Order>> {
            self.inner.find_all(filter, order_by).await
        }

        async fn count(&self, filter: Filter<'_, Order>) -> StoreResult<usize> {
            self.inner.count(filter).await
        }

        async fn update(&self, id: i64, expected_version: u64, entity: Order) -> StoreResult<Order> {
            self.inner.update(id, expected_version, entity).await
        }
    }

    #[tokio::test]
    async fn test_committed_transition_always_publishes() {
        let orders = Arc::new(ReadLimitedOrders {
            inner: MemoryTable::new(),
            reads_left: AtomicUsize::new(1),
        });
        let order = orders.insert(sample_order("ABC Construction")).await.unwrap();
        let store = Store {
            orders,
            ..Store::in_memory()
        };
        let wo = store
            .work_orders
            .insert(sample_work_order(order.id, 1))
            .await
            .unwrap();
        let hub = Arc::new(EventHub::new(8));
        let mut sub = hub.subscribe();
        let service = WorkOrderService::new(store.clone(), hub, 3);

        let view = service
            .transition(wo.id, update(Some(InProgress), Some(20)))
            .await
            .unwrap();
        assert_eq!(view.order.as_ref().map(|o| o.id), Some(order.id));
        assert_eq!(sub.rx.try_recv().unwrap(), FloorEvent::WoUpdated(view));

        // Order lookup fails: nothing is written and nothing is published
        let err = service
            .transition(wo.id, update(None, Some(40)))
            .await
            .unwrap_err();
        assert!(matches!(err, FloorError::Store(_)));
        let stored = store.work_orders.find_by_id(wo.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 2);
        assert!(sub.rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_transitions_account_for_every_success() {
        let f = fixture(3).await;
        let id = f.service.create(create_input(f.order_id)).await.unwrap().work_order.id;
        f.service
            .transition(id, update(Some(InProgress), None))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for p in 1..=8 {
            let service = f.service.clone();
            handles.push(tokio::spawn(async move {
                service.transition(id, update(None, Some(p * 10))).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(FloorError::Conflict { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        let final_view = f.service.get(id).await.unwrap();
        assert_eq!(final_view.work_order.version, 2 + successes);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let f = fixture(3).await;
        let first = f.service.create(create_input(f.order_id)).await.unwrap().work_order.id;
        let second = f.service.create(create_input(f.order_id)).await.unwrap().work_order.id;
        f.service
            .transition(first, update(Some(InProgress), None))
            .await
            .unwrap();

        let ids: Vec<i64> = f
            .service
            .list()
            .await
            .unwrap()
            .iter()
            .map(|v| v.work_order.id)
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&first) && ids.contains(&second));
        assert!(f.service.list().await.unwrap().iter().all(|v| v.order.is_some()));
    }
}
