//! Server state
//!
//! One [`ServerState`] is built at start-up and cloned into every handler.
//! All fields are cheap handles onto shared resources.

use std::sync::Arc;

use shared::message::ServerMessage;

use crate::core::{Config, FloorResult, StoreBackend};
use crate::dashboard::DashboardAggregator;
use crate::downtime::{DowntimeManager, DowntimePolicy};
use crate::message::EventHub;
use crate::planning::OrderService;
use crate::seed::seed_demo_data;
use crate::store::Store;
use crate::workorders::WorkOrderService;

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub store: Store,
    pub hub: Arc<EventHub>,
    pub orders: OrderService,
    pub work_orders: WorkOrderService,
    pub downtime: DowntimeManager,
    pub dashboard: DashboardAggregator,
    /// Random per-process id, lets observers notice a restart
    pub epoch: String,
}

impl ServerState {
    /// Wire services onto an already opened store
    pub fn new(config: Config, store: Store) -> Self {
        let hub = Arc::new(EventHub::new(config.observer_channel_capacity));
        let policy = if config.downtime_single_active {
            DowntimePolicy::SingleActive
        } else {
            DowntimePolicy::Permissive
        };

        Self {
            orders: OrderService::new(store.clone()),
            work_orders: WorkOrderService::new(
                store.clone(),
                hub.clone(),
                config.transition_max_retries,
            ),
            downtime: DowntimeManager::new(
                store.clone(),
                hub.clone(),
                policy,
                config.transition_max_retries,
            ),
            dashboard: DashboardAggregator::new(store.clone(), config.business_tz),
            epoch: uuid::Uuid::new_v4().to_string(),
            config,
            store,
            hub,
        }
    }

    /// Open the configured store, wire services and seed demo data if asked to
    pub async fn initialize(config: &Config) -> FloorResult<Self> {
        let store = match config.store_backend {
            StoreBackend::Redb => {
                let path = config.db_path();
                tracing::info!(path = %path.display(), "Opening redb store");
                Store::open_redb(&path)?
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store, data is lost on restart");
                Store::in_memory()
            }
        };

        let state = Self::new(config.clone(), store);
        tracing::info!(epoch = %state.epoch, "Server state initialized");

        if config.seed_demo_data {
            seed_demo_data(&state.orders, &state.work_orders).await?;
        }

        Ok(state)
    }

    /// Memory-backed state with default config
    pub fn in_memory() -> Self {
        Self::new(Config::ephemeral(), Store::in_memory())
    }

    /// Full snapshot sent to an observer on connect and after it lagged
    pub async fn ready_snapshot(&self) -> FloorResult<ServerMessage> {
        Ok(ServerMessage::Ready {
            epoch: self.epoch.clone(),
            work_orders: self.work_orders.list().await?,
            stats: self.dashboard.stats().await?,
            active_downtime: self.downtime.list(true).await?,
        })
    }
}
