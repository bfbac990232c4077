//! Store adapter
//!
//! Versioned row storage for orders, work orders and downtime logs.
//!
//! # Contents
//!
//! - [`Table`] - async row API with compare-and-swap updates
//! - [`MemoryTable`] - arena-backed table for tests and ephemeral runs
//! - [`RedbTable`] - embedded redb table, one write transaction per mutation
//! - [`Store`] - the three tables the floor works with
//!
//! Every row carries a `version`. `insert` starts it at 1 and each successful
//! `update` bumps it by one, failing with [`StoreError::VersionConflict`] when
//! the caller's expected version is stale.

mod memory;
mod redb_table;

pub use memory::MemoryTable;
pub use redb_table::RedbTable;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::models::{DowntimeLog, Order, WorkOrder};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("{kind} {id} was modified: expected version {expected}, found {actual}")]
    VersionConflict {
        kind: &'static str,
        id: i64,
        expected: u64,
        actual: u64,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A row type the store can persist
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Table name (redb table and sequence key)
    const TABLE: &'static str;
    /// Human-readable kind used in errors and logs
    const KIND: &'static str;

    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
    fn version(&self) -> u64;
    fn set_version(&mut self, version: u64);
    fn updated_at(&self) -> i64;
}

/// Row predicate for queries
pub type Filter<'a, E> = &'a (dyn Fn(&E) -> bool + Send + Sync);

/// Result ordering for [`Table::find_all`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    IdAsc,
    /// Newest-updated first, id descending on ties
    UpdatedDesc,
}

impl OrderBy {
    pub(crate) fn sort<E: Entity>(self, rows: &mut [E]) {
        match self {
            OrderBy::IdAsc => rows.sort_by_key(|e| e.id()),
            OrderBy::UpdatedDesc => rows.sort_by(|a, b| {
                b.updated_at()
                    .cmp(&a.updated_at())
                    .then_with(|| b.id().cmp(&a.id()))
            }),
        }
    }
}

/// Versioned table of one entity kind
#[async_trait]
pub trait Table<E: Entity>: Send + Sync {
    /// Assign the next id, set version 1 and persist
    async fn insert(&self, entity: E) -> StoreResult<E>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<E>>;

    async fn find_all(&self, filter: Filter<'_, E>, order_by: OrderBy) -> StoreResult<Vec<E>>;

    /// Every row
    async fn list(&self, order_by: OrderBy) -> StoreResult<Vec<E>> {
        self.find_all(&|_: &E| true, order_by).await
    }

    async fn count(&self, filter: Filter<'_, E>) -> StoreResult<usize>;

    /// Compare-and-swap write: replaces row `id` when its stored version equals
    /// `expected_version`, returning the row with the bumped version
    async fn update(&self, id: i64, expected_version: u64, entity: E) -> StoreResult<E>;
}

/// The floor's tables
#[derive(Clone)]
pub struct Store {
    pub orders: Arc<dyn Table<Order>>,
    pub work_orders: Arc<dyn Table<WorkOrder>>,
    pub downtime_logs: Arc<dyn Table<DowntimeLog>>,
}

impl Store {
    /// Non-persistent store
    pub fn in_memory() -> Self {
        Self {
            orders: Arc::new(MemoryTable::new()),
            work_orders: Arc::new(MemoryTable::new()),
            downtime_logs: Arc::new(MemoryTable::new()),
        }
    }

    /// Open or create the redb database at `path`, creating parent directories
    pub fn open_redb(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = redb::Database::create(path)?;
        Self::from_redb(db)
    }

    /// redb store on an in-memory backend (for testing)
    #[cfg(test)]
    pub fn redb_in_memory() -> StoreResult<Self> {
        let db = redb::Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::from_redb(db)
    }

    fn from_redb(db: redb::Database) -> StoreResult<Self> {
        let db = Arc::new(db);
        let orders = RedbTable::<Order>::new(db.clone())?;
        let work_orders = RedbTable::<WorkOrder>::new(db.clone())?;
        let downtime_logs = RedbTable::<DowntimeLog>::new(db)?;
        Ok(Self {
            orders: Arc::new(orders),
            work_orders: Arc::new(work_orders),
            downtime_logs: Arc::new(downtime_logs),
        })
    }
}

// ========== Entity impls ==========

macro_rules! impl_entity {
    ($ty:ty, $table:literal, $kind:literal) => {
        impl Entity for $ty {
            const TABLE: &'static str = $table;
            const KIND: &'static str = $kind;

            fn id(&self) -> i64 {
                self.id
            }
            fn set_id(&mut self, id: i64) {
                self.id = id;
            }
            fn version(&self) -> u64 {
                self.version
            }
            fn set_version(&mut self, version: u64) {
                self.version = version;
            }
            fn updated_at(&self) -> i64 {
                self.updated_at
            }
        }
    };
}

impl_entity!(Order, "orders", "Order");
impl_entity!(WorkOrder, "work_orders", "WorkOrder");
impl_entity!(DowntimeLog, "downtime_logs", "DowntimeLog");
