//! redb-backed tables
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | id | JSON `Order` | Orders |
//! | `work_orders` | id | JSON `WorkOrder` | Work orders |
//! | `downtime_logs` | id | JSON `DowntimeLog` | Downtime incidents |
//! | `sequences` | table name | `u64` | Last assigned id per table |
//!
//! Every insert/update runs in its own write transaction. redb serializes
//! writers, so the version check and the write in `update` are atomic.

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::marker::PhantomData;
use std::sync::Arc;

use super::{Entity, Filter, OrderBy, StoreError, StoreResult, Table};

/// Last assigned id per table: key = table name
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequences");

/// One entity kind stored as JSON rows keyed by id
pub struct RedbTable<E> {
    db: Arc<Database>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> RedbTable<E> {
    /// Wrap a shared database, creating the table if it doesn't exist
    pub fn new(db: Arc<Database>) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(Self::definition())?;
            let _ = write_txn.open_table(SEQUENCE_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db,
            _entity: PhantomData,
        })
    }

    fn definition() -> TableDefinition<'static, u64, &'static [u8]> {
        TableDefinition::new(E::TABLE)
    }

    fn key(id: i64) -> Option<u64> {
        u64::try_from(id).ok().filter(|k| *k > 0)
    }
}

#[async_trait]
impl<E: Entity> Table<E> for RedbTable<E> {
    async fn insert(&self, mut entity: E) -> StoreResult<E> {
        let txn = self.db.begin_write()?;
        {
            let mut seq = txn.open_table(SEQUENCE_TABLE)?;
            let next = seq.get(E::TABLE)?.map(|g| g.value()).unwrap_or(0) + 1;
            seq.insert(E::TABLE, next)?;

            entity.set_id(next as i64);
            entity.set_version(1);
            let bytes = serde_json::to_vec(&entity)?;
            let mut table = txn.open_table(Self::definition())?;
            table.insert(next, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(entity)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<E>> {
        let Some(key) = Self::key(id) else {
            return Ok(None);
        };
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(Self::definition())?;
        match table.get(key)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self, filter: Filter<'_, E>, order_by: OrderBy) -> StoreResult<Vec<E>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(Self::definition())?;
        let mut matched = Vec::new();
        for row in table.iter()? {
            let (_, value) = row?;
            let entity: E = serde_json::from_slice(value.value())?;
            if filter(&entity) {
                matched.push(entity);
            }
        }
        order_by.sort(&mut matched);
        Ok(matched)
    }

    async fn count(&self, filter: Filter<'_, E>) -> StoreResult<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(Self::definition())?;
        let mut count = 0;
        for row in table.iter()? {
            let (_, value) = row?;
            let entity: E = serde_json::from_slice(value.value())?;
            if filter(&entity) {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn update(&self, id: i64, expected_version: u64, mut entity: E) -> StoreResult<E> {
        let key = Self::key(id).ok_or(StoreError::NotFound { kind: E::KIND, id })?;

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(Self::definition())?;
            let current: E = match table.get(key)? {
                Some(guard) => serde_json::from_slice(guard.value())?,
                None => return Err(StoreError::NotFound { kind: E::KIND, id }),
            };

            if current.version() != expected_version {
                return Err(StoreError::VersionConflict {
                    kind: E::KIND,
                    id,
                    expected: expected_version,
                    actual: current.version(),
                });
            }

            entity.set_id(id);
            entity.set_version(expected_version + 1);
            let bytes = serde_json::to_vec(&entity)?;
            table.insert(key, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(entity)
    }
}
