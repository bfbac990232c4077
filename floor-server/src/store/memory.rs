use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Entity, Filter, OrderBy, StoreError, StoreResult, Table};

/// Arena-backed table
///
/// Rows live in a `Vec` indexed by `id - 1`; ids are never reused because
/// rows are never deleted. The lock is only taken inside synchronous sections.
pub struct MemoryTable<E> {
    rows: RwLock<Vec<E>>,
}

impl<E> MemoryTable<E> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl<E> Default for MemoryTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn slot(id: i64) -> Option<usize> {
    usize::try_from(id).ok()?.checked_sub(1)
}

#[async_trait]
impl<E: Entity> Table<E> for MemoryTable<E> {
    async fn insert(&self, mut entity: E) -> StoreResult<E> {
        let mut rows = self.rows.write();
        entity.set_id(rows.len() as i64 + 1);
        entity.set_version(1);
        rows.push(entity.clone());
        Ok(entity)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<E>> {
        let rows = self.rows.read();
        Ok(slot(id).and_then(|i| rows.get(i)).cloned())
    }

    async fn find_all(&self, filter: Filter<'_, E>, order_by: OrderBy) -> StoreResult<Vec<E>> {
        let mut matched: Vec<E> = self
            .rows
            .read()
            .iter()
            .filter(|e| filter(e))
            .cloned()
            .collect();
        order_by.sort(&mut matched);
        Ok(matched)
    }

    async fn count(&self, filter: Filter<'_, E>) -> StoreResult<usize> {
        Ok(self.rows.read().iter().filter(|e| filter(e)).count())
    }

    async fn update(&self, id: i64, expected_version: u64, mut entity: E) -> StoreResult<E> {
        let mut rows = self.rows.write();
        let row = slot(id)
            .and_then(|i| rows.get_mut(i))
            .ok_or(StoreError::NotFound { kind: E::KIND, id })?;

        if row.version() != expected_version {
            return Err(StoreError::VersionConflict {
                kind: E::KIND,
                id,
                expected: expected_version,
                actual: row.version(),
            });
        }

        entity.set_id(id);
        entity.set_version(expected_version + 1);
        *row = entity.clone();
        Ok(entity)
    }
}
