//! Mock storage implementations for testing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::SortOrder;
use crate::interfaces::record_store::Result;
use crate::interfaces::{
    Interval, RecordId, RecordRow, RecordStore, StorageError, StoreTransaction,
};
use crate::scope::Scope;


/// Table contents: rows by id plus the next id to hand out.
#[derive(Debug, Clone, Default)]
struct MockTable {
    rows: BTreeMap<RecordId, RecordRow>,
    next_id: RecordId,
}

impl MockTable {
    fn scoped<'a>(&'a self, scope: &'a Scope) -> impl Iterator<Item = &'a RecordRow> + 'a {
        self.rows.values().filter(move |row| row.scope == *scope)
    }
}

/// Mock record store that keeps rows in memory.
///
/// A transaction holds the table lock from `begin` until it is committed or
/// dropped, so transactions are fully serialized. Writes go to a private copy
/// that replaces the table on commit.
#[derive(Default)]
pub struct MockRecordStore {
    table: Arc<Mutex<MockTable>>,
    fail_on_begin: AtomicBool,
    fail_on_commit: Arc<AtomicBool>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_on_begin(&self, fail: bool) {
        self.fail_on_begin.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_on_commit(&self, fail: bool) {
        self.fail_on_commit.store(fail, Ordering::SeqCst);
    }

    /// All committed rows of `scope`, by ascending position.
    pub async fn rows(&self, scope: &Scope) -> Vec<RecordRow> {
        let table = self.table.lock().await;
        let mut rows: Vec<RecordRow> = table.scoped(scope).cloned().collect();
        rows.sort_by_key(|row| (row.position, row.id));
        rows
    }

    /// Committed position of a row.
    pub async fn position_of(&self, id: RecordId) -> Option<i64> {
        self.table.lock().await.rows.get(&id).map(|row| row.position)
    }

    /// Insert a row verbatim, bypassing position maintenance.
    pub async fn insert_raw(&self, scope: Scope, position: i64) -> RecordId {
        let mut table = self.table.lock().await;
        table.next_id += 1;
        let id = table.next_id;
        table.rows.insert(
            id,
            RecordRow {
                id,
                scope,
                position,
            },
        );
        id
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        if self.fail_on_begin.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("mock store offline".to_string()));
        }
        let guard = Arc::clone(&self.table).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MockTransaction {
            guard,
            working,
            fail_on_commit: Arc::clone(&self.fail_on_commit),
        }))
    }

    async fn scopes(&self) -> Result<Vec<Scope>> {
        let table = self.table.lock().await;
        let mut scopes: Vec<Scope> = table.rows.values().map(|row| row.scope.clone()).collect();
        scopes.sort();
        scopes.dedup();
        Ok(scopes)
    }
}

/// Transaction over a `MockRecordStore`.
pub struct MockTransaction {
    guard: OwnedMutexGuard<MockTable>,
    working: MockTable,
    fail_on_commit: Arc<AtomicBool>,
}

#[async_trait]
impl StoreTransaction for MockTransaction {
    async fn count(&mut self, scope: &Scope) -> Result<i64> {
        Ok(self.working.scoped(scope).count() as i64)
    }

    async fn fetch(&mut self, id: RecordId) -> Result<Option<RecordRow>> {
        Ok(self.working.rows.get(&id).cloned())
    }

    async fn find_at(&mut self, scope: &Scope, position: i64) -> Result<Option<RecordRow>> {
        Ok(self
            .working
            .scoped(scope)
            .find(|row| row.position == position)
            .cloned())
    }

    async fn find_range(
        &mut self,
        scope: &Scope,
        interval: Interval,
        order: SortOrder,
    ) -> Result<Vec<RecordRow>> {
        let mut rows: Vec<RecordRow> = self
            .working
            .scoped(scope)
            .filter(|row| interval.contains(row.position))
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.position);
        if order == SortOrder::Desc {
            rows.reverse();
        }
        Ok(rows)
    }

    async fn shift(&mut self, scope: &Scope, interval: Interval, delta: i64) -> Result<u64> {
        let mut shifted = 0;
        for row in self.working.rows.values_mut() {
            if row.scope == *scope && interval.contains(row.position) {
                row.position += delta;
                shifted += 1;
            }
        }
        Ok(shifted)
    }

    async fn insert_row(&mut self, scope: &Scope, position: i64) -> Result<RecordId> {
        self.working.next_id += 1;
        let id = self.working.next_id;
        self.working.rows.insert(
            id,
            RecordRow {
                id,
                scope: scope.clone(),
                position,
            },
        );
        Ok(id)
    }

    async fn update_row(&mut self, id: RecordId, scope: &Scope, position: i64) -> Result<()> {
        let row = self
            .working
            .rows
            .get_mut(&id)
            .ok_or(StorageError::NotFound(id))?;
        row.scope = scope.clone();
        row.position = position;
        Ok(())
    }

    async fn delete_row(&mut self, id: RecordId) -> Result<()> {
        self.working
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound(id))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        if self.fail_on_commit.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("commit rejected".to_string()));
        }
        let MockTransaction {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
