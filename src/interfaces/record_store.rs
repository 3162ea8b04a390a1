//! Record storage interface.

use async_trait::async_trait;

use super::record::{RecordId, RecordRow};
use crate::config::SortOrder;
use crate::scope::Scope;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Record not found: id={0}")]
    NotFound(RecordId),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Scope key does not fit the scope column: {0}")]
    InvalidScope(String),

    #[error("Unsupported storage backend: {0}")]
    UnsupportedBackend(String),

    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Inclusive interval of positions. `None` bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Interval {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl Interval {
    /// `[from, to]`.
    pub fn between(from: i64, to: i64) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Every position strictly greater than `position`.
    pub fn above(position: i64) -> Self {
        Self {
            from: Some(position + 1),
            to: None,
        }
    }

    /// Every position strictly lower than `position`.
    pub fn below(position: i64) -> Self {
        Self {
            from: None,
            to: Some(position - 1),
        }
    }

    /// Every position greater than or equal to `position`.
    pub fn at_least(position: i64) -> Self {
        Self {
            from: Some(position),
            to: None,
        }
    }

    /// Every position.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, position: i64) -> bool {
        self.from.map_or(true, |from| position >= from) && self.to.map_or(true, |to| position <= to)
    }

    pub fn is_empty(&self) -> bool {
        matches!((self.from, self.to), (Some(from), Some(to)) if from > to)
    }
}

/// Interface for the table holding positioned records.
///
/// Every multi-row mutation goes through a `StoreTransaction`, which must
/// provide isolation between concurrent transactions touching the same scope.
///
/// Implementations:
/// - `SqlRecordStore<Sqlite>` / `SqlRecordStore<Postgres>`: SQL storage
/// - `MockRecordStore`: In-memory mock for testing
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Open a new transaction.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;

    /// Distinct scopes currently holding at least one record.
    async fn scopes(&self) -> Result<Vec<Scope>>;
}

/// Atomic unit of work against a `RecordStore`.
///
/// Nothing is visible to other transactions until `commit`. Dropping the
/// transaction without committing rolls it back.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Number of records in `scope`.
    async fn count(&mut self, scope: &Scope) -> Result<i64>;

    /// Load a row by identity.
    async fn fetch(&mut self, id: RecordId) -> Result<Option<RecordRow>>;

    /// The record of `scope` holding `position`, if any.
    async fn find_at(&mut self, scope: &Scope, position: i64) -> Result<Option<RecordRow>>;

    /// Records of `scope` whose position lies in `interval`, sorted by position.
    async fn find_range(
        &mut self,
        scope: &Scope,
        interval: Interval,
        order: SortOrder,
    ) -> Result<Vec<RecordRow>>;

    /// Add `delta` to the position of every record of `scope` in `interval`.
    ///
    /// Must run as a single set-based update. Returns the number of rows shifted.
    async fn shift(&mut self, scope: &Scope, interval: Interval, delta: i64) -> Result<u64>;

    /// Insert a new row and return its identity.
    async fn insert_row(&mut self, scope: &Scope, position: i64) -> Result<RecordId>;

    /// Overwrite the scope and position of an existing row.
    async fn update_row(&mut self, id: RecordId, scope: &Scope, position: i64) -> Result<()>;

    /// Remove a row.
    async fn delete_row(&mut self, id: RecordId) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}
