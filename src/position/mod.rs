//! Gapless position maintenance.
//!
//! After every committed operation the positions of each scope are exactly
//! `start, start + 1, ..., start + count - 1`. The planner (`plan`) decides
//! which siblings move; the `PositionManager` fetches counts, plans and applies
//! the shifts inside a single store transaction.

pub mod audit;
mod manager;
pub mod plan;
pub mod range;


pub use audit::Audit;
pub use manager::PositionManager;
pub use plan::{Outcome, Plan, Shift};
pub use range::PositionRange;

use crate::interfaces::StorageError;

/// Result type for position operations.
pub type Result<T> = std::result::Result<T, PositionError>;

/// Errors raised by the position manager.
#[derive(Debug, thiserror::Error)]
pub enum PositionError {
    /// A range was requested for an unpersisted record with no scope key and
    /// no explicit target scope.
    #[error("Cannot compute a position range without a scope")]
    MissingScope,

    #[error("Record has not been persisted")]
    NotPersisted,

    /// The scope key cannot be stored in the configured scope column.
    #[error("Scope key does not fit the scope column: {0}")]
    InvalidScope(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
