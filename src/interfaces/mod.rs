//! Abstract interfaces for positional components.
//!
//! These traits define the contracts for:
//! - Positioned records (identity, scope and position capability)
//! - Record storage (scoped queries, bulk shifts, transactions)

pub mod record;
pub mod record_store;

pub use record::{Entry, Positioned, RecordId, RecordRow, Snapshot};
pub use record_store::{Interval, RecordStore, StorageError, StoreTransaction};
