//! Positional - gapless, scoped record ordering
//!
//! Keeps an integer position on every record of a table so that, within
//! each scope, positions always form the contiguous run
//! `start, start + 1, ..., start + count - 1`. Records can be appended,
//! moved, swapped with neighbors, transferred between scopes and deleted
//! without ever leaving gaps or duplicates.

pub mod config;
pub mod interfaces;
pub mod position;
pub mod scope;
pub mod storage;
pub mod utils;

pub use config::{Config, PositionConfig, SortOrder};
pub use interfaces::{Entry, Positioned, RecordId, RecordRow, RecordStore, Snapshot};
pub use position::{Audit, PositionError, PositionManager, PositionRange};
pub use scope::{Scope, ScopeKey};
pub use storage::init_storage;
