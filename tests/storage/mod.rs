//! Shared storage integration tests.
//!
//! Tests the RecordStore interface and the PositionManager against all SQL
//! implementations. Each backend module imports these test functions and runs
//! them.

pub mod manager_tests;
pub mod record_store_tests;

use positional::config::{PositionConfig, ScopeKind};

/// Scope column used by every contract test table.
pub const SCOPE_COLUMN: &str = "list_id";

/// Positioning of the contract test table.
pub fn test_positioning() -> PositionConfig {
    PositionConfig::new().scoped_by(SCOPE_COLUMN, ScopeKind::Integer)
}
