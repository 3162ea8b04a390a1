//! Positioning configuration types.
//!
//! One `PositionConfig` describes one positioned record type. It is built once
//! and handed to the `PositionManager`, which never mutates it.

use serde::Deserialize;

/// Read order of a scope when listed for display.
///
/// Only affects retrieval order. Stored positions always grow from `start`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Column type of the scope key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    #[default]
    Integer,
    Text,
}

/// The column that partitions records into scopes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScopeColumnConfig {
    /// Column name, e.g. `folder_id`.
    pub column: String,
    /// Column type.
    #[serde(default)]
    pub kind: ScopeKind,
}

/// Positioning configuration for one record type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PositionConfig {
    /// Position of the first record of every scope.
    pub start: i64,
    /// Display order used by listing.
    pub order: SortOrder,
    /// Scope column. `None` means the whole table is a single scope.
    pub scope: Option<ScopeColumnConfig>,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            start: 0,
            order: SortOrder::Asc,
            scope: None,
        }
    }
}

impl PositionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn scoped_by(mut self, column: impl Into<String>, kind: ScopeKind) -> Self {
        self.scope = Some(ScopeColumnConfig {
            column: column.into(),
            kind,
        });
        self
    }

    /// Whether records of this type are partitioned by a scope column.
    pub fn is_scoped(&self) -> bool {
        self.scope.is_some()
    }
}
