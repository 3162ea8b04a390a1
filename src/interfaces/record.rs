//! Positioned record capability.

use crate::scope::Scope;

/// Identity of a persisted record.
pub type RecordId = i64;

/// A record whose position is maintained by the `PositionManager`.
///
/// Implemented once per record type. `scope()` replaces any runtime field
/// lookup: the record type decides which of its fields forms the scope key.
pub trait Positioned {
    /// Persisted identity, `None` while the record is a pending insert.
    fn id(&self) -> Option<RecordId>;

    fn set_id(&mut self, id: RecordId);

    /// Current (possibly not yet persisted) scope.
    fn scope(&self) -> Scope;

    fn set_scope(&mut self, scope: Scope);

    /// Current (possibly not yet persisted) position, `None` when unpositioned.
    fn position(&self) -> Option<i64>;

    fn set_position(&mut self, position: i64);

    /// Capture the in-memory state as a snapshot.
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            id: self.id(),
            scope: self.scope(),
            position: self.position(),
        }
    }
}

/// Point-in-time view of a record's positioning fields.
///
/// Used as the "was" state of an in-flight update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub id: Option<RecordId>,
    pub scope: Scope,
    pub position: Option<i64>,
}

impl Snapshot {
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// A row as returned by a record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow {
    pub id: RecordId,
    pub scope: Scope,
    pub position: i64,
}

impl From<&RecordRow> for Snapshot {
    fn from(row: &RecordRow) -> Self {
        Snapshot {
            id: Some(row.id),
            scope: row.scope.clone(),
            position: Some(row.position),
        }
    }
}

/// Minimal positioned record: identity, scope and position only.
///
/// Useful when the positioned table carries no other columns the caller
/// cares about, and in tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub id: Option<RecordId>,
    pub scope: Scope,
    pub position: Option<i64>,
}

impl Entry {
    /// A new, unpersisted entry in `scope`.
    pub fn new(scope: Scope) -> Self {
        Self {
            id: None,
            scope,
            position: None,
        }
    }
}

impl From<RecordRow> for Entry {
    fn from(row: RecordRow) -> Self {
        Self {
            id: Some(row.id),
            scope: row.scope,
            position: Some(row.position),
        }
    }
}

impl Positioned for Entry {
    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    fn scope(&self) -> Scope {
        self.scope.clone()
    }

    fn set_scope(&mut self, scope: Scope) {
        self.scope = scope;
    }

    fn position(&self) -> Option<i64> {
        self.position
    }

    fn set_position(&mut self, position: i64) {
        self.position = Some(position);
    }
}
