//! Scope values.
//!
//! A scope is the partition of records sharing the same grouping key. It is
//! never stored on its own; it is derived from the scope column of each row.
//! Two records share a scope iff their keys are equal, and two records with
//! no key share the "absent" scope.

use std::fmt;

use uuid::Uuid;

use crate::config::ScopeKind;

/// A single scope key value as found in the scope column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScopeKey {
    /// Integer keys (typically a foreign key id).
    Int(i64),
    /// Text keys (names, UUIDs, slugs).
    Text(String),
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKey::Int(value) => write!(f, "{}", value),
            ScopeKey::Text(value) => write!(f, "{:?}", value),
        }
    }
}

impl ScopeKey {
    /// The same key as stored in a column of `kind`.
    ///
    /// `None` when a text key does not parse as an integer.
    pub fn to_kind(&self, kind: ScopeKind) -> Option<ScopeKey> {
        match (kind, self) {
            (ScopeKind::Integer, ScopeKey::Int(_)) | (ScopeKind::Text, ScopeKey::Text(_)) => {
                Some(self.clone())
            }
            (ScopeKind::Integer, ScopeKey::Text(text)) => text.parse().ok().map(ScopeKey::Int),
            (ScopeKind::Text, ScopeKey::Int(value)) => Some(ScopeKey::Text(value.to_string())),
        }
    }
}

impl From<i64> for ScopeKey {
    fn from(value: i64) -> Self {
        ScopeKey::Int(value)
    }
}

impl From<i32> for ScopeKey {
    fn from(value: i32) -> Self {
        ScopeKey::Int(i64::from(value))
    }
}

impl From<String> for ScopeKey {
    fn from(value: String) -> Self {
        ScopeKey::Text(value)
    }
}

impl From<&str> for ScopeKey {
    fn from(value: &str) -> Self {
        ScopeKey::Text(value.to_string())
    }
}

impl From<Uuid> for ScopeKey {
    fn from(value: Uuid) -> Self {
        ScopeKey::Text(value.to_string())
    }
}

/// The scope a record belongs to.
///
/// `Scope::absent()` is a real scope: every record without a key belongs to
/// it, and it compares equal to itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scope(Option<ScopeKey>);

impl Scope {
    /// The scope of records without a scope key.
    pub const fn absent() -> Self {
        Scope(None)
    }

    /// The scope identified by `key`.
    pub fn of(key: impl Into<ScopeKey>) -> Self {
        Scope(Some(key.into()))
    }

    pub fn key(&self) -> Option<&ScopeKey> {
        self.0.as_ref()
    }

    pub fn is_absent(&self) -> bool {
        self.0.is_none()
    }

    /// The same scope with its key converted for a column of `kind`.
    ///
    /// Two scopes that read back as the same column value compare equal only
    /// after conversion. `None` when the key does not fit the column.
    pub fn to_kind(&self, kind: ScopeKind) -> Option<Scope> {
        match &self.0 {
            None => Some(Scope::absent()),
            Some(key) => key.to_kind(kind).map(|key| Scope(Some(key))),
        }
    }
}

impl From<Option<ScopeKey>> for Scope {
    fn from(value: Option<ScopeKey>) -> Self {
        Scope(value)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(key) => write!(f, "{}", key),
            None => f.write_str("<absent>"),
        }
    }
}
