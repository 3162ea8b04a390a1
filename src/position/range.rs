//! Valid position ranges.

use std::ops::RangeInclusive;

use super::{PositionError, Result};
use crate::config::PositionConfig;
use crate::interfaces::Positioned;
use crate::scope::Scope;

/// Inclusive interval of positions a record may take.
pub type PositionRange = RangeInclusive<i64>;

/// Position of the last record of a scope holding `count` records.
///
/// `start - 1` for an empty scope.
pub fn bottom(start: i64, count: i64) -> i64 {
    start + count - 1
}

/// Valid positions for a record within `target`, which holds `count` records.
///
/// `resident` is the scope the record currently occupies a slot in, `None` for
/// a pending insert. A record entering `target` gets one extra slot.
pub fn position_range(
    start: i64,
    resident: Option<&Scope>,
    target: &Scope,
    count: i64,
) -> PositionRange {
    match resident {
        Some(scope) if scope == target => start..=bottom(start, count),
        _ => start..=bottom(start, count) + 1,
    }
}

/// Scope a range query should count against.
///
/// An explicit target wins. Otherwise the record's own scope is used, unless
/// the record is unpersisted and carries no scope key in a scoped type.
pub fn target_scope<R: Positioned + ?Sized>(
    config: &PositionConfig,
    record: &R,
    target: Option<&Scope>,
) -> Result<Scope> {
    if let Some(scope) = target {
        return Ok(scope.clone());
    }
    let scope = record.scope();
    if config.is_scoped() && record.id().is_none() && scope.is_absent() {
        return Err(PositionError::MissingScope);
    }
    Ok(scope)
}
