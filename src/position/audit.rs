//! Contiguity audit.

use std::collections::BTreeMap;

use crate::scope::Scope;

/// Result of checking one scope against the contiguity invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Audit {
    pub scope: Scope,
    pub count: usize,
    /// Positions held by more than one record.
    pub duplicates: Vec<i64>,
    /// Positions of `[start, start + count - 1]` held by no record.
    pub missing: Vec<i64>,
    /// Positions held outside `[start, start + count - 1]`.
    pub stray: Vec<i64>,
}

impl Audit {
    pub fn is_contiguous(&self) -> bool {
        self.duplicates.is_empty() && self.missing.is_empty() && self.stray.is_empty()
    }
}

/// Check that `positions` are exactly `{start, ..., start + len - 1}`.
pub fn check(start: i64, scope: Scope, positions: &[i64]) -> Audit {
    let mut seen: BTreeMap<i64, usize> = BTreeMap::new();
    for position in positions {
        *seen.entry(*position).or_default() += 1;
    }

    let end = start + positions.len() as i64;
    let duplicates = seen
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(position, _)| *position)
        .collect();
    let missing = (start..end).filter(|p| !seen.contains_key(p)).collect();
    let stray = seen
        .keys()
        .filter(|p| **p < start || **p >= end)
        .copied()
        .collect();

    Audit {
        scope,
        count: positions.len(),
        duplicates,
        missing,
        stray,
    }
}
