//! Position transition planning.
//!
//! Pure functions that turn "where a record is" and "where it should go" into
//! the bulk shifts its siblings need. Nothing here touches a store: callers
//! fetch the scope counts, plan, then apply the shifts inside one transaction.

use super::range::{bottom, position_range};
use crate::interfaces::Interval;
use crate::scope::Scope;

/// Add `delta` to every position of `scope` lying in `interval`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shift {
    pub scope: Scope,
    pub interval: Interval,
    pub delta: i64,
}

/// Where the record ends up once the shifts are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changes, the record keeps its slot.
    Unchanged,
    /// The requested position was rejected and the prior one restored.
    Reverted { position: i64 },
    /// The record takes `position` in `scope`.
    Placed { scope: Scope, position: i64 },
}

/// Shifts to apply, in order, and the resulting record placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub shifts: Vec<Shift>,
    pub outcome: Outcome,
}

impl Plan {
    fn unchanged() -> Self {
        Self {
            shifts: Vec::new(),
            outcome: Outcome::Unchanged,
        }
    }

    /// Whether applying the plan writes anything.
    pub fn is_noop(&self) -> bool {
        self.shifts.is_empty() && self.outcome == Outcome::Unchanged
    }
}

/// How an out-of-range request is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Explicit move: out of range means "do nothing".
    Move,
    /// Direct assignment of scope/position: out of range reverts the position
    /// within the same scope, or appends when the scope changed.
    Assign,
}

/// Where a record currently sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub scope: Scope,
    pub position: i64,
}

/// Position of a record appended to a scope holding `count` records.
pub fn append_position(start: i64, count: i64) -> i64 {
    bottom(start, count) + 1
}

/// Shift closing the gap left by a record leaving `position` of `scope`.
pub fn close_gap(scope: &Scope, position: i64) -> Shift {
    Shift {
        scope: scope.clone(),
        interval: Interval::above(position),
        delta: -1,
    }
}

/// Plan the transition of a resident record from `prior` to the requested
/// scope and position.
///
/// `target_count` is the current number of records in `target`, which
/// includes the record itself when `target` is its prior scope.
pub fn plan_transition(
    start: i64,
    prior: &Placement,
    target: &Scope,
    requested: Option<i64>,
    target_count: i64,
    request: Request,
) -> Plan {
    let range = position_range(start, Some(&prior.scope), target, target_count);
    let in_range = requested.filter(|position| range.contains(position));

    if *target == prior.scope {
        let Some(position) = in_range else {
            return match request {
                Request::Move => Plan::unchanged(),
                Request::Assign => Plan {
                    shifts: Vec::new(),
                    outcome: Outcome::Reverted {
                        position: prior.position,
                    },
                },
            };
        };
        if position == prior.position {
            return Plan::unchanged();
        }
        let shift = if position > prior.position {
            Shift {
                scope: target.clone(),
                interval: Interval::between(prior.position + 1, position),
                delta: -1,
            }
        } else {
            Shift {
                scope: target.clone(),
                interval: Interval::between(position, prior.position - 1),
                delta: 1,
            }
        };
        return Plan {
            shifts: vec![shift],
            outcome: Outcome::Placed {
                scope: target.clone(),
                position,
            },
        };
    }

    if request == Request::Move && in_range.is_none() {
        return Plan::unchanged();
    }

    let mut shifts = vec![close_gap(&prior.scope, prior.position)];
    let position = match in_range {
        Some(position) => {
            shifts.push(Shift {
                scope: target.clone(),
                interval: Interval::at_least(position),
                delta: 1,
            });
            position
        }
        None => append_position(start, target_count),
    };

    Plan {
        shifts,
        outcome: Outcome::Placed {
            scope: target.clone(),
            position,
        },
    }
}
