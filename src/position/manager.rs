//! Position manager.

use std::sync::Arc;

use tracing::debug;

use super::audit::{self, Audit};
use super::plan::{self, Outcome, Placement, Plan, Request};
use super::range::{self, bottom, PositionRange};
use super::{PositionError, Result};
use crate::config::{PositionConfig, SortOrder};
use crate::interfaces::{
    Interval, Positioned, RecordId, RecordRow, RecordStore, StorageError, StoreTransaction,
};
use crate::scope::Scope;

#[derive(Debug, Clone, Copy)]
enum Neighbor {
    Previous,
    Next,
}

/// Keeps the positions of one record type contiguous within each scope.
///
/// Lifecycle hooks (`on_before_create`, `on_before_update`, `on_after_delete`)
/// run inside a transaction owned by the caller, which also writes the record
/// row itself. Every other operation opens, and commits, its own transaction.
#[derive(Clone)]
pub struct PositionManager {
    store: Arc<dyn RecordStore>,
    config: PositionConfig,
}

impl PositionManager {
    pub fn new(store: Arc<dyn RecordStore>, config: PositionConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &PositionConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// `scope` as the store reads it back.
    ///
    /// Keys are converted to the configured column type. An unscoped type
    /// has a single scope, the absent one.
    pub fn canonical_scope(&self, scope: &Scope) -> Result<Scope> {
        match &self.config.scope {
            None => Ok(Scope::absent()),
            Some(column) => scope
                .to_kind(column.kind)
                .ok_or_else(|| PositionError::InvalidScope(scope.to_string())),
        }
    }

    fn scope_of<R: Positioned + ?Sized>(&self, record: &R) -> Result<Scope> {
        self.canonical_scope(&record.scope())
    }

    // ---------------------------------------------------------------------
    // Lifecycle hooks
    // ---------------------------------------------------------------------

    /// Assign the bottom slot of the record's scope to a pending insert.
    pub async fn on_before_create<R: Positioned + ?Sized>(
        &self,
        tx: &mut dyn StoreTransaction,
        record: &mut R,
    ) -> Result<i64> {
        let scope = self.scope_of(record)?;
        let count = tx.count(&scope).await?;
        let position = plan::append_position(self.config.start, count);
        debug!(scope = %scope, position, "Appending record");
        record.set_scope(scope);
        record.set_position(position);
        Ok(position)
    }

    /// Resolve a directly assigned scope and/or position before the record
    /// row is written.
    ///
    /// The prior placement is the stored row, read inside `tx`, so writes
    /// committed since the record was loaded are taken into account. Siblings
    /// are shifted to make room. An out-of-range position is reverted within
    /// the same scope, or replaced by the bottom slot of a new scope. Returns
    /// the position the caller must persist.
    pub async fn on_before_update<R: Positioned + ?Sized>(
        &self,
        tx: &mut dyn StoreTransaction,
        record: &mut R,
    ) -> Result<i64> {
        let id = record.id().ok_or(PositionError::NotPersisted)?;
        let row = tx.fetch(id).await?.ok_or(StorageError::NotFound(id))?;
        let prior = Placement {
            scope: row.scope,
            position: row.position,
        };
        let target = self.scope_of(record)?;
        let count = tx.count(&target).await?;

        let plan = plan::plan_transition(
            self.config.start,
            &prior,
            &target,
            record.position(),
            count,
            Request::Assign,
        );
        apply(tx, &plan).await?;

        let position = match plan.outcome {
            Outcome::Unchanged => prior.position,
            Outcome::Reverted { position } => {
                debug!(position, "Requested position out of range, reverting");
                position
            }
            Outcome::Placed { position, .. } => position,
        };
        record.set_scope(target);
        record.set_position(position);
        Ok(position)
    }

    /// Close the gap left by a deleted record.
    pub async fn on_after_delete<R: Positioned + ?Sized>(
        &self,
        tx: &mut dyn StoreTransaction,
        record: &R,
    ) -> Result<()> {
        let Some(position) = record.position() else {
            return Ok(());
        };
        close_gap(tx, &self.scope_of(record)?, position).await
    }

    // ---------------------------------------------------------------------
    // Self-contained writes
    // ---------------------------------------------------------------------

    /// Append and insert a new record in one transaction.
    #[tracing::instrument(name = "position.create", skip_all, fields(scope = %record.scope()))]
    pub async fn create<R: Positioned + ?Sized>(&self, record: &mut R) -> Result<RecordId> {
        let mut tx = self.store.begin().await?;
        let position = self.on_before_create(tx.as_mut(), record).await?;
        let id = tx.insert_row(&record.scope(), position).await?;
        tx.commit().await?;

        record.set_id(id);
        Ok(id)
    }

    /// Persist a directly assigned scope and/or position.
    #[tracing::instrument(name = "position.save", skip_all, fields(id = ?record.id()))]
    pub async fn save<R: Positioned + ?Sized>(&self, record: &mut R) -> Result<i64> {
        let id = record.id().ok_or(PositionError::NotPersisted)?;
        let mut tx = self.store.begin().await?;
        let position = self.on_before_update(tx.as_mut(), record).await?;
        tx.update_row(id, &record.scope(), position).await?;
        tx.commit().await?;
        Ok(position)
    }

    /// Delete a record and close the gap in its scope.
    #[tracing::instrument(name = "position.destroy", skip_all, fields(id = ?record.id()))]
    pub async fn destroy<R: Positioned + ?Sized>(&self, record: &R) -> Result<()> {
        let id = record.id().ok_or(PositionError::NotPersisted)?;
        let mut tx = self.store.begin().await?;
        let row = tx.fetch(id).await?.ok_or(StorageError::NotFound(id))?;
        tx.delete_row(id).await?;
        close_gap(tx.as_mut(), &row.scope, row.position).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Move a record to `position`, optionally in another scope.
    ///
    /// Without a target the record stays in its stored scope. A target outside
    /// `range(record, target)`, or the record's own slot, is a no-op. Returns
    /// the record's position after the call.
    #[tracing::instrument(name = "position.move_to", skip_all, fields(id = ?record.id(), position = position))]
    pub async fn move_to<R: Positioned + ?Sized>(
        &self,
        record: &mut R,
        position: i64,
        target: Option<&Scope>,
    ) -> Result<i64> {
        let id = record.id().ok_or(PositionError::NotPersisted)?;
        let target = target.map(|scope| self.canonical_scope(scope)).transpose()?;

        let mut tx = self.store.begin().await?;
        let row = tx.fetch(id).await?.ok_or(StorageError::NotFound(id))?;
        let target = target.unwrap_or_else(|| row.scope.clone());
        let count = tx.count(&target).await?;

        let plan = plan::plan_transition(
            self.config.start,
            &Placement {
                scope: row.scope.clone(),
                position: row.position,
            },
            &target,
            Some(position),
            count,
            Request::Move,
        );

        let Outcome::Placed { scope, position } = &plan.outcome else {
            debug!(scope = %target, position, "Move target out of range or unchanged");
            tx.rollback().await?;
            return Ok(row.position);
        };

        apply(tx.as_mut(), &plan).await?;
        tx.update_row(id, scope, *position).await?;
        tx.commit().await?;

        record.set_scope(scope.clone());
        record.set_position(*position);
        Ok(*position)
    }

    /// Swap with the previous sibling. Returns `false` for the first record.
    #[tracing::instrument(name = "position.up", skip_all, fields(id = ?record.id()))]
    pub async fn up<R: Positioned + ?Sized>(&self, record: &mut R) -> Result<bool> {
        self.swap(record, Neighbor::Previous).await
    }

    /// Swap with the next sibling. Returns `false` for the last record.
    #[tracing::instrument(name = "position.down", skip_all, fields(id = ?record.id()))]
    pub async fn down<R: Positioned + ?Sized>(&self, record: &mut R) -> Result<bool> {
        self.swap(record, Neighbor::Next).await
    }

    async fn swap<R: Positioned + ?Sized>(&self, record: &mut R, neighbor: Neighbor) -> Result<bool> {
        let id = record.id().ok_or(PositionError::NotPersisted)?;
        let mut tx = self.store.begin().await?;
        let row = tx.fetch(id).await?.ok_or(StorageError::NotFound(id))?;

        let other_position = match neighbor {
            Neighbor::Previous if row.position <= self.config.start => None,
            Neighbor::Previous => Some(row.position - 1),
            Neighbor::Next => {
                let count = tx.count(&row.scope).await?;
                (row.position < bottom(self.config.start, count)).then_some(row.position + 1)
            }
        };
        let other = match other_position {
            Some(position) => tx.find_at(&row.scope, position).await?,
            None => None,
        };
        let Some(other) = other else {
            tx.rollback().await?;
            return Ok(false);
        };

        tx.update_row(other.id, &other.scope, row.position).await?;
        tx.update_row(id, &row.scope, other.position).await?;
        tx.commit().await?;

        debug!(id, from = row.position, to = other.position, "Swapped with neighbor");
        record.set_position(other.position);
        Ok(true)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Valid positions for `record` within `target` (its own scope by default).
    pub async fn range<R: Positioned + ?Sized>(
        &self,
        record: &R,
        target: Option<&Scope>,
    ) -> Result<PositionRange> {
        let target = self.canonical_scope(&range::target_scope(&self.config, record, target)?)?;
        let count = self.count(&target).await?;
        let resident = match record.id() {
            Some(_) => Some(self.scope_of(record)?),
            None => None,
        };
        Ok(range::position_range(
            self.config.start,
            resident.as_ref(),
            &target,
            count,
        ))
    }

    /// Number of records in `scope`.
    pub async fn count(&self, scope: &Scope) -> Result<i64> {
        let scope = self.canonical_scope(scope)?;
        let mut tx = self.store.begin().await?;
        let count = tx.count(&scope).await?;
        tx.commit().await?;
        Ok(count)
    }

    pub fn is_first<R: Positioned + ?Sized>(&self, record: &R) -> bool {
        record.position() == Some(self.config.start)
    }

    pub async fn is_last<R: Positioned + ?Sized>(&self, record: &R) -> Result<bool> {
        let Some(position) = record.position() else {
            return Ok(false);
        };
        let count = self.count(&self.scope_of(record)?).await?;
        Ok(position == bottom(self.config.start, count))
    }

    /// The sibling right after `record`.
    pub async fn next<R: Positioned + ?Sized>(&self, record: &R) -> Result<Option<RecordRow>> {
        self.sibling(record, 1).await
    }

    /// The sibling right before `record`.
    pub async fn previous<R: Positioned + ?Sized>(&self, record: &R) -> Result<Option<RecordRow>> {
        self.sibling(record, -1).await
    }

    async fn sibling<R: Positioned + ?Sized>(
        &self,
        record: &R,
        offset: i64,
    ) -> Result<Option<RecordRow>> {
        let Some(position) = record.position() else {
            return Ok(None);
        };
        let scope = self.scope_of(record)?;
        let mut tx = self.store.begin().await?;
        let row = tx.find_at(&scope, position + offset).await?;
        tx.commit().await?;
        Ok(row)
    }

    /// Every sibling after `record`, by ascending position.
    pub async fn all_next<R: Positioned + ?Sized>(&self, record: &R) -> Result<Vec<RecordRow>> {
        match record.position() {
            Some(position) => {
                self.find(&self.scope_of(record)?, Interval::above(position), SortOrder::Asc)
                    .await
            }
            None => Ok(Vec::new()),
        }
    }

    /// Every sibling before `record`, by ascending position.
    pub async fn all_previous<R: Positioned + ?Sized>(&self, record: &R) -> Result<Vec<RecordRow>> {
        match record.position() {
            Some(position) => {
                self.find(&self.scope_of(record)?, Interval::below(position), SortOrder::Asc)
                    .await
            }
            None => Ok(Vec::new()),
        }
    }

    /// Every record of `scope`, in the configured display order.
    pub async fn list(&self, scope: &Scope) -> Result<Vec<RecordRow>> {
        self.find(&self.canonical_scope(scope)?, Interval::all(), self.config.order)
            .await
    }

    async fn find(&self, scope: &Scope, interval: Interval, order: SortOrder) -> Result<Vec<RecordRow>> {
        let mut tx = self.store.begin().await?;
        let rows = tx.find_range(scope, interval, order).await?;
        tx.commit().await?;
        Ok(rows)
    }

    /// Check the positions of `scope` against the contiguity invariant.
    pub async fn audit(&self, scope: &Scope) -> Result<Audit> {
        let scope = self.canonical_scope(scope)?;
        let positions: Vec<i64> = self
            .find(&scope, Interval::all(), SortOrder::Asc)
            .await?
            .iter()
            .map(|row| row.position)
            .collect();
        Ok(audit::check(self.config.start, scope, &positions))
    }

    /// Audit every scope currently present in the store.
    pub async fn audit_all(&self) -> Result<Vec<Audit>> {
        let mut audits = Vec::new();
        for scope in self.store.scopes().await? {
            audits.push(self.audit(&scope).await?);
        }
        Ok(audits)
    }
}

async fn close_gap(tx: &mut dyn StoreTransaction, scope: &Scope, position: i64) -> Result<()> {
    let shift = plan::close_gap(scope, position);
    let shifted = tx.shift(&shift.scope, shift.interval, shift.delta).await?;
    debug!(scope = %scope, position, shifted, "Closed gap");
    Ok(())
}

async fn apply(tx: &mut dyn StoreTransaction, plan: &Plan) -> Result<()> {
    for shift in &plan.shifts {
        let shifted = tx.shift(&shift.scope, shift.interval, shift.delta).await?;
        debug!(
            scope = %shift.scope,
            from = ?shift.interval.from,
            to = ?shift.interval.to,
            delta = shift.delta,
            shifted,
            "Shifted siblings"
        );
    }
    Ok(())
}
