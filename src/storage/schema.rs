//! Positioned table schema.
//!
//! Table and column names come from configuration, so identifiers are built
//! as sea-query aliases rather than a derived `Iden` enum. This module also
//! translates scopes and position intervals into query conditions.

use sea_query::{Alias, Condition, Expr, SimpleExpr, Value};

use crate::config::{PositionConfig, ScopeKind, TableConfig};
use crate::interfaces::record_store::Result;
use crate::interfaces::{Interval, StorageError};
use crate::scope::{Scope, ScopeKey};

/// Names and types of the columns the record store reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    table: String,
    id_column: String,
    position_column: String,
    scope: Option<(String, ScopeKind)>,
}

impl TableSchema {
    pub fn new(table: &TableConfig, positioning: &PositionConfig) -> Self {
        Self {
            table: table.name.clone(),
            id_column: table.id_column.clone(),
            position_column: table.position_column.clone(),
            scope: positioning
                .scope
                .as_ref()
                .map(|scope| (scope.column.clone(), scope.kind)),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn table(&self) -> Alias {
        Alias::new(self.table.as_str())
    }

    pub fn id(&self) -> Alias {
        Alias::new(self.id_column.as_str())
    }

    pub fn position(&self) -> Alias {
        Alias::new(self.position_column.as_str())
    }

    /// Scope column, `None` for an unscoped table.
    pub fn scope(&self) -> Option<Alias> {
        self.scope.as_ref().map(|(column, _)| Alias::new(column.as_str()))
    }

    pub fn scope_kind(&self) -> Option<ScopeKind> {
        self.scope.as_ref().map(|(_, kind)| *kind)
    }

    /// Columns selected for a row, in decoding order: id, position, scope.
    pub fn row_columns(&self) -> Vec<Alias> {
        let mut columns = vec![self.id(), self.position()];
        columns.extend(self.scope());
        columns
    }

    /// Bindable value of `scope` for the scope column.
    ///
    /// Keys are converted to the column type first, so `Scope::of(12)` and
    /// `Scope::of("12")` bind the same value.
    pub fn scope_value(&self, scope: &Scope) -> Result<Value> {
        let Some(kind) = self.scope_kind() else {
            return Err(StorageError::Corrupt(
                "table has no scope column".to_string(),
            ));
        };
        let scope = scope
            .to_kind(kind)
            .ok_or_else(|| StorageError::InvalidScope(scope.to_string()))?;
        Ok(match (kind, scope.key()) {
            (ScopeKind::Integer, None) => Option::<i64>::None.into(),
            (ScopeKind::Text, None) => Option::<String>::None.into(),
            (_, Some(ScopeKey::Int(value))) => (*value).into(),
            (_, Some(ScopeKey::Text(text))) => text.clone().into(),
        })
    }

    /// Condition matching exactly the members of `scope`.
    ///
    /// Absent scopes match `IS NULL`, never `= NULL`. An unscoped table has a
    /// single scope, so the condition is empty.
    pub fn scope_condition(&self, scope: &Scope) -> Result<Condition> {
        let Some(column) = self.scope() else {
            return Ok(Condition::all());
        };
        let condition = if scope.is_absent() {
            Expr::col(column).is_null()
        } else {
            Expr::col(column).eq(self.scope_value(scope)?)
        };
        Ok(Condition::all().add(condition))
    }

    /// Condition matching positions lying in `interval`.
    pub fn interval_condition(&self, interval: Interval) -> Condition {
        self.restrict(Condition::all(), interval)
    }

    /// Condition matching members of `scope` whose position lies in `interval`.
    pub fn scoped_interval(&self, scope: &Scope, interval: Interval) -> Result<Condition> {
        Ok(self.restrict(self.scope_condition(scope)?, interval))
    }

    fn restrict(&self, condition: Condition, interval: Interval) -> Condition {
        condition
            .add_option(interval.from.map(|from| Expr::col(self.position()).gte(from)))
            .add_option(interval.to.map(|to| Expr::col(self.position()).lte(to)))
    }

    /// `position = position + delta`.
    pub fn shifted_position(&self, delta: i64) -> SimpleExpr {
        Expr::col(self.position()).add(delta)
    }

    /// `(column, value)` pairs writing `scope` and `position`.
    pub fn placement_values(&self, scope: &Scope, position: i64) -> Result<Vec<(Alias, SimpleExpr)>> {
        let mut values = vec![(self.position(), SimpleExpr::from(position))];
        if let Some(column) = self.scope() {
            values.push((column, SimpleExpr::from(self.scope_value(scope)?)));
        }
        Ok(values)
    }

    /// Decode a scope column value.
    pub fn decode_scope(&self, int_value: Option<i64>, text_value: Option<String>) -> Scope {
        match self.scope_kind() {
            None => Scope::absent(),
            Some(ScopeKind::Integer) => Scope::from(int_value.map(ScopeKey::Int)),
            Some(ScopeKind::Text) => Scope::from(text_value.map(ScopeKey::Text)),
        }
    }

    /// Column definitions shared by every backend: name and SQL type of the
    /// scope column, if any.
    pub(crate) fn scope_column_ddl(&self, integer_type: &str) -> Option<String> {
        self.scope.as_ref().map(|(column, kind)| {
            let sql_type = match kind {
                ScopeKind::Integer => integer_type,
                ScopeKind::Text => "TEXT",
            };
            format!("{} {}", quote(column), sql_type)
        })
    }

    pub(crate) fn quoted_table(&self) -> String {
        quote(&self.table)
    }

    pub(crate) fn quoted_id(&self) -> String {
        quote(&self.id_column)
    }

    pub(crate) fn quoted_position(&self) -> String {
        quote(&self.position_column)
    }

    /// `CREATE INDEX` over (scope, position), or position alone.
    pub(crate) fn create_index_sql(&self) -> String {
        let mut columns = Vec::new();
        if let Some((column, _)) = &self.scope {
            columns.push(quote(column));
        }
        columns.push(self.quoted_position());
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            quote(&format!("{}_scope_position_idx", self.table)),
            self.quoted_table(),
            columns.join(", ")
        )
    }
}

/// Quote an identifier for both SQLite and PostgreSQL.
fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
