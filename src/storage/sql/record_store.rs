//! Unified SQL RecordStore implementation.
//!
//! Uses a macro to generate implementations for each SQL backend,
//! eliminating code duplication while maintaining type safety.

use std::marker::PhantomData;
use std::sync::Arc;

use super::SqlDatabase;
use crate::storage::schema::TableSchema;

/// SQL-based implementation of RecordStore.
///
/// This generic implementation works with any SQL database that implements
/// the `SqlDatabase` trait (PostgreSQL, SQLite).
pub struct SqlRecordStore<DB: SqlDatabase> {
    pool: DB::Pool,
    schema: Arc<TableSchema>,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlRecordStore<DB> {
    /// Create a new SQL record store with the given pool.
    pub fn new(pool: DB::Pool, schema: TableSchema) -> Self {
        Self {
            pool,
            schema: Arc::new(schema),
            _marker: PhantomData,
        }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &DB::Pool {
        &self.pool
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }
}

/// An open transaction on a `SqlRecordStore`.
pub struct SqlTransaction<DB: SqlDatabase> {
    tx: DB::Transaction,
    schema: Arc<TableSchema>,
}

/// Macro to implement RecordStore and StoreTransaction for a specific SQL
/// backend.
///
/// `$begin` runs on the fresh transaction before it is handed out.
macro_rules! impl_record_store {
    ($db_type:ty, $row:ty, $builder:expr, $feature:literal, $begin:expr) => {
        #[cfg(feature = $feature)]
        impl SqlRecordStore<$db_type> {
            /// Create the positioned table and its index if missing.
            pub async fn init(&self) -> crate::interfaces::record_store::Result<()> {
                for statement in <$db_type as SqlDatabase>::create_table(&self.schema) {
                    sqlx::query(&statement).execute(&self.pool).await?;
                }
                Ok(())
            }
        }

        #[cfg(feature = $feature)]
        impl SqlTransaction<$db_type> {
            fn decode_scope(
                schema: &TableSchema,
                row: &$row,
                index: usize,
            ) -> crate::interfaces::record_store::Result<crate::scope::Scope> {
                use sqlx::Row;

                use crate::config::ScopeKind;

                Ok(match schema.scope_kind() {
                    None => crate::scope::Scope::absent(),
                    Some(ScopeKind::Integer) => {
                        schema.decode_scope(row.try_get::<Option<i64>, _>(index)?, None)
                    }
                    Some(ScopeKind::Text) => {
                        schema.decode_scope(None, row.try_get::<Option<String>, _>(index)?)
                    }
                })
            }

            fn decode_row(
                schema: &TableSchema,
                row: &$row,
            ) -> crate::interfaces::record_store::Result<crate::interfaces::RecordRow> {
                use sqlx::Row;

                Ok(crate::interfaces::RecordRow {
                    id: row.try_get::<i64, _>(0)?,
                    position: row.try_get::<i64, _>(1)?,
                    scope: Self::decode_scope(schema, row, 2)?,
                })
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::RecordStore for SqlRecordStore<$db_type> {
            async fn begin(
                &self,
            ) -> crate::interfaces::record_store::Result<
                Box<dyn crate::interfaces::StoreTransaction>,
            > {
                let mut tx = self.pool.begin().await?;
                if let Some(statement) = $begin {
                    sqlx::query(statement).execute(&mut *tx).await?;
                }
                Ok(Box::new(SqlTransaction::<$db_type> {
                    tx,
                    schema: Arc::clone(&self.schema),
                }))
            }

            async fn scopes(
                &self,
            ) -> crate::interfaces::record_store::Result<Vec<crate::scope::Scope>> {
                use sea_query::{Expr, Func, Query};
                use sea_query_binder::SqlxBinder;
                use sqlx::Row;

                let Some(column) = self.schema.scope() else {
                    let (sql, values) = Query::select()
                        .expr(Func::count(Expr::col(self.schema.id())))
                        .from(self.schema.table())
                        .build_sqlx($builder);
                    let row = sqlx::query_with(&sql, values).fetch_one(&self.pool).await?;
                    let count: i64 = row.try_get(0)?;
                    return Ok(if count > 0 {
                        vec![crate::scope::Scope::absent()]
                    } else {
                        Vec::new()
                    });
                };

                let (sql, values) = Query::select()
                    .distinct()
                    .column(column)
                    .from(self.schema.table())
                    .build_sqlx($builder);
                let rows = sqlx::query_with(&sql, values).fetch_all(&self.pool).await?;

                let mut scopes = rows
                    .iter()
                    .map(|row| SqlTransaction::<$db_type>::decode_scope(&self.schema, row, 0))
                    .collect::<crate::interfaces::record_store::Result<Vec<_>>>()?;
                scopes.sort();
                Ok(scopes)
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::StoreTransaction for SqlTransaction<$db_type> {
            async fn count(
                &mut self,
                scope: &crate::scope::Scope,
            ) -> crate::interfaces::record_store::Result<i64> {
                use sea_query::{Expr, Func, Query};
                use sea_query_binder::SqlxBinder;
                use sqlx::Row;

                let (sql, values) = Query::select()
                    .expr(Func::count(Expr::col(self.schema.id())))
                    .from(self.schema.table())
                    .cond_where(self.schema.scope_condition(scope)?)
                    .build_sqlx($builder);

                let row = sqlx::query_with(&sql, values)
                    .fetch_one(&mut *self.tx)
                    .await?;
                Ok(row.try_get::<i64, _>(0)?)
            }

            async fn fetch(
                &mut self,
                id: crate::interfaces::RecordId,
            ) -> crate::interfaces::record_store::Result<Option<crate::interfaces::RecordRow>> {
                use sea_query::{Expr, Query};
                use sea_query_binder::SqlxBinder;

                let (sql, values) = Query::select()
                    .columns(self.schema.row_columns())
                    .from(self.schema.table())
                    .and_where(Expr::col(self.schema.id()).eq(id))
                    .build_sqlx($builder);

                let row = sqlx::query_with(&sql, values)
                    .fetch_optional(&mut *self.tx)
                    .await?;
                row.map(|row| Self::decode_row(&self.schema, &row))
                    .transpose()
            }

            async fn find_at(
                &mut self,
                scope: &crate::scope::Scope,
                position: i64,
            ) -> crate::interfaces::record_store::Result<Option<crate::interfaces::RecordRow>> {
                use sea_query::{Order, Query};
                use sea_query_binder::SqlxBinder;

                use crate::interfaces::Interval;

                let (sql, values) = Query::select()
                    .columns(self.schema.row_columns())
                    .from(self.schema.table())
                    .cond_where(
                        self.schema
                            .scoped_interval(scope, Interval::between(position, position))?,
                    )
                    .order_by(self.schema.id(), Order::Asc)
                    .limit(1)
                    .build_sqlx($builder);

                let row = sqlx::query_with(&sql, values)
                    .fetch_optional(&mut *self.tx)
                    .await?;
                row.map(|row| Self::decode_row(&self.schema, &row))
                    .transpose()
            }

            async fn find_range(
                &mut self,
                scope: &crate::scope::Scope,
                interval: crate::interfaces::Interval,
                order: crate::config::SortOrder,
            ) -> crate::interfaces::record_store::Result<Vec<crate::interfaces::RecordRow>> {
                use sea_query::{Order, Query};
                use sea_query_binder::SqlxBinder;

                use crate::config::SortOrder;

                let order = match order {
                    SortOrder::Asc => Order::Asc,
                    SortOrder::Desc => Order::Desc,
                };
                let (sql, values) = Query::select()
                    .columns(self.schema.row_columns())
                    .from(self.schema.table())
                    .cond_where(self.schema.scoped_interval(scope, interval)?)
                    .order_by(self.schema.position(), order.clone())
                    .order_by(self.schema.id(), order)
                    .build_sqlx($builder);

                let rows = sqlx::query_with(&sql, values)
                    .fetch_all(&mut *self.tx)
                    .await?;
                rows.iter()
                    .map(|row| Self::decode_row(&self.schema, row))
                    .collect()
            }

            async fn shift(
                &mut self,
                scope: &crate::scope::Scope,
                interval: crate::interfaces::Interval,
                delta: i64,
            ) -> crate::interfaces::record_store::Result<u64> {
                use sea_query::Query;
                use sea_query_binder::SqlxBinder;

                if interval.is_empty() {
                    return Ok(0);
                }
                let (sql, values) = Query::update()
                    .table(self.schema.table())
                    .value(self.schema.position(), self.schema.shifted_position(delta))
                    .cond_where(self.schema.scoped_interval(scope, interval)?)
                    .build_sqlx($builder);

                let result = sqlx::query_with(&sql, values)
                    .execute(&mut *self.tx)
                    .await?;
                Ok(result.rows_affected())
            }

            async fn insert_row(
                &mut self,
                scope: &crate::scope::Scope,
                position: i64,
            ) -> crate::interfaces::record_store::Result<crate::interfaces::RecordId> {
                use sea_query::Query;
                use sea_query_binder::SqlxBinder;
                use sqlx::Row;

                let (columns, exprs): (Vec<_>, Vec<_>) = self
                    .schema
                    .placement_values(scope, position)?
                    .into_iter()
                    .unzip();
                let (sql, values) = Query::insert()
                    .into_table(self.schema.table())
                    .columns(columns)
                    .values_panic(exprs)
                    .returning_col(self.schema.id())
                    .build_sqlx($builder);

                let row = sqlx::query_with(&sql, values)
                    .fetch_one(&mut *self.tx)
                    .await?;
                Ok(row.try_get::<i64, _>(0)?)
            }

            async fn update_row(
                &mut self,
                id: crate::interfaces::RecordId,
                scope: &crate::scope::Scope,
                position: i64,
            ) -> crate::interfaces::record_store::Result<()> {
                use sea_query::{Expr, Query};
                use sea_query_binder::SqlxBinder;

                let (sql, values) = Query::update()
                    .table(self.schema.table())
                    .values(self.schema.placement_values(scope, position)?)
                    .and_where(Expr::col(self.schema.id()).eq(id))
                    .build_sqlx($builder);

                let result = sqlx::query_with(&sql, values)
                    .execute(&mut *self.tx)
                    .await?;
                if result.rows_affected() == 0 {
                    return Err(crate::interfaces::StorageError::NotFound(id));
                }
                Ok(())
            }

            async fn delete_row(
                &mut self,
                id: crate::interfaces::RecordId,
            ) -> crate::interfaces::record_store::Result<()> {
                use sea_query::{Expr, Query};
                use sea_query_binder::SqlxBinder;

                let (sql, values) = Query::delete()
                    .from_table(self.schema.table())
                    .and_where(Expr::col(self.schema.id()).eq(id))
                    .build_sqlx($builder);

                let result = sqlx::query_with(&sql, values)
                    .execute(&mut *self.tx)
                    .await?;
                if result.rows_affected() == 0 {
                    return Err(crate::interfaces::StorageError::NotFound(id));
                }
                Ok(())
            }

            async fn commit(self: Box<Self>) -> crate::interfaces::record_store::Result<()> {
                let SqlTransaction { tx, .. } = *self;
                tx.commit().await?;
                Ok(())
            }

            async fn rollback(self: Box<Self>) -> crate::interfaces::record_store::Result<()> {
                let SqlTransaction { tx, .. } = *self;
                tx.rollback().await?;
                Ok(())
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_record_store!(
    super::postgres::Postgres,
    sqlx::postgres::PgRow,
    sea_query::PostgresQueryBuilder,
    "postgres",
    Some("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
);
impl_record_store!(
    super::sqlite::Sqlite,
    sqlx::sqlite::SqliteRow,
    sea_query::SqliteQueryBuilder,
    "sqlite",
    None::<&str>
);
