//! Unified SQL storage implementations.
//!
//! This module provides the record store shared by SQL-based backends
//! (PostgreSQL, SQLite). The implementation is parameterized by database type
//! using the `SqlDatabase` trait.

mod query;
mod record_store;

pub use query::SqlDatabase;
pub use record_store::{SqlRecordStore, SqlTransaction};

#[cfg(feature = "postgres")]
pub mod postgres {
    //! PostgreSQL database backend.

    use sqlx::PgPool;

    use crate::storage::schema::TableSchema;

    /// PostgreSQL database marker type.
    pub struct Postgres;

    impl super::SqlDatabase for Postgres {
        type Pool = PgPool;
        type Transaction = sqlx::Transaction<'static, sqlx::Postgres>;

        fn create_table(schema: &TableSchema) -> Vec<String> {
            let mut columns = vec![
                format!("{} BIGSERIAL PRIMARY KEY", schema.quoted_id()),
                format!("{} BIGINT NOT NULL", schema.quoted_position()),
            ];
            columns.extend(schema.scope_column_ddl("BIGINT"));
            vec![
                format!(
                    "CREATE TABLE IF NOT EXISTS {} ({})",
                    schema.quoted_table(),
                    columns.join(", ")
                ),
                schema.create_index_sql(),
            ]
        }
    }

    /// PostgreSQL record store.
    pub type PostgresRecordStore = super::SqlRecordStore<Postgres>;
}

#[cfg(feature = "sqlite")]
pub mod sqlite {
    //! SQLite database backend.

    use sqlx::SqlitePool;

    use crate::storage::schema::TableSchema;

    /// SQLite database marker type.
    pub struct Sqlite;

    impl super::SqlDatabase for Sqlite {
        type Pool = SqlitePool;
        type Transaction = sqlx::Transaction<'static, sqlx::Sqlite>;

        fn create_table(schema: &TableSchema) -> Vec<String> {
            let mut columns = vec![
                format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", schema.quoted_id()),
                format!("{} INTEGER NOT NULL", schema.quoted_position()),
            ];
            columns.extend(schema.scope_column_ddl("INTEGER"));
            vec![
                format!(
                    "CREATE TABLE IF NOT EXISTS {} ({})",
                    schema.quoted_table(),
                    columns.join(", ")
                ),
                schema.create_index_sql(),
            ]
        }
    }

    /// SQLite record store.
    pub type SqliteRecordStore = super::SqlRecordStore<Sqlite>;

}
