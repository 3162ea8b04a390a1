//! SQL database abstraction trait.

use crate::storage::schema::TableSchema;

/// Trait for SQL database backends.
///
/// This trait abstracts over different SQL databases (PostgreSQL, SQLite)
/// by providing the pool and transaction types plus backend-specific DDL.
pub trait SqlDatabase: Send + Sync + 'static {
    /// The connection pool type for this database.
    type Pool: Clone + Send + Sync;

    /// An open transaction on this database.
    type Transaction: Send;

    /// Statements creating the positioned table and its scope index.
    fn create_table(schema: &TableSchema) -> Vec<String>;
}
