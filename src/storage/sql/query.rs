//! SQL database abstraction trait.

use sea_query::{
    DeleteStatement, IndexCreateStatement, InsertStatement, SelectStatement, TableCreateStatement,
};
use sea_query_binder::SqlxValues;

/// Trait for SQL database backends.
///
/// This trait abstracts over different SQL databases (PostgreSQL, SQLite)
/// by providing the pool type and query building methods. DML statements are
/// built with bound parameters; DDL is rendered inline.
pub trait SqlDatabase: Send + Sync + 'static {
    /// The connection pool type for this database.
    type Pool: Clone + Send + Sync;

    /// Build a parameterized SELECT.
    fn build_select(stmt: &SelectStatement) -> (String, SqlxValues);

    /// Build a parameterized INSERT.
    fn build_insert(stmt: &InsertStatement) -> (String, SqlxValues);

    /// Build a parameterized DELETE.
    fn build_delete(stmt: &DeleteStatement) -> (String, SqlxValues);

    /// Render a CREATE TABLE.
    fn build_table(stmt: &TableCreateStatement) -> String;

    /// Render a CREATE INDEX.
    fn build_index(stmt: &IndexCreateStatement) -> String;
}
