//! Unified SQL storage implementations.
//!
//! This module provides shared implementations for SQL-based storage backends
//! (PostgreSQL, SQLite). The implementations are parameterized by database type
//! using the `SqlDatabase` trait.

mod query;
mod warehouse;
mod watermark_store;

pub use query::SqlDatabase;
pub use warehouse::SqlWarehouse;
pub use watermark_store::SqlWatermarkStore;

/// Rows per multi-row INSERT. Keeps bind counts under SQLite's limit.
pub(crate) const INSERT_BATCH: usize = 500;

/// Keys per `IN (...)` lookup.
pub(crate) const LOOKUP_BATCH: usize = 500;

#[cfg(feature = "postgres")]
pub mod postgres {
    //! PostgreSQL database backend.

    use sea_query::{
        DeleteStatement, IndexCreateStatement, InsertStatement, PostgresQueryBuilder,
        SelectStatement, TableCreateStatement,
    };
    use sea_query_binder::{SqlxBinder, SqlxValues};
    use sqlx::PgPool;

    /// PostgreSQL database marker type.
    pub struct Postgres;

    impl super::SqlDatabase for Postgres {
        type Pool = PgPool;

        fn build_select(stmt: &SelectStatement) -> (String, SqlxValues) {
            stmt.build_sqlx(PostgresQueryBuilder)
        }

        fn build_insert(stmt: &InsertStatement) -> (String, SqlxValues) {
            stmt.build_sqlx(PostgresQueryBuilder)
        }

        fn build_delete(stmt: &DeleteStatement) -> (String, SqlxValues) {
            stmt.build_sqlx(PostgresQueryBuilder)
        }

        fn build_table(stmt: &TableCreateStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_index(stmt: &IndexCreateStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }
    }

    /// PostgreSQL analytical store.
    pub type PostgresWarehouse = super::SqlWarehouse<Postgres>;

    /// PostgreSQL watermark store.
    pub type PostgresWatermarkStore = super::SqlWatermarkStore<Postgres>;
}

#[cfg(feature = "sqlite")]
pub mod sqlite {
    //! SQLite database backend.

    use sea_query::{
        DeleteStatement, IndexCreateStatement, InsertStatement, SelectStatement,
        SqliteQueryBuilder, TableCreateStatement,
    };
    use sea_query_binder::{SqlxBinder, SqlxValues};
    use sqlx::SqlitePool;

    /// SQLite database marker type.
    pub struct Sqlite;

    impl super::SqlDatabase for Sqlite {
        type Pool = SqlitePool;

        fn build_select(stmt: &SelectStatement) -> (String, SqlxValues) {
            stmt.build_sqlx(SqliteQueryBuilder)
        }

        fn build_insert(stmt: &InsertStatement) -> (String, SqlxValues) {
            stmt.build_sqlx(SqliteQueryBuilder)
        }

        fn build_delete(stmt: &DeleteStatement) -> (String, SqlxValues) {
            stmt.build_sqlx(SqliteQueryBuilder)
        }

        fn build_table(stmt: &TableCreateStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_index(stmt: &IndexCreateStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }
    }

    /// SQLite analytical store.
    pub type SqliteWarehouse = super::SqlWarehouse<Sqlite>;

    /// SQLite watermark store.
    pub type SqliteWatermarkStore = super::SqlWatermarkStore<Sqlite>;
}
