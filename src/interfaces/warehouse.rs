//! Warehouse trait definition and the storage error shared by every store.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::{WarehouseRow, WarehouseTable};

/// Storage layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[cfg(any(feature = "postgres", feature = "sqlite"))]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid stored value in {table}.{column}: {value}")]
    InvalidValue {
        table: String,
        column: String,
        value: String,
    },

    #[error("Row for {table} has {actual} values, expected {expected}")]
    ColumnMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Interface for the analytical store's dimension and fact tables.
///
/// Implementations:
/// - `SqlWarehouse<Postgres>` / `SqlWarehouse<Sqlite>`: SQL storage
/// - `MockWarehouse`: In-memory mock for testing
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Create every dimension, fact and watermark table if missing.
    async fn init(&self) -> Result<()>;

    /// Remove all rows from a table.
    async fn truncate(&self, table: WarehouseTable) -> Result<()>;

    /// Insert-or-overwrite dimension rows by natural key.
    ///
    /// Re-applying the same rows leaves the table unchanged.
    async fn upsert_dimension(&self, table: WarehouseTable, rows: &[WarehouseRow]) -> Result<u64>;

    /// Replace the uncommitted window of a fact table with `rows`.
    ///
    /// Atomically deletes every fact with `event_at > window_start` (when
    /// given) and every fact sharing a key with an incoming row, then inserts
    /// `rows`. Retrying the same window therefore never duplicates facts.
    async fn replace_facts(
        &self,
        table: WarehouseTable,
        window_start: Option<DateTime<Utc>>,
        rows: &[WarehouseRow],
    ) -> Result<u64>;

    /// Subset of `keys` present in the table's natural-key column.
    async fn existing_keys(
        &self,
        table: WarehouseTable,
        keys: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>>;

    /// Number of rows currently in the table.
    async fn count(&self, table: WarehouseTable) -> Result<u64>;
}
