//! WatermarkStore trait definition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Result;
use crate::model::{SyncType, Watermark};

/// Interface for per-table sync cursors.
///
/// One row per table name. Written only by the orchestrator, after the
/// table's load has fully returned.
///
/// # Implementations
///
/// - `PostgresWatermarkStore`: PostgreSQL storage
/// - `SqliteWatermarkStore`: SQLite storage
/// - `MockWatermarkStore`: In-memory mock for testing
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Get the stored cursor for a table.
    ///
    /// Returns `None` if the table has never been synced.
    async fn get(&self, table_name: &str) -> Result<Option<Watermark>>;

    /// Store the cursor for a table, overwriting any prior row entirely.
    async fn set(
        &self,
        table_name: &str,
        last_synced_at: DateTime<Utc>,
        rows_synced: u64,
        sync_type: SyncType,
    ) -> Result<()>;

    /// Drop the cursor for a table so its next run starts from scratch.
    ///
    /// Deleting a missing cursor is not an error.
    async fn delete(&self, table_name: &str) -> Result<()>;

    /// All cursors, ordered by table name.
    async fn list_all(&self) -> Result<Vec<Watermark>>;
}
