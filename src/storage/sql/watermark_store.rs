//! Unified SQL WatermarkStore implementation.
//!
//! Uses a macro to generate implementations for each SQL backend,
//! eliminating code duplication while maintaining type safety.

use std::marker::PhantomData;

use sea_query::{Expr, Order, Query, SelectStatement};

use super::SqlDatabase;
use crate::interfaces::{Result, StorageError};
use crate::model::{SyncType, Watermark};
use crate::storage::helpers::parse_timestamp;
use crate::storage::schema::SyncWatermarks;

const WATERMARK_TABLE: &str = "sync_watermarks";

/// Raw watermark columns: name, timestamp text, count, mode text.
type WatermarkParts = (String, String, i64, String);

/// SQL-based implementation of WatermarkStore.
///
/// The watermark table lives in the analytical store next to the tables it
/// tracks. `SqlWarehouse::init` creates it.
pub struct SqlWatermarkStore<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlWatermarkStore<DB> {
    /// Create a new SQL watermark store with the given pool.
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &DB::Pool {
        &self.pool
    }
}

fn select_watermarks() -> SelectStatement {
    Query::select()
        .columns([
            SyncWatermarks::TableName,
            SyncWatermarks::LastSyncedAt,
            SyncWatermarks::RowsSynced,
            SyncWatermarks::SyncType,
        ])
        .from(SyncWatermarks::Table)
        .to_owned()
}

fn decode((table_name, last_synced_at, rows_synced, sync_type): WatermarkParts) -> Result<Watermark> {
    let last_synced_at = parse_timestamp(WATERMARK_TABLE, "last_synced_at", &last_synced_at)?;
    let sync_type = sync_type.parse::<SyncType>().map_err(|_| StorageError::InvalidValue {
        table: WATERMARK_TABLE.to_string(),
        column: "sync_type".to_string(),
        value: sync_type.clone(),
    })?;
    Ok(Watermark {
        table_name,
        last_synced_at,
        rows_synced: u64::try_from(rows_synced).unwrap_or_default(),
        sync_type,
    })
}

/// Macro to implement WatermarkStore for a specific SQL backend.
///
/// This eliminates duplication between PostgreSQL and SQLite implementations
/// while maintaining full type safety.
macro_rules! impl_watermark_store {
    ($db_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::WatermarkStore for SqlWatermarkStore<$db_type> {
            async fn get(&self, table_name: &str) -> Result<Option<Watermark>> {
                let stmt = select_watermarks()
                    .and_where(Expr::col(SyncWatermarks::TableName).eq(table_name))
                    .to_owned();

                let (sql, values) = <$db_type>::build_select(&stmt);
                let row: Option<WatermarkParts> = sqlx::query_as_with(&sql, values)
                    .fetch_optional(&self.pool)
                    .await?;

                row.map(decode).transpose()
            }

            async fn set(
                &self,
                table_name: &str,
                last_synced_at: chrono::DateTime<chrono::Utc>,
                rows_synced: u64,
                sync_type: SyncType,
            ) -> Result<()> {
                use sea_query::OnConflict;

                use crate::storage::helpers::format_timestamp;

                let rows = i64::try_from(rows_synced).unwrap_or(i64::MAX);
                let stmt = Query::insert()
                    .into_table(SyncWatermarks::Table)
                    .columns([
                        SyncWatermarks::TableName,
                        SyncWatermarks::LastSyncedAt,
                        SyncWatermarks::RowsSynced,
                        SyncWatermarks::SyncType,
                    ])
                    .values_panic([
                        table_name.into(),
                        format_timestamp(last_synced_at).into(),
                        rows.into(),
                        sync_type.as_str().into(),
                    ])
                    .on_conflict(
                        OnConflict::column(SyncWatermarks::TableName)
                            .update_columns([
                                SyncWatermarks::LastSyncedAt,
                                SyncWatermarks::RowsSynced,
                                SyncWatermarks::SyncType,
                            ])
                            .to_owned(),
                    )
                    .to_owned();

                let (sql, values) = <$db_type>::build_insert(&stmt);
                sqlx::query_with(&sql, values).execute(&self.pool).await?;

                Ok(())
            }

            async fn delete(&self, table_name: &str) -> Result<()> {
                let stmt = Query::delete()
                    .from_table(SyncWatermarks::Table)
                    .and_where(Expr::col(SyncWatermarks::TableName).eq(table_name))
                    .to_owned();

                let (sql, values) = <$db_type>::build_delete(&stmt);
                sqlx::query_with(&sql, values).execute(&self.pool).await?;

                Ok(())
            }

            async fn list_all(&self) -> Result<Vec<Watermark>> {
                let stmt = select_watermarks()
                    .order_by(SyncWatermarks::TableName, Order::Asc)
                    .to_owned();

                let (sql, values) = <$db_type>::build_select(&stmt);
                let rows: Vec<WatermarkParts> = sqlx::query_as_with(&sql, values)
                    .fetch_all(&self.pool)
                    .await?;

                rows.into_iter().map(decode).collect()
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_watermark_store!(super::postgres::Postgres, "postgres");
impl_watermark_store!(super::sqlite::Sqlite, "sqlite");
