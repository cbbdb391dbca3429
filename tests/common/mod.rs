//! Shared utilities for integration tests.
//!
//! Builds warehouse rows from the column catalog and opens in-memory SQLite
//! analytical stores.

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_query::Value;

use starsync::interfaces::Warehouse;
use starsync::model::{ColumnType, WarehouseRow, WarehouseTable, DATE_KEY_COLUMN, EVENT_AT_COLUMN};
use starsync::storage::helpers::{bigint, double, format_date, text, timestamp};
use starsync::storage::{SqliteWarehouse, SqliteWatermarkStore};

/// Get SQLite connection string (in-memory for tests)
pub fn sqlite_uri() -> String {
    std::env::var("SQLITE_URI").unwrap_or_else(|_| "sqlite::memory:".to_string())
}

/// Single-connection pool so every query sees the same in-memory database.
pub async fn connect() -> sqlx::SqlitePool {
    sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<std::time::Duration>)
        .max_lifetime(None::<std::time::Duration>)
        .connect(&sqlite_uri())
        .await
        .expect("Failed to connect to SQLite")
}

/// Warehouse and watermark store over one initialized in-memory database.
pub async fn sqlite_stores() -> (SqliteWarehouse, SqliteWatermarkStore) {
    let pool = connect().await;
    let warehouse = SqliteWarehouse::new(pool.clone());
    warehouse.init().await.expect("init should succeed");
    (warehouse, SqliteWatermarkStore::new(pool))
}

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

/// A row for `table` with every column filled, then `overrides` applied.
///
/// Fact rows get `event_at` and `date_key` from `event_at`; other text
/// columns default to the key, numbers to 1.
pub fn row(
    table: WarehouseTable,
    key: &str,
    event_at: Option<DateTime<Utc>>,
    overrides: &[(&str, Value)],
) -> WarehouseRow {
    let values = table
        .columns()
        .iter()
        .map(|column| {
            if let Some((_, value)) = overrides.iter().find(|(name, _)| *name == column.name) {
                return value.clone();
            }
            match (column.name, event_at) {
                (EVENT_AT_COLUMN, Some(ts)) => timestamp(ts),
                (DATE_KEY_COLUMN, Some(ts)) => text(format_date(ts.date_naive())),
                _ => match column.ty {
                    ColumnType::Text => text(key),
                    ColumnType::Double => double(1.0),
                    ColumnType::BigInt => bigint(1),
                },
            }
        })
        .collect();
    WarehouseRow::new(key, event_at, values)
}
