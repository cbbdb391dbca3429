//! Mock Warehouse implementation for testing.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::interfaces::{Result, StorageError, Warehouse};
use crate::model::{WarehouseRow, WarehouseTable};
use crate::storage::helpers::check_row;

/// In-memory analytical store keyed by natural key.
#[derive(Default)]
pub struct MockWarehouse {
    tables: RwLock<BTreeMap<WarehouseTable, BTreeMap<String, WarehouseRow>>>,
    fail_on_write: RwLock<HashSet<WarehouseTable>>,
    fail_on_truncate: RwLock<bool>,
    writes: RwLock<Vec<WarehouseTable>>,
}

impl MockWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail upserts and fact replacement for one table.
    pub async fn set_fail_on_write(&self, table: WarehouseTable, fail: bool) {
        let mut fail_on = self.fail_on_write.write().await;
        if fail {
            fail_on.insert(table);
        } else {
            fail_on.remove(&table);
        }
    }

    pub async fn set_fail_on_truncate(&self, fail: bool) {
        *self.fail_on_truncate.write().await = fail;
    }

    /// Rows of a table ordered by key.
    pub async fn rows(&self, table: WarehouseTable) -> Vec<WarehouseRow> {
        self.tables
            .read()
            .await
            .get(&table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn row(&self, table: WarehouseTable, key: &str) -> Option<WarehouseRow> {
        self.tables
            .read()
            .await
            .get(&table)
            .and_then(|rows| rows.get(key).cloned())
    }

    /// Seed a row directly, bypassing failure toggles.
    pub async fn insert_row(&self, table: WarehouseTable, row: WarehouseRow) {
        self.tables
            .write()
            .await
            .entry(table)
            .or_default()
            .insert(row.key.clone(), row);
    }

    /// Tables written to, in call order.
    pub async fn write_log(&self) -> Vec<WarehouseTable> {
        self.writes.read().await.clone()
    }

    async fn check_write(&self, table: WarehouseTable) -> Result<()> {
        self.writes.write().await.push(table);
        if self.fail_on_write.read().await.contains(&table) {
            return Err(StorageError::Unavailable(format!(
                "analytical store rejected write to {table}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Warehouse for MockWarehouse {
    async fn init(&self) -> Result<()> {
        let mut tables = self.tables.write().await;
        for table in WarehouseTable::all() {
            tables.entry(table).or_default();
        }
        Ok(())
    }

    async fn truncate(&self, table: WarehouseTable) -> Result<()> {
        if *self.fail_on_truncate.read().await {
            return Err(StorageError::Unavailable(format!("cannot truncate {table}")));
        }
        self.tables.write().await.remove(&table);
        Ok(())
    }

    async fn upsert_dimension(&self, table: WarehouseTable, rows: &[WarehouseRow]) -> Result<u64> {
        self.check_write(table).await?;
        for row in rows {
            check_row(table, row)?;
        }

        let mut tables = self.tables.write().await;
        let target = tables.entry(table).or_default();
        let keys: BTreeSet<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        for row in rows {
            target.insert(row.key.clone(), row.clone());
        }
        Ok(keys.len() as u64)
    }

    async fn replace_facts(
        &self,
        table: WarehouseTable,
        window_start: Option<DateTime<Utc>>,
        rows: &[WarehouseRow],
    ) -> Result<u64> {
        self.check_write(table).await?;
        for row in rows {
            check_row(table, row)?;
        }

        let mut tables = self.tables.write().await;
        let target = tables.entry(table).or_default();
        if let Some(window_start) = window_start {
            target.retain(|_, row| row.event_at.map_or(true, |at| at <= window_start));
        }
        let keys: BTreeSet<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        for row in rows {
            target.insert(row.key.clone(), row.clone());
        }
        Ok(keys.len() as u64)
    }

    async fn existing_keys(
        &self,
        table: WarehouseTable,
        keys: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table)
            .map(|rows| keys.iter().filter(|k| rows.contains_key(*k)).cloned().collect())
            .unwrap_or_default())
    }

    async fn count(&self, table: WarehouseTable) -> Result<u64> {
        Ok(self
            .tables
            .read()
            .await
            .get(&table)
            .map_or(0, |rows| rows.len() as u64))
    }
}
