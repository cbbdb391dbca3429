//! Mock WatermarkStore implementation for testing.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::interfaces::{Result, StorageError, WatermarkStore};
use crate::model::{SyncType, Watermark};

/// In-memory watermark table.
#[derive(Default)]
pub struct MockWatermarkStore {
    watermarks: RwLock<BTreeMap<String, Watermark>>,
    fail_on_set: RwLock<HashSet<String>>,
    fail_on_get: RwLock<bool>,
}

impl MockWatermarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `set` and `delete` for one table name.
    pub async fn set_fail_on_set(&self, table_name: &str, fail: bool) {
        let mut fail_on = self.fail_on_set.write().await;
        if fail {
            fail_on.insert(table_name.to_string());
        } else {
            fail_on.remove(table_name);
        }
    }

    pub async fn set_fail_on_get(&self, fail: bool) {
        *self.fail_on_get.write().await = fail;
    }

    /// Seed a watermark directly.
    pub async fn insert(&self, watermark: Watermark) {
        self.watermarks
            .write()
            .await
            .insert(watermark.table_name.clone(), watermark);
    }
}

#[async_trait]
impl WatermarkStore for MockWatermarkStore {
    async fn get(&self, table_name: &str) -> Result<Option<Watermark>> {
        if *self.fail_on_get.read().await {
            return Err(StorageError::Unavailable("watermark read failed".to_string()));
        }
        Ok(self.watermarks.read().await.get(table_name).cloned())
    }

    async fn set(
        &self,
        table_name: &str,
        last_synced_at: DateTime<Utc>,
        rows_synced: u64,
        sync_type: SyncType,
    ) -> Result<()> {
        if self.fail_on_set.read().await.contains(table_name) {
            return Err(StorageError::Unavailable(format!(
                "watermark write failed for {table_name}"
            )));
        }
        self.watermarks.write().await.insert(
            table_name.to_string(),
            Watermark {
                table_name: table_name.to_string(),
                last_synced_at,
                rows_synced,
                sync_type,
            },
        );
        Ok(())
    }

    async fn delete(&self, table_name: &str) -> Result<()> {
        if self.fail_on_set.read().await.contains(table_name) {
            return Err(StorageError::Unavailable(format!(
                "watermark delete failed for {table_name}"
            )));
        }
        self.watermarks.write().await.remove(table_name);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Watermark>> {
        Ok(self.watermarks.read().await.values().cloned().collect())
    }
}
