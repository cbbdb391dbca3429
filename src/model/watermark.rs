//! Per-table sync cursor.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a table was (or is to be) synchronized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncType {
    /// Truncate and reload, ignoring stored watermarks.
    Full,
    /// Load only rows changed since the stored watermark.
    #[default]
    Incremental,
}

impl SyncType {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncType::Full => "full",
            SyncType::Incremental => "incremental",
        }
    }
}

impl fmt::Display for SyncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown sync type: {0} (expected full or incremental)")]
pub struct UnknownSyncType(pub String);

impl FromStr for SyncType {
    type Err = UnknownSyncType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(SyncType::Full),
            "incremental" => Ok(SyncType::Incremental),
            other => Err(UnknownSyncType(other.to_string())),
        }
    }
}

/// Stored cursor for one warehouse table.
///
/// `last_synced_at` is the high-water mark on the source change column.
/// `rows_synced` is the cardinality of the last successful run only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark {
    pub table_name: String,
    pub last_synced_at: DateTime<Utc>,
    pub rows_synced: u64,
    pub sync_type: SyncType,
}
