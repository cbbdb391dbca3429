//! Per-table and per-run results.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::model::{SyncType, WarehouseTable};

/// Row accounting for one table load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Rows returned by extraction (or generated, for `dim_date`).
    pub extracted: u64,
    /// Rows written to the warehouse.
    pub loaded: u64,
    /// Rows that failed transformation.
    pub skipped_invalid: u64,
    /// Fact rows referencing a missing dimension row.
    pub skipped_unresolved: u64,
}

impl LoadStats {
    pub fn skipped(&self) -> u64 {
        self.skipped_invalid + self.skipped_unresolved
    }
}

/// What a loader hands back to the orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadResult {
    pub stats: LoadStats,
    /// New high-water mark; `None` leaves the stored one unchanged.
    pub watermark: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum TableOutcome {
    Succeeded,
    Failed(String),
    /// Deadline hit while this table was loading.
    Cancelled,
    /// Not attempted because the deadline had already passed.
    Skipped,
}

impl TableOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TableOutcome::Succeeded)
    }
}

impl fmt::Display for TableOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableOutcome::Succeeded => f.write_str("succeeded"),
            TableOutcome::Failed(reason) => write!(f, "failed ({reason})"),
            TableOutcome::Cancelled => f.write_str("cancelled"),
            TableOutcome::Skipped => f.write_str("skipped"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TablePhase {
    Dimension,
    Fact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableReport {
    pub table: WarehouseTable,
    pub phase: TablePhase,
    #[serde(flatten)]
    pub outcome: TableOutcome,
    pub stats: LoadStats,
    /// Watermark written for this table, if any.
    pub watermark: Option<DateTime<Utc>>,
}

/// Orchestrator state, observable while a run is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    #[default]
    Idle,
    Dimensions,
    Facts,
    Completed,
    /// Last run ended with at least one table not succeeded.
    Failed,
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub mode: SyncType,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub outcomes: Vec<TableReport>,
    /// Post-run row count per table; tables whose count failed are absent.
    pub table_counts: BTreeMap<String, u64>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|r| r.outcome.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &TableReport> {
        self.outcomes.iter().filter(|r| !r.outcome.is_success())
    }

    pub fn report(&self, table: WarehouseTable) -> Option<&TableReport> {
        self.outcomes.iter().find(|r| r.table == table)
    }

    /// `table: outcome` for every table that did not succeed.
    pub fn failure_summary(&self) -> String {
        self.failures()
            .map(|r| format!("{}: {}", r.table, r.outcome))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
