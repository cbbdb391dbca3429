//! Row validation and batch bookkeeping shared by the dimension and fact
//! loaders.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::outcome::LoadStats;
use crate::model::{SourceRecord, WarehouseRow, WarehouseTable};

/// A single source row that cannot be mapped.
///
/// Logged and counted; never aborts the batch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("Row has an empty natural key")]
    MissingKey,

    #[error("Row {id} has a blank {field}")]
    BlankField { id: String, field: &'static str },

    #[error("Row {id} has a non-finite {field}")]
    NonFinite { id: String, field: &'static str },

    #[error("Row {id} clocks out before clocking in")]
    InvertedShift { id: String },
}

pub type TransformResult<T> = std::result::Result<T, TransformError>;

/// Trimmed natural key.
pub fn key(id: &str) -> TransformResult<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(TransformError::MissingKey);
    }
    Ok(id.to_string())
}

pub fn non_blank(id: &str, field: &'static str, value: &str) -> TransformResult<()> {
    if value.trim().is_empty() {
        return Err(TransformError::BlankField {
            id: id.to_string(),
            field,
        });
    }
    Ok(())
}

pub fn finite(id: &str, field: &'static str, value: f64) -> TransformResult<f64> {
    if !value.is_finite() {
        return Err(TransformError::NonFinite {
            id: id.to_string(),
            field,
        });
    }
    Ok(value)
}

/// Optional reference with blank values treated as absent.
pub fn reference(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// What happens to one extracted row.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    Load(WarehouseRow),
    Invalid,
    Unresolved,
}

/// One extracted row after mapping, tagged with its change timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub changed_at: DateTime<Utc>,
    pub disposition: Disposition,
}

impl Candidate {
    pub fn is_load(&self) -> bool {
        matches!(self.disposition, Disposition::Load(_))
    }
}

/// Map records in change order.
///
/// Rows that fail mapping are logged and marked invalid; the batch continues.
pub fn prepare<R, F>(table: WarehouseTable, mut records: Vec<R>, map: F) -> Vec<Candidate>
where
    R: SourceRecord,
    F: Fn(&R) -> TransformResult<WarehouseRow>,
{
    records.sort_by_key(|r| r.changed_at());
    records
        .iter()
        .map(|record| {
            let disposition = match map(record) {
                Ok(row) => Disposition::Load(row),
                Err(e) => {
                    warn!(
                        table = %table,
                        id = record.source_id(),
                        error = %e,
                        "Skipping invalid source row"
                    );
                    Disposition::Invalid
                }
            };
            Candidate {
                changed_at: record.changed_at(),
                disposition,
            }
        })
        .collect()
}

/// Highest change timestamp safe to commit as the new watermark.
///
/// Only loaded rows strictly older than the first skipped row count, so a
/// skipped row is always extracted again by the next incremental run.
pub fn high_water(candidates: &[Candidate]) -> Option<DateTime<Utc>> {
    let barrier = candidates
        .iter()
        .filter(|c| !c.is_load())
        .map(|c| c.changed_at)
        .min();
    candidates
        .iter()
        .filter(|c| c.is_load())
        .map(|c| c.changed_at)
        .filter(|at| barrier.map_or(true, |b| *at < b))
        .max()
}

/// Split candidates into rows to write and accounting.
///
/// `loaded` is left for the caller to fill from the store's answer.
pub fn partition(candidates: Vec<Candidate>) -> (Vec<WarehouseRow>, LoadStats) {
    let mut stats = LoadStats {
        extracted: candidates.len() as u64,
        ..Default::default()
    };
    let mut rows = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match candidate.disposition {
            Disposition::Load(row) => rows.push(row),
            Disposition::Invalid => stats.skipped_invalid += 1,
            Disposition::Unresolved => stats.skipped_unresolved += 1,
        }
    }
    (rows, stats)
}
