//! Analytics read path.
//!
//! Serves time-series, ranked and overview aggregates from the analytical
//! store once it holds synced data, and from live operational-store queries
//! otherwise.

mod service;
mod types;

pub use service::{bucket_series, AnalyticsQueryService};
pub use types::{
    Aggregation, DailyAggregate, DateRange, Granularity, KpiMetric, Overview, OverviewKpi,
    QueryParams, RankMetric, RankedItem, SeriesMetric, TimeSeriesPoint, DEFAULT_LIMIT, MAX_LIMIT,
};

use chrono::NaiveDate;

use crate::interfaces::StorageError;
use crate::sync::SyncError;

/// Query layer errors.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid granularity: {0}")]
    InvalidGranularity(String),

    #[error("Analytical store is not configured")]
    AnalyticalStoreUnavailable,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}
