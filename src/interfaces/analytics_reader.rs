//! AnalyticsReader trait definition.

use async_trait::async_trait;

use super::Result;
use crate::analytics::{DailyAggregate, DateRange, KpiMetric, RankMetric, RankedItem, SeriesMetric};

/// Aggregate read contract served by the analytical store and, in degraded
/// mode, by live queries against the operational store.
///
/// Readers return per-day aggregates; bucketing into weeks or months and
/// turning `(sum, count)` into the metric's value is the query service's job,
/// so both sources produce identical shapes.
#[async_trait]
pub trait AnalyticsReader: Send + Sync {
    /// Whether this source is reachable and holds synced data.
    async fn is_ready(&self) -> Result<bool>;

    /// Per-day `(sum, count)` for a metric over an inclusive date range,
    /// ordered by date. Days without data are omitted.
    async fn daily_series(&self, metric: SeriesMetric, range: &DateRange) -> Result<Vec<DailyAggregate>>;

    /// Top `limit` entities for a metric, highest value first. `rank` is
    /// left for the caller to assign.
    async fn ranking(&self, metric: RankMetric, range: &DateRange, limit: u32) -> Result<Vec<RankedItem>>;

    /// Single scalar over the range.
    async fn kpi(&self, metric: KpiMetric, range: &DateRange) -> Result<f64>;
}
