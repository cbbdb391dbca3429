//! Analytics query service.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::types::{
    Aggregation, DailyAggregate, Granularity, KpiMetric, Overview, OverviewKpi, QueryParams,
    RankMetric, RankedItem, SeriesMetric, TimeSeriesPoint,
};
use super::QueryError;
use crate::interfaces::{AnalyticsReader, WatermarkStore};
use crate::model::{SyncType, Watermark};
use crate::sync::{BatchSyncOrchestrator, SyncReport};

/// Read path over the analytical store with an operational fallback.
///
/// Every call re-aggregates; nothing is cached.
pub struct AnalyticsQueryService {
    operational: Arc<dyn AnalyticsReader>,
    analytical: Option<Arc<dyn AnalyticsReader>>,
    watermarks: Option<Arc<dyn WatermarkStore>>,
    orchestrator: Option<Arc<BatchSyncOrchestrator>>,
}

impl AnalyticsQueryService {
    /// Service answering from the operational store only.
    pub fn new(operational: Arc<dyn AnalyticsReader>) -> Self {
        Self {
            operational,
            analytical: None,
            watermarks: None,
            orchestrator: None,
        }
    }

    /// Prefer the analytical store whenever it reports ready.
    pub fn with_analytical(
        mut self,
        reader: Arc<dyn AnalyticsReader>,
        watermarks: Arc<dyn WatermarkStore>,
    ) -> Self {
        self.analytical = Some(reader);
        self.watermarks = Some(watermarks);
        self
    }

    /// Enable on-demand sync triggering.
    pub fn with_orchestrator(mut self, orchestrator: Arc<BatchSyncOrchestrator>) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    /// Pick the analytical store when populated, else the operational store.
    async fn reader(&self) -> &dyn AnalyticsReader {
        if let Some(analytical) = &self.analytical {
            match analytical.is_ready().await {
                Ok(true) => return analytical.as_ref(),
                Ok(false) => debug!("Analytical store not yet populated, using operational store"),
                Err(e) => warn!(error = %e, "Analytical store unavailable, using operational store"),
            }
        }
        self.operational.as_ref()
    }

    /// Time series bucketed by the requested granularity.
    pub async fn series(
        &self,
        metric: SeriesMetric,
        params: &QueryParams,
    ) -> Result<Vec<TimeSeriesPoint>, QueryError> {
        let range = params.range()?;
        let daily = self.reader().await.daily_series(metric, &range).await?;
        Ok(bucket_series(&daily, params.granularity, metric.aggregation()))
    }

    /// Top-N entities, ranked from 1.
    pub async fn rankings(
        &self,
        metric: RankMetric,
        params: &QueryParams,
    ) -> Result<Vec<RankedItem>, QueryError> {
        let range = params.range()?;
        let limit = params.effective_limit();
        let mut items = self.reader().await.ranking(metric, &range, limit).await?;
        items.truncate(limit as usize);
        for (i, item) in items.iter_mut().enumerate() {
            item.rank = i as u32 + 1;
        }
        Ok(items)
    }

    /// KPIs for the range alongside the preceding range of equal length.
    pub async fn overview(&self, params: &QueryParams) -> Result<Overview, QueryError> {
        let range = params.range()?;
        let prior = range.prior();
        let reader = self.reader().await;

        let kpi = |metric: KpiMetric| async move {
            let current = reader.kpi(metric, &range).await?;
            let previous = reader.kpi(metric, &prior).await?;
            Ok::<_, QueryError>(OverviewKpi::new(metric, current, previous))
        };

        Ok(Overview {
            revenue: kpi(KpiMetric::Revenue).await?,
            orders: kpi(KpiMetric::Orders).await?,
            procurement_spend: kpi(KpiMetric::ProcurementSpend).await?,
            inventory_movements: kpi(KpiMetric::InventoryMovements).await?,
            attendance: kpi(KpiMetric::AttendanceRate).await?,
        })
    }

    /// Stored watermarks, ordered by table name.
    pub async fn sync_status(&self) -> Result<Vec<Watermark>, QueryError> {
        let watermarks = self
            .watermarks
            .as_ref()
            .ok_or(QueryError::AnalyticalStoreUnavailable)?;
        Ok(watermarks.list_all().await?)
    }

    /// Run a sync now with the orchestrator's configured deadline.
    pub async fn trigger_sync(&self, mode: SyncType) -> Result<SyncReport, QueryError> {
        let orchestrator = self
            .orchestrator
            .as_ref()
            .ok_or(QueryError::AnalyticalStoreUnavailable)?;
        let ctx = orchestrator.default_context();
        Ok(orchestrator.run(mode, ctx).await?)
    }
}

/// Fold per-day aggregates into buckets keyed by the bucket's first day.
pub fn bucket_series(
    daily: &[DailyAggregate],
    granularity: Granularity,
    aggregation: Aggregation,
) -> Vec<TimeSeriesPoint> {
    let mut buckets: BTreeMap<_, (f64, u64)> = BTreeMap::new();
    for day in daily {
        let entry = buckets
            .entry(granularity.bucket_start(day.date))
            .or_insert((0.0, 0));
        entry.0 += day.sum;
        entry.1 += day.count;
    }

    buckets
        .into_iter()
        .map(|(date, (sum, count))| TimeSeriesPoint {
            date: date.format("%Y-%m-%d").to_string(),
            value: aggregation.value(sum, count),
        })
        .collect()
}
