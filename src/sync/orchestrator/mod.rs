//! Batch sync orchestrator.
//!
//! One run loads every dimension, then every fact, one table at a time.
//! Each table's watermark is committed as soon as that table's load returns,
//! so a failure or deadline only costs the tables not yet committed.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::calendar::CalendarOptions;
use super::currency::ExchangeRates;
use super::dimension::DimensionLoader;
use super::fact::FactLoader;
use super::kinds::{DimensionKind, FactKind};
use super::outcome::{LoadResult, RunPhase, SyncReport, TableOutcome, TablePhase, TableReport};
use crate::interfaces::{OperationalStore, Result, Warehouse, WatermarkStore};
use crate::model::{SyncType, WarehouseTable};

/// Default base currency.
pub const DEFAULT_BASE_CURRENCY: &str = "IDR";
/// Default run deadline in seconds.
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 1800;
/// Default number of consecutive runs with unresolved references before
/// escalating to error logs.
pub const DEFAULT_UNRESOLVED_ALERT_AFTER: u32 = 3;

/// Sync pipeline configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    /// Currency every `*_base` measure is expressed in.
    pub base_currency: String,
    /// Static snapshot of units of base currency per unit of each code.
    pub exchange_rates: HashMap<String, f64>,
    pub unresolved_alert_after: u32,
    pub run_timeout_secs: u64,
    pub calendar: CalendarOptions,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            exchange_rates: HashMap::new(),
            unresolved_alert_after: DEFAULT_UNRESOLVED_ALERT_AFTER,
            run_timeout_secs: DEFAULT_RUN_TIMEOUT_SECS,
            calendar: CalendarOptions::default(),
        }
    }
}

/// Per-run execution context.
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    /// Loads still running at this instant are cancelled; tables not yet
    /// started are skipped.
    pub deadline: Instant,
}

impl RunContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
        }
    }
}

/// Errors from a sync run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Sync run incomplete: {}", .0.failure_summary())]
    Incomplete(Box<SyncReport>),

    #[error("A sync run is already in progress")]
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Dimension(DimensionKind),
    Fact(FactKind),
}

impl Step {
    fn table(self) -> WarehouseTable {
        match self {
            Step::Dimension(kind) => kind.table(),
            Step::Fact(kind) => kind.table(),
        }
    }

    fn phase(self) -> TablePhase {
        match self {
            Step::Dimension(_) => TablePhase::Dimension,
            Step::Fact(_) => TablePhase::Fact,
        }
    }
}

/// What a table load needs to commit its watermark.
struct Loaded {
    result: LoadResult,
    previous: Option<DateTime<Utc>>,
    sync_type: SyncType,
}

/// State carried across runs, guarded by the single-flight lock.
#[derive(Default)]
struct RunState {
    /// Consecutive runs in which a fact table skipped unresolved rows.
    unresolved_streaks: HashMap<WarehouseTable, u32>,
}

/// Drives dimension and fact loads and commits watermarks.
pub struct BatchSyncOrchestrator {
    dimensions: DimensionLoader,
    facts: FactLoader,
    warehouse: Arc<dyn Warehouse>,
    watermarks: Arc<dyn WatermarkStore>,
    options: SyncOptions,
    state: Mutex<RunState>,
    phase: watch::Sender<RunPhase>,
}

impl BatchSyncOrchestrator {
    pub fn new(
        source: Arc<dyn OperationalStore>,
        warehouse: Arc<dyn Warehouse>,
        watermarks: Arc<dyn WatermarkStore>,
        options: SyncOptions,
    ) -> Self {
        let rates = ExchangeRates::new(&options.base_currency, &options.exchange_rates);
        let (phase, _) = watch::channel(RunPhase::Idle);
        Self {
            dimensions: DimensionLoader::new(
                source.clone(),
                warehouse.clone(),
                options.calendar.clone(),
            ),
            facts: FactLoader::new(source, warehouse.clone(), rates, options.calendar.clone()),
            warehouse,
            watermarks,
            options,
            state: Mutex::new(RunState::default()),
            phase,
        }
    }

    /// Context with the configured deadline from now.
    pub fn default_context(&self) -> RunContext {
        RunContext::with_timeout(Duration::from_secs(self.options.run_timeout_secs))
    }

    /// Subscribe to the current run phase.
    pub fn phase(&self) -> watch::Receiver<RunPhase> {
        self.phase.subscribe()
    }

    pub async fn run_full_sync(&self, ctx: RunContext) -> std::result::Result<SyncReport, SyncError> {
        self.run(SyncType::Full, ctx).await
    }

    pub async fn run_incremental_sync(
        &self,
        ctx: RunContext,
    ) -> std::result::Result<SyncReport, SyncError> {
        self.run(SyncType::Incremental, ctx).await
    }

    /// Run every table in order.
    ///
    /// `Ok` only when every table succeeded. A concurrent call returns
    /// [`SyncError::AlreadyRunning`] without touching any store.
    pub async fn run(
        &self,
        mode: SyncType,
        ctx: RunContext,
    ) -> std::result::Result<SyncReport, SyncError> {
        let mut state = self.state.try_lock().map_err(|_| SyncError::AlreadyRunning)?;

        let started_at = Utc::now();
        let clock = std::time::Instant::now();
        info!(mode = %mode, "Starting sync run");

        let mut outcomes = Vec::with_capacity(DimensionKind::ALL.len() + FactKind::ALL.len());

        self.phase.send_replace(RunPhase::Dimensions);
        for kind in DimensionKind::ALL {
            outcomes.push(self.sync_table(Step::Dimension(kind), mode, &ctx).await);
        }

        self.phase.send_replace(RunPhase::Facts);
        for kind in FactKind::ALL {
            let report = self.sync_table(Step::Fact(kind), mode, &ctx).await;
            self.track_unresolved(&mut state, &report);
            outcomes.push(report);
        }

        let report = SyncReport {
            mode,
            started_at,
            elapsed: clock.elapsed(),
            outcomes,
            table_counts: self.table_counts().await,
        };

        if report.is_complete() {
            self.phase.send_replace(RunPhase::Completed);
            info!(
                mode = %mode,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Sync run completed"
            );
            Ok(report)
        } else {
            self.phase.send_replace(RunPhase::Failed);
            error!(
                mode = %mode,
                failures = %report.failure_summary(),
                "Sync run incomplete"
            );
            Err(SyncError::Incomplete(Box::new(report)))
        }
    }

    async fn sync_table(&self, step: Step, mode: SyncType, ctx: &RunContext) -> TableReport {
        let table = step.table();
        let mut report = TableReport {
            table,
            phase: step.phase(),
            outcome: TableOutcome::Skipped,
            stats: Default::default(),
            watermark: None,
        };

        if Instant::now() >= ctx.deadline {
            warn!(table = %table, "Deadline passed, skipping table");
            return report;
        }

        let loaded = match tokio::time::timeout_at(ctx.deadline, self.load_table(step, mode)).await {
            Err(_) => {
                warn!(table = %table, "Deadline hit, table load cancelled");
                report.outcome = TableOutcome::Cancelled;
                return report;
            }
            Ok(Err(e)) => {
                error!(table = %table, error = %e, "Table sync failed");
                report.outcome = TableOutcome::Failed(e.to_string());
                return report;
            }
            Ok(Ok(loaded)) => loaded,
        };

        report.stats = loaded.result.stats;
        let watermark = loaded
            .result
            .watermark
            .or(loaded.previous)
            .unwrap_or_default();

        match self
            .watermarks
            .set(table.name(), watermark, loaded.result.stats.loaded, loaded.sync_type)
            .await
        {
            Ok(()) => {
                report.outcome = TableOutcome::Succeeded;
                report.watermark = Some(watermark);
            }
            Err(e) => {
                error!(table = %table, error = %e, "Watermark write failed");
                report.outcome = TableOutcome::Failed(format!("watermark write: {e}"));
            }
        }
        report
    }

    async fn load_table(&self, step: Step, mode: SyncType) -> Result<Loaded> {
        let table = step.table();
        let (since, sync_type) = match mode {
            SyncType::Full => {
                // A truncated table must not keep a cursor past rows it no
                // longer holds; if this load stops early the next run
                // falls back to full.
                self.watermarks.delete(table.name()).await?;
                self.warehouse.truncate(table).await?;
                (None, SyncType::Full)
            }
            SyncType::Incremental => match self.watermarks.get(table.name()).await? {
                Some(watermark) => (Some(watermark.last_synced_at), SyncType::Incremental),
                None => (None, SyncType::Full),
            },
        };

        let result = match step {
            Step::Dimension(kind) => self.dimensions.load(kind, since).await?,
            Step::Fact(kind) => self.facts.load(kind, since).await?,
        };
        Ok(Loaded {
            result,
            previous: since,
            sync_type,
        })
    }

    fn track_unresolved(&self, state: &mut RunState, report: &TableReport) {
        if !report.outcome.is_success() {
            return;
        }
        let skipped = report.stats.skipped_unresolved;
        if skipped == 0 {
            state.unresolved_streaks.remove(&report.table);
            return;
        }

        let streak = state.unresolved_streaks.entry(report.table).or_insert(0);
        *streak += 1;
        if *streak >= self.options.unresolved_alert_after.max(1) {
            error!(
                table = %report.table,
                skipped,
                consecutive_runs = *streak,
                "Unresolved dimension references persist"
            );
        } else {
            warn!(
                table = %report.table,
                skipped,
                consecutive_runs = *streak,
                "Facts skipped for unresolved dimension references"
            );
        }
    }

    async fn table_counts(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for table in WarehouseTable::all() {
            match self.warehouse.count(table).await {
                Ok(n) => {
                    counts.insert(table.name().to_string(), n);
                }
                Err(e) => warn!(table = %table, error = %e, "Row count failed"),
            }
        }
        counts
    }
}
