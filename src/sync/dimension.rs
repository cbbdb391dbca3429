//! Dimension loader.
//!
//! Extracts reference entities changed since the watermark, maps them to
//! their dimension rows and upserts them by natural key. `dim_date` is
//! generated from the calendar window instead of extracted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::calendar::{calendar_rows, CalendarOptions};
use super::kinds::DimensionKind;
use super::outcome::{LoadResult, LoadStats};
use super::transform::{finite, high_water, key, non_blank, partition, prepare, Candidate, TransformResult};
use crate::interfaces::{OperationalStore, Result, Warehouse};
use crate::model::{
    ArticleRecord, CustomerRecord, EmployeeRecord, SupplierRecord, WarehouseRecord, WarehouseRow,
};
use crate::storage::helpers::{double, flag, opt_date, opt_text, text, timestamp};

/// Missing status counts as active.
fn status_active(status: Option<&str>) -> bool {
    status.map_or(true, |s| s.trim().eq_ignore_ascii_case("active"))
}

fn customer_row(r: &CustomerRecord) -> TransformResult<WarehouseRow> {
    let id = key(&r.id)?;
    non_blank(&id, "name", &r.name)?;
    Ok(WarehouseRow::new(
        id.clone(),
        Some(r.changed_at),
        vec![
            text(id),
            text(r.name.trim()),
            opt_text(r.phone.as_deref()),
            opt_text(r.email.as_deref()),
            opt_text(r.address.as_deref()),
            opt_text(r.city.as_deref()),
            opt_text(r.customer_type.as_deref()),
            flag(status_active(r.status.as_deref())),
            timestamp(r.changed_at),
        ],
    ))
}

fn supplier_row(r: &SupplierRecord) -> TransformResult<WarehouseRow> {
    let id = key(&r.id)?;
    non_blank(&id, "name", &r.name)?;
    Ok(WarehouseRow::new(
        id.clone(),
        Some(r.changed_at),
        vec![
            text(id),
            text(r.name.trim()),
            opt_text(r.contact_person.as_deref()),
            opt_text(r.phone.as_deref()),
            opt_text(r.email.as_deref()),
            opt_text(r.address.as_deref()),
            opt_text(r.city.as_deref()),
            opt_text(r.supplier_type.as_deref()),
            flag(status_active(r.status.as_deref())),
            timestamp(r.changed_at),
        ],
    ))
}

fn article_row(r: &ArticleRecord) -> TransformResult<WarehouseRow> {
    let id = key(&r.id)?;
    non_blank(&id, "name", &r.name)?;
    let price = finite(&id, "price", r.price)?;
    let cost = finite(&id, "cost", r.cost)?;
    Ok(WarehouseRow::new(
        id.clone(),
        Some(r.changed_at),
        vec![
            text(id),
            opt_text(r.barcode.as_deref()),
            text(r.name.trim()),
            opt_text(r.description.as_deref()),
            opt_text(r.classification_id.as_deref()),
            opt_text(r.classification_name.as_deref()),
            opt_text(r.color_id.as_deref()),
            opt_text(r.color_name.as_deref()),
            opt_text(r.model_id.as_deref()),
            opt_text(r.model_name.as_deref()),
            opt_text(r.classification_name.as_deref()),
            double(price),
            double(cost),
            flag(true),
            timestamp(r.changed_at),
        ],
    ))
}

fn warehouse_row(r: &WarehouseRecord) -> TransformResult<WarehouseRow> {
    let id = key(&r.id)?;
    non_blank(&id, "name", &r.name)?;
    Ok(WarehouseRow::new(
        id.clone(),
        Some(r.changed_at),
        vec![
            text(id),
            opt_text(r.code.as_deref()),
            text(r.name.trim()),
            opt_text(r.city.as_deref()),
            opt_text(r.warehouse_type.as_deref()),
            flag(status_active(r.status.as_deref())),
            timestamp(r.changed_at),
        ],
    ))
}

fn employee_row(r: &EmployeeRecord) -> TransformResult<WarehouseRow> {
    let id = key(&r.id)?;
    non_blank(&id, "employee_name", &r.employee_name)?;
    let active = r
        .employment_status
        .as_deref()
        .is_some_and(|s| s.trim() == "ACTIVE");
    Ok(WarehouseRow::new(
        id.clone(),
        Some(r.changed_at),
        vec![
            text(id),
            opt_text(r.employee_code.as_deref()),
            text(r.employee_name.trim()),
            opt_text(r.department.as_deref()),
            opt_text(r.position.as_deref()),
            opt_date(r.hire_date),
            flag(active),
            timestamp(r.changed_at),
        ],
    ))
}

/// Loads one dimension table per call.
///
/// Never touches watermarks; the orchestrator commits the returned one.
pub struct DimensionLoader {
    source: Arc<dyn OperationalStore>,
    warehouse: Arc<dyn Warehouse>,
    calendar: CalendarOptions,
}

impl DimensionLoader {
    pub fn new(
        source: Arc<dyn OperationalStore>,
        warehouse: Arc<dyn Warehouse>,
        calendar: CalendarOptions,
    ) -> Self {
        Self {
            source,
            warehouse,
            calendar,
        }
    }

    /// Upsert rows changed after `since` (all rows when `None`).
    pub async fn load(&self, kind: DimensionKind, since: Option<DateTime<Utc>>) -> Result<LoadResult> {
        let table = kind.table();
        let candidates: Vec<Candidate> = match kind {
            DimensionKind::Date => return self.load_calendar().await,
            DimensionKind::Customer => prepare(table, self.source.customers(since).await?, customer_row),
            DimensionKind::Supplier => prepare(table, self.source.suppliers(since).await?, supplier_row),
            DimensionKind::Article => prepare(table, self.source.articles(since).await?, article_row),
            DimensionKind::Warehouse => {
                prepare(table, self.source.warehouses(since).await?, warehouse_row)
            }
            DimensionKind::Employee => prepare(table, self.source.employees(since).await?, employee_row),
        };

        let watermark = high_water(&candidates);
        let (rows, mut stats) = partition(candidates);
        if !rows.is_empty() {
            stats.loaded = self.warehouse.upsert_dimension(table, &rows).await?;
        }

        info!(
            table = %table,
            extracted = stats.extracted,
            rows = stats.loaded,
            skipped = stats.skipped_invalid,
            "Dimension loaded"
        );
        Ok(LoadResult { stats, watermark })
    }

    async fn load_calendar(&self) -> Result<LoadResult> {
        let rows = calendar_rows(&self.calendar);
        debug!(
            start = %self.calendar.start,
            end = %self.calendar.end,
            days = rows.len(),
            "Generating calendar"
        );
        let loaded = if rows.is_empty() {
            0
        } else {
            self.warehouse
                .upsert_dimension(DimensionKind::Date.table(), &rows)
                .await?
        };
        info!(table = %DimensionKind::Date.table(), rows = loaded, "Dimension loaded");
        Ok(LoadResult {
            stats: LoadStats {
                extracted: rows.len() as u64,
                loaded,
                ..Default::default()
            },
            watermark: None,
        })
    }
}
