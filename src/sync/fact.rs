//! Fact loader.
//!
//! Extracts transactional rows changed since the watermark, normalizes
//! currency, resolves dimension references and replaces the uncommitted
//! window of the fact table. Rows whose references do not resolve are
//! counted and left for a later run.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use super::calendar::{date_row, CalendarOptions};
use super::currency::ExchangeRates;
use super::kinds::{FactKind, Reference};
use super::outcome::LoadResult;
use super::transform::{
    finite, high_water, key, partition, prepare, reference, Candidate, Disposition, TransformError,
    TransformResult,
};
use crate::interfaces::{OperationalStore, Result, Warehouse};
use crate::model::{
    AttendanceRecord, FinancialRecord, InventoryMovementRecord, ProcurementRecord, SalesRecord,
    WarehouseRow, WarehouseTable,
};
use crate::storage::helpers::{
    as_str, bigint, date, double, opt_double, opt_text, opt_timestamp, text, timestamp,
};

/// Attendance rows are tagged with the system that produced them.
const ATTENDANCE_SOURCE: &str = "system";

fn sales_row(r: &SalesRecord, base: &str) -> TransformResult<WarehouseRow> {
    let id = key(&r.id)?;
    let unit_price = finite(&id, "unit_price", r.unit_price)?;
    let discount = finite(&id, "discount_amount", r.discount_amount)?;
    let tax = finite(&id, "tax_amount", r.tax_amount)?;
    let line_total = finite(&id, "line_total", r.line_total)?;
    let order_total = finite(&id, "order_total", r.order_total)?;

    Ok(WarehouseRow::new(
        id.clone(),
        Some(r.changed_at),
        vec![
            text(id),
            timestamp(r.changed_at),
            date(r.transaction_at.date_naive()),
            text(r.source_type.as_str()),
            text(r.order_id.as_str()),
            timestamp(r.transaction_at),
            opt_text(reference(r.customer_id.as_deref())),
            opt_text(reference(r.article_id.as_deref())),
            opt_text(reference(r.warehouse_id.as_deref())),
            opt_text(reference(r.cashier_id.as_deref())),
            bigint(r.quantity),
            double(unit_price),
            double(discount),
            double(tax),
            double(line_total),
            // sales are booked in the base currency
            double(line_total),
            double(order_total),
            text(base),
            text(r.status.as_str()),
            text(r.payment_method.as_str()),
            text(r.payment_status.as_str()),
            text(r.source_type.as_str()),
        ],
    ))
}

fn procurement_row(r: &ProcurementRecord, rates: &ExchangeRates) -> TransformResult<WarehouseRow> {
    let id = key(&r.id)?;
    let unit_price = finite(&id, "unit_price", r.unit_price)?;
    let line_total = finite(&id, "line_total", r.line_total)?;
    let order_total = finite(&id, "order_total", r.order_total)?;
    let currency = match r.currency.trim() {
        "" => rates.base().to_string(),
        code => code.to_ascii_uppercase(),
    };
    let rate = rates.rate(&currency);

    Ok(WarehouseRow::new(
        id.clone(),
        Some(r.changed_at),
        vec![
            text(id),
            timestamp(r.changed_at),
            date(r.transaction_at.date_naive()),
            text(r.po_id.as_str()),
            text(r.po_number.as_str()),
            timestamp(r.transaction_at),
            opt_text(reference(r.supplier_id.as_deref())),
            opt_text(reference(r.article_id.as_deref())),
            opt_text(reference(r.created_by_id.as_deref())),
            bigint(r.quantity),
            bigint(r.received_quantity),
            double(unit_price),
            double(line_total),
            opt_double(rate.map(|rate| line_total * rate)),
            double(order_total),
            opt_double(rate.map(|rate| order_total * rate)),
            text(currency),
            opt_double(rate),
            text(r.status.as_str()),
            text(r.payment_status.as_str()),
            text(r.payment_terms.as_str()),
            opt_text(reference(r.purchase_request_id.as_deref())),
        ],
    ))
}

fn inventory_row(r: &InventoryMovementRecord) -> TransformResult<WarehouseRow> {
    let id = key(&r.id)?;
    let unit_cost = finite(&id, "unit_cost", r.unit_cost)?;

    Ok(WarehouseRow::new(
        id.clone(),
        Some(r.changed_at),
        vec![
            text(id),
            timestamp(r.changed_at),
            date(r.movement_at.date_naive()),
            timestamp(r.movement_at),
            opt_text(reference(r.article_id.as_deref())),
            opt_text(reference(r.warehouse_id.as_deref())),
            bigint(r.quantity),
            double(unit_cost),
            double(r.quantity as f64 * unit_cost),
            text(r.movement_type.as_str()),
            text(r.reference_id.as_str()),
            text(r.reference_type.as_str()),
        ],
    ))
}

fn financial_row(r: &FinancialRecord, rates: &ExchangeRates) -> TransformResult<WarehouseRow> {
    let id = key(&r.id)?;
    let debit = finite(&id, "debit_amount", r.debit_amount)?;
    let credit = finite(&id, "credit_amount", r.credit_amount)?;
    // entries without a captured rate are booked at par
    let rate = match finite(&id, "exchange_rate", r.exchange_rate)? {
        rate if rate > 0.0 => rate,
        _ => 1.0,
    };
    let currency = match r.currency_code.trim() {
        "" => rates.base().to_string(),
        code => code.to_ascii_uppercase(),
    };

    Ok(WarehouseRow::new(
        id.clone(),
        Some(r.changed_at),
        vec![
            text(id),
            timestamp(r.changed_at),
            date(r.entry_date),
            text(r.journal_entry_id.as_str()),
            text(r.entry_number.as_str()),
            opt_text(reference(r.account_id.as_deref())),
            text(r.account_code.as_str()),
            text(r.account_name.as_str()),
            text(r.company_id.as_str()),
            double(debit),
            double(credit),
            double(debit * rate),
            double(credit * rate),
            text(currency),
            double(rate),
            text(r.status.as_str()),
            text(r.source_module.as_str()),
            text(r.source_id.as_str()),
            text(r.description.as_str()),
        ],
    ))
}

fn attendance_row(r: &AttendanceRecord) -> TransformResult<WarehouseRow> {
    let id = key(&r.id)?;
    if let (Some(clock_in), Some(clock_out)) = (r.clock_in, r.clock_out) {
        if clock_out < clock_in {
            return Err(TransformError::InvertedShift { id });
        }
    }
    let work_hours = finite(&id, "work_hours", r.work_hours)?;
    let overtime_hours = finite(&id, "overtime_hours", r.overtime_hours)?;

    Ok(WarehouseRow::new(
        id.clone(),
        Some(r.changed_at),
        vec![
            text(id),
            timestamp(r.changed_at),
            date(r.attendance_date),
            opt_text(reference(r.employee_id.as_deref())),
            opt_timestamp(r.clock_in),
            opt_timestamp(r.clock_out),
            double(work_hours),
            double(overtime_hours),
            bigint(r.late_minutes),
            bigint(r.early_out_minutes),
            text(r.status.as_str()),
            text(ATTENDANCE_SOURCE),
        ],
    ))
}

/// Present reference value of a mapped row.
fn referenced<'a>(table: WarehouseTable, row: &'a WarehouseRow, r: &Reference) -> Option<&'a str> {
    row.value(table, r.column).and_then(as_str)
}

/// Loads one fact table per call.
///
/// Never touches watermarks; the orchestrator commits the returned one.
/// Days outside the configured calendar window are added to `dim_date` on
/// demand, so a fact's date never holds back its table.
pub struct FactLoader {
    source: Arc<dyn OperationalStore>,
    warehouse: Arc<dyn Warehouse>,
    rates: ExchangeRates,
    calendar: CalendarOptions,
}

impl FactLoader {
    pub fn new(
        source: Arc<dyn OperationalStore>,
        warehouse: Arc<dyn Warehouse>,
        rates: ExchangeRates,
        calendar: CalendarOptions,
    ) -> Self {
        Self {
            source,
            warehouse,
            rates,
            calendar,
        }
    }

    /// Replace facts changed after `since` (all facts when `None`).
    pub async fn load(&self, kind: FactKind, since: Option<DateTime<Utc>>) -> Result<LoadResult> {
        let table = kind.table();
        let base = self.rates.base();
        let rates = &self.rates;
        let mut candidates = match kind {
            FactKind::Sales => prepare(table, self.source.sales(since).await?, |r| sales_row(r, base)),
            FactKind::Procurement => prepare(table, self.source.procurement(since).await?, |r| {
                procurement_row(r, rates)
            }),
            FactKind::InventoryMovement => {
                prepare(table, self.source.inventory_movements(since).await?, inventory_row)
            }
            FactKind::FinancialTransaction => {
                prepare(table, self.source.financial_transactions(since).await?, |r| {
                    financial_row(r, rates)
                })
            }
            FactKind::Attendance => prepare(table, self.source.attendance(since).await?, attendance_row),
        };

        self.resolve(kind, &mut candidates).await?;

        let watermark = high_water(&candidates);
        let (rows, mut stats) = partition(candidates);
        stats.loaded = self.warehouse.replace_facts(table, since, &rows).await?;

        info!(
            table = %table,
            extracted = stats.extracted,
            rows = stats.loaded,
            skipped_invalid = stats.skipped_invalid,
            skipped_unresolved = stats.skipped_unresolved,
            "Facts loaded"
        );
        Ok(LoadResult { stats, watermark })
    }

    /// Mark rows whose present references name a missing dimension row.
    async fn resolve(&self, kind: FactKind, candidates: &mut [Candidate]) -> Result<()> {
        let table = kind.table();
        let mut found: HashMap<&'static str, BTreeSet<String>> = HashMap::new();

        for r in kind.references() {
            let wanted: BTreeSet<String> = candidates
                .iter()
                .filter_map(|c| match &c.disposition {
                    Disposition::Load(row) => referenced(table, row, r),
                    _ => None,
                })
                .map(str::to_string)
                .collect();
            let mut existing = if wanted.is_empty() {
                BTreeSet::new()
            } else {
                self.warehouse.existing_keys(r.dimension, &wanted).await?
            };
            if r.dimension == WarehouseTable::DimDate {
                let added = self.extend_calendar(table, &wanted, &existing).await?;
                existing.extend(added);
            }
            found.insert(r.column, existing);
        }

        for candidate in candidates.iter_mut() {
            let Disposition::Load(row) = &candidate.disposition else {
                continue;
            };
            let missing = kind.references().iter().find(|r| {
                referenced(table, row, r)
                    .is_some_and(|v| !found.get(r.column).is_some_and(|keys| keys.contains(v)))
            });
            if let Some(r) = missing {
                debug!(
                    table = %table,
                    id = %row.key,
                    column = r.column,
                    dimension = %r.dimension,
                    "Unresolved dimension reference"
                );
                candidate.disposition = Disposition::Unresolved;
            }
        }
        Ok(())
    }

    /// Upsert `dim_date` rows for referenced days it does not hold yet.
    async fn extend_calendar(
        &self,
        table: WarehouseTable,
        wanted: &BTreeSet<String>,
        existing: &BTreeSet<String>,
    ) -> Result<Vec<String>> {
        let rows: Vec<WarehouseRow> = wanted
            .difference(existing)
            .filter_map(|k| NaiveDate::parse_from_str(k, "%Y-%m-%d").ok())
            .map(|d| date_row(&self.calendar, d))
            .collect();
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        self.warehouse
            .upsert_dimension(WarehouseTable::DimDate, &rows)
            .await?;
        info!(
            table = %table,
            days = rows.len(),
            first = %rows[0].key,
            "Calendar extended for out-of-window facts"
        );
        Ok(rows.into_iter().map(|row| row.key).collect())
    }
}
