//! PostgreSQL operational store.
//!
//! Reads the ERP's transactional schema. Every extraction query projects
//! one record shape, exposes `changed_at` as `COALESCE(updated_at,
//! created_at)` and is wrapped by [`changed_since`] for the watermark filter
//! and ordering.
//!
//! The same pool also serves live aggregates when the analytical store is
//! not ready.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::analytics::{DailyAggregate, DateRange, KpiMetric, RankMetric, RankedItem, SeriesMetric};
use crate::interfaces::{AnalyticsReader, OperationalStore, Result};
use crate::model::{
    ArticleRecord, AttendanceRecord, CustomerRecord, EmployeeRecord, FinancialRecord,
    InventoryMovementRecord, ProcurementRecord, SalesRecord, SupplierRecord, WarehouseRecord,
};

const CUSTOMERS: &str = r#"
SELECT id::text AS id,
       COALESCE(name, '') AS name,
       phone, email, address, city,
       customer_type,
       status,
       COALESCE(updated_at, created_at)::timestamptz AS changed_at
FROM customers"#;

const SUPPLIERS: &str = r#"
SELECT id::text AS id,
       COALESCE(name, '') AS name,
       contact_person, phone, email, address, city,
       supplier_type,
       status,
       COALESCE(updated_at, created_at)::timestamptz AS changed_at
FROM suppliers"#;

const ARTICLES: &str = r#"
SELECT a.id::text AS id,
       a.barcode,
       COALESCE(a.name, '') AS name,
       a.description,
       a.classification_id::text AS classification_id,
       cl.name AS classification_name,
       a.color_id::text AS color_id,
       co.name AS color_name,
       a.model_id::text AS model_id,
       m.name AS model_name,
       COALESCE(a.price, 0)::float8 AS price,
       COALESCE(a.cost, 0)::float8 AS cost,
       COALESCE(a.updated_at, a.created_at)::timestamptz AS changed_at
FROM articles a
LEFT JOIN classifications cl ON a.classification_id = cl.id
LEFT JOIN colors co ON a.color_id = co.id
LEFT JOIN models m ON a.model_id = m.id"#;

const WAREHOUSES: &str = r#"
SELECT id::text AS id,
       code,
       COALESCE(name, '') AS name,
       city,
       type AS warehouse_type,
       status,
       COALESCE(updated_at, created_at)::timestamptz AS changed_at
FROM warehouses"#;

const EMPLOYEES: &str = r#"
SELECT id::text AS id,
       employee_code,
       COALESCE(employee_name, '') AS employee_name,
       department, position,
       hire_date::date AS hire_date,
       employment_status,
       COALESCE(updated_at, created_at)::timestamptz AS changed_at
FROM employees"#;

/// Sales order headers and POS item lines in one shape.
const SALES: &str = r#"
SELECT so.id::text AS id,
       'sales_order'::text AS source_type,
       so.id::text AS order_id,
       COALESCE(so.order_date, so.created_at)::timestamptz AS transaction_at,
       so.customer_id::text AS customer_id,
       NULL::text AS article_id,
       NULL::text AS warehouse_id,
       NULL::text AS cashier_id,
       1::bigint AS quantity,
       COALESCE(so.total_amount, 0)::float8 AS unit_price,
       0::float8 AS discount_amount,
       0::float8 AS tax_amount,
       COALESCE(so.total_amount, 0)::float8 AS line_total,
       COALESCE(so.total_amount, 0)::float8 AS order_total,
       COALESCE(so.status, '') AS status,
       ''::text AS payment_method,
       ''::text AS payment_status,
       COALESCE(so.updated_at, so.created_at)::timestamptz AS changed_at
FROM sales_orders so
UNION ALL
SELECT pi.id::text,
       'pos'::text,
       pt.id::text,
       COALESCE(pt.transaction_date, pt.created_at)::timestamptz,
       NULL::text,
       pi.article_id::text,
       NULL::text,
       pt.cashier_id::text,
       COALESCE(pi.quantity, 0)::bigint,
       COALESCE(pi.unit_price, 0)::float8,
       (COALESCE(pi.unit_price, 0) * COALESCE(pi.quantity, 0)
           * COALESCE(pi.discount_percentage, 0) / 100)::float8,
       COALESCE(pt.tax_amount, 0)::float8,
       COALESCE(pi.line_total, 0)::float8,
       COALESCE(pt.total_amount, 0)::float8,
       'completed'::text,
       COALESCE(pt.payment_method, ''),
       COALESCE(pt.payment_status, ''),
       GREATEST(COALESCE(pi.updated_at, pi.created_at),
                COALESCE(pt.updated_at, pt.created_at))::timestamptz
FROM pos_items pi
JOIN pos_transactions pt ON pi.pos_transaction_id = pt.id"#;

const PROCUREMENT: &str = r#"
SELECT ppoi.id::text AS id,
       ppo.id::text AS po_id,
       COALESCE(ppo.po_number, '') AS po_number,
       COALESCE(ppo.order_date, ppo.created_at)::timestamptz AS transaction_at,
       ppo.supplier_id::text AS supplier_id,
       ppoi.article_id::text AS article_id,
       ppo.created_by::text AS created_by_id,
       COALESCE(ppoi.quantity, 0)::bigint AS quantity,
       COALESCE(ppoi.received_quantity, 0)::bigint AS received_quantity,
       COALESCE(ppoi.unit_price, 0)::float8 AS unit_price,
       COALESCE(ppoi.line_total, 0)::float8 AS line_total,
       COALESCE(ppo.total_amount, 0)::float8 AS order_total,
       COALESCE(ppo.currency, '') AS currency,
       COALESCE(ppo.status, '') AS status,
       COALESCE(ppo.payment_status, '') AS payment_status,
       COALESCE(ppo.payment_terms, '') AS payment_terms,
       ppo.purchase_request_id::text AS purchase_request_id,
       GREATEST(COALESCE(ppoi.updated_at, ppoi.created_at),
                COALESCE(ppo.updated_at, ppo.created_at))::timestamptz AS changed_at
FROM procurement_purchase_order_items ppoi
JOIN procurement_purchase_orders ppo ON ppoi.purchase_order_id = ppo.id"#;

const INVENTORY_MOVEMENTS: &str = r#"
SELECT sm.id::text AS id,
       COALESCE(sm.movement_date, sm.created_at)::timestamptz AS movement_at,
       sm.article_id::text AS article_id,
       sm.warehouse_id::text AS warehouse_id,
       COALESCE(sm.quantity, 0)::bigint AS quantity,
       COALESCE(sm.unit_cost, 0)::float8 AS unit_cost,
       COALESCE(sm.movement_type, '') AS movement_type,
       COALESCE(sm.reference_id::text, '') AS reference_id,
       COALESCE(sm.reference_type, '') AS reference_type,
       COALESCE(sm.updated_at, sm.created_at)::timestamptz AS changed_at
FROM stock_movements sm"#;

const FINANCIAL_TRANSACTIONS: &str = r#"
SELECT jel.id::text AS id,
       je.id::text AS journal_entry_id,
       COALESCE(je.entry_number, '') AS entry_number,
       je.entry_date::date AS entry_date,
       jel.account_id::text AS account_id,
       COALESCE(coa.account_code, '') AS account_code,
       COALESCE(coa.account_name, '') AS account_name,
       COALESCE(je.company_id::text, '') AS company_id,
       COALESCE(jel.description, je.description, '') AS description,
       COALESCE(jel.debit_amount, 0)::float8 AS debit_amount,
       COALESCE(jel.credit_amount, 0)::float8 AS credit_amount,
       COALESCE(je.currency_code, '') AS currency_code,
       COALESCE(je.exchange_rate, 1)::float8 AS exchange_rate,
       COALESCE(je.source_module, '') AS source_module,
       COALESCE(je.source_id::text, '') AS source_id,
       COALESCE(je.status, '') AS status,
       GREATEST(COALESCE(jel.updated_at, jel.created_at),
                COALESCE(je.updated_at, je.created_at))::timestamptz AS changed_at
FROM journal_entry_lines jel
JOIN journal_entries je ON jel.journal_entry_id = je.id
LEFT JOIN chart_of_accounts coa ON jel.account_id = coa.id"#;

const ATTENDANCE: &str = r#"
SELECT dat.id::text AS id,
       dat.attendance_date::date AS attendance_date,
       dat.employee_id::text AS employee_id,
       dat.actual_in::timestamptz AS clock_in,
       dat.actual_out::timestamptz AS clock_out,
       COALESCE(dat.work_hours, 0)::float8 AS work_hours,
       COALESCE(dat.overtime_hours, 0)::float8 AS overtime_hours,
       COALESCE(dat.late_minutes, 0)::bigint AS late_minutes,
       COALESCE(dat.early_out_minutes, 0)::bigint AS early_out_minutes,
       COALESCE(dat.status, '') AS status,
       COALESCE(dat.updated_at, dat.created_at)::timestamptz AS changed_at
FROM daily_attendance_tracking dat"#;

/// Wrap an extraction query with the watermark filter and change ordering.
///
/// `$1` is the optional watermark; NULL selects every row.
fn changed_since(select: &str) -> String {
    format!(
        "SELECT * FROM ({select}) src \
         WHERE ($1::timestamptz IS NULL OR src.changed_at > $1) \
         ORDER BY src.changed_at, src.id"
    )
}

/// Live per-day aggregate as `(day, sum, count)` over `$1..=$2`.
fn daily_series_sql(metric: SeriesMetric) -> &'static str {
    match metric {
        SeriesMetric::Revenue => {
            "SELECT so.order_date::date AS d, \
                    COALESCE(SUM(soi.total_price), 0)::float8, COUNT(*)::bigint \
             FROM sales_order_items soi \
             JOIN sales_orders so ON soi.sales_order_id = so.id \
             WHERE so.order_date::date >= $1 AND so.order_date::date <= $2 \
             GROUP BY d ORDER BY d"
        }
        SeriesMetric::ProcurementSpend => {
            "SELECT order_date::date AS d, \
                    COALESCE(SUM(total_amount), 0)::float8, COUNT(*)::bigint \
             FROM procurement_purchase_orders \
             WHERE order_date::date >= $1 AND order_date::date <= $2 \
             GROUP BY d ORDER BY d"
        }
        SeriesMetric::InventoryMovement => {
            "SELECT movement_date::date AS d, 0::float8, COUNT(*)::bigint \
             FROM stock_movements \
             WHERE movement_date::date >= $1 AND movement_date::date <= $2 \
             GROUP BY d ORDER BY d"
        }
        SeriesMetric::LedgerBalance => {
            "SELECT je.entry_date::date AS d, \
                    COALESCE(SUM((COALESCE(jel.debit_amount, 0) - COALESCE(jel.credit_amount, 0)) \
                        * COALESCE(je.exchange_rate, 1)), 0)::float8, \
                    COUNT(*)::bigint \
             FROM journal_entry_lines jel \
             JOIN journal_entries je ON jel.journal_entry_id = je.id \
             WHERE je.entry_date::date >= $1 AND je.entry_date::date <= $2 \
             GROUP BY d ORDER BY d"
        }
        SeriesMetric::AttendanceHours => {
            "SELECT attendance_date::date AS d, \
                    COALESCE(SUM(work_hours), 0)::float8, COUNT(work_hours)::bigint \
             FROM daily_attendance_tracking \
             WHERE attendance_date::date >= $1 AND attendance_date::date <= $2 \
             GROUP BY d ORDER BY d"
        }
    }
}

/// Live ranking as `(id, name, value, quantity)` over `$1..=$2`, limit `$3`.
fn ranking_sql(metric: RankMetric) -> &'static str {
    match metric {
        RankMetric::TopProducts => {
            "SELECT soi.article_id::text, COALESCE(a.name, ''), \
                    COALESCE(SUM(soi.total_price), 0)::float8 AS value, \
                    COALESCE(SUM(soi.quantity), 0)::bigint \
             FROM sales_order_items soi \
             JOIN sales_orders so ON soi.sales_order_id = so.id \
             LEFT JOIN articles a ON soi.article_id = a.id \
             WHERE so.order_date::date >= $1 AND so.order_date::date <= $2 \
               AND soi.article_id IS NOT NULL \
             GROUP BY soi.article_id, a.name \
             ORDER BY value DESC, 1 LIMIT $3"
        }
        RankMetric::TopCustomers => {
            "SELECT so.customer_id::text, COALESCE(c.name, ''), \
                    COALESCE(SUM(so.total_amount), 0)::float8 AS value, \
                    COUNT(DISTINCT so.id)::bigint \
             FROM sales_orders so \
             LEFT JOIN customers c ON so.customer_id = c.id \
             WHERE so.order_date::date >= $1 AND so.order_date::date <= $2 \
               AND so.customer_id IS NOT NULL \
             GROUP BY so.customer_id, c.name \
             ORDER BY value DESC, 1 LIMIT $3"
        }
        RankMetric::TopSuppliers => {
            "SELECT ppo.supplier_id::text, COALESCE(s.name, ''), \
                    COALESCE(SUM(ppo.total_amount), 0)::float8 AS value, \
                    COUNT(DISTINCT ppo.id)::bigint \
             FROM procurement_purchase_orders ppo \
             LEFT JOIN suppliers s ON ppo.supplier_id = s.id \
             WHERE ppo.order_date::date >= $1 AND ppo.order_date::date <= $2 \
               AND ppo.supplier_id IS NOT NULL \
             GROUP BY ppo.supplier_id, s.name \
             ORDER BY value DESC, 1 LIMIT $3"
        }
    }
}

/// Live scalar over `$1..=$2`.
fn kpi_sql(metric: KpiMetric) -> &'static str {
    match metric {
        KpiMetric::Revenue => {
            "SELECT COALESCE(SUM(soi.total_price), 0)::float8 \
             FROM sales_order_items soi \
             JOIN sales_orders so ON soi.sales_order_id = so.id \
             WHERE so.order_date::date >= $1 AND so.order_date::date <= $2"
        }
        KpiMetric::Orders => {
            "SELECT COUNT(*)::float8 FROM sales_orders \
             WHERE order_date::date >= $1 AND order_date::date <= $2"
        }
        KpiMetric::ProcurementSpend => {
            "SELECT COALESCE(SUM(total_amount), 0)::float8 FROM procurement_purchase_orders \
             WHERE order_date::date >= $1 AND order_date::date <= $2"
        }
        KpiMetric::InventoryMovements => {
            "SELECT COUNT(*)::float8 FROM stock_movements \
             WHERE movement_date::date >= $1 AND movement_date::date <= $2"
        }
        KpiMetric::AttendanceRate => {
            "SELECT CASE WHEN COUNT(*) = 0 THEN 0 \
                    ELSE 100.0 * COUNT(*) FILTER (WHERE status IN ('PRESENT', 'LATE')) / COUNT(*) \
                    END::float8 \
             FROM daily_attendance_tracking \
             WHERE attendance_date::date >= $1 AND attendance_date::date <= $2"
        }
    }
}

/// PostgreSQL implementation of OperationalStore and the fallback
/// AnalyticsReader.
pub struct PgOperationalStore {
    pool: PgPool,
}

impl PgOperationalStore {
    /// Create a new operational store reader.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn extract<R>(&self, select: &str, since: Option<DateTime<Utc>>) -> Result<Vec<R>>
    where
        R: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let sql = changed_since(select);
        let rows = sqlx::query_as::<_, R>(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl OperationalStore for PgOperationalStore {
    async fn customers(&self, since: Option<DateTime<Utc>>) -> Result<Vec<CustomerRecord>> {
        self.extract(CUSTOMERS, since).await
    }

    async fn suppliers(&self, since: Option<DateTime<Utc>>) -> Result<Vec<SupplierRecord>> {
        self.extract(SUPPLIERS, since).await
    }

    async fn articles(&self, since: Option<DateTime<Utc>>) -> Result<Vec<ArticleRecord>> {
        self.extract(ARTICLES, since).await
    }

    async fn warehouses(&self, since: Option<DateTime<Utc>>) -> Result<Vec<WarehouseRecord>> {
        self.extract(WAREHOUSES, since).await
    }

    async fn employees(&self, since: Option<DateTime<Utc>>) -> Result<Vec<EmployeeRecord>> {
        self.extract(EMPLOYEES, since).await
    }

    async fn sales(&self, since: Option<DateTime<Utc>>) -> Result<Vec<SalesRecord>> {
        self.extract(SALES, since).await
    }

    async fn procurement(&self, since: Option<DateTime<Utc>>) -> Result<Vec<ProcurementRecord>> {
        self.extract(PROCUREMENT, since).await
    }

    async fn inventory_movements(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<InventoryMovementRecord>> {
        self.extract(INVENTORY_MOVEMENTS, since).await
    }

    async fn financial_transactions(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<FinancialRecord>> {
        self.extract(FINANCIAL_TRANSACTIONS, since).await
    }

    async fn attendance(&self, since: Option<DateTime<Utc>>) -> Result<Vec<AttendanceRecord>> {
        self.extract(ATTENDANCE, since).await
    }
}

#[async_trait]
impl AnalyticsReader for PgOperationalStore {
    async fn is_ready(&self) -> Result<bool> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(true)
    }

    async fn daily_series(&self, metric: SeriesMetric, range: &DateRange) -> Result<Vec<DailyAggregate>> {
        let rows: Vec<(NaiveDate, f64, i64)> = sqlx::query_as(daily_series_sql(metric))
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(date, sum, count)| DailyAggregate {
                date,
                sum,
                count: u64::try_from(count).unwrap_or_default(),
            })
            .collect())
    }

    async fn ranking(&self, metric: RankMetric, range: &DateRange, limit: u32) -> Result<Vec<RankedItem>> {
        let rows: Vec<(String, String, f64, i64)> = sqlx::query_as(ranking_sql(metric))
            .bind(range.start)
            .bind(range.end)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, value, quantity)| RankedItem {
                id,
                name,
                value,
                quantity,
                rank: 0,
            })
            .collect())
    }

    async fn kpi(&self, metric: KpiMetric, range: &DateRange) -> Result<f64> {
        let (value,): (f64,) = sqlx::query_as(kpi_sql(metric))
            .bind(range.start)
            .bind(range.end)
            .fetch_one(&self.pool)
            .await?;
        Ok(value)
    }
}
