//! Unified SQL Warehouse and AnalyticsReader implementation.
//!
//! Statements are built backend-agnostically with sea-query; a macro
//! generates the executing impls for each SQL backend.

use std::collections::{BTreeSet, HashMap};
use std::marker::PhantomData;

use sea_query::{
    Alias, DeleteStatement, Expr, InsertStatement, JoinType, OnConflict, Order, Query,
    SelectStatement, SimpleExpr,
};

use super::SqlDatabase;
use crate::analytics::{DateRange, KpiMetric, RankMetric, SeriesMetric};
use crate::interfaces::{Result, StorageError};
use crate::model::{WarehouseRow, WarehouseTable, DATE_KEY_COLUMN, EVENT_AT_COLUMN};
use crate::storage::helpers::{check_row, format_timestamp};
use crate::storage::schema::SyncWatermarks;

/// SQL-based implementation of Warehouse and AnalyticsReader.
pub struct SqlWarehouse<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlWarehouse<DB> {
    /// Create a new SQL warehouse with the given pool.
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &DB::Pool {
        &self.pool
    }
}

/// Keep the last row per key, preserving first-seen order.
///
/// A multi-row upsert may not touch the same key twice.
fn dedupe_last(rows: &[WarehouseRow]) -> Vec<&WarehouseRow> {
    let mut position: HashMap<&str, usize> = HashMap::with_capacity(rows.len());
    let mut out: Vec<&WarehouseRow> = Vec::with_capacity(rows.len());
    for row in rows {
        match position.get(row.key.as_str()) {
            Some(&i) => out[i] = row,
            None => {
                position.insert(row.key.as_str(), out.len());
                out.push(row);
            }
        }
    }
    out
}

fn columns(table: WarehouseTable) -> impl Iterator<Item = Alias> {
    table.columns().iter().map(|c| Alias::new(c.name))
}

fn insert_rows(table: WarehouseTable, rows: &[&WarehouseRow], upsert: bool) -> Result<InsertStatement> {
    let mut stmt = Query::insert();
    stmt.into_table(Alias::new(table.name())).columns(columns(table));

    for row in rows {
        check_row(table, row)?;
        stmt.values(row.values.iter().cloned().map(SimpleExpr::from))
            .map_err(|_| StorageError::ColumnMismatch {
                table: table.name().to_string(),
                expected: table.columns().len(),
                actual: row.values.len(),
            })?;
    }

    if upsert {
        stmt.on_conflict(
            OnConflict::column(Alias::new(table.key_column()))
                .update_columns(columns(table).skip(1))
                .to_owned(),
        );
    }

    Ok(stmt.to_owned())
}

fn delete_window(table: WarehouseTable, window_start: chrono::DateTime<chrono::Utc>) -> DeleteStatement {
    Query::delete()
        .from_table(Alias::new(table.name()))
        .and_where(Expr::col(Alias::new(EVENT_AT_COLUMN)).gt(format_timestamp(window_start)))
        .to_owned()
}

fn delete_keys(table: WarehouseTable, keys: &[&WarehouseRow]) -> DeleteStatement {
    Query::delete()
        .from_table(Alias::new(table.name()))
        .and_where(Expr::col(Alias::new(table.key_column())).is_in(keys.iter().map(|r| r.key.clone())))
        .to_owned()
}

fn select_keys(table: WarehouseTable, keys: &[&String]) -> SelectStatement {
    Query::select()
        .column(Alias::new(table.key_column()))
        .from(Alias::new(table.name()))
        .and_where(Expr::col(Alias::new(table.key_column())).is_in(keys.iter().map(|k| (*k).clone())))
        .to_owned()
}

fn select_count(table: &str) -> SelectStatement {
    Query::select()
        .expr(Expr::cust("CAST(COUNT(*) AS BIGINT)"))
        .from(Alias::new(table))
        .to_owned()
}

fn in_range(stmt: &mut SelectStatement, qualifier: Option<&str>, range: &DateRange) {
    let col = match qualifier {
        Some(q) => Expr::col((Alias::new(q), Alias::new(DATE_KEY_COLUMN))),
        None => Expr::col(Alias::new(DATE_KEY_COLUMN)),
    };
    stmt.and_where(col.clone().gte(range.start_key()))
        .and_where(col.lte(range.end_key()));
}

/// Per-day `(date_key, sum, count)` for a series metric.
fn daily_series_query(metric: SeriesMetric, range: &DateRange) -> SelectStatement {
    let (table, sum, count) = match metric {
        SeriesMetric::Revenue => (
            WarehouseTable::SalesFact,
            "COALESCE(SUM(line_total_base), 0)",
            "COUNT(*)",
        ),
        SeriesMetric::ProcurementSpend => (
            WarehouseTable::ProcurementFact,
            "COALESCE(SUM(line_total_base), 0)",
            "COUNT(*)",
        ),
        SeriesMetric::InventoryMovement => (WarehouseTable::InventoryMovementFact, "0", "COUNT(*)"),
        SeriesMetric::LedgerBalance => (
            WarehouseTable::FinancialTransactionFact,
            "COALESCE(SUM(debit_amount_base), 0) - COALESCE(SUM(credit_amount_base), 0)",
            "COUNT(*)",
        ),
        SeriesMetric::AttendanceHours => (
            WarehouseTable::AttendanceFact,
            "COALESCE(SUM(work_hours), 0)",
            "COUNT(work_hours)",
        ),
    };

    let mut stmt = Query::select();
    stmt.column(Alias::new(DATE_KEY_COLUMN))
        .expr(Expr::cust(format!("CAST({sum} AS DOUBLE PRECISION)")))
        .expr(Expr::cust(format!("CAST({count} AS BIGINT)")))
        .from(Alias::new(table.name()));
    in_range(&mut stmt, None, range);
    stmt.group_by_col(Alias::new(DATE_KEY_COLUMN))
        .order_by(Alias::new(DATE_KEY_COLUMN), Order::Asc);
    stmt.to_owned()
}

/// Top entities as `(id, name, value, quantity)`.
fn ranking_query(metric: RankMetric, range: &DateRange, limit: u32) -> SelectStatement {
    let (fact, dim, id_col, quantity) = match metric {
        RankMetric::TopProducts => (
            WarehouseTable::SalesFact,
            WarehouseTable::DimArticle,
            "article_id",
            "COALESCE(SUM(f.quantity), 0)",
        ),
        RankMetric::TopCustomers => (
            WarehouseTable::SalesFact,
            WarehouseTable::DimCustomer,
            "customer_id",
            "COUNT(DISTINCT f.order_id)",
        ),
        RankMetric::TopSuppliers => (
            WarehouseTable::ProcurementFact,
            WarehouseTable::DimSupplier,
            "supplier_id",
            "COUNT(DISTINCT f.po_id)",
        ),
    };
    let f = Alias::new("f");
    let d = Alias::new("d");

    let mut stmt = Query::select();
    stmt.expr(Expr::col((f.clone(), Alias::new(id_col))))
        .expr(Expr::cust("COALESCE(d.name, '')"))
        .expr_as(
            Expr::cust("CAST(COALESCE(SUM(f.line_total_base), 0) AS DOUBLE PRECISION)"),
            Alias::new("value"),
        )
        .expr(Expr::cust(format!("CAST({quantity} AS BIGINT)")))
        .from_as(Alias::new(fact.name()), f.clone())
        .join_as(
            JoinType::LeftJoin,
            Alias::new(dim.name()),
            d.clone(),
            Expr::col((f.clone(), Alias::new(id_col))).equals((d.clone(), Alias::new("id"))),
        )
        .and_where(Expr::col((f.clone(), Alias::new(id_col))).is_not_null());
    in_range(&mut stmt, Some("f"), range);
    stmt.group_by_col((f.clone(), Alias::new(id_col)))
        .group_by_col((d, Alias::new("name")))
        .order_by(Alias::new("value"), Order::Desc)
        .order_by((f, Alias::new(id_col)), Order::Asc)
        .limit(u64::from(limit));
    stmt.to_owned()
}

/// Single scalar KPI.
fn kpi_query(metric: KpiMetric, range: &DateRange) -> SelectStatement {
    let (table, expr) = match metric {
        KpiMetric::Revenue => (WarehouseTable::SalesFact, "COALESCE(SUM(line_total_base), 0)"),
        KpiMetric::Orders => (WarehouseTable::SalesFact, "COUNT(DISTINCT order_id)"),
        KpiMetric::ProcurementSpend => (
            WarehouseTable::ProcurementFact,
            "COALESCE(SUM(line_total_base), 0)",
        ),
        KpiMetric::InventoryMovements => (WarehouseTable::InventoryMovementFact, "COUNT(*)"),
        KpiMetric::AttendanceRate => (
            WarehouseTable::AttendanceFact,
            "CASE WHEN COUNT(*) = 0 THEN 0 \
             ELSE 100.0 * SUM(CASE WHEN status IN ('PRESENT', 'LATE') THEN 1 ELSE 0 END) / COUNT(*) END",
        ),
    };

    let mut stmt = Query::select();
    stmt.expr(Expr::cust(format!("CAST({expr} AS DOUBLE PRECISION)")))
        .from(Alias::new(table.name()));
    in_range(&mut stmt, None, range);
    stmt.to_owned()
}

/// Macro to implement Warehouse and AnalyticsReader for a specific SQL backend.
///
/// This eliminates duplication between PostgreSQL and SQLite implementations
/// while maintaining full type safety.
macro_rules! impl_warehouse {
    ($db_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::Warehouse for SqlWarehouse<$db_type> {
            async fn init(&self) -> Result<()> {
                use crate::storage::schema::{create_event_index, create_table, create_watermarks_table};

                let ddl = <$db_type>::build_table(&create_watermarks_table());
                sqlx::query(&ddl).execute(&self.pool).await?;

                for table in WarehouseTable::all() {
                    let ddl = <$db_type>::build_table(&create_table(table));
                    sqlx::query(&ddl).execute(&self.pool).await?;

                    if let Some(index) = create_event_index(table) {
                        let ddl = <$db_type>::build_index(&index);
                        sqlx::query(&ddl).execute(&self.pool).await?;
                    }
                }

                tracing::debug!("Analytical schema initialized");
                Ok(())
            }

            async fn truncate(&self, table: WarehouseTable) -> Result<()> {
                let stmt = Query::delete().from_table(Alias::new(table.name())).to_owned();
                let (sql, values) = <$db_type>::build_delete(&stmt);
                sqlx::query_with(&sql, values).execute(&self.pool).await?;
                Ok(())
            }

            async fn upsert_dimension(&self, table: WarehouseTable, rows: &[WarehouseRow]) -> Result<u64> {
                let rows = dedupe_last(rows);
                if rows.is_empty() {
                    return Ok(0);
                }

                let mut tx = self.pool.begin().await?;
                for chunk in rows.chunks(super::INSERT_BATCH) {
                    let (sql, values) = <$db_type>::build_insert(&insert_rows(table, chunk, true)?);
                    sqlx::query_with(&sql, values).execute(&mut *tx).await?;
                }
                tx.commit().await?;

                Ok(rows.len() as u64)
            }

            async fn replace_facts(
                &self,
                table: WarehouseTable,
                window_start: Option<chrono::DateTime<chrono::Utc>>,
                rows: &[WarehouseRow],
            ) -> Result<u64> {
                let rows = dedupe_last(rows);

                let mut tx = self.pool.begin().await?;
                if let Some(window_start) = window_start {
                    let (sql, values) = <$db_type>::build_delete(&delete_window(table, window_start));
                    let removed = sqlx::query_with(&sql, values).execute(&mut *tx).await?;
                    tracing::debug!(
                        table = %table,
                        rows = removed.rows_affected(),
                        "Cleared uncommitted fact window"
                    );
                }
                for chunk in rows.chunks(super::INSERT_BATCH) {
                    let (sql, values) = <$db_type>::build_delete(&delete_keys(table, chunk));
                    sqlx::query_with(&sql, values).execute(&mut *tx).await?;

                    let (sql, values) = <$db_type>::build_insert(&insert_rows(table, chunk, false)?);
                    sqlx::query_with(&sql, values).execute(&mut *tx).await?;
                }
                tx.commit().await?;

                Ok(rows.len() as u64)
            }

            async fn existing_keys(
                &self,
                table: WarehouseTable,
                keys: &BTreeSet<String>,
            ) -> Result<BTreeSet<String>> {
                let keys: Vec<&String> = keys.iter().collect();
                let mut found = BTreeSet::new();
                for chunk in keys.chunks(super::LOOKUP_BATCH) {
                    let (sql, values) = <$db_type>::build_select(&select_keys(table, chunk));
                    let rows: Vec<(String,)> = sqlx::query_as_with(&sql, values)
                        .fetch_all(&self.pool)
                        .await?;
                    found.extend(rows.into_iter().map(|(key,)| key));
                }
                Ok(found)
            }

            async fn count(&self, table: WarehouseTable) -> Result<u64> {
                let (sql, values) = <$db_type>::build_select(&select_count(table.name()));
                let (count,): (i64,) = sqlx::query_as_with(&sql, values)
                    .fetch_one(&self.pool)
                    .await?;
                Ok(u64::try_from(count).unwrap_or_default())
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::interfaces::AnalyticsReader for SqlWarehouse<$db_type> {
            async fn is_ready(&self) -> Result<bool> {
                use sea_query::Iden;

                let (sql, values) =
                    <$db_type>::build_select(&select_count(&SyncWatermarks::Table.to_string()));
                let (count,): (i64,) = sqlx::query_as_with(&sql, values)
                    .fetch_one(&self.pool)
                    .await?;
                Ok(count > 0)
            }

            async fn daily_series(
                &self,
                metric: SeriesMetric,
                range: &DateRange,
            ) -> Result<Vec<crate::analytics::DailyAggregate>> {
                use crate::storage::helpers::parse_date;

                let (sql, values) = <$db_type>::build_select(&daily_series_query(metric, range));
                let rows: Vec<(String, f64, i64)> = sqlx::query_as_with(&sql, values)
                    .fetch_all(&self.pool)
                    .await?;

                rows.into_iter()
                    .map(|(day, sum, count)| {
                        Ok(crate::analytics::DailyAggregate {
                            date: parse_date("fact", DATE_KEY_COLUMN, &day)?,
                            sum,
                            count: u64::try_from(count).unwrap_or_default(),
                        })
                    })
                    .collect()
            }

            async fn ranking(
                &self,
                metric: RankMetric,
                range: &DateRange,
                limit: u32,
            ) -> Result<Vec<crate::analytics::RankedItem>> {
                let (sql, values) = <$db_type>::build_select(&ranking_query(metric, range, limit));
                let rows: Vec<(String, String, f64, i64)> = sqlx::query_as_with(&sql, values)
                    .fetch_all(&self.pool)
                    .await?;

                Ok(rows
                    .into_iter()
                    .map(|(id, name, value, quantity)| crate::analytics::RankedItem {
                        id,
                        name,
                        value,
                        quantity,
                        rank: 0,
                    })
                    .collect())
            }

            async fn kpi(&self, metric: KpiMetric, range: &DateRange) -> Result<f64> {
                let (sql, values) = <$db_type>::build_select(&kpi_query(metric, range));
                let (value,): (f64,) = sqlx::query_as_with(&sql, values)
                    .fetch_one(&self.pool)
                    .await?;
                Ok(value)
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_warehouse!(super::postgres::Postgres, "postgres");
impl_warehouse!(super::sqlite::Sqlite, "sqlite");
