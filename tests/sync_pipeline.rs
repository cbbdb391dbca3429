//! End-to-end sync pipeline tests.
//!
//! Run with: cargo test --test sync_pipeline --features sqlite
//!
//! Drives the orchestrator from the in-memory operational store into an
//! in-memory SQLite analytical store, then reads the result back through the
//! query service.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use starsync::analytics::{AnalyticsQueryService, QueryParams, RankMetric, SeriesMetric};
use starsync::interfaces::{Warehouse, WatermarkStore};
use starsync::model::{
    ArticleRecord, AttendanceRecord, CustomerRecord, EmployeeRecord, FinancialRecord,
    InventoryMovementRecord, ProcurementRecord, SalesRecord, SupplierRecord, SyncType,
    WarehouseRecord, WarehouseTable,
};
use starsync::storage::{MockOperationalStore, SqliteWarehouse, SqliteWatermarkStore};
use starsync::sync::{BatchSyncOrchestrator, CalendarOptions, RunContext, SyncOptions};

use common::{at, day, sqlite_stores};

struct Pipeline {
    source: Arc<MockOperationalStore>,
    warehouse: Arc<SqliteWarehouse>,
    watermarks: Arc<SqliteWatermarkStore>,
    orchestrator: Arc<BatchSyncOrchestrator>,
}

async fn pipeline() -> Pipeline {
    let (warehouse, watermarks) = sqlite_stores().await;
    let source = Arc::new(MockOperationalStore::new());
    let warehouse = Arc::new(warehouse);
    let watermarks = Arc::new(watermarks);

    let options = SyncOptions {
        base_currency: "IDR".into(),
        exchange_rates: [("USD".to_string(), 15_000.0)].into_iter().collect(),
        calendar: CalendarOptions {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            fiscal_year_start_month: 1,
        },
        ..Default::default()
    };
    let orchestrator = Arc::new(BatchSyncOrchestrator::new(
        source.clone(),
        warehouse.clone(),
        watermarks.clone(),
        options,
    ));

    Pipeline {
        source,
        warehouse,
        watermarks,
        orchestrator,
    }
}

fn ctx() -> RunContext {
    RunContext::with_timeout(Duration::from_secs(60))
}

fn sale(id: &str, order: &str, customer: &str, ts: DateTime<Utc>, amount: f64) -> SalesRecord {
    SalesRecord {
        id: id.into(),
        source_type: "sales_order".into(),
        order_id: order.into(),
        transaction_at: ts,
        customer_id: Some(customer.into()),
        article_id: Some("a1".into()),
        quantity: 1,
        unit_price: amount,
        line_total: amount,
        order_total: amount,
        status: "completed".into(),
        changed_at: ts,
        ..Default::default()
    }
}

/// One row per source entity, plus two customers and three sales.
async fn seed(source: &MockOperationalStore) {
    source
        .add_customers([
            CustomerRecord {
                id: "c1".into(),
                name: "Ana".into(),
                status: Some("active".into()),
                changed_at: at(1, 0),
                ..Default::default()
            },
            CustomerRecord {
                id: "c2".into(),
                name: "Budi".into(),
                changed_at: at(1, 1),
                ..Default::default()
            },
        ])
        .await;
    source
        .add_suppliers([SupplierRecord {
            id: "sup1".into(),
            name: "Textile Co".into(),
            changed_at: at(1, 0),
            ..Default::default()
        }])
        .await;
    source
        .add_articles([ArticleRecord {
            id: "a1".into(),
            name: "Shirt".into(),
            classification_name: Some("Apparel".into()),
            price: 100.0,
            cost: 60.0,
            changed_at: at(1, 0),
            ..Default::default()
        }])
        .await;
    source
        .add_warehouses([WarehouseRecord {
            id: "w1".into(),
            name: "Main".into(),
            city: Some("Jakarta".into()),
            changed_at: at(1, 0),
            ..Default::default()
        }])
        .await;
    source
        .add_employees([EmployeeRecord {
            id: "e1".into(),
            employee_name: "Citra".into(),
            employment_status: Some("ACTIVE".into()),
            changed_at: at(1, 0),
            ..Default::default()
        }])
        .await;

    source
        .add_sales([
            sale("s1", "o1", "c1", at(2, 9), 100.0),
            sale("s2", "o2", "c1", at(2, 10), 200.0),
            sale("s3", "o3", "c2", at(4, 9), 50.0),
        ])
        .await;
    source
        .add_procurement([ProcurementRecord {
            id: "pl1".into(),
            po_id: "po1".into(),
            po_number: "PO-001".into(),
            transaction_at: at(3, 9),
            supplier_id: Some("sup1".into()),
            article_id: Some("a1".into()),
            quantity: 10,
            unit_price: 2.0,
            line_total: 20.0,
            order_total: 20.0,
            currency: "usd".into(),
            status: "approved".into(),
            changed_at: at(3, 9),
            ..Default::default()
        }])
        .await;
    source
        .add_inventory_movements([InventoryMovementRecord {
            id: "m1".into(),
            movement_at: at(3, 11),
            article_id: Some("a1".into()),
            warehouse_id: Some("w1".into()),
            quantity: 10,
            unit_cost: 60.0,
            movement_type: "IN".into(),
            changed_at: at(3, 11),
            ..Default::default()
        }])
        .await;
    source
        .add_financial_transactions([FinancialRecord {
            id: "jl1".into(),
            journal_entry_id: "je1".into(),
            entry_number: "JE-001".into(),
            entry_date: day(3),
            debit_amount: 500.0,
            currency_code: "IDR".into(),
            exchange_rate: 1.0,
            status: "posted".into(),
            changed_at: at(3, 12),
            ..Default::default()
        }])
        .await;
    source
        .add_attendance([AttendanceRecord {
            id: "att1".into(),
            attendance_date: day(2),
            employee_id: Some("e1".into()),
            clock_in: Some(at(2, 8)),
            clock_out: Some(at(2, 16)),
            work_hours: 8.0,
            status: "PRESENT".into(),
            changed_at: at(2, 16),
            ..Default::default()
        }])
        .await;
}

async fn counts(p: &Pipeline) -> Vec<(WarehouseTable, u64)> {
    let mut out = Vec::new();
    for table in WarehouseTable::all() {
        out.push((table, p.warehouse.count(table).await.unwrap()));
    }
    out
}

#[tokio::test]
async fn test_full_sync_populates_every_table() {
    let p = pipeline().await;
    seed(&p.source).await;

    let report = p.orchestrator.run_full_sync(ctx()).await.unwrap();

    assert!(report.is_complete(), "{}", report.failure_summary());
    assert_eq!(report.table_counts["dim_date"], 366);
    assert_eq!(report.table_counts["dim_customer"], 2);
    assert_eq!(report.table_counts["sales_fact"], 3);
    assert_eq!(report.table_counts["procurement_fact"], 1);
    assert_eq!(report.table_counts["inventory_movement_fact"], 1);
    assert_eq!(report.table_counts["financial_transaction_fact"], 1);
    assert_eq!(report.table_counts["attendance_fact"], 1);

    let mark = p.watermarks.get("sales_fact").await.unwrap().unwrap();
    assert_eq!(mark.last_synced_at, at(4, 9));
    assert_eq!(mark.rows_synced, 3);
    assert_eq!(mark.sync_type, SyncType::Full);
}

#[tokio::test]
async fn test_full_sync_twice_is_idempotent() {
    let p = pipeline().await;
    seed(&p.source).await;

    p.orchestrator.run_full_sync(ctx()).await.unwrap();
    let first = counts(&p).await;
    p.orchestrator.run_full_sync(ctx()).await.unwrap();
    let second = counts(&p).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_incremental_sync_without_changes_moves_nothing() {
    let p = pipeline().await;
    seed(&p.source).await;
    p.orchestrator.run_full_sync(ctx()).await.unwrap();
    let before = counts(&p).await;

    let report = p.orchestrator.run_incremental_sync(ctx()).await.unwrap();

    assert_eq!(counts(&p).await, before);
    let sales = report.report(WarehouseTable::SalesFact).unwrap();
    assert_eq!(sales.stats.extracted, 0);
    assert_eq!(sales.watermark, None);

    let mark = p.watermarks.get("sales_fact").await.unwrap().unwrap();
    assert_eq!(mark.last_synced_at, at(4, 9), "watermark should hold");
    assert_eq!(mark.sync_type, SyncType::Incremental);
}

#[tokio::test]
async fn test_incremental_sync_retries_unresolved_fact() {
    let p = pipeline().await;
    seed(&p.source).await;
    p.orchestrator.run_full_sync(ctx()).await.unwrap();

    // c3 is not a customer yet; s5 sorts after the unresolved s4
    p.source
        .add_sales([
            sale("s4", "o4", "c3", at(5, 9), 70.0),
            sale("s5", "o5", "c1", at(5, 10), 30.0),
        ])
        .await;
    let report = p.orchestrator.run_incremental_sync(ctx()).await.unwrap();

    let sales = report.report(WarehouseTable::SalesFact).unwrap();
    assert_eq!(sales.stats.loaded, 1);
    assert_eq!(sales.stats.skipped_unresolved, 1);
    assert_eq!(
        p.watermarks.get("sales_fact").await.unwrap().unwrap().last_synced_at,
        at(4, 9),
        "watermark must not pass the unresolved row"
    );

    p.source
        .add_customers([CustomerRecord {
            id: "c3".into(),
            name: "Dewi".into(),
            changed_at: at(5, 12),
            ..Default::default()
        }])
        .await;
    let report = p.orchestrator.run_incremental_sync(ctx()).await.unwrap();

    let sales = report.report(WarehouseTable::SalesFact).unwrap();
    assert_eq!(sales.stats.loaded, 2);
    assert_eq!(sales.watermark, Some(at(5, 10)));
    assert_eq!(p.warehouse.count(WarehouseTable::SalesFact).await.unwrap(), 5);
}

#[tokio::test]
async fn test_query_service_reads_synced_store() {
    let p = pipeline().await;
    seed(&p.source).await;

    let service = AnalyticsQueryService::new(p.warehouse.clone())
        .with_analytical(p.warehouse.clone(), p.watermarks.clone())
        .with_orchestrator(p.orchestrator.clone());
    service.trigger_sync(SyncType::Full).await.unwrap();

    let params = QueryParams::new(day(1), day(31));
    let series = service.series(SeriesMetric::Revenue, &params).await.unwrap();
    let values: Vec<f64> = series.iter().map(|point| point.value).collect();
    assert_eq!(values, vec![300.0, 50.0]);

    let top = service.rankings(RankMetric::TopCustomers, &params).await.unwrap();
    assert_eq!(top[0].name, "Ana");
    assert_eq!(top[0].rank, 1);
    assert_eq!(top[1].name, "Budi");

    let spend = service
        .series(SeriesMetric::ProcurementSpend, &params)
        .await
        .unwrap();
    assert_eq!(spend.len(), 1);
    assert_eq!(spend[0].value, 300_000.0, "USD converted at the configured rate");

    let status = service.sync_status().await.unwrap();
    assert_eq!(status.len(), 11);
}

#[tokio::test]
async fn test_sale_dated_outside_calendar_window_loads_and_advances_watermark() {
    let p = pipeline().await;
    seed(&p.source).await;
    p.orchestrator.run_full_sync(ctx()).await.unwrap();

    // backdated into 2019, well before the 2024 calendar window
    let backdated = SalesRecord {
        transaction_at: Utc.with_ymd_and_hms(2019, 12, 31, 9, 0, 0).unwrap(),
        ..sale("s4", "o4", "c1", at(5, 9), 40.0)
    };
    p.source
        .add_sales([backdated, sale("s5", "o5", "c2", at(5, 10), 60.0)])
        .await;
    let report = p.orchestrator.run_incremental_sync(ctx()).await.unwrap();

    let sales = report.report(WarehouseTable::SalesFact).unwrap();
    assert_eq!(sales.stats.loaded, 2);
    assert_eq!(sales.stats.skipped_unresolved, 0);
    assert_eq!(
        p.watermarks.get("sales_fact").await.unwrap().unwrap().last_synced_at,
        at(5, 10)
    );
    assert_eq!(p.warehouse.count(WarehouseTable::DimDate).await.unwrap(), 367);
}
