//! AnalyticsReader interface tests for the analytical store.
//!
//! Expects a freshly initialized store: readiness is checked before any
//! watermark exists.

use chrono::Utc;

use starsync::analytics::{DailyAggregate, DateRange, KpiMetric, RankMetric, SeriesMetric};
use starsync::interfaces::{AnalyticsReader, Warehouse, WatermarkStore};
use starsync::model::{SyncType, WarehouseTable};
use starsync::storage::helpers::{bigint, double, text};

use crate::common::{at, day, row};

fn january() -> DateRange {
    DateRange::new(day(1), day(31)).unwrap()
}

async fn seed_sales<W: Warehouse>(store: &W) {
    let dim = WarehouseTable::DimCustomer;
    store
        .upsert_dimension(
            dim,
            &[
                row(dim, "c1", None, &[("name", text("Ana"))]),
                row(dim, "c2", None, &[("name", text("Budi"))]),
            ],
        )
        .await
        .unwrap();

    let fact = WarehouseTable::SalesFact;
    let sale = |id: &str, ts, order: &str, customer: &str, amount: f64| {
        row(
            fact,
            id,
            Some(ts),
            &[
                ("order_id", text(order)),
                ("customer_id", text(customer)),
                ("quantity", bigint(2)),
                ("line_total_base", double(amount)),
            ],
        )
    };
    store.truncate(fact).await.unwrap();
    store
        .replace_facts(
            fact,
            None,
            &[
                sale("s1", at(1, 9), "o1", "c1", 10.0),
                sale("s2", at(1, 15), "o2", "c1", 20.0),
                sale("s3", at(3, 9), "o3", "c2", 5.0),
            ],
        )
        .await
        .unwrap();
}

pub async fn test_is_ready_follows_watermarks<W, M>(store: &W, watermarks: &M)
where
    W: AnalyticsReader,
    M: WatermarkStore,
{
    assert!(!store.is_ready().await.unwrap(), "empty store should not be ready");
    watermarks
        .set("dim_customer", Utc::now(), 0, SyncType::Full)
        .await
        .unwrap();
    assert!(store.is_ready().await.unwrap());
}

pub async fn test_daily_revenue_series<W: Warehouse + AnalyticsReader>(store: &W) {
    seed_sales(store).await;

    let series = store.daily_series(SeriesMetric::Revenue, &january()).await.unwrap();
    assert_eq!(
        series,
        vec![
            DailyAggregate { date: day(1), sum: 30.0, count: 2 },
            DailyAggregate { date: day(3), sum: 5.0, count: 1 },
        ]
    );

    let february = DateRange::new(
        chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
    )
    .unwrap();
    assert!(store
        .daily_series(SeriesMetric::Revenue, &february)
        .await
        .unwrap()
        .is_empty());
}

pub async fn test_top_customers_ranking<W: Warehouse + AnalyticsReader>(store: &W) {
    seed_sales(store).await;

    let ranked = store
        .ranking(RankMetric::TopCustomers, &january(), 10)
        .await
        .unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].id, "c1");
    assert_eq!(ranked[0].name, "Ana");
    assert_eq!(ranked[0].value, 30.0);
    assert_eq!(ranked[0].quantity, 2, "distinct orders");
    assert_eq!(ranked[1].name, "Budi");

    let limited = store
        .ranking(RankMetric::TopCustomers, &january(), 1)
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
}

pub async fn test_order_and_revenue_kpis<W: Warehouse + AnalyticsReader>(store: &W) {
    seed_sales(store).await;

    assert_eq!(store.kpi(KpiMetric::Revenue, &january()).await.unwrap(), 35.0);
    assert_eq!(store.kpi(KpiMetric::Orders, &january()).await.unwrap(), 3.0);
}

pub async fn test_attendance_rate_kpi<W: Warehouse + AnalyticsReader>(store: &W) {
    let fact = WarehouseTable::AttendanceFact;
    store.truncate(fact).await.unwrap();
    let rows: Vec<_> = ["PRESENT", "LATE", "ABSENT", "PRESENT"]
        .iter()
        .enumerate()
        .map(|(i, status)| row(fact, &format!("att{i}"), Some(at(2, 8)), &[("status", text(*status))]))
        .collect();
    store.replace_facts(fact, None, &rows).await.unwrap();

    assert_eq!(store.kpi(KpiMetric::AttendanceRate, &january()).await.unwrap(), 75.0);

    store.truncate(fact).await.unwrap();
    assert_eq!(
        store.kpi(KpiMetric::AttendanceRate, &january()).await.unwrap(),
        0.0,
        "no attendance rows means a zero rate"
    );
}

/// Run all AnalyticsReader tests against a fresh store.
#[macro_export]
macro_rules! run_analytics_reader_tests {
    ($store:expr, $watermarks:expr) => {
        use $crate::storage::analytics_reader_tests::*;

        test_is_ready_follows_watermarks($store, $watermarks).await;
        println!("  test_is_ready_follows_watermarks: PASSED");

        test_daily_revenue_series($store).await;
        println!("  test_daily_revenue_series: PASSED");

        test_top_customers_ranking($store).await;
        println!("  test_top_customers_ranking: PASSED");

        test_order_and_revenue_kpis($store).await;
        println!("  test_order_and_revenue_kpis: PASSED");

        test_attendance_rate_kpi($store).await;
        println!("  test_attendance_rate_kpi: PASSED");
    };
}
