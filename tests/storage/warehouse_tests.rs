//! Warehouse interface tests.
//!
//! These tests verify the contract of the Warehouse trait.
//! Each test truncates the tables it touches first, so they can share a store.

use std::collections::BTreeSet;

use starsync::interfaces::{StorageError, Warehouse};
use starsync::model::WarehouseTable;
use starsync::storage::helpers::text;

use crate::common::{at, row};

fn keys(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

// =============================================================================
// init / truncate tests
// =============================================================================

pub async fn test_init_is_idempotent<S: Warehouse>(store: &S) {
    store.init().await.expect("second init should succeed");
    for table in WarehouseTable::all() {
        store.count(table).await.expect("every table should exist");
    }
}

pub async fn test_truncate_empties_table<S: Warehouse>(store: &S) {
    let table = WarehouseTable::DimWarehouse;
    store
        .upsert_dimension(table, &[row(table, "w1", None, &[]), row(table, "w2", None, &[])])
        .await
        .unwrap();
    assert_eq!(store.count(table).await.unwrap(), 2);

    store.truncate(table).await.expect("truncate should succeed");
    assert_eq!(store.count(table).await.unwrap(), 0);
}

// =============================================================================
// upsert_dimension tests
// =============================================================================

pub async fn test_upsert_overwrites_by_key<S: Warehouse>(store: &S) {
    let table = WarehouseTable::DimCustomer;
    store.truncate(table).await.unwrap();

    store
        .upsert_dimension(table, &[row(table, "c1", None, &[("name", text("Ana"))])])
        .await
        .unwrap();
    let written = store
        .upsert_dimension(
            table,
            &[
                row(table, "c1", None, &[("name", text("Ana Maria"))]),
                row(table, "c2", None, &[("name", text("Budi"))]),
            ],
        )
        .await
        .unwrap();

    assert_eq!(written, 2);
    assert_eq!(store.count(table).await.unwrap(), 2, "c1 should be overwritten, not duplicated");
}

pub async fn test_upsert_same_key_twice_in_batch<S: Warehouse>(store: &S) {
    let table = WarehouseTable::DimSupplier;
    store.truncate(table).await.unwrap();

    let written = store
        .upsert_dimension(
            table,
            &[
                row(table, "s1", None, &[("name", text("old"))]),
                row(table, "s1", None, &[("name", text("new"))]),
            ],
        )
        .await
        .expect("duplicate keys in one batch should collapse");

    assert_eq!(written, 1);
    assert_eq!(store.count(table).await.unwrap(), 1);
}

pub async fn test_upsert_empty_is_noop<S: Warehouse>(store: &S) {
    let table = WarehouseTable::DimEmployee;
    store.truncate(table).await.unwrap();
    assert_eq!(store.upsert_dimension(table, &[]).await.unwrap(), 0);
    assert_eq!(store.count(table).await.unwrap(), 0);
}

pub async fn test_upsert_rejects_wrong_width<S: Warehouse>(store: &S) {
    let table = WarehouseTable::DimCustomer;
    let mut bad = row(table, "c9", None, &[]);
    bad.values.pop();

    let result = store.upsert_dimension(table, &[bad]).await;
    assert!(
        matches!(result, Err(StorageError::ColumnMismatch { .. })),
        "short row should be rejected, got {result:?}"
    );
}

// =============================================================================
// replace_facts tests
// =============================================================================

pub async fn test_replace_facts_clears_window<S: Warehouse>(store: &S) {
    let table = WarehouseTable::SalesFact;
    store.truncate(table).await.unwrap();

    store
        .replace_facts(
            table,
            None,
            &[row(table, "f1", Some(at(1, 10)), &[]), row(table, "f2", Some(at(1, 11)), &[])],
        )
        .await
        .unwrap();

    // f2 lies past the window start and is not re-sent: the window drops it
    let batch = [row(table, "f3", Some(at(1, 12)), &[])];
    store.replace_facts(table, Some(at(1, 10)), &batch).await.unwrap();
    assert_eq!(store.count(table).await.unwrap(), 2);
    assert_eq!(
        store.existing_keys(table, &keys(&["f1", "f2", "f3"])).await.unwrap(),
        keys(&["f1", "f3"])
    );
}

pub async fn test_replace_facts_retry_does_not_duplicate<S: Warehouse>(store: &S) {
    let table = WarehouseTable::ProcurementFact;
    store.truncate(table).await.unwrap();

    let batch = [
        row(table, "p1", Some(at(2, 9)), &[]),
        row(table, "p2", Some(at(2, 10)), &[]),
    ];
    store.replace_facts(table, Some(at(1, 0)), &batch).await.unwrap();
    store.replace_facts(table, Some(at(1, 0)), &batch).await.unwrap();

    assert_eq!(store.count(table).await.unwrap(), 2);
}

pub async fn test_replace_facts_replaces_key_outside_window<S: Warehouse>(store: &S) {
    let table = WarehouseTable::InventoryMovementFact;
    store.truncate(table).await.unwrap();

    store
        .replace_facts(table, None, &[row(table, "m1", Some(at(1, 8)), &[])])
        .await
        .unwrap();
    // m1 changed again later; its old copy predates the window
    store
        .replace_facts(table, Some(at(1, 9)), &[row(table, "m1", Some(at(1, 10)), &[])])
        .await
        .unwrap();

    assert_eq!(store.count(table).await.unwrap(), 1);
}

pub async fn test_replace_facts_empty_batch_without_window<S: Warehouse>(store: &S) {
    let table = WarehouseTable::AttendanceFact;
    store.truncate(table).await.unwrap();
    store
        .replace_facts(table, None, &[row(table, "a1", Some(at(1, 8)), &[])])
        .await
        .unwrap();

    assert_eq!(store.replace_facts(table, None, &[]).await.unwrap(), 0);
    assert_eq!(store.count(table).await.unwrap(), 1, "no window means nothing is deleted");
}

// =============================================================================
// existing_keys tests
// =============================================================================

pub async fn test_existing_keys_spans_batches<S: Warehouse>(store: &S) {
    let table = WarehouseTable::DimArticle;
    store.truncate(table).await.unwrap();

    let rows: Vec<_> = (0..1200).map(|i| row(table, &format!("a{i:04}"), None, &[])).collect();
    assert_eq!(store.upsert_dimension(table, &rows).await.unwrap(), 1200);

    let mut wanted: BTreeSet<String> = rows.iter().map(|r| r.key.clone()).collect();
    wanted.insert("missing".to_string());

    let found = store.existing_keys(table, &wanted).await.unwrap();
    assert_eq!(found.len(), 1200);
    assert!(!found.contains("missing"));
}

pub async fn test_existing_keys_empty_input<S: Warehouse>(store: &S) {
    let found = store
        .existing_keys(WarehouseTable::DimCustomer, &BTreeSet::new())
        .await
        .unwrap();
    assert!(found.is_empty());
}

/// Run all Warehouse tests against a store.
#[macro_export]
macro_rules! run_warehouse_tests {
    ($store:expr) => {
        use $crate::storage::warehouse_tests::*;

        test_init_is_idempotent($store).await;
        println!("  test_init_is_idempotent: PASSED");

        test_truncate_empties_table($store).await;
        println!("  test_truncate_empties_table: PASSED");

        test_upsert_overwrites_by_key($store).await;
        println!("  test_upsert_overwrites_by_key: PASSED");

        test_upsert_same_key_twice_in_batch($store).await;
        println!("  test_upsert_same_key_twice_in_batch: PASSED");

        test_upsert_empty_is_noop($store).await;
        println!("  test_upsert_empty_is_noop: PASSED");

        test_upsert_rejects_wrong_width($store).await;
        println!("  test_upsert_rejects_wrong_width: PASSED");

        test_replace_facts_clears_window($store).await;
        println!("  test_replace_facts_clears_window: PASSED");

        test_replace_facts_retry_does_not_duplicate($store).await;
        println!("  test_replace_facts_retry_does_not_duplicate: PASSED");

        test_replace_facts_replaces_key_outside_window($store).await;
        println!("  test_replace_facts_replaces_key_outside_window: PASSED");

        test_replace_facts_empty_batch_without_window($store).await;
        println!("  test_replace_facts_empty_batch_without_window: PASSED");

        test_existing_keys_spans_batches($store).await;
        println!("  test_existing_keys_spans_batches: PASSED");

        test_existing_keys_empty_input($store).await;
        println!("  test_existing_keys_empty_input: PASSED");
    };
}
