//! WatermarkStore interface tests.
//!
//! These tests verify the contract of the WatermarkStore trait.
//! Each storage implementation should run these tests.

use chrono::{DateTime, TimeZone, Utc};

use starsync::interfaces::WatermarkStore;
use starsync::model::SyncType;

fn micros(ts: DateTime<Utc>, us: u32) -> DateTime<Utc> {
    ts + chrono::Duration::microseconds(i64::from(us))
}

// =============================================================================
// WatermarkStore::get tests
// =============================================================================

pub async fn test_get_nonexistent<S: WatermarkStore>(store: &S) {
    let result = store
        .get("test_never_synced")
        .await
        .expect("get should succeed");
    assert!(result.is_none(), "unsynced table should have no watermark");
}

// =============================================================================
// WatermarkStore::set tests
// =============================================================================

pub async fn test_set_and_get<S: WatermarkStore>(store: &S) {
    let ts = micros(Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap(), 123_456);

    store
        .set("test_set_get", ts, 42, SyncType::Incremental)
        .await
        .expect("set should succeed");

    let watermark = store
        .get("test_set_get")
        .await
        .expect("get should succeed")
        .expect("watermark should exist");

    assert_eq!(watermark.table_name, "test_set_get");
    assert_eq!(watermark.last_synced_at, ts, "microseconds should survive storage");
    assert_eq!(watermark.rows_synced, 42);
    assert_eq!(watermark.sync_type, SyncType::Incremental);
}

pub async fn test_set_overwrites<S: WatermarkStore>(store: &S) {
    let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

    store.set("test_overwrite", first, 10, SyncType::Full).await.unwrap();
    store
        .set("test_overwrite", second, 3, SyncType::Incremental)
        .await
        .unwrap();

    let watermark = store.get("test_overwrite").await.unwrap().unwrap();
    assert_eq!(watermark.last_synced_at, second);
    assert_eq!(watermark.rows_synced, 3);
    assert_eq!(watermark.sync_type, SyncType::Incremental);
}

pub async fn test_set_epoch<S: WatermarkStore>(store: &S) {
    store
        .set("test_epoch", DateTime::<Utc>::default(), 0, SyncType::Full)
        .await
        .unwrap();

    let watermark = store.get("test_epoch").await.unwrap().unwrap();
    assert_eq!(watermark.last_synced_at, DateTime::<Utc>::UNIX_EPOCH);
    assert_eq!(watermark.rows_synced, 0);
}

// =============================================================================
// WatermarkStore::delete tests
// =============================================================================

pub async fn test_delete_removes_only_that_table<S: WatermarkStore>(store: &S) {
    let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    store.set("test_delete_a", ts, 5, SyncType::Full).await.unwrap();
    store.set("test_delete_b", ts, 7, SyncType::Full).await.unwrap();

    store.delete("test_delete_a").await.expect("delete should succeed");

    assert!(store.get("test_delete_a").await.unwrap().is_none());
    let kept = store.get("test_delete_b").await.unwrap().unwrap();
    assert_eq!(kept.rows_synced, 7);
}

pub async fn test_delete_nonexistent<S: WatermarkStore>(store: &S) {
    store
        .delete("test_delete_never_synced")
        .await
        .expect("deleting a missing watermark should succeed");
}

// =============================================================================
// WatermarkStore::list_all tests
// =============================================================================

pub async fn test_list_all_ordered_by_name<S: WatermarkStore>(store: &S) {
    let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    for name in ["test_list_c", "test_list_a", "test_list_b"] {
        store.set(name, ts, 1, SyncType::Full).await.unwrap();
    }

    let names: Vec<String> = store
        .list_all()
        .await
        .expect("list_all should succeed")
        .into_iter()
        .map(|w| w.table_name)
        .filter(|n| n.starts_with("test_list_"))
        .collect();

    assert_eq!(names, vec!["test_list_a", "test_list_b", "test_list_c"]);
}

/// Run all WatermarkStore tests against a store.
#[macro_export]
macro_rules! run_watermark_store_tests {
    ($store:expr) => {
        use $crate::storage::watermark_store_tests::*;

        test_get_nonexistent($store).await;
        println!("  test_get_nonexistent: PASSED");

        test_set_and_get($store).await;
        println!("  test_set_and_get: PASSED");

        test_set_overwrites($store).await;
        println!("  test_set_overwrites: PASSED");

        test_set_epoch($store).await;
        println!("  test_set_epoch: PASSED");

        test_delete_removes_only_that_table($store).await;
        println!("  test_delete_removes_only_that_table: PASSED");

        test_delete_nonexistent($store).await;
        println!("  test_delete_nonexistent: PASSED");

        test_list_all_ordered_by_name($store).await;
        println!("  test_list_all_ordered_by_name: PASSED");
    };
}
