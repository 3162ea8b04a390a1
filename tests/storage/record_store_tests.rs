//! RecordStore interface tests.
//!
//! These tests verify the contract of the RecordStore and StoreTransaction
//! traits. Each storage implementation should run these tests. Every test
//! works in its own scope, so they can share one table.

use positional::config::SortOrder;
use positional::interfaces::{Interval, RecordStore, StorageError};
use positional::Scope;

async fn seed(store: &dyn RecordStore, scope: &Scope, count: i64) -> Vec<i64> {
    let mut tx = store.begin().await.expect("begin should succeed");
    let mut ids = Vec::new();
    for position in 0..count {
        ids.push(tx.insert_row(scope, position).await.expect("insert should succeed"));
    }
    tx.commit().await.expect("commit should succeed");
    ids
}

async fn positions(store: &dyn RecordStore, scope: &Scope) -> Vec<i64> {
    let mut tx = store.begin().await.unwrap();
    let rows = tx
        .find_range(scope, Interval::all(), SortOrder::Asc)
        .await
        .unwrap();
    tx.commit().await.unwrap();
    rows.iter().map(|row| row.position).collect()
}

// =============================================================================
// insert / fetch / count
// =============================================================================

pub async fn test_insert_and_fetch(store: &dyn RecordStore) {
    let scope = Scope::of(1001);
    let ids = seed(store, &scope, 2).await;
    assert_ne!(ids[0], ids[1], "ids should be distinct");

    let mut tx = store.begin().await.unwrap();
    let row = tx
        .fetch(ids[1])
        .await
        .unwrap()
        .expect("inserted row should exist");
    tx.commit().await.unwrap();

    assert_eq!(row.id, ids[1]);
    assert_eq!(row.position, 1);
    assert_eq!(row.scope, scope);
}

pub async fn test_fetch_nonexistent(store: &dyn RecordStore) {
    let mut tx = store.begin().await.unwrap();
    let row = tx.fetch(i64::MAX).await.unwrap();
    tx.rollback().await.unwrap();
    assert!(row.is_none(), "nonexistent row should be None");
}

pub async fn test_count_by_scope(store: &dyn RecordStore) {
    seed(store, &Scope::of(1002), 3).await;
    seed(store, &Scope::of(1003), 1).await;

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.count(&Scope::of(1002)).await.unwrap(), 3);
    assert_eq!(tx.count(&Scope::of(1003)).await.unwrap(), 1);
    assert_eq!(tx.count(&Scope::of(1999)).await.unwrap(), 0);
    tx.commit().await.unwrap();
}

pub async fn test_absent_scope(store: &dyn RecordStore) {
    let mut tx = store.begin().await.unwrap();
    let before = tx.count(&Scope::absent()).await.unwrap();
    let id = tx.insert_row(&Scope::absent(), before).await.unwrap();
    let row = tx.fetch(id).await.unwrap().expect("row should exist");
    let after = tx.count(&Scope::absent()).await.unwrap();
    tx.commit().await.unwrap();

    assert!(row.scope.is_absent(), "NULL scope should decode as absent");
    assert_eq!(after, before + 1);
}

// =============================================================================
// Scoped lookups
// =============================================================================

pub async fn test_find_at(store: &dyn RecordStore) {
    let scope = Scope::of(1004);
    let ids = seed(store, &scope, 3).await;

    let mut tx = store.begin().await.unwrap();
    let row = tx.find_at(&scope, 2).await.unwrap();
    let missing = tx.find_at(&scope, 3).await.unwrap();
    let other = tx.find_at(&Scope::of(1998), 0).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(row.map(|row| row.id), Some(ids[2]));
    assert!(missing.is_none());
    assert!(other.is_none(), "lookups must not cross scopes");
}

pub async fn test_find_range_order(store: &dyn RecordStore) {
    let scope = Scope::of(1005);
    let ids = seed(store, &scope, 5).await;

    let mut tx = store.begin().await.unwrap();
    let middle = tx
        .find_range(&scope, Interval::between(1, 3), SortOrder::Asc)
        .await
        .unwrap();
    let tail = tx
        .find_range(&scope, Interval::above(2), SortOrder::Desc)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(
        middle.iter().map(|row| row.id).collect::<Vec<_>>(),
        vec![ids[1], ids[2], ids[3]]
    );
    assert_eq!(
        tail.iter().map(|row| row.id).collect::<Vec<_>>(),
        vec![ids[4], ids[3]]
    );
}

// =============================================================================
// Writes
// =============================================================================

pub async fn test_shift(store: &dyn RecordStore) {
    let scope = Scope::of(1006);
    let neighbor = Scope::of(1007);
    seed(store, &scope, 5).await;
    seed(store, &neighbor, 3).await;

    let mut tx = store.begin().await.unwrap();
    let shifted = tx.shift(&scope, Interval::at_least(2), 1).await.unwrap();
    let none = tx
        .shift(&scope, Interval::between(3, 2), 1)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(shifted, 3);
    assert_eq!(none, 0, "empty interval should shift nothing");
    assert_eq!(positions(store, &scope).await, vec![0, 1, 3, 4, 5]);
    assert_eq!(positions(store, &neighbor).await, vec![0, 1, 2]);
}

pub async fn test_update_row(store: &dyn RecordStore) {
    let from = Scope::of(1008);
    let to = Scope::of(1009);
    let ids = seed(store, &from, 2).await;

    let mut tx = store.begin().await.unwrap();
    tx.update_row(ids[0], &to, 7).await.unwrap();
    let row = tx.fetch(ids[0]).await.unwrap().unwrap();
    tx.commit().await.unwrap();

    assert_eq!(row.scope, to);
    assert_eq!(row.position, 7);
    assert_eq!(positions(store, &from).await, vec![1]);
}

pub async fn test_update_missing_row(store: &dyn RecordStore) {
    let mut tx = store.begin().await.unwrap();
    let result = tx.update_row(i64::MAX, &Scope::of(1010), 0).await;
    tx.rollback().await.unwrap();
    assert!(matches!(result, Err(StorageError::NotFound(_))));
}

pub async fn test_delete_row(store: &dyn RecordStore) {
    let scope = Scope::of(1011);
    let ids = seed(store, &scope, 2).await;

    let mut tx = store.begin().await.unwrap();
    tx.delete_row(ids[0]).await.unwrap();
    let missing = tx.delete_row(ids[0]).await;
    tx.commit().await.unwrap();

    assert!(matches!(missing, Err(StorageError::NotFound(_))));
    assert_eq!(positions(store, &scope).await, vec![1]);
}

// =============================================================================
// Transactions
// =============================================================================

pub async fn test_rollback_discards_writes(store: &dyn RecordStore) {
    let scope = Scope::of(1012);
    seed(store, &scope, 3).await;

    let mut tx = store.begin().await.unwrap();
    tx.insert_row(&scope, 3).await.unwrap();
    tx.shift(&scope, Interval::all(), 10).await.unwrap();
    tx.rollback().await.unwrap();

    assert_eq!(positions(store, &scope).await, vec![0, 1, 2]);
}

pub async fn test_scopes(store: &dyn RecordStore) {
    seed(store, &Scope::of(1013), 2).await;

    let scopes = store.scopes().await.unwrap();

    assert!(scopes.contains(&Scope::of(1013)));
    let mut deduped = scopes.clone();
    deduped.dedup();
    assert_eq!(scopes, deduped, "scopes should be distinct");
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all RecordStore interface tests against a store implementation.
#[macro_export]
macro_rules! run_record_store_tests {
    ($store:expr) => {
        use $crate::storage::record_store_tests::*;

        // insert / fetch / count
        test_insert_and_fetch($store).await;
        println!("  test_insert_and_fetch: PASSED");

        test_fetch_nonexistent($store).await;
        println!("  test_fetch_nonexistent: PASSED");

        test_count_by_scope($store).await;
        println!("  test_count_by_scope: PASSED");

        test_absent_scope($store).await;
        println!("  test_absent_scope: PASSED");

        // scoped lookups
        test_find_at($store).await;
        println!("  test_find_at: PASSED");

        test_find_range_order($store).await;
        println!("  test_find_range_order: PASSED");

        // writes
        test_shift($store).await;
        println!("  test_shift: PASSED");

        test_update_row($store).await;
        println!("  test_update_row: PASSED");

        test_update_missing_row($store).await;
        println!("  test_update_missing_row: PASSED");

        test_delete_row($store).await;
        println!("  test_delete_row: PASSED");

        // transactions
        test_rollback_discards_writes($store).await;
        println!("  test_rollback_discards_writes: PASSED");

        test_scopes($store).await;
        println!("  test_scopes: PASSED");
    };
}
