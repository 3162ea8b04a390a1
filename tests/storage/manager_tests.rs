//! PositionManager scenarios against a real record store.
//!
//! These run the ordering operations end to end through SQL and check the
//! resulting positions with the contiguity audit.

use std::sync::Arc;

use positional::interfaces::{Entry, Positioned, RecordId, RecordStore};
use positional::{PositionError, PositionManager, Scope};

use super::test_positioning;

fn manager(store: Arc<dyn RecordStore>) -> PositionManager {
    PositionManager::new(store, test_positioning())
}

async fn seed(manager: &PositionManager, scope: &Scope, count: usize) -> Vec<Entry> {
    let mut entries = Vec::new();
    for _ in 0..count {
        let mut entry = Entry::new(scope.clone());
        manager.create(&mut entry).await.expect("create should succeed");
        entries.push(entry);
    }
    entries
}

async fn order(manager: &PositionManager, scope: &Scope) -> Vec<RecordId> {
    manager
        .list(scope)
        .await
        .unwrap()
        .iter()
        .map(|row| row.id)
        .collect()
}

fn ids(entries: &[Entry], indexes: &[usize]) -> Vec<RecordId> {
    indexes.iter().map(|i| entries[*i].id.unwrap()).collect()
}

async fn assert_contiguous(manager: &PositionManager, scope: &Scope) {
    let audit = manager.audit(scope).await.unwrap();
    assert!(audit.is_contiguous(), "scope {} broken: {:?}", scope, audit);
}

// =============================================================================
// Lifecycle
// =============================================================================

pub async fn test_create_appends(store: Arc<dyn RecordStore>) {
    let manager = manager(store);
    let scope = Scope::of(2001);

    let entries = seed(&manager, &scope, 4).await;

    let positions: Vec<Option<i64>> = entries.iter().map(|e| e.position).collect();
    assert_eq!(positions, vec![Some(0), Some(1), Some(2), Some(3)]);
    assert_eq!(order(&manager, &scope).await, ids(&entries, &[0, 1, 2, 3]));
}

pub async fn test_destroy_closes_gap(store: Arc<dyn RecordStore>) {
    let manager = manager(store);
    let scope = Scope::of(2002);
    let entries = seed(&manager, &scope, 5).await;

    manager.destroy(&entries[2]).await.unwrap();

    assert_eq!(order(&manager, &scope).await, ids(&entries, &[0, 1, 3, 4]));
    assert_contiguous(&manager, &scope).await;
}

// =============================================================================
// Moves
// =============================================================================

pub async fn test_move_within_scope(store: Arc<dyn RecordStore>) {
    let manager = manager(store);
    let scope = Scope::of(2003);
    let mut entries = seed(&manager, &scope, 10).await;

    assert_eq!(manager.move_to(&mut entries[5], 8, None).await.unwrap(), 8);
    assert_eq!(
        order(&manager, &scope).await,
        ids(&entries, &[0, 1, 2, 3, 4, 6, 7, 8, 5, 9])
    );

    assert_eq!(manager.move_to(&mut entries[5], 1, None).await.unwrap(), 1);
    assert_eq!(
        order(&manager, &scope).await,
        ids(&entries, &[0, 5, 1, 2, 3, 4, 6, 7, 8, 9])
    );
    assert_contiguous(&manager, &scope).await;
}

pub async fn test_move_out_of_range(store: Arc<dyn RecordStore>) {
    let manager = manager(store);
    let scope = Scope::of(2004);
    let mut entries = seed(&manager, &scope, 10).await;

    assert_eq!(manager.move_to(&mut entries[5], 20, None).await.unwrap(), 5);
    assert_eq!(
        order(&manager, &scope).await,
        ids(&entries, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9])
    );
}

pub async fn test_move_across_scopes(store: Arc<dyn RecordStore>) {
    let manager = manager(store);
    let (a, b) = (Scope::of(2005), Scope::of(2006));
    let mut from = seed(&manager, &a, 5).await;
    let to = seed(&manager, &b, 3).await;

    let position = manager.move_to(&mut from[1], 0, Some(&b)).await.unwrap();

    assert_eq!(position, 0);
    assert_eq!(from[1].scope, b);
    assert_eq!(order(&manager, &a).await, ids(&from, &[0, 2, 3, 4]));
    assert_eq!(
        order(&manager, &b).await,
        vec![from[1].id.unwrap(), to[0].id.unwrap(), to[1].id.unwrap(), to[2].id.unwrap()]
    );
    assert_contiguous(&manager, &a).await;
    assert_contiguous(&manager, &b).await;
}

pub async fn test_up_and_down(store: Arc<dyn RecordStore>) {
    let manager = manager(store);
    let scope = Scope::of(2007);
    let mut entries = seed(&manager, &scope, 3).await;

    assert!(manager.up(&mut entries[1]).await.unwrap());
    assert!(!manager.down(&mut entries[2]).await.unwrap());
    assert!(!manager.up(&mut entries[1]).await.unwrap());
    assert!(manager.down(&mut entries[1]).await.unwrap());
    assert!(manager.up(&mut entries[1]).await.unwrap());

    assert_eq!(order(&manager, &scope).await, ids(&entries, &[1, 0, 2]));
    assert_contiguous(&manager, &scope).await;
}

// =============================================================================
// Direct assignment
// =============================================================================

pub async fn test_save_reverts_out_of_range(store: Arc<dyn RecordStore>) {
    let manager = manager(store);
    let scope = Scope::of(2008);
    let mut entries = seed(&manager, &scope, 3).await;

    entries[0].set_position(-4);
    assert_eq!(manager.save(&mut entries[0]).await.unwrap(), 0);

    entries[0].set_position(2);
    assert_eq!(manager.save(&mut entries[0]).await.unwrap(), 2);

    assert_eq!(order(&manager, &scope).await, ids(&entries, &[1, 2, 0]));
    assert_contiguous(&manager, &scope).await;
}

pub async fn test_save_scope_change_appends(store: Arc<dyn RecordStore>) {
    let manager = manager(store);
    let (a, b) = (Scope::of(2009), Scope::of(2010));
    let mut from = seed(&manager, &a, 2).await;
    seed(&manager, &b, 2).await;

    from[0].set_scope(b.clone());
    from[0].set_position(50);
    assert_eq!(manager.save(&mut from[0]).await.unwrap(), 2);

    assert_eq!(manager.count(&a).await.unwrap(), 1);
    assert_eq!(manager.count(&b).await.unwrap(), 3);
    assert_contiguous(&manager, &a).await;
    assert_contiguous(&manager, &b).await;
}

// =============================================================================
// Range
// =============================================================================

pub async fn test_range(store: Arc<dyn RecordStore>) {
    let manager = manager(store);
    let scope = Scope::of(2011);
    let entries = seed(&manager, &scope, 4).await;

    assert_eq!(manager.range(&entries[0], None).await.unwrap(), 0..=3);
    assert_eq!(
        manager.range(&Entry::new(scope.clone()), None).await.unwrap(),
        0..=4
    );
    assert!(matches!(
        manager.range(&Entry::new(Scope::absent()), None).await,
        Err(PositionError::MissingScope)
    ));
}

pub async fn test_save_uses_stored_placement(store: Arc<dyn RecordStore>) {
    let manager = manager(store);
    let scope = Scope::of(2012);
    let mut entries = seed(&manager, &scope, 3).await;
    let mut stale = entries[0].clone();

    manager.move_to(&mut entries[0], 2, None).await.unwrap();
    stale.set_position(1);
    let position = manager.save(&mut stale).await.unwrap();

    assert_eq!(position, 1);
    assert_eq!(order(&manager, &scope).await, ids(&entries, &[1, 0, 2]));
    assert_contiguous(&manager, &scope).await;
}

pub async fn test_text_key_on_integer_column(store: Arc<dyn RecordStore>) {
    let manager = manager(store);
    let entries = seed(&manager, &Scope::of("2013"), 10).await;
    assert_eq!(entries[0].scope, Scope::of(2013));

    let mut record = entries[9].clone();
    record.scope = Scope::of("2013");

    assert_eq!(manager.range(&record, None).await.unwrap(), 0..=9);
    assert_eq!(manager.move_to(&mut record, 10, None).await.unwrap(), 9);
    assert_eq!(manager.count(&Scope::of(2013)).await.unwrap(), 10);
    assert_contiguous(&manager, &Scope::of(2013)).await;

    assert!(matches!(
        manager.create(&mut Entry::new(Scope::of("inbox"))).await,
        Err(PositionError::InvalidScope(_))
    ));
}

/// Interleaved writers on one scope. A write may fail with a busy or
/// serialization error; the ones that commit must leave the scope contiguous.
pub async fn test_concurrent_operations(store: Arc<dyn RecordStore>) {
    let manager = manager(store);
    let scope = Scope::of(2014);
    let entries = seed(&manager, &scope, 12).await;

    let mut handles = Vec::new();
    for (i, mut entry) in entries.into_iter().enumerate() {
        let manager = manager.clone();
        let scope = scope.clone();
        handles.push(tokio::spawn(async move {
            match i % 3 {
                0 => manager
                    .move_to(&mut entry, (i as i64 * 5) % 12, None)
                    .await
                    .map(|_| 0),
                1 => manager.destroy(&entry).await.map(|_| -1),
                _ => {
                    let mut fresh = Entry::new(scope);
                    manager.create(&mut fresh).await.map(|_| 1)
                }
            }
        }));
    }

    let mut expected = 12;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(delta) => expected += delta,
            Err(error) => println!("    concurrent write failed: {}", error),
        }
    }

    assert_eq!(manager.count(&scope).await.unwrap(), expected);
    assert_contiguous(&manager, &scope).await;
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all PositionManager scenarios against a store implementation.
#[macro_export]
macro_rules! run_manager_tests {
    ($store:expr) => {
        use $crate::storage::manager_tests::*;

        // lifecycle
        test_create_appends($store).await;
        println!("  test_create_appends: PASSED");

        test_destroy_closes_gap($store).await;
        println!("  test_destroy_closes_gap: PASSED");

        // moves
        test_move_within_scope($store).await;
        println!("  test_move_within_scope: PASSED");

        test_move_out_of_range($store).await;
        println!("  test_move_out_of_range: PASSED");

        test_move_across_scopes($store).await;
        println!("  test_move_across_scopes: PASSED");

        test_up_and_down($store).await;
        println!("  test_up_and_down: PASSED");

        // direct assignment
        test_save_reverts_out_of_range($store).await;
        println!("  test_save_reverts_out_of_range: PASSED");

        test_save_scope_change_appends($store).await;
        println!("  test_save_scope_change_appends: PASSED");

        test_save_uses_stored_placement($store).await;
        println!("  test_save_uses_stored_placement: PASSED");

        // range
        test_range($store).await;
        println!("  test_range: PASSED");

        // scope keys
        test_text_key_on_integer_column($store).await;
        println!("  test_text_key_on_integer_column: PASSED");

        // concurrency
        test_concurrent_operations($store).await;
        println!("  test_concurrent_operations: PASSED");
    };
}
