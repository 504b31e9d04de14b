//! End-to-end tests for the group operations against the in-memory store

use std::sync::Arc;

use core_kernel::{CustomerGroupId, CustomerId};
use domain_customer::{
    CustomerError, CustomerStore, CustomerStoreExt, ErrorTracker, GroupCreateOperation,
    GroupDeleteOperation, GroupEdit, GroupUpdateOperation, InMemoryCustomerStore, NewCustomerGroup,
    ASSIGN_CUSTOMERS_ERROR, INVALID_POSITION_ERROR, POSITION_WRITE_ERROR,
};
use domain_customer::group::DEFAULT_GROUP_DELETE_ERROR;
use domain_customer::validation::GROUP_NAME_TAKEN;
use rust_decimal_macros::dec;
use test_utils::{
    assert_dense_positions, assert_failed_with, assert_succeeded, StoreFixtures, TestCustomerBuilder,
    TestGroupBuilder,
};

const NAME_TOO_SHORT: &str = "Name is too short (minimum is 3 characters)";

fn dyn_store(store: &Arc<InMemoryCustomerStore>) -> Arc<dyn CustomerStore> {
    store.clone()
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_group_moves_listed_customers_and_renumbers() {
    let (store, general) = StoreFixtures::with_default_group().await;
    let customers = StoreFixtures::seed_customers(&store, &general, 4).await;
    let operation = GroupCreateOperation::new(dyn_store(&store));

    let outcome = operation
        .execute(
            NewCustomerGroup::new("  morning   route "),
            vec![customers[3].id, customers[1].id],
        )
        .await
        .unwrap();

    let group = assert_succeeded!(outcome);
    assert_eq!(group.name, "Morning Route");
    assert!(!group.is_default);

    let state = store.snapshot().await;
    assert_eq!(state.customers[&customers[1].id].group_id, group.id);
    assert_eq!(state.customers[&customers[3].id].group_id, group.id);
    assert_eq!(state.customers[&customers[0].id].position, 1);
    assert_eq!(state.customers[&customers[2].id].position, 2);
    assert_dense_positions(state.customers.values());
}

#[tokio::test]
async fn test_create_group_with_taken_name_fails_without_changes() {
    let (store, general) = StoreFixtures::with_default_group().await;
    let customers = StoreFixtures::seed_customers(&store, &general, 2).await;
    let before = store.snapshot().await;
    let operation = GroupCreateOperation::new(dyn_store(&store));

    let outcome = operation
        .execute(NewCustomerGroup::new("GENERAL"), vec![customers[0].id])
        .await
        .unwrap();

    assert_failed_with(&outcome, GROUP_NAME_TAKEN);
    let after = store.snapshot().await;
    assert_eq!(after.groups, before.groups);
    assert_eq!(after.customers, before.customers);
}

#[tokio::test]
async fn test_create_group_ignores_unknown_customer_ids() {
    let (store, _general) = StoreFixtures::with_default_group().await;
    let operation = GroupCreateOperation::new(dyn_store(&store));

    let outcome = operation
        .execute(NewCustomerGroup::new("Evening Route"), vec![CustomerId::new()])
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(store.snapshot().await.groups.len(), 2);
}

#[tokio::test]
async fn test_failed_position_write_rolls_back_group_creation() {
    let (store, general) = StoreFixtures::with_default_group().await;
    let customers = StoreFixtures::seed_customers(&store, &general, 3).await;
    store.fail_position_writes_for(customers[2].id);
    let operation = GroupCreateOperation::new(dyn_store(&store));

    let outcome = operation
        .execute(NewCustomerGroup::new("Evening Route"), vec![customers[0].id])
        .await
        .unwrap();

    assert_failed_with(&outcome, POSITION_WRITE_ERROR);
    let state = store.snapshot().await;
    assert_eq!(state.groups.len(), 1);
    assert_eq!(state.customers[&customers[0].id].group_id, general.id);
}

#[tokio::test]
async fn test_create_group_with_invalid_member_reports_assignment_failure() {
    let (store, general) = StoreFixtures::with_default_group().await;
    let valid = StoreFixtures::seed_customers(&store, &general, 1).await.remove(0);
    let invalid = TestCustomerBuilder::new()
        .in_group(general.id)
        .with_name("Ab")
        .at_position(2)
        .seed(&store)
        .await;
    let before = store.snapshot().await;
    let operation = GroupCreateOperation::new(dyn_store(&store));

    let outcome = operation
        .execute(NewCustomerGroup::new("Evening Route"), vec![valid.id, invalid.id])
        .await
        .unwrap();

    assert_failed_with(&outcome, ASSIGN_CUSTOMERS_ERROR);
    assert_failed_with(&outcome, NAME_TOO_SHORT);
    let after = store.snapshot().await;
    assert_eq!(after.groups.len(), 1);
    assert_eq!(after.customers, before.customers);
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_renames_adds_and_removes() {
    let (store, general) = StoreFixtures::with_default_group().await;
    let route = TestGroupBuilder::new().seed(&store).await;
    let members = StoreFixtures::seed_customers(&store, &route, 3).await;
    let outsiders = StoreFixtures::seed_customers(&store, &general, 2).await;
    let operation = GroupUpdateOperation::new(dyn_store(&store));

    let edit = GroupEdit::rename("north route")
        .remove([members[0].id])
        .add([outsiders[1].id]);
    let outcome = operation.execute(route.id, edit).await.unwrap();

    let group = assert_succeeded!(outcome);
    assert_eq!(group.name, "North Route");

    let state = store.snapshot().await;
    assert_eq!(state.customers[&members[0].id].group_id, general.id);
    assert_eq!(state.customers[&outsiders[1].id].group_id, route.id);
    assert_eq!(state.customers[&members[1].id].position, 1);
    assert_eq!(state.customers[&members[2].id].position, 2);
    assert_eq!(state.customers[&outsiders[1].id].position, 3);
    assert_dense_positions(state.customers.values());
}

#[tokio::test]
async fn test_update_moves_customer_to_requested_position() {
    let (store, _general) = StoreFixtures::with_default_group().await;
    let route = TestGroupBuilder::new().seed(&store).await;
    let members = StoreFixtures::seed_customers(&store, &route, 3).await;
    let operation = GroupUpdateOperation::new(dyn_store(&store));

    let outcome = operation
        .execute(route.id, GroupEdit::default().reposition(members[2].id, 1))
        .await
        .unwrap();

    assert!(outcome.success);
    let state = store.snapshot().await;
    let positions: Vec<i32> = members.iter().map(|c| state.customers[&c.id].position).collect();
    assert_eq!(positions, vec![2, 3, 1]);
}

#[tokio::test]
async fn test_update_rejects_multiple_positions_without_mutation() {
    let (store, _general) = StoreFixtures::with_default_group().await;
    let route = TestGroupBuilder::new().seed(&store).await;
    let members = StoreFixtures::seed_customers(&store, &route, 3).await;
    let before = store.snapshot().await;
    let operation = GroupUpdateOperation::new(dyn_store(&store));

    let edit = GroupEdit::rename("Renamed Route")
        .reposition(members[0].id, 1)
        .reposition(members[1].id, 2);
    let outcome = operation.execute(route.id, edit).await.unwrap();

    assert_failed_with(&outcome, INVALID_POSITION_ERROR);
    let after = store.snapshot().await;
    assert_eq!(after.groups, before.groups);
    assert_eq!(after.customers, before.customers);
}

#[tokio::test]
async fn test_update_rejects_out_of_range_position() {
    let (store, _general) = StoreFixtures::with_default_group().await;
    let route = TestGroupBuilder::new().seed(&store).await;
    let members = StoreFixtures::seed_customers(&store, &route, 3).await;
    let before = store.snapshot().await;
    let operation = GroupUpdateOperation::new(dyn_store(&store));

    for position in [0, 5] {
        let outcome = operation
            .execute(route.id, GroupEdit::default().reposition(members[0].id, position))
            .await
            .unwrap();
        assert_failed_with(&outcome, INVALID_POSITION_ERROR);
    }
    assert_eq!(store.snapshot().await.customers, before.customers);
}

#[tokio::test]
async fn test_update_with_blank_name_keeps_name() {
    let (store, _general) = StoreFixtures::with_default_group().await;
    let route = TestGroupBuilder::new().with_name("Harbour Route").seed(&store).await;
    let operation = GroupUpdateOperation::new(dyn_store(&store));

    let outcome = operation.execute(route.id, GroupEdit::rename("   ")).await.unwrap();

    assert_eq!(assert_succeeded!(outcome).name, "Harbour Route");
}

#[tokio::test]
async fn test_update_invalid_rename_stops_membership_changes() {
    let (store, general) = StoreFixtures::with_default_group().await;
    let route = TestGroupBuilder::new().seed(&store).await;
    let outsider = TestCustomerBuilder::new().in_group(general.id).seed(&store).await;
    let operation = GroupUpdateOperation::new(dyn_store(&store));

    let outcome = operation
        .execute(route.id, GroupEdit::rename("ab").add([outsider.id]))
        .await
        .unwrap();

    assert_failed_with(&outcome, "Name is too short (minimum is 3 characters)");
    assert_eq!(store.snapshot().await.customers[&outsider.id].group_id, general.id);
}

#[tokio::test]
async fn test_update_unknown_group_is_a_hard_error() {
    let (store, _general) = StoreFixtures::with_default_group().await;
    let operation = GroupUpdateOperation::new(dyn_store(&store));

    let error = operation
        .execute(CustomerGroupId::new(), GroupEdit::rename("Anything"))
        .await
        .unwrap_err();

    assert!(matches!(error, CustomerError::GroupNotFound(_)));
}

#[tokio::test]
async fn test_nested_calls_share_one_tracker() {
    let (store, _general) = StoreFixtures::with_default_group().await;
    let route = TestGroupBuilder::new().seed(&store).await;
    let mut tracker = ErrorTracker::new("route_maintenance");

    let outcome = GroupUpdateOperation::new(dyn_store(&store))
        .execute_with_tracker(route.id, GroupEdit::rename("General"), &mut tracker)
        .await
        .unwrap();

    assert!(!outcome.success);
    assert_eq!(tracker.list(), vec![GROUP_NAME_TAKEN.to_string()]);
    assert_eq!(tracker.name(), "route_maintenance");
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_default_group_is_refused() {
    let (store, general) = StoreFixtures::with_default_group().await;
    StoreFixtures::seed_customers(&store, &general, 2).await;
    let before = store.snapshot().await;
    let operation = GroupDeleteOperation::new(dyn_store(&store));

    let outcome = operation.execute(general.id).await.unwrap();

    assert_failed_with(&outcome, DEFAULT_GROUP_DELETE_ERROR);
    let after = store.snapshot().await;
    assert_eq!(after.groups, before.groups);
    assert_eq!(after.customers, before.customers);
}

#[tokio::test]
async fn test_delete_moves_all_customers_to_default_group() {
    let (store, general) = StoreFixtures::with_default_group().await;
    let d = TestCustomerBuilder::new().in_group(general.id).at_position(1).seed(&store).await;
    let route = TestGroupBuilder::new().seed(&store).await;
    let members = StoreFixtures::seed_customers(&store, &route, 3).await;
    let held = TestCustomerBuilder::new()
        .in_group(route.id)
        .withheld()
        .at_position(1)
        .seed(&store)
        .await;
    let operation = GroupDeleteOperation::new(dyn_store(&store));

    let outcome = operation.execute(route.id).await.unwrap();

    assert_eq!(assert_succeeded!(outcome).id, route.id);
    let state = store.snapshot().await;
    assert!(!state.groups.contains_key(&route.id));
    for customer in members.iter().chain([&d, &held]) {
        assert_eq!(state.customers[&customer.id].group_id, general.id);
    }

    let mut active: Vec<i32> = state.customers.values().filter(|c| !c.withheld).map(|c| c.position).collect();
    active.sort_unstable();
    assert_eq!(active, vec![1, 2, 3, 4]);
    assert_eq!(state.customers[&held.id].position, 1);
    assert_dense_positions(state.customers.values());
}

#[tokio::test]
async fn test_delete_without_default_group_fails_loudly() {
    let store = Arc::new(InMemoryCustomerStore::new());
    let route = TestGroupBuilder::new().seed(&store).await;
    let operation = GroupDeleteOperation::new(dyn_store(&store));

    let error = operation.execute(route.id).await.unwrap_err();

    assert!(matches!(error, CustomerError::DefaultGroupMissing));
    assert!(store.load_group(route.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_ambiguous_default_group_is_reported() {
    let store = Arc::new(InMemoryCustomerStore::new());
    TestGroupBuilder::new().as_default().seed(&store).await;
    TestGroupBuilder::new().as_default().seed(&store).await;
    let route = TestGroupBuilder::new().seed(&store).await;

    let error = GroupDeleteOperation::new(dyn_store(&store))
        .execute(route.id)
        .await
        .unwrap_err();

    assert!(matches!(error, CustomerError::AmbiguousDefaultGroup(2)));
}

#[tokio::test]
async fn test_delete_with_invalid_active_member_rolls_back_withheld_move() {
    let (store, general) = StoreFixtures::with_default_group().await;
    StoreFixtures::seed_customers(&store, &general, 2).await;
    let route = TestGroupBuilder::new().seed(&store).await;
    TestCustomerBuilder::new()
        .in_group(route.id)
        .withheld()
        .at_position(1)
        .seed(&store)
        .await;
    TestCustomerBuilder::new()
        .in_group(route.id)
        .with_name("Ab")
        .at_position(1)
        .seed(&store)
        .await;
    let before = store.snapshot().await;
    let operation = GroupDeleteOperation::new(dyn_store(&store));

    let outcome = operation.execute(route.id).await.unwrap();

    assert_failed_with(&outcome, NAME_TOO_SHORT);
    assert_eq!(outcome.errors, vec![NAME_TOO_SHORT.to_string()]);
    let after = store.snapshot().await;
    assert_eq!(after.groups, before.groups);
    assert_eq!(after.customers, before.customers);
}

// ============================================================================
// Totals
// ============================================================================

#[tokio::test]
async fn test_group_due_amount_sums_members() {
    let (store, _general) = StoreFixtures::with_default_group().await;
    let route = TestGroupBuilder::new().seed(&store).await;
    for amount in [dec!(10.50), dec!(4.25)] {
        TestCustomerBuilder::new()
            .in_group(route.id)
            .with_due_amount(amount)
            .seed(&store)
            .await;
    }

    assert_eq!(store.group_due_amount(route.id).await.unwrap(), dec!(14.75));
}
