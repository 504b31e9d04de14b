//! Dense position maintenance
//!
//! Positions are a structural property of a group: within each partition
//! they must read `1..=N`. The resetter rebuilds that sequence from the
//! current ordering and never validates or aborts on a single failed write.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use core_kernel::{CustomerGroupId, PortError};

use crate::customer::{Customer, Partition};
use crate::ports::CustomerTransaction;
use crate::tracker::ErrorTracker;

/// Message recorded for every failed position write
pub const POSITION_WRITE_ERROR: &str = "unable to update position for customers";

/// Recomputes contiguous positions inside groups
pub struct PositionResetter;

impl PositionResetter {
    /// Renumbers every partition of every listed group
    ///
    /// Customers keep their relative order, sorted by (position, id), and
    /// receive positions `1..=N`. Duplicated or unknown group ids are
    /// ignored. A failed write is recorded in `tracker` and the remaining
    /// writes still run.
    ///
    /// # Errors
    ///
    /// Only failures to load groups or customers are returned.
    pub async fn reset<I>(
        tx: &mut dyn CustomerTransaction,
        group_ids: I,
        tracker: &mut ErrorTracker,
    ) -> Result<(), PortError>
    where
        I: IntoIterator<Item = CustomerGroupId>,
    {
        let group_ids: BTreeSet<CustomerGroupId> = group_ids.into_iter().collect();

        for group_id in group_ids {
            if !tx.group_exists(group_id).await? {
                continue;
            }
            for partition in Partition::ALL {
                let customers = tx.customers_in_partition(group_id, partition).await?;
                debug!(%group_id, ?partition, count = customers.len(), "renumbering positions");
                Self::write_sequence(tx, &customers, tracker).await;
            }
        }

        Ok(())
    }

    /// Moves one customer to `position` inside its partition
    ///
    /// The others shift to keep the sequence dense. `position` is clamped to
    /// the partition size.
    pub async fn move_to(
        tx: &mut dyn CustomerTransaction,
        customer: &Customer,
        position: i32,
        tracker: &mut ErrorTracker,
    ) -> Result<(), PortError> {
        let mut ordered = tx
            .customers_in_partition(customer.group_id, customer.partition())
            .await?;

        let Some(current) = ordered.iter().position(|c| c.id == customer.id) else {
            return Ok(());
        };
        let moving = ordered.remove(current);
        let target = (position.max(1) as usize - 1).min(ordered.len());
        ordered.insert(target, moving);

        Self::write_sequence(tx, &ordered, tracker).await;
        Ok(())
    }

    /// Writes positions `1..=N` onto `ordered`, skipping unchanged rows
    async fn write_sequence(
        tx: &mut dyn CustomerTransaction,
        ordered: &[Customer],
        tracker: &mut ErrorTracker,
    ) {
        for (index, customer) in ordered.iter().enumerate() {
            let position = index as i32 + 1;
            if customer.position == position {
                continue;
            }
            if let Err(error) = tx.write_position(customer.id, position).await {
                warn!(customer_id = %customer.id, position, %error, "position write failed");
                tracker.add(POSITION_WRITE_ERROR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customer::NewCustomer;
    use crate::group::CustomerGroup;
    use crate::ports::mock::InMemoryCustomerStore;
    use crate::ports::CustomerStore;
    use proptest::prelude::*;

    async fn store_with_positions(
        positions: &[i32],
    ) -> (InMemoryCustomerStore, CustomerGroup, Vec<Customer>) {
        let store = InMemoryCustomerStore::new();
        let group = CustomerGroup::new_default("General");
        store.seed_group(group.clone()).await;

        let mut customers = Vec::new();
        for (index, position) in positions.iter().enumerate() {
            let mut customer = Customer::new(
                NewCustomer::new(format!("Customer {index}"), format!("98{index:08}")),
                group.id,
            );
            customer.position = *position;
            store.seed_customer(customer.clone()).await;
            customers.push(customer);
        }
        (store, group, customers)
    }

    async fn positions_by_id(store: &InMemoryCustomerStore, customers: &[Customer]) -> Vec<i32> {
        let state = store.snapshot().await;
        customers.iter().map(|c| state.customers[&c.id].position).collect()
    }

    #[tokio::test]
    async fn test_reset_closes_gaps_and_breaks_ties_by_id() {
        let (store, group, customers) = store_with_positions(&[4, 4, 1]).await;
        let mut tracker = ErrorTracker::default();

        let mut tx = store.begin().await.unwrap();
        PositionResetter::reset(tx.as_mut(), [group.id, group.id], &mut tracker).await.unwrap();
        tx.commit().await.unwrap();

        assert!(!tracker.has_error());
        let positions = positions_by_id(&store, &customers).await;
        assert_eq!(positions[2], 1);
        if customers[0].id < customers[1].id {
            assert_eq!(&positions[..2], &[2, 3]);
        } else {
            assert_eq!(&positions[..2], &[3, 2]);
        }
    }

    #[tokio::test]
    async fn test_partitions_are_numbered_independently() {
        let (store, group, mut customers) = store_with_positions(&[1, 2, 3]).await;
        customers[1].withheld = true;
        customers[1].position = 7;
        store.seed_customer(customers[1].clone()).await;
        let mut tracker = ErrorTracker::default();

        let mut tx = store.begin().await.unwrap();
        PositionResetter::reset(tx.as_mut(), [group.id], &mut tracker).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(positions_by_id(&store, &customers).await, vec![1, 1, 2]);
    }

    #[tokio::test]
    async fn test_failed_write_is_recorded_and_others_continue() {
        let (store, group, customers) = store_with_positions(&[5, 6, 7]).await;
        store.fail_position_writes_for(customers[1].id);
        let mut tracker = ErrorTracker::default();

        let mut tx = store.begin().await.unwrap();
        PositionResetter::reset(tx.as_mut(), [group.id], &mut tracker).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(tracker.list(), vec![POSITION_WRITE_ERROR.to_string()]);
        assert_eq!(positions_by_id(&store, &customers).await, vec![1, 6, 3]);
    }

    #[tokio::test]
    async fn test_unknown_group_is_ignored() {
        let store = InMemoryCustomerStore::new();
        let mut tracker = ErrorTracker::default();

        let mut tx = store.begin().await.unwrap();
        PositionResetter::reset(tx.as_mut(), [CustomerGroupId::new()], &mut tracker).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(!tracker.has_error());
    }

    #[tokio::test]
    async fn test_move_to_shifts_neighbours() {
        let (store, _group, customers) = store_with_positions(&[1, 2, 3]).await;
        let mut tracker = ErrorTracker::default();

        let mut tx = store.begin().await.unwrap();
        PositionResetter::move_to(tx.as_mut(), &customers[2], 1, &mut tracker).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(positions_by_id(&store, &customers).await, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn test_move_to_clamps_to_partition_size() {
        let (store, _group, customers) = store_with_positions(&[1, 2, 3]).await;
        let mut tracker = ErrorTracker::default();

        let mut tx = store.begin().await.unwrap();
        PositionResetter::move_to(tx.as_mut(), &customers[0], 10, &mut tracker).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(positions_by_id(&store, &customers).await, vec![3, 1, 2]);
    }

    fn run_reset_twice(positions: Vec<i32>) -> (Vec<i32>, Vec<i32>) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let (store, group, customers) = store_with_positions(&positions).await;
            let mut tracker = ErrorTracker::default();

            let mut tx = store.begin().await.unwrap();
            PositionResetter::reset(tx.as_mut(), [group.id], &mut tracker).await.unwrap();
            tx.commit().await.unwrap();
            let first = positions_by_id(&store, &customers).await;

            let mut tx = store.begin().await.unwrap();
            PositionResetter::reset(tx.as_mut(), [group.id], &mut tracker).await.unwrap();
            tx.commit().await.unwrap();
            let second = positions_by_id(&store, &customers).await;

            (first, second)
        })
    }

    proptest! {
        #[test]
        fn prop_reset_is_dense_and_idempotent(positions in prop::collection::vec(-3i32..20, 0..12)) {
            let (first, second) = run_reset_twice(positions.clone());

            let mut sorted = first.clone();
            sorted.sort_unstable();
            let expected: Vec<i32> = (1..=positions.len() as i32).collect();
            prop_assert_eq!(sorted, expected);
            prop_assert_eq!(first, second);
        }
    }
}
