//! Combined group edit: rename, add, remove and reposition

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::instrument;

use core_kernel::{CustomerGroupId, CustomerId};

use crate::error::CustomerError;
use crate::group::{CustomerGroup, CustomerPosition, DefaultGroup, GroupEdit};
use crate::outcome::{OperationOutcome, StepResult};
use crate::ports::{CustomerStore, CustomerTransaction};
use crate::tracker::ErrorTracker;

use super::positions::PositionResetter;
use super::records::{reassign_customers, save_group, SaveMode};
use super::finish;

/// Message recorded when a repositioning request is rejected
pub const INVALID_POSITION_ERROR: &str = "Invalid position provided";

/// Applies a [`GroupEdit`] to an existing group in one transaction
///
/// Steps run in a fixed order and each one stops the edit when it recorded
/// an error:
///
/// 1. validate the repositioning request, before anything is written
/// 2. rename
/// 3. move removed customers to the default group
/// 4. move added customers into the group
/// 5. apply the repositioning
pub struct GroupUpdateOperation {
    store: Arc<dyn CustomerStore>,
}

impl GroupUpdateOperation {
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        group_id: CustomerGroupId,
        edit: GroupEdit,
    ) -> Result<OperationOutcome<CustomerGroup>, CustomerError> {
        let mut tracker = ErrorTracker::new("customer_group_update");
        self.execute_with_tracker(group_id, edit, &mut tracker).await
    }

    #[instrument(skip(self, edit, tracker), fields(group_id = %group_id))]
    pub async fn execute_with_tracker(
        &self,
        group_id: CustomerGroupId,
        edit: GroupEdit,
        tracker: &mut ErrorTracker,
    ) -> Result<OperationOutcome<CustomerGroup>, CustomerError> {
        let mut tx = self.store.begin().await?;
        let step = Self::apply(tx.as_mut(), group_id, edit, tracker).await;
        finish(tx, step, tracker, "customer_group_update").await
    }

    async fn apply(
        tx: &mut dyn CustomerTransaction,
        group_id: CustomerGroupId,
        edit: GroupEdit,
        tracker: &mut ErrorTracker,
    ) -> StepResult<CustomerGroup> {
        let mut group = tx
            .find_group(group_id)
            .await?
            .ok_or(CustomerError::GroupNotFound(group_id))?;

        Self::validate_positions(tx, &group, &edit.positions, tracker).await?;

        Self::rename(tx, &mut group, edit.name.as_deref(), tracker).await?;
        tracker.checkpoint()?;

        Self::remove_customers(tx, &group, &edit.remove_customer_ids, tracker).await?;
        tracker.checkpoint()?;

        Self::add_customers(tx, &group, &edit.add_customer_ids, tracker).await?;
        tracker.checkpoint()?;

        Self::apply_position(tx, &group, &edit.positions, tracker).await?;
        tracker.checkpoint()?;

        Ok(group)
    }

    /// Accepts exactly one entry, inside `1..=group size`, without
    /// duplicated customers
    async fn validate_positions(
        tx: &mut dyn CustomerTransaction,
        group: &CustomerGroup,
        positions: &[CustomerPosition],
        tracker: &mut ErrorTracker,
    ) -> StepResult {
        if positions.is_empty() {
            return Ok(());
        }

        let group_size = tx.count_in_group(group.id).await?;
        let valid_positions = positions.len() == 1
            && positions
                .iter()
                .all(|p| p.position >= 1 && p.position as u64 <= group_size);
        let customer_ids: BTreeSet<CustomerId> = positions.iter().map(|p| p.customer_id).collect();
        let valid_customers = customer_ids.len() == positions.len();

        if valid_positions && valid_customers {
            Ok(())
        } else {
            Err(tracker.halt(INVALID_POSITION_ERROR))
        }
    }

    async fn rename(
        tx: &mut dyn CustomerTransaction,
        group: &mut CustomerGroup,
        name: Option<&str>,
        tracker: &mut ErrorTracker,
    ) -> StepResult {
        let Some(name) = name.filter(|n| !n.trim().is_empty()) else {
            return Ok(());
        };
        group.name = name.to_string();
        save_group(tx, group, SaveMode::Update, tracker).await?;
        Ok(())
    }

    async fn remove_customers(
        tx: &mut dyn CustomerTransaction,
        group: &CustomerGroup,
        customer_ids: &[CustomerId],
        tracker: &mut ErrorTracker,
    ) -> StepResult {
        let customers: Vec<_> = tx
            .find_customers(customer_ids)
            .await?
            .into_iter()
            .filter(|c| c.group_id == group.id)
            .collect();
        if customers.is_empty() {
            return Ok(());
        }

        let default_group = DefaultGroup::resolve(tx).await?;
        let vacated: BTreeSet<CustomerGroupId> = customers.iter().map(|c| c.group_id).collect();

        reassign_customers(tx, customers, default_group.id(), tracker).await?;
        PositionResetter::reset(tx, vacated, tracker).await?;
        Ok(())
    }

    async fn add_customers(
        tx: &mut dyn CustomerTransaction,
        group: &CustomerGroup,
        customer_ids: &[CustomerId],
        tracker: &mut ErrorTracker,
    ) -> StepResult {
        let customers: Vec<_> = tx
            .find_customers(customer_ids)
            .await?
            .into_iter()
            .filter(|c| c.group_id != group.id)
            .collect();
        if customers.is_empty() {
            return Ok(());
        }

        let vacated: BTreeSet<CustomerGroupId> = customers.iter().map(|c| c.group_id).collect();

        reassign_customers(tx, customers, group.id, tracker).await?;
        PositionResetter::reset(tx, vacated, tracker).await?;
        Ok(())
    }

    /// Moves the requested customer; customers outside the group are left alone
    async fn apply_position(
        tx: &mut dyn CustomerTransaction,
        group: &CustomerGroup,
        positions: &[CustomerPosition],
        tracker: &mut ErrorTracker,
    ) -> StepResult {
        for requested in positions {
            let Some(customer) = tx.find_customer(requested.customer_id).await? else {
                continue;
            };
            if customer.group_id != group.id {
                continue;
            }
            PositionResetter::move_to(tx, &customer, requested.position, tracker).await?;
        }
        Ok(())
    }
}
