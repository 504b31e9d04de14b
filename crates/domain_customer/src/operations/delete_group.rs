//! Group deletion with member migration to the default group

use std::sync::Arc;

use tracing::{debug, instrument};

use core_kernel::CustomerGroupId;

use crate::error::CustomerError;
use crate::group::{CustomerGroup, DefaultGroup};
use crate::outcome::{OperationOutcome, StepError, StepResult};
use crate::ports::{CustomerStore, CustomerTransaction};
use crate::tracker::ErrorTracker;

use super::positions::PositionResetter;
use super::records::{save_customer, SaveMode};
use super::finish;

/// Message recorded when the store reports nothing was deleted
pub const GROUP_DELETE_FAILED_ERROR: &str = "Customer group could not be deleted";

/// Deletes a non-default group after moving its customers to the default group
pub struct GroupDeleteOperation {
    store: Arc<dyn CustomerStore>,
}

impl GroupDeleteOperation {
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        group_id: CustomerGroupId,
    ) -> Result<OperationOutcome<CustomerGroup>, CustomerError> {
        let mut tracker = ErrorTracker::new("customer_group_delete");
        self.execute_with_tracker(group_id, &mut tracker).await
    }

    /// Deletes the group
    ///
    /// Withheld customers move with one bulk write that skips validation;
    /// the others move through validated saves and the first failure stops
    /// the deletion. The default group is renumbered before the group row is
    /// removed.
    #[instrument(skip(self, tracker), fields(group_id = %group_id))]
    pub async fn execute_with_tracker(
        &self,
        group_id: CustomerGroupId,
        tracker: &mut ErrorTracker,
    ) -> Result<OperationOutcome<CustomerGroup>, CustomerError> {
        let mut tx = self.store.begin().await?;
        let step = Self::apply(tx.as_mut(), group_id, tracker).await;
        finish(tx, step, tracker, "customer_group_delete").await
    }

    async fn apply(
        tx: &mut dyn CustomerTransaction,
        group_id: CustomerGroupId,
        tracker: &mut ErrorTracker,
    ) -> StepResult<CustomerGroup> {
        let group = tx
            .find_group(group_id)
            .await?
            .ok_or(CustomerError::GroupNotFound(group_id))?;

        let refusals = group.deletion_errors();
        if !refusals.is_empty() {
            return Err(tracker.halt(refusals));
        }

        let default_group = DefaultGroup::resolve(tx).await?;
        Self::migrate_customers(tx, &group, &default_group, tracker).await?;
        PositionResetter::reset(tx, [default_group.id()], tracker).await?;

        if !tx.delete_group(group.id).await? {
            tracker.add(GROUP_DELETE_FAILED_ERROR);
        }
        tracker.checkpoint()?;

        Ok(group)
    }

    async fn migrate_customers(
        tx: &mut dyn CustomerTransaction,
        group: &CustomerGroup,
        default_group: &DefaultGroup,
        tracker: &mut ErrorTracker,
    ) -> StepResult {
        let withheld = tx.reassign_withheld(group.id, default_group.id()).await?;
        debug!(withheld, "withheld customers moved to the default group");

        let active = tx
            .customers_in_group(group.id)
            .await?
            .into_iter()
            .filter(|c| !c.withheld);
        for mut customer in active {
            customer.group_id = default_group.id();
            customer.position = tx.next_position(default_group.id(), customer.partition()).await?;
            if !save_customer(tx, &mut customer, SaveMode::Update, tracker).await? {
                return Err(StepError::Halted);
            }
        }
        Ok(())
    }
}
