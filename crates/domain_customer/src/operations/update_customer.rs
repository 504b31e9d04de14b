//! Customer attribute and membership edits

use std::sync::Arc;

use tracing::{debug, instrument};

use core_kernel::{CustomerGroupId, CustomerId};

use crate::customer::{Customer, CustomerChanges};
use crate::error::CustomerError;
use crate::group::DefaultGroup;
use crate::outcome::{OperationOutcome, StepError, StepResult};
use crate::ports::{CustomerStore, CustomerTransaction};
use crate::tracker::ErrorTracker;

use super::positions::PositionResetter;
use super::records::{save_customer, SaveMode};
use super::finish;

/// Updates a customer and keeps the group it left densely numbered
pub struct CustomerUpdateOperation {
    store: Arc<dyn CustomerStore>,
}

impl CustomerUpdateOperation {
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        customer_id: CustomerId,
        changes: CustomerChanges,
    ) -> Result<OperationOutcome<Customer>, CustomerError> {
        let mut tracker = ErrorTracker::new("customer_update");
        self.execute_with_tracker(customer_id, changes, &mut tracker).await
    }

    /// Updates the customer
    ///
    /// A requested group that does not exist is ignored and the customer
    /// keeps its group. When the group or the withheld flag changes, the
    /// customer is appended to its new partition and the previous group is
    /// renumbered after the save.
    #[instrument(skip(self, changes, tracker), fields(customer_id = %customer_id))]
    pub async fn execute_with_tracker(
        &self,
        customer_id: CustomerId,
        changes: CustomerChanges,
        tracker: &mut ErrorTracker,
    ) -> Result<OperationOutcome<Customer>, CustomerError> {
        let mut tx = self.store.begin().await?;
        let step = Self::apply(tx.as_mut(), customer_id, changes, tracker).await;
        finish(tx, step, tracker, "customer_update").await
    }

    async fn apply(
        tx: &mut dyn CustomerTransaction,
        customer_id: CustomerId,
        changes: CustomerChanges,
        tracker: &mut ErrorTracker,
    ) -> StepResult<Customer> {
        let mut customer = tx
            .find_customer(customer_id)
            .await?
            .ok_or(CustomerError::CustomerNotFound(customer_id))?;
        let previous_group = customer.group_id;
        let previous_partition = customer.partition();

        customer.group_id = Self::resolve_group(tx, &customer, changes.group_id).await?;
        changes.apply_attributes(&mut customer);

        let moved = customer.group_id != previous_group || customer.partition() != previous_partition;
        if moved {
            customer.position = tx.next_position(customer.group_id, customer.partition()).await?;
        }

        if !save_customer(tx, &mut customer, SaveMode::Update, tracker).await? {
            return Err(StepError::Halted);
        }

        if moved {
            PositionResetter::reset(tx, [previous_group], tracker).await?;
        }
        tracker.checkpoint()?;

        Ok(customer)
    }

    /// Picks the group the customer ends up in
    ///
    /// An unknown requested group keeps the current one; a customer whose
    /// current group is gone as well lands in the default group.
    async fn resolve_group(
        tx: &mut dyn CustomerTransaction,
        customer: &Customer,
        requested: Option<CustomerGroupId>,
    ) -> Result<CustomerGroupId, CustomerError> {
        if let Some(id) = requested {
            if tx.group_exists(id).await? {
                return Ok(id);
            }
            debug!(requested = %id, "ignoring unknown group");
        }
        if tx.group_exists(customer.group_id).await? {
            return Ok(customer.group_id);
        }
        Ok(DefaultGroup::resolve(tx).await?.id())
    }
}
