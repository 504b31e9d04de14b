//! Customer deletion

use std::sync::Arc;

use tracing::instrument;

use core_kernel::CustomerId;

use crate::customer::Customer;
use crate::error::CustomerError;
use crate::group::DefaultGroup;
use crate::outcome::{OperationOutcome, StepResult};
use crate::ports::{CustomerStore, CustomerTransaction};
use crate::tracker::ErrorTracker;

use super::positions::PositionResetter;
use super::finish;

/// Message recorded when the store reports nothing was deleted
pub const CUSTOMER_DELETE_FAILED_ERROR: &str = "Customer could not be deleted";

/// Deletes a customer and renumbers the group it was in
pub struct CustomerDeleteOperation {
    store: Arc<dyn CustomerStore>,
}

impl CustomerDeleteOperation {
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, customer_id: CustomerId) -> Result<OperationOutcome<Customer>, CustomerError> {
        let mut tracker = ErrorTracker::new("customer_delete");
        self.execute_with_tracker(customer_id, &mut tracker).await
    }

    /// Deletes the customer
    ///
    /// The returned record carries the default group id it was reassigned to
    /// just before deletion.
    #[instrument(skip(self, tracker), fields(customer_id = %customer_id))]
    pub async fn execute_with_tracker(
        &self,
        customer_id: CustomerId,
        tracker: &mut ErrorTracker,
    ) -> Result<OperationOutcome<Customer>, CustomerError> {
        let mut tx = self.store.begin().await?;
        let step = Self::apply(tx.as_mut(), customer_id, tracker).await;
        finish(tx, step, tracker, "customer_delete").await
    }

    async fn apply(
        tx: &mut dyn CustomerTransaction,
        customer_id: CustomerId,
        tracker: &mut ErrorTracker,
    ) -> StepResult<Customer> {
        let mut customer = tx
            .find_customer(customer_id)
            .await?
            .ok_or(CustomerError::CustomerNotFound(customer_id))?;
        let previous_group = customer.group_id;

        customer.group_id = DefaultGroup::resolve(tx).await?.id();

        if !tx.delete_customer(customer.id).await? {
            return Err(tracker.halt(CUSTOMER_DELETE_FAILED_ERROR));
        }

        PositionResetter::reset(tx, [previous_group], tracker).await?;
        tracker.checkpoint()?;

        Ok(customer)
    }
}
