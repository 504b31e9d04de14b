//! Customer creation

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::customer::{Customer, NewCustomer};
use crate::error::CustomerError;
use crate::group::DefaultGroup;
use crate::outcome::{OperationOutcome, StepError, StepResult};
use crate::ports::{CustomerStore, CustomerTransaction};
use crate::tracker::ErrorTracker;

use super::records::{save_customer, SaveMode};
use super::finish;

/// Creates a customer, falling back to the default group
pub struct CustomerCreateOperation {
    store: Arc<dyn CustomerStore>,
}

impl CustomerCreateOperation {
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, attributes: NewCustomer) -> Result<OperationOutcome<Customer>, CustomerError> {
        let mut tracker = ErrorTracker::new("customer_create");
        self.execute_with_tracker(attributes, &mut tracker).await
    }

    /// Creates the customer
    ///
    /// A candidate group that does not exist is replaced by the default
    /// group. The customer is appended to the end of its partition.
    #[instrument(skip(self, attributes, tracker))]
    pub async fn execute_with_tracker(
        &self,
        attributes: NewCustomer,
        tracker: &mut ErrorTracker,
    ) -> Result<OperationOutcome<Customer>, CustomerError> {
        let mut tx = self.store.begin().await?;
        let step = Self::apply(tx.as_mut(), attributes, tracker).await;
        finish(tx, step, tracker, "customer_create").await
    }

    async fn apply(
        tx: &mut dyn CustomerTransaction,
        attributes: NewCustomer,
        tracker: &mut ErrorTracker,
    ) -> StepResult<Customer> {
        let existing = match attributes.group_id {
            Some(id) => tx.group_exists(id).await?.then_some(id),
            None => None,
        };
        let group_id = match existing {
            Some(id) => id,
            None => {
                let default_group = DefaultGroup::resolve(tx).await?;
                debug!(requested = ?attributes.group_id, default_group = %default_group.id(), "using the default group");
                default_group.id()
            }
        };

        let mut customer = Customer::new(attributes, group_id);
        customer.position = tx.next_position(group_id, customer.partition()).await?;
        if !save_customer(tx, &mut customer, SaveMode::Insert, tracker).await? {
            return Err(StepError::Halted);
        }
        Ok(customer)
    }
}
