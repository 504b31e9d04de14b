//! Group creation with an initial set of members

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::instrument;

use core_kernel::{CustomerGroupId, CustomerId};

use crate::error::CustomerError;
use crate::group::{CustomerGroup, NewCustomerGroup};
use crate::outcome::{OperationOutcome, StepError, StepResult};
use crate::ports::{CustomerStore, CustomerTransaction};
use crate::tracker::ErrorTracker;

use super::positions::PositionResetter;
use super::records::{reassign_customers, save_group, SaveMode};
use super::finish;

/// Message recorded when a listed customer cannot be moved into the new group
pub const ASSIGN_CUSTOMERS_ERROR: &str = "Unable to assign customer to customer group.";

/// Creates a group and moves an initial customer set into it
pub struct GroupCreateOperation {
    store: Arc<dyn CustomerStore>,
}

impl GroupCreateOperation {
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self { store }
    }

    /// Creates the group with a fresh tracker
    pub async fn execute(
        &self,
        attributes: NewCustomerGroup,
        customer_ids: Vec<CustomerId>,
    ) -> Result<OperationOutcome<CustomerGroup>, CustomerError> {
        let mut tracker = ErrorTracker::new("customer_group_create");
        self.execute_with_tracker(attributes, customer_ids, &mut tracker).await
    }

    /// Creates the group, recording failures in the caller's tracker
    ///
    /// The group is persisted first; a validation failure aborts before any
    /// customer moves. The listed customers are then moved in, and both the
    /// groups they vacated and the new group are renumbered.
    #[instrument(skip(self, attributes, customer_ids, tracker), fields(customers = customer_ids.len()))]
    pub async fn execute_with_tracker(
        &self,
        attributes: NewCustomerGroup,
        customer_ids: Vec<CustomerId>,
        tracker: &mut ErrorTracker,
    ) -> Result<OperationOutcome<CustomerGroup>, CustomerError> {
        let mut tx = self.store.begin().await?;
        let step = Self::apply(tx.as_mut(), attributes, &customer_ids, tracker).await;
        finish(tx, step, tracker, "customer_group_create").await
    }

    async fn apply(
        tx: &mut dyn CustomerTransaction,
        attributes: NewCustomerGroup,
        customer_ids: &[CustomerId],
        tracker: &mut ErrorTracker,
    ) -> StepResult<CustomerGroup> {
        let mut group = CustomerGroup::new(attributes.name);
        if !save_group(tx, &mut group, SaveMode::Insert, tracker).await? {
            return Err(StepError::Halted);
        }

        let customers = tx.find_customers(customer_ids).await?;
        let vacated: BTreeSet<CustomerGroupId> = customers.iter().map(|c| c.group_id).collect();

        if reassign_customers(tx, customers, group.id, tracker).await? > 0 {
            tracker.add(ASSIGN_CUSTOMERS_ERROR);
        }

        PositionResetter::reset(tx, vacated, tracker).await?;
        PositionResetter::reset(tx, [group.id], tracker).await?;

        tracker.checkpoint()?;
        Ok(group)
    }
}
