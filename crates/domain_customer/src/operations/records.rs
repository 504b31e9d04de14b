//! Validated saves shared by the operations
//!
//! A save normalises the record, runs the attribute rules and the
//! uniqueness lookups, and only then writes. Validation failures are
//! recorded in the tracker and reported as `Ok(false)`; the caller decides
//! whether its step halts.

use chrono::Utc;

use core_kernel::{CustomerGroupId, PortError};

use crate::customer::Customer;
use crate::group::CustomerGroup;
use crate::ports::CustomerTransaction;
use crate::tracker::ErrorTracker;
use crate::validation::{
    CustomerValidator, GroupValidator, CUSTOMER_NAME_TAKEN, GROUP_NAME_TAKEN, MOBILE_NO_TAKEN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SaveMode {
    Insert,
    Update,
}

pub(crate) async fn save_group(
    tx: &mut dyn CustomerTransaction,
    group: &mut CustomerGroup,
    mode: SaveMode,
    tracker: &mut ErrorTracker,
) -> Result<bool, PortError> {
    GroupValidator::normalize(group);
    let mut result = GroupValidator::validate(group);
    if !group.name.is_empty() && tx.group_name_taken(&group.name, group.id).await? {
        result.add_error(GROUP_NAME_TAKEN);
    }
    if !result.is_valid {
        tracker.add(result.errors);
        return Ok(false);
    }

    group.updated_at = Utc::now();
    match mode {
        SaveMode::Insert => tx.insert_group(group).await?,
        SaveMode::Update => tx.update_group(group).await?,
    }
    Ok(true)
}

pub(crate) async fn save_customer(
    tx: &mut dyn CustomerTransaction,
    customer: &mut Customer,
    mode: SaveMode,
    tracker: &mut ErrorTracker,
) -> Result<bool, PortError> {
    CustomerValidator::normalize(customer);
    let mut result = CustomerValidator::validate(customer);
    if !customer.name.is_empty() && tx.customer_name_taken(&customer.name, customer.id).await? {
        result.add_error(CUSTOMER_NAME_TAKEN);
    }
    if !customer.mobile_no.is_empty() && tx.mobile_no_taken(&customer.mobile_no, customer.id).await? {
        result.add_error(MOBILE_NO_TAKEN);
    }
    if !result.is_valid {
        tracker.add(result.errors);
        return Ok(false);
    }

    customer.updated_at = Utc::now();
    match mode {
        SaveMode::Insert => tx.insert_customer(customer).await?,
        SaveMode::Update => tx.update_customer(customer).await?,
    }
    Ok(true)
}

/// Moves customers into `target` through validated saves
///
/// Each moved customer is appended to the end of its partition in the new
/// group. Customers already in `target` are left alone. Returns how many
/// saves failed validation.
pub(crate) async fn reassign_customers(
    tx: &mut dyn CustomerTransaction,
    customers: Vec<Customer>,
    target: CustomerGroupId,
    tracker: &mut ErrorTracker,
) -> Result<usize, PortError> {
    let mut failures = 0;
    for mut customer in customers {
        if customer.group_id == target {
            continue;
        }
        customer.group_id = target;
        customer.position = tx.next_position(target, customer.partition()).await?;
        if !save_customer(tx, &mut customer, SaveMode::Update, tracker).await? {
            failures += 1;
        }
    }
    Ok(failures)
}
