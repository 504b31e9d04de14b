//! Customer group entity and edit requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CustomerGroupId, CustomerId};
use crate::error::CustomerError;
use crate::ports::CustomerTransaction;

/// A named collection of customers
///
/// Exactly one group in the system carries `is_default`. Groups are only
/// ever created without the flag; the default group is established by the
/// initial setup and can never be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerGroup {
    pub id: CustomerGroupId,
    /// Unique (case-insensitive) name, 3 to 50 characters
    pub name: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CustomerGroup {
    /// Creates a non-default group
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CustomerGroupId::new(),
            name: name.into(),
            is_default: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates the default group; used by initial setup only
    pub fn new_default(name: impl Into<String>) -> Self {
        Self {
            is_default: true,
            ..Self::new(name)
        }
    }

    /// Returns the reasons this group may not be deleted
    pub fn deletion_errors(&self) -> Vec<String> {
        if self.is_default {
            vec![DEFAULT_GROUP_DELETE_ERROR.to_string()]
        } else {
            Vec::new()
        }
    }
}

/// Message reported when deleting the default group is attempted
pub const DEFAULT_GROUP_DELETE_ERROR: &str = "cannot delete the default group";

/// Attributes for creating a group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCustomerGroup {
    pub name: String,
}

impl NewCustomerGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A requested rank for one customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerPosition {
    pub customer_id: CustomerId,
    pub position: i32,
}

impl CustomerPosition {
    pub fn new(customer_id: CustomerId, position: i32) -> Self {
        Self { customer_id, position }
    }
}

/// Combined edit applied to an existing group in one transaction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupEdit {
    /// New name; ignored when absent or blank
    pub name: Option<String>,
    /// Customers to move into the group
    #[serde(default)]
    pub add_customer_ids: Vec<CustomerId>,
    /// Customers to move out of the group, into the default group
    #[serde(default)]
    pub remove_customer_ids: Vec<CustomerId>,
    /// Repositioning request; only a single entry is accepted
    #[serde(default)]
    pub positions: Vec<CustomerPosition>,
}

impl GroupEdit {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn add(mut self, customer_ids: impl IntoIterator<Item = CustomerId>) -> Self {
        self.add_customer_ids.extend(customer_ids);
        self
    }

    pub fn remove(mut self, customer_ids: impl IntoIterator<Item = CustomerId>) -> Self {
        self.remove_customer_ids.extend(customer_ids);
        self
    }

    pub fn reposition(mut self, customer_id: CustomerId, position: i32) -> Self {
        self.positions.push(CustomerPosition::new(customer_id, position));
        self
    }
}

/// The single group flagged as default, resolved inside a transaction
///
/// Operations resolve it explicitly instead of consulting ambient state, and
/// refuse to guess when the flag is missing or duplicated.
#[derive(Debug, Clone)]
pub struct DefaultGroup(CustomerGroup);

impl DefaultGroup {
    /// Looks up the default group
    ///
    /// # Errors
    ///
    /// * `CustomerError::DefaultGroupMissing` - no group carries the flag
    /// * `CustomerError::AmbiguousDefaultGroup` - several groups carry it
    pub async fn resolve(tx: &mut dyn CustomerTransaction) -> Result<Self, CustomerError> {
        let mut groups = tx.default_groups().await?;
        match groups.len() {
            0 => Err(CustomerError::DefaultGroupMissing),
            1 => Ok(Self(groups.remove(0))),
            count => Err(CustomerError::AmbiguousDefaultGroup(count)),
        }
    }

    pub fn id(&self) -> CustomerGroupId {
        self.0.id
    }

    pub fn group(&self) -> &CustomerGroup {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_group_is_not_default() {
        let group = CustomerGroup::new("Morning Route");
        assert!(!group.is_default);
        assert!(group.deletion_errors().is_empty());
    }

    #[test]
    fn test_default_group_refuses_deletion() {
        let group = CustomerGroup::new_default("General");
        assert_eq!(group.deletion_errors(), vec![DEFAULT_GROUP_DELETE_ERROR.to_string()]);
    }

    #[test]
    fn test_group_edit_builder() {
        let added = CustomerId::new();
        let edit = GroupEdit::rename("Evening").add([added]).reposition(added, 1);

        assert_eq!(edit.name.as_deref(), Some("Evening"));
        assert_eq!(edit.add_customer_ids, vec![added]);
        assert_eq!(edit.positions, vec![CustomerPosition::new(added, 1)]);
        assert!(edit.remove_customer_ids.is_empty());
    }
}
