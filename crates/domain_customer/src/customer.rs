//! Customer entity
//!
//! A customer always belongs to exactly one customer group and holds a
//! 1-based position inside that group. Withheld customers are soft-removed:
//! they stay in their group but are ranked in a separate sequence.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{CustomerGroupId, CustomerId};

/// The independent position sequences kept inside every group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    /// Customers that are not withheld
    Active,
    /// Soft-removed customers
    Withheld,
}

impl Partition {
    /// Both partitions, in the order they are renumbered
    pub const ALL: [Partition; 2] = [Partition::Active, Partition::Withheld];

    /// Maps the withheld flag to its partition
    pub fn from_withheld(withheld: bool) -> Self {
        if withheld {
            Partition::Withheld
        } else {
            Partition::Active
        }
    }

    /// Returns true for the withheld partition
    pub fn is_withheld(&self) -> bool {
        matches!(self, Partition::Withheld)
    }
}

/// A customer and its group membership
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    /// Owning group; always references an existing group
    pub group_id: CustomerGroupId,
    pub name: String,
    pub email: Option<String>,
    pub mobile_no: String,
    pub address: Option<String>,
    /// Outstanding amount owed by the customer
    pub due_amount: Decimal,
    pub is_active: bool,
    /// Soft-removal marker, distinct from deletion
    pub withheld: bool,
    /// 1-based rank within the group and partition
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Builds a customer from creation attributes inside the given group
    ///
    /// The position is left at 0; it is assigned when the customer is
    /// appended to its partition.
    pub fn new(attributes: NewCustomer, group_id: CustomerGroupId) -> Self {
        let now = Utc::now();
        Self {
            id: CustomerId::new(),
            group_id,
            name: attributes.name,
            email: attributes.email,
            mobile_no: attributes.mobile_no,
            address: attributes.address,
            due_amount: attributes.due_amount.unwrap_or(Decimal::ZERO),
            is_active: attributes.is_active.unwrap_or(true),
            withheld: attributes.withheld,
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the position sequence this customer is ranked in
    pub fn partition(&self) -> Partition {
        Partition::from_withheld(self.withheld)
    }
}

/// Attributes for creating a customer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub mobile_no: String,
    pub address: Option<String>,
    pub due_amount: Option<Decimal>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub withheld: bool,
    /// Candidate group; replaced by the default group when it does not exist
    pub group_id: Option<CustomerGroupId>,
}

impl NewCustomer {
    /// Creates attributes with the two required fields
    pub fn new(name: impl Into<String>, mobile_no: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mobile_no: mobile_no.into(),
            ..Default::default()
        }
    }

    /// Sets the candidate group
    pub fn in_group(mut self, group_id: CustomerGroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }
}

/// Attribute edits for an existing customer
///
/// `None` means "leave unchanged", never "clear the field".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile_no: Option<String>,
    pub address: Option<String>,
    pub due_amount: Option<Decimal>,
    pub is_active: Option<bool>,
    pub withheld: Option<bool>,
    pub group_id: Option<CustomerGroupId>,
}

impl CustomerChanges {
    /// Applies every present attribute except the group, which the update
    /// operation resolves separately
    pub fn apply_attributes(&self, customer: &mut Customer) {
        if let Some(name) = &self.name {
            customer.name = name.clone();
        }
        if let Some(email) = &self.email {
            customer.email = Some(email.clone());
        }
        if let Some(mobile_no) = &self.mobile_no {
            customer.mobile_no = mobile_no.clone();
        }
        if let Some(address) = &self.address {
            customer.address = Some(address.clone());
        }
        if let Some(due_amount) = self.due_amount {
            customer.due_amount = due_amount;
        }
        if let Some(is_active) = self.is_active {
            customer.is_active = is_active;
        }
        if let Some(withheld) = self.withheld {
            customer.withheld = withheld;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_customer_defaults() {
        let group_id = CustomerGroupId::new();
        let customer = Customer::new(NewCustomer::new("Asha Rao", "9800000001"), group_id);

        assert_eq!(customer.group_id, group_id);
        assert!(customer.is_active);
        assert!(!customer.withheld);
        assert_eq!(customer.due_amount, Decimal::ZERO);
        assert_eq!(customer.partition(), Partition::Active);
    }

    #[test]
    fn test_changes_leave_missing_fields_untouched() {
        let mut customer = Customer::new(
            NewCustomer {
                email: Some("asha@example.com".to_string()),
                ..NewCustomer::new("Asha Rao", "9800000001")
            },
            CustomerGroupId::new(),
        );

        CustomerChanges {
            address: Some("12 Hill Road".to_string()),
            withheld: Some(true),
            ..Default::default()
        }
        .apply_attributes(&mut customer);

        assert_eq!(customer.email.as_deref(), Some("asha@example.com"));
        assert_eq!(customer.address.as_deref(), Some("12 Hill Road"));
        assert_eq!(customer.partition(), Partition::Withheld);
    }
}
