//! Test Data Builders
//!
//! Builders fill every field with valid, unique values so tests only state
//! what they care about.

use chrono::Utc;
use rust_decimal::Decimal;

use core_kernel::{CustomerGroupId, CustomerId};
use domain_customer::{Customer, CustomerGroup, InMemoryCustomerStore};

use crate::fixtures::{CustomerFixtures, GroupFixtures};

/// Builder for customers
pub struct TestCustomerBuilder {
    id: CustomerId,
    group_id: CustomerGroupId,
    name: String,
    email: Option<String>,
    mobile_no: String,
    address: Option<String>,
    due_amount: Decimal,
    is_active: bool,
    withheld: bool,
    position: i32,
}

impl Default for TestCustomerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCustomerBuilder {
    pub fn new() -> Self {
        Self {
            id: CustomerId::new(),
            group_id: CustomerGroupId::new(),
            name: CustomerFixtures::name(),
            email: None,
            mobile_no: CustomerFixtures::mobile_no(),
            address: Some(CustomerFixtures::address()),
            due_amount: Decimal::ZERO,
            is_active: true,
            withheld: false,
            position: 1,
        }
    }

    pub fn with_id(mut self, id: CustomerId) -> Self {
        self.id = id;
        self
    }

    pub fn in_group(mut self, group_id: CustomerGroupId) -> Self {
        self.group_id = group_id;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_mobile_no(mut self, mobile_no: impl Into<String>) -> Self {
        self.mobile_no = mobile_no.into();
        self
    }

    pub fn with_due_amount(mut self, due_amount: Decimal) -> Self {
        self.due_amount = due_amount;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Places the customer in the withheld partition
    pub fn withheld(mut self) -> Self {
        self.withheld = true;
        self
    }

    pub fn at_position(mut self, position: i32) -> Self {
        self.position = position;
        self
    }

    pub fn build(self) -> Customer {
        let now = Utc::now();
        Customer {
            id: self.id,
            group_id: self.group_id,
            name: self.name,
            email: self.email,
            mobile_no: self.mobile_no,
            address: self.address,
            due_amount: self.due_amount,
            is_active: self.is_active,
            withheld: self.withheld,
            position: self.position,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builds the customer and seeds it into `store`
    pub async fn seed(self, store: &InMemoryCustomerStore) -> Customer {
        let customer = self.build();
        store.seed_customer(customer.clone()).await;
        customer
    }
}

/// Builder for customer groups
pub struct TestGroupBuilder {
    id: CustomerGroupId,
    name: String,
    is_default: bool,
}

impl Default for TestGroupBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestGroupBuilder {
    pub fn new() -> Self {
        Self {
            id: CustomerGroupId::new(),
            name: GroupFixtures::name(),
            is_default: false,
        }
    }

    pub fn with_id(mut self, id: CustomerGroupId) -> Self {
        self.id = id;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Flags the group as the default group
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn build(self) -> CustomerGroup {
        let now = Utc::now();
        CustomerGroup {
            id: self.id,
            name: self.name,
            is_default: self.is_default,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builds the group and seeds it into `store`
    pub async fn seed(self, store: &InMemoryCustomerStore) -> CustomerGroup {
        let group = self.build();
        store.seed_group(group.clone()).await;
        group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_customer_builder_overrides() {
        let group_id = CustomerGroupId::new();
        let customer = TestCustomerBuilder::new()
            .in_group(group_id)
            .with_due_amount(dec!(40.25))
            .withheld()
            .at_position(3)
            .build();

        assert_eq!(customer.group_id, group_id);
        assert_eq!(customer.due_amount, dec!(40.25));
        assert!(customer.withheld);
        assert_eq!(customer.position, 3);
    }

    #[tokio::test]
    async fn test_group_builder_seeds_store() {
        let store = InMemoryCustomerStore::new();
        let group = TestGroupBuilder::new().as_default().seed(&store).await;

        let state = store.snapshot().await;
        assert!(state.groups[&group.id].is_default);
    }
}
