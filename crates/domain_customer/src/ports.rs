//! Customer Domain Ports
//!
//! This module defines the store interface the operations run against.
//!
//! # Architecture
//!
//! A [`CustomerStore`] hands out [`CustomerTransaction`]s. Every operation
//! performs all of its reads and writes through one transaction and ends it
//! with exactly one `commit` or `rollback`. Adapters:
//!
//! - **PostgreSQL**: `infra_db::adapters::PostgresCustomerStore`
//! - **In-memory**: [`mock::InMemoryCustomerStore`], for tests
//!
//! # Write kinds
//!
//! `insert_*`/`update_*` persist records the operations have already
//! validated. `write_position` and `reassign_withheld` are direct field
//! writes used for structural repair; they never trigger validation.

use async_trait::async_trait;
use rust_decimal::Decimal;

use core_kernel::{CustomerGroupId, CustomerId, DomainPort, HealthCheckable, PortError};

use crate::customer::{Customer, Partition};
use crate::group::CustomerGroup;

/// Entry point to the transactional store
#[async_trait]
pub trait CustomerStore: DomainPort + HealthCheckable {
    /// Opens a new transaction
    async fn begin(&self) -> Result<Box<dyn CustomerTransaction>, PortError>;
}

/// One atomic unit of work against the store
///
/// Dropping a transaction without committing discards its writes.
#[async_trait]
pub trait CustomerTransaction: Send {
    // ========================================================================
    // Groups
    // ========================================================================

    async fn find_group(&mut self, id: CustomerGroupId) -> Result<Option<CustomerGroup>, PortError>;

    /// Returns every group flagged as default
    async fn default_groups(&mut self) -> Result<Vec<CustomerGroup>, PortError>;

    async fn group_exists(&mut self, id: CustomerGroupId) -> Result<bool, PortError> {
        Ok(self.find_group(id).await?.is_some())
    }

    /// Case-insensitive name lookup, ignoring the group `except`
    async fn group_name_taken(
        &mut self,
        name: &str,
        except: CustomerGroupId,
    ) -> Result<bool, PortError>;

    async fn insert_group(&mut self, group: &CustomerGroup) -> Result<(), PortError>;

    async fn update_group(&mut self, group: &CustomerGroup) -> Result<(), PortError>;

    /// Deletes a group, returning false when it did not exist
    async fn delete_group(&mut self, id: CustomerGroupId) -> Result<bool, PortError>;

    // ========================================================================
    // Customers
    // ========================================================================

    async fn find_customer(&mut self, id: CustomerId) -> Result<Option<Customer>, PortError>;

    /// Loads the existing customers among `ids`, ordered by id
    async fn find_customers(&mut self, ids: &[CustomerId]) -> Result<Vec<Customer>, PortError>;

    /// Loads every customer of a group, both partitions, ordered by id
    async fn customers_in_group(&mut self, group_id: CustomerGroupId) -> Result<Vec<Customer>, PortError>;

    /// Loads one partition of a group ordered by (position, id)
    async fn customers_in_partition(
        &mut self,
        group_id: CustomerGroupId,
        partition: Partition,
    ) -> Result<Vec<Customer>, PortError>;

    /// Counts every customer of a group, both partitions
    async fn count_in_group(&mut self, group_id: CustomerGroupId) -> Result<u64, PortError>;

    /// Position a customer appended to the partition receives
    async fn next_position(
        &mut self,
        group_id: CustomerGroupId,
        partition: Partition,
    ) -> Result<i32, PortError>;

    /// Case-insensitive name lookup, ignoring the customer `except`
    async fn customer_name_taken(&mut self, name: &str, except: CustomerId) -> Result<bool, PortError>;

    /// Case-insensitive mobile number lookup, ignoring the customer `except`
    async fn mobile_no_taken(&mut self, mobile_no: &str, except: CustomerId) -> Result<bool, PortError>;

    async fn insert_customer(&mut self, customer: &Customer) -> Result<(), PortError>;

    async fn update_customer(&mut self, customer: &Customer) -> Result<(), PortError>;

    /// Writes only the position column of one customer
    async fn write_position(&mut self, id: CustomerId, position: i32) -> Result<(), PortError>;

    /// Moves every withheld customer of `from` into `to` with one bulk write
    async fn reassign_withheld(
        &mut self,
        from: CustomerGroupId,
        to: CustomerGroupId,
    ) -> Result<u64, PortError>;

    /// Deletes a customer, returning false when it did not exist
    async fn delete_customer(&mut self, id: CustomerId) -> Result<bool, PortError>;

    /// Sums the due amount of a group's customers
    async fn total_due_amount(&mut self, group_id: CustomerGroupId) -> Result<Decimal, PortError>;

    // ========================================================================
    // Completion
    // ========================================================================

    async fn commit(self: Box<Self>) -> Result<(), PortError>;

    async fn rollback(self: Box<Self>) -> Result<(), PortError>;
}

/// Read helpers that run in their own short transaction
#[async_trait]
pub trait CustomerStoreExt: CustomerStore {
    /// Loads a group
    async fn load_group(&self, id: CustomerGroupId) -> Result<Option<CustomerGroup>, PortError> {
        let mut tx = self.begin().await?;
        let group = tx.find_group(id).await?;
        tx.commit().await?;
        Ok(group)
    }

    /// Loads a customer
    async fn load_customer(&self, id: CustomerId) -> Result<Option<Customer>, PortError> {
        let mut tx = self.begin().await?;
        let customer = tx.find_customer(id).await?;
        tx.commit().await?;
        Ok(customer)
    }

    /// Sums the due amount of a group's customers
    async fn group_due_amount(&self, id: CustomerGroupId) -> Result<Decimal, PortError> {
        let mut tx = self.begin().await?;
        let total = tx.total_due_amount(id).await?;
        tx.commit().await?;
        Ok(total)
    }
}

impl<T: CustomerStore + ?Sized> CustomerStoreExt for T {}

/// In-memory implementation of the store for testing
///
/// A transaction takes the store lock for its whole lifetime and works on a
/// copy of the data, which replaces the shared state on commit. Transactions
/// are therefore serialised, like the row locks of the database adapter.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{BTreeMap, HashSet};
    use std::sync::{Arc, Mutex as StdMutex};
    use tokio::sync::{Mutex, OwnedMutexGuard};
    use chrono::Utc;
    use core_kernel::HealthCheckResult;

    /// Data held by the in-memory store
    #[derive(Debug, Clone, Default)]
    pub struct StoreState {
        pub groups: BTreeMap<CustomerGroupId, CustomerGroup>,
        pub customers: BTreeMap<CustomerId, Customer>,
    }

    impl StoreState {
        fn partition(&self, group_id: CustomerGroupId, partition: Partition) -> Vec<Customer> {
            let mut customers: Vec<Customer> = self
                .customers
                .values()
                .filter(|c| c.group_id == group_id && c.partition() == partition)
                .cloned()
                .collect();
            customers.sort_by_key(|c| (c.position, c.id));
            customers
        }
    }

    /// In-memory customer store
    #[derive(Debug, Clone, Default)]
    pub struct InMemoryCustomerStore {
        state: Arc<Mutex<StoreState>>,
        failing_position_writes: Arc<StdMutex<HashSet<CustomerId>>>,
    }

    impl InMemoryCustomerStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Inserts a group without validation
        pub async fn seed_group(&self, group: CustomerGroup) {
            self.state.lock().await.groups.insert(group.id, group);
        }

        /// Inserts a customer without validation
        pub async fn seed_customer(&self, customer: Customer) {
            self.state.lock().await.customers.insert(customer.id, customer);
        }

        /// Returns a copy of the committed data
        pub async fn snapshot(&self) -> StoreState {
            self.state.lock().await.clone()
        }

        /// Makes every later `write_position` for `id` fail
        pub fn fail_position_writes_for(&self, id: CustomerId) {
            if let Ok(mut failing) = self.failing_position_writes.lock() {
                failing.insert(id);
            }
        }
    }

    impl DomainPort for InMemoryCustomerStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryCustomerStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("in-memory-customer-store", 0)
        }
    }

    #[async_trait]
    impl CustomerStore for InMemoryCustomerStore {
        async fn begin(&self) -> Result<Box<dyn CustomerTransaction>, PortError> {
            let guard = self.state.clone().lock_owned().await;
            let working = guard.clone();
            let failing = self
                .failing_position_writes
                .lock()
                .map(|failing| failing.clone())
                .map_err(|_| PortError::internal("failing position write registry poisoned"))?;
            Ok(Box::new(InMemoryTransaction {
                guard,
                working,
                failing_position_writes: failing,
            }))
        }
    }

    struct InMemoryTransaction {
        guard: OwnedMutexGuard<StoreState>,
        working: StoreState,
        failing_position_writes: HashSet<CustomerId>,
    }

    #[async_trait]
    impl CustomerTransaction for InMemoryTransaction {
        async fn find_group(&mut self, id: CustomerGroupId) -> Result<Option<CustomerGroup>, PortError> {
            Ok(self.working.groups.get(&id).cloned())
        }

        async fn default_groups(&mut self) -> Result<Vec<CustomerGroup>, PortError> {
            Ok(self.working.groups.values().filter(|g| g.is_default).cloned().collect())
        }

        async fn group_name_taken(
            &mut self,
            name: &str,
            except: CustomerGroupId,
        ) -> Result<bool, PortError> {
            let name = name.to_lowercase();
            Ok(self
                .working
                .groups
                .values()
                .any(|g| g.id != except && g.name.to_lowercase() == name))
        }

        async fn insert_group(&mut self, group: &CustomerGroup) -> Result<(), PortError> {
            if self.working.groups.contains_key(&group.id) {
                return Err(PortError::conflict(format!("group {} already exists", group.id)));
            }
            self.working.groups.insert(group.id, group.clone());
            Ok(())
        }

        async fn update_group(&mut self, group: &CustomerGroup) -> Result<(), PortError> {
            let stored = self
                .working
                .groups
                .get_mut(&group.id)
                .ok_or_else(|| PortError::not_found("CustomerGroup", group.id))?;
            *stored = group.clone();
            Ok(())
        }

        async fn delete_group(&mut self, id: CustomerGroupId) -> Result<bool, PortError> {
            if self.working.customers.values().any(|c| c.group_id == id) {
                return Err(PortError::conflict(format!("group {} still has customers", id)));
            }
            Ok(self.working.groups.remove(&id).is_some())
        }

        async fn find_customer(&mut self, id: CustomerId) -> Result<Option<Customer>, PortError> {
            Ok(self.working.customers.get(&id).cloned())
        }

        async fn find_customers(&mut self, ids: &[CustomerId]) -> Result<Vec<Customer>, PortError> {
            Ok(self
                .working
                .customers
                .values()
                .filter(|c| ids.contains(&c.id))
                .cloned()
                .collect())
        }

        async fn customers_in_group(&mut self, group_id: CustomerGroupId) -> Result<Vec<Customer>, PortError> {
            Ok(self
                .working
                .customers
                .values()
                .filter(|c| c.group_id == group_id)
                .cloned()
                .collect())
        }

        async fn customers_in_partition(
            &mut self,
            group_id: CustomerGroupId,
            partition: Partition,
        ) -> Result<Vec<Customer>, PortError> {
            Ok(self.working.partition(group_id, partition))
        }

        async fn count_in_group(&mut self, group_id: CustomerGroupId) -> Result<u64, PortError> {
            Ok(self.working.customers.values().filter(|c| c.group_id == group_id).count() as u64)
        }

        async fn next_position(
            &mut self,
            group_id: CustomerGroupId,
            partition: Partition,
        ) -> Result<i32, PortError> {
            let max = self
                .working
                .partition(group_id, partition)
                .iter()
                .map(|c| c.position)
                .max()
                .unwrap_or(0);
            Ok(max + 1)
        }

        async fn customer_name_taken(&mut self, name: &str, except: CustomerId) -> Result<bool, PortError> {
            let name = name.to_lowercase();
            Ok(self
                .working
                .customers
                .values()
                .any(|c| c.id != except && c.name.to_lowercase() == name))
        }

        async fn mobile_no_taken(&mut self, mobile_no: &str, except: CustomerId) -> Result<bool, PortError> {
            let mobile_no = mobile_no.to_lowercase();
            Ok(self
                .working
                .customers
                .values()
                .any(|c| c.id != except && c.mobile_no.to_lowercase() == mobile_no))
        }

        async fn insert_customer(&mut self, customer: &Customer) -> Result<(), PortError> {
            if !self.working.groups.contains_key(&customer.group_id) {
                return Err(PortError::conflict(format!("group {} does not exist", customer.group_id)));
            }
            self.working.customers.insert(customer.id, customer.clone());
            Ok(())
        }

        async fn update_customer(&mut self, customer: &Customer) -> Result<(), PortError> {
            if !self.working.groups.contains_key(&customer.group_id) {
                return Err(PortError::conflict(format!("group {} does not exist", customer.group_id)));
            }
            let stored = self
                .working
                .customers
                .get_mut(&customer.id)
                .ok_or_else(|| PortError::not_found("Customer", customer.id))?;
            *stored = customer.clone();
            Ok(())
        }

        async fn write_position(&mut self, id: CustomerId, position: i32) -> Result<(), PortError> {
            if self.failing_position_writes.contains(&id) {
                return Err(PortError::internal(format!("position write rejected for {}", id)));
            }
            let customer = self
                .working
                .customers
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Customer", id))?;
            customer.position = position;
            Ok(())
        }

        async fn reassign_withheld(
            &mut self,
            from: CustomerGroupId,
            to: CustomerGroupId,
        ) -> Result<u64, PortError> {
            let now = Utc::now();
            let mut moved = 0;
            for customer in self.working.customers.values_mut() {
                if customer.group_id == from && customer.withheld {
                    customer.group_id = to;
                    customer.updated_at = now;
                    moved += 1;
                }
            }
            Ok(moved)
        }

        async fn delete_customer(&mut self, id: CustomerId) -> Result<bool, PortError> {
            Ok(self.working.customers.remove(&id).is_some())
        }

        async fn total_due_amount(&mut self, group_id: CustomerGroupId) -> Result<Decimal, PortError> {
            Ok(self
                .working
                .customers
                .values()
                .filter(|c| c.group_id == group_id)
                .map(|c| c.due_amount)
                .sum())
        }

        async fn commit(self: Box<Self>) -> Result<(), PortError> {
            let InMemoryTransaction { mut guard, working, .. } = *self;
            *guard = working;
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<(), PortError> {
            Ok(())
        }
    }
}
