//! PostgreSQL Customer Store Adapter
//!
//! Implements `CustomerStore` with one database transaction per `begin`.
//! Row types are converted to domain entities at this boundary, and
//! database failures are translated into `PortError`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use core_kernel::{
    CustomerGroupId, CustomerId, DomainPort, HealthCheckResult, HealthCheckable, PortError,
};
use domain_customer::{Customer, CustomerGroup, CustomerStore, CustomerTransaction, Partition};

use crate::repositories::{CustomerGroupRepository, CustomerGroupRow, CustomerRepository, CustomerRow};
use crate::error::DatabaseError;

const ADAPTER_ID: &str = "postgres-customer-store";

/// PostgreSQL-backed implementation of the customer store port
#[derive(Debug, Clone)]
pub struct PostgresCustomerStore {
    pool: PgPool,
}

impl PostgresCustomerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl DomainPort for PostgresCustomerStore {}

#[async_trait]
impl HealthCheckable for PostgresCustomerStore {
    /// Runs `SELECT 1` against the pool
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult::healthy(ADAPTER_ID, latency_ms),
            Err(e) => HealthCheckResult::unhealthy(ADAPTER_ID, latency_ms, format!("Database error: {}", e)),
        }
    }
}

#[async_trait]
impl CustomerStore for PostgresCustomerStore {
    #[instrument(skip(self))]
    async fn begin(&self) -> Result<Box<dyn CustomerTransaction>, PortError> {
        let tx = self.pool.begin().await.map_err(|e| transaction_error("begin", e))?;
        debug!("transaction opened");
        Ok(Box::new(PgCustomerTransaction { tx }))
    }
}

/// One open database transaction
struct PgCustomerTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CustomerTransaction for PgCustomerTransaction {
    async fn find_group(&mut self, id: CustomerGroupId) -> Result<Option<CustomerGroup>, PortError> {
        let row = CustomerGroupRepository::find(&mut self.tx, id.into()).await?;
        Ok(row.map(CustomerGroup::from_row))
    }

    async fn default_groups(&mut self) -> Result<Vec<CustomerGroup>, PortError> {
        let rows = CustomerGroupRepository::find_defaults(&mut self.tx).await?;
        Ok(rows.into_iter().map(CustomerGroup::from_row).collect())
    }

    async fn group_exists(&mut self, id: CustomerGroupId) -> Result<bool, PortError> {
        Ok(CustomerGroupRepository::exists(&mut self.tx, id.into()).await?)
    }

    async fn group_name_taken(
        &mut self,
        name: &str,
        except: CustomerGroupId,
    ) -> Result<bool, PortError> {
        Ok(CustomerGroupRepository::name_taken(&mut self.tx, name, except.into()).await?)
    }

    #[instrument(skip(self, group), fields(group_id = %group.id))]
    async fn insert_group(&mut self, group: &CustomerGroup) -> Result<(), PortError> {
        Ok(CustomerGroupRepository::insert(&mut self.tx, &group_row(group)).await?)
    }

    #[instrument(skip(self, group), fields(group_id = %group.id))]
    async fn update_group(&mut self, group: &CustomerGroup) -> Result<(), PortError> {
        Ok(CustomerGroupRepository::update(&mut self.tx, &group_row(group)).await?)
    }

    #[instrument(skip(self), fields(group_id = %id))]
    async fn delete_group(&mut self, id: CustomerGroupId) -> Result<bool, PortError> {
        Ok(CustomerGroupRepository::delete(&mut self.tx, id.into()).await?)
    }

    async fn find_customer(&mut self, id: CustomerId) -> Result<Option<Customer>, PortError> {
        let row = CustomerRepository::find(&mut self.tx, id.into()).await?;
        Ok(row.map(Customer::from_row))
    }

    async fn find_customers(&mut self, ids: &[CustomerId]) -> Result<Vec<Customer>, PortError> {
        let ids: Vec<uuid::Uuid> = ids.iter().map(|id| (*id).into()).collect();
        let rows = CustomerRepository::find_many(&mut self.tx, &ids).await?;
        Ok(rows.into_iter().map(Customer::from_row).collect())
    }

    async fn customers_in_group(&mut self, group_id: CustomerGroupId) -> Result<Vec<Customer>, PortError> {
        let rows = CustomerRepository::in_group(&mut self.tx, group_id.into()).await?;
        Ok(rows.into_iter().map(Customer::from_row).collect())
    }

    async fn customers_in_partition(
        &mut self,
        group_id: CustomerGroupId,
        partition: Partition,
    ) -> Result<Vec<Customer>, PortError> {
        let rows =
            CustomerRepository::in_partition(&mut self.tx, group_id.into(), partition.is_withheld())
                .await?;
        Ok(rows.into_iter().map(Customer::from_row).collect())
    }

    async fn count_in_group(&mut self, group_id: CustomerGroupId) -> Result<u64, PortError> {
        let count = CustomerRepository::count_in_group(&mut self.tx, group_id.into()).await?;
        Ok(count.max(0) as u64)
    }

    async fn next_position(
        &mut self,
        group_id: CustomerGroupId,
        partition: Partition,
    ) -> Result<i32, PortError> {
        Ok(CustomerRepository::next_position(&mut self.tx, group_id.into(), partition.is_withheld()).await?)
    }

    async fn customer_name_taken(&mut self, name: &str, except: CustomerId) -> Result<bool, PortError> {
        Ok(CustomerRepository::name_taken(&mut self.tx, name, except.into()).await?)
    }

    async fn mobile_no_taken(&mut self, mobile_no: &str, except: CustomerId) -> Result<bool, PortError> {
        Ok(CustomerRepository::mobile_no_taken(&mut self.tx, mobile_no, except.into()).await?)
    }

    #[instrument(skip(self, customer), fields(customer_id = %customer.id))]
    async fn insert_customer(&mut self, customer: &Customer) -> Result<(), PortError> {
        Ok(CustomerRepository::insert(&mut self.tx, &customer_row(customer)).await?)
    }

    #[instrument(skip(self, customer), fields(customer_id = %customer.id))]
    async fn update_customer(&mut self, customer: &Customer) -> Result<(), PortError> {
        Ok(CustomerRepository::update(&mut self.tx, &customer_row(customer)).await?)
    }

    async fn write_position(&mut self, id: CustomerId, position: i32) -> Result<(), PortError> {
        Ok(CustomerRepository::write_position(&mut self.tx, id.into(), position).await?)
    }

    #[instrument(skip_all, fields(from = %from, to = %to))]
    async fn reassign_withheld(
        &mut self,
        from: CustomerGroupId,
        to: CustomerGroupId,
    ) -> Result<u64, PortError> {
        Ok(CustomerRepository::reassign_withheld(&mut self.tx, from.into(), to.into()).await?)
    }

    #[instrument(skip(self), fields(customer_id = %id))]
    async fn delete_customer(&mut self, id: CustomerId) -> Result<bool, PortError> {
        Ok(CustomerRepository::delete(&mut self.tx, id.into()).await?)
    }

    async fn total_due_amount(&mut self, group_id: CustomerGroupId) -> Result<Decimal, PortError> {
        Ok(CustomerRepository::total_due_amount(&mut self.tx, group_id.into()).await?)
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        self.tx.commit().await.map_err(|e| transaction_error("commit", e))?;
        debug!("transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        self.tx.rollback().await.map_err(|e| transaction_error("rollback", e))?;
        debug!("transaction rolled back");
        Ok(())
    }
}

fn transaction_error(stage: &str, error: sqlx::Error) -> PortError {
    DatabaseError::transaction(stage, error).into()
}

/// Row conversions at the adapter boundary
trait FromDbRow<R> {
    fn from_row(row: R) -> Self;
}

impl FromDbRow<CustomerGroupRow> for CustomerGroup {
    fn from_row(row: CustomerGroupRow) -> Self {
        CustomerGroup {
            id: CustomerGroupId::from(row.id),
            name: row.name,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl FromDbRow<CustomerRow> for Customer {
    fn from_row(row: CustomerRow) -> Self {
        Customer {
            id: CustomerId::from(row.id),
            group_id: CustomerGroupId::from(row.customer_group_id),
            name: row.name,
            email: row.email,
            mobile_no: row.mobile_no,
            address: row.address,
            due_amount: row.due_amount,
            is_active: row.is_active,
            withheld: row.withheld,
            position: row.position,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn group_row(group: &CustomerGroup) -> CustomerGroupRow {
    CustomerGroupRow {
        id: group.id.into(),
        name: group.name.clone(),
        is_default: group.is_default,
        created_at: group.created_at,
        updated_at: group.updated_at,
    }
}

fn customer_row(customer: &Customer) -> CustomerRow {
    CustomerRow {
        id: customer.id.into(),
        customer_group_id: customer.group_id.into(),
        name: customer.name.clone(),
        email: customer.email.clone(),
        mobile_no: customer.mobile_no.clone(),
        address: customer.address.clone(),
        due_amount: customer.due_amount,
        is_active: customer.is_active,
        withheld: customer.withheld,
        position: customer.position,
        created_at: customer.created_at,
        updated_at: customer.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_customer::NewCustomer;
    use rust_decimal_macros::dec;

    #[test]
    fn test_group_row_conversion() {
        let group = CustomerGroup::new_default("General");
        let row = group_row(&group);

        assert_eq!(row.id, *group.id.as_uuid());
        assert!(row.is_default);
        assert_eq!(CustomerGroup::from_row(row), group);
    }

    #[test]
    fn test_customer_row_conversion() {
        let mut customer = Customer::new(
            NewCustomer {
                email: Some("asha@example.com".to_string()),
                due_amount: Some(dec!(125.50)),
                withheld: true,
                ..NewCustomer::new("Asha Rao", "9800000001")
            },
            CustomerGroupId::new(),
        );
        customer.position = 4;

        let row = customer_row(&customer);
        assert_eq!(row.customer_group_id, *customer.group_id.as_uuid());
        assert!(row.withheld);
        assert_eq!(Customer::from_row(row), customer);
    }
}
