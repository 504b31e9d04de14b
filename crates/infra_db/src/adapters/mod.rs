//! Domain Adapters
//!
//! Implementations of the customer domain's store port on PostgreSQL.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use infra_db::adapters::PostgresCustomerStore;
//! use domain_customer::{CustomerStore, GroupDeleteOperation};
//!
//! let store: Arc<dyn CustomerStore> = Arc::new(PostgresCustomerStore::new(pool));
//! let outcome = GroupDeleteOperation::new(store).execute(group_id).await?;
//! ```

pub mod customer_store;

pub use customer_store::PostgresCustomerStore;
