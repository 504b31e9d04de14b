//! Infrastructure Database Layer
//!
//! PostgreSQL implementation of the customer group store using SQLx.
//!
//! # Architecture
//!
//! Repositories hold the SQL and map rows to plain row structs. The
//! [`adapters::PostgresCustomerStore`] implements the domain's
//! `CustomerStore` port on top of them: every `begin` opens one database
//! transaction, and every repository call of an operation runs on that
//! transaction's connection.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use infra_db::{create_pool, DatabaseSettings, PostgresCustomerStore};
//! use domain_customer::CustomerCreateOperation;
//!
//! let settings = DatabaseSettings::load()?;
//! let pool = create_pool(settings.pool_config()).await?;
//! let store = Arc::new(PostgresCustomerStore::new(pool));
//! let outcome = CustomerCreateOperation::new(store).execute(attributes).await?;
//! ```

pub mod pool;
pub mod error;
pub mod settings;
pub mod setup;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use settings::DatabaseSettings;
pub use setup::ensure_default_group;
pub use adapters::PostgresCustomerStore;
