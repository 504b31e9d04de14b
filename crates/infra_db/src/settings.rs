//! Runtime settings
//!
//! Values come from `CUSTOMERS_*` environment variables, after an optional
//! `.env` file has been loaded:
//!
//! * `CUSTOMERS_DATABASE_URL` - PostgreSQL connection string
//! * `CUSTOMERS_MAX_CONNECTIONS` / `CUSTOMERS_MIN_CONNECTIONS` - pool bounds
//! * `CUSTOMERS_ACQUIRE_TIMEOUT_SECS` - wait for a pooled connection
//! * `CUSTOMERS_LOG_LEVEL` - fallback filter when `RUST_LOG` is unset
//! * `CUSTOMERS_DEFAULT_GROUP_NAME` - name of the seeded default group

use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;

use crate::error::DatabaseError;
use crate::pool::DatabaseConfig;

const ENV_PREFIX: &str = "CUSTOMERS";

/// Settings shared by the setup binary and embedding applications
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub log_level: String,
    pub default_group_name: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/customers".to_string(),
            max_connections: 10,
            min_connections: 2,
            acquire_timeout_secs: 30,
            log_level: "info".to_string(),
            default_group_name: "General".to_string(),
        }
    }
}

impl DatabaseSettings {
    /// Loads `.env` when present, then reads the process environment
    pub fn load() -> Result<Self, DatabaseError> {
        dotenvy::dotenv().ok();
        Self::from_environment(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    /// Reads settings from the given environment source over the defaults
    pub fn from_environment(environment: Environment) -> Result<Self, DatabaseError> {
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("database_url", defaults.database_url)?
            .set_default("max_connections", defaults.max_connections)?
            .set_default("min_connections", defaults.min_connections)?
            .set_default("acquire_timeout_secs", defaults.acquire_timeout_secs)?
            .set_default("log_level", defaults.log_level)?
            .set_default("default_group_name", defaults.default_group_name)?
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Builds the pool configuration for these settings
    pub fn pool_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.database_url)
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.acquire_timeout_secs))
    }
}
