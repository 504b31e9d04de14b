//! Customer store setup
//!
//! Applies the schema migrations and makes sure the default customer group
//! exists.
//!
//! # Usage
//!
//! ```bash
//! CUSTOMERS_DATABASE_URL=postgres://... cargo run --bin customer-setup
//! ```
//!
//! See `infra_db::settings` for the full list of variables.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::{AdapterHealth, HealthCheckable};
use infra_db::{create_pool, ensure_default_group, run_migrations, DatabaseSettings, PostgresCustomerStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = DatabaseSettings::load().context("loading settings")?;

    init_tracing(&settings.log_level);

    let pool = create_pool(settings.pool_config())
        .await
        .context("connecting to the database")?;

    run_migrations(&pool).await.context("applying migrations")?;

    let store = PostgresCustomerStore::new(pool);
    let health = store.health_check().await;
    if health.status != AdapterHealth::Healthy {
        anyhow::bail!("store unhealthy: {}", health.message.unwrap_or_default());
    }

    let group = ensure_default_group(&store, &settings.default_group_name)
        .await
        .context("seeding the default group")?;

    tracing::info!(group_id = %group.id, name = %group.name, "customer store ready");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
