// commerce_server/src/bin/seed.rs

//! Seeds the product catalogue. Applies migrations first when `RUN_MIGRATIONS=true`.

use anyhow::Context;

use commerce_server::config::AppConfig;
use commerce_server::{db, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  telemetry::init_tracing();

  let config = AppConfig::from_env().context("loading configuration")?;
  let pool = db::connect_lazy(&config).context("creating database pool")?;

  if config.run_migrations {
    db::run_migrations(&pool).await.context("applying migrations")?;
  }

  let inserted = db::seed::seed_products(&pool).await.context("seeding products")?;
  if inserted == 0 {
    tracing::info!("Products table already populated; nothing to seed.");
  } else {
    tracing::info!(inserted, "Seeded products.");
  }
  Ok(())
}
