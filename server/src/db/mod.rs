// commerce_server/src/db/mod.rs

//! Repository functions over a shared `PgPool`.

pub mod chat_sessions;
pub mod orders;
pub mod products;
pub mod seed;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Builds the pool without connecting. The first query opens the first connection.
pub fn connect_lazy(config: &AppConfig) -> Result<PgPool> {
  let pool = PgPoolOptions::new()
    .max_connections(config.db_max_connections)
    .connect_lazy(&config.database_url)
    .map_err(|e| {
      error!("Invalid database configuration: {}", e);
      AppError::Config(format!("Invalid DATABASE_URL: {}", e))
    })?;
  info!(max_connections = config.db_max_connections, "Database pool created (lazy).");
  Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
  info!("Running database migrations.");
  sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
    error!("Database migration failed: {}", e);
    AppError::Migrate(e)
  })?;
  info!("Database migrations applied.");
  Ok(())
}

/// Wraps `term` for a `LIKE`/`ILIKE` substring match, escaping wildcard characters.
pub fn like_pattern(term: &str) -> String {
  let mut escaped = String::with_capacity(term.len() + 2);
  escaped.push('%');
  for c in term.chars() {
    if matches!(c, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped.push('%');
  escaped
}
