// commerce_server/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use agent_graph::GraphRegistry;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub graphs: Arc<GraphRegistry<AppError>>,
  pub config: Arc<AppConfig>,
}
