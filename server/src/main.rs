// commerce_server/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use agent_graph::GraphRegistry;
use std::sync::Arc;

use commerce_server::config::AppConfig;
use commerce_server::errors::AppError;
use commerce_server::state::AppState;
use commerce_server::web::configure_app_routes;
use commerce_server::{db, graphs, telemetry};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  telemetry::init_tracing();
  tracing::info!("Starting commerce server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  let db_pool = db::connect_lazy(&app_config).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

  if app_config.run_migrations {
    if let Err(e) = db::run_migrations(&db_pool).await {
      tracing::error!(error = %e, "Failed to apply migrations.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
  }

  if app_config.seed_db {
    match db::seed::seed_products(&db_pool).await {
      Ok(inserted) => tracing::info!(inserted, "Database seeding finished."),
      Err(e) => tracing::error!(error = %e, "Failed to seed database."),
    }
  }

  let graph_registry = Arc::new(GraphRegistry::<AppError>::new());
  let app_state = AppState {
    db_pool,
    graphs: graph_registry.clone(),
    config: app_config.clone(),
  };

  if let Err(e) = graphs::register_all_graphs(&graph_registry, &app_state) {
    tracing::error!(error = %e, "Failed to build application graphs.");
    return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
  }

  let server_address = app_config.bind_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
