// commerce_server/src/bin/edge_proxy.rs

//! Frontend edge server: relays browser chat requests to the backend.

use actix_web::{web, App, HttpServer};

use commerce_server::config::EdgeConfig;
use commerce_server::telemetry;
use commerce_server::web::edge::{configure_edge_routes, EdgeState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  telemetry::init_tracing();

  let config = EdgeConfig::from_env().map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
  let edge = EdgeState::new(&config).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

  let address = config.bind_address();
  tracing::info!(backend_url = %config.backend_url, "Edge server binding to {}...", address);

  HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(edge.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_edge_routes)
  })
  .bind(&address)?
  .run()
  .await
}
