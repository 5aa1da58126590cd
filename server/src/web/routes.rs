// commerce_server/src/web/routes.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use crate::errors::AppError;
use crate::web::handlers::{
  chat_handlers, chat_session_handlers, docs_handlers, graph_handlers, order_handlers, product_handlers,
};

#[utoipa::path(get, path = "/health", tag = "system", responses((status = 200, description = "Server is running")))]
pub async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(json!({ "status": "ok", "message": "Server is running" }))
}

#[utoipa::path(get, path = "/api", tag = "system", responses((status = 200, description = "API is working")))]
pub async fn api_root_handler() -> HttpResponse {
  HttpResponse::Ok().json(json!({ "message": "API is working" }))
}

#[utoipa::path(get, path = "/api/test", tag = "system", responses((status = 200, description = "Message and RFC 3339 timestamp")))]
pub async fn api_test_handler() -> HttpResponse {
  HttpResponse::Ok().json(json!({ "message": "Test endpoint", "timestamp": Utc::now().to_rfc3339() }))
}

/// Extractor configs that report malformed input in the application's error shape.
fn extractor_configs(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(
      web::JsonConfig::default()
        .error_handler(|err, _req| AppError::Validation(format!("Invalid JSON body: {}", err)).into()),
    )
    .app_data(
      web::QueryConfig::default()
        .error_handler(|err, _req| AppError::Validation(format!("Invalid query string: {}", err)).into()),
    )
    .app_data(
      web::PathConfig::default()
        .error_handler(|err, _req| AppError::NotFound(format!("Invalid path parameter: {}", err)).into()),
    );
}

// Called in `main.rs` and by route tests to configure the Actix app.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  extractor_configs(cfg);
  cfg
    .route("/health", web::get().to(health_check_handler))
    .route("/api-docs", web::get().to(docs_handlers::swagger_ui_handler))
    .route("/api-docs.json", web::get().to(docs_handlers::openapi_json_handler))
    .service(
      web::scope("/api")
        .route("", web::get().to(api_root_handler))
        .route("/test", web::get().to(api_test_handler))
        // Products: fixed segments before `/{id}`.
        .service(
          web::scope("/products")
            .route("", web::get().to(product_handlers::list_products_handler))
            .route("", web::post().to(product_handlers::create_product_handler))
            .route("/search", web::get().to(product_handlers::search_products_handler))
            .route("/category/{category}", web::get().to(product_handlers::list_by_category_handler))
            .route("/{id}", web::get().to(product_handlers::get_product_handler))
            .route("/{id}", web::put().to(product_handlers::update_product_handler))
            .route("/{id}", web::delete().to(product_handlers::delete_product_handler)),
        )
        .service(
          web::scope("/orders")
            .route("", web::get().to(order_handlers::list_orders_handler))
            .route("", web::post().to(order_handlers::create_order_handler))
            .route("/user/{user_id}", web::get().to(order_handlers::list_user_orders_handler))
            .route("/{id}", web::get().to(order_handlers::get_order_handler))
            .route("/{id}/status", web::patch().to(order_handlers::update_order_status_handler)),
        )
        .service(
          web::scope("/chat-sessions")
            .route("", web::post().to(chat_session_handlers::create_chat_session_handler))
            .route(
              "/user/{user_id}",
              web::get().to(chat_session_handlers::list_user_chat_sessions_handler),
            )
            .route("/{id}", web::get().to(chat_session_handlers::get_chat_session_handler))
            .route("/{id}", web::put().to(chat_session_handlers::update_chat_session_handler))
            .route("/{id}", web::delete().to(chat_session_handlers::delete_chat_session_handler)),
        )
        .service(
          web::scope("/chat")
            .route("", web::post().to(chat_handlers::chat_stream_handler))
            .route("/complete", web::post().to(chat_handlers::chat_complete_handler)),
        )
        .route("/langgraph/run", web::post().to(graph_handlers::run_demo_graph_handler)),
    );
}
