// commerce_server/src/web/handlers/docs_handlers.rs

//! OpenAPI document and the Swagger UI page that renders it.

use actix_web::{web, HttpRequest, HttpResponse};
use tracing::instrument;
use utoipa::openapi::server::Server;
use utoipa::OpenApi;

use crate::agent::IncomingMessage;
use crate::models::{
  ChatMessage, ChatSession, MessageRole, NewChatSession, NewOrder, NewProduct, Order, OrderItem, OrderStatus, Product,
  ProductPatch, UpdateChatSession, UpdateOrderStatus,
};
use crate::state::AppState;
use crate::web::handlers::chat_handlers::{ChatCompletion, ChatRequestBody};
use crate::web::handlers::graph_handlers::DemoRunRequest;
use crate::web::handlers::{chat_handlers, chat_session_handlers, graph_handlers, order_handlers, product_handlers};
use crate::web::routes;

#[derive(OpenApi)]
#[openapi(
  info(
    title = "Commerce API",
    version = "1.0.0",
    description = "Products, orders, chat sessions and the streaming commerce assistant."
  ),
  servers((url = "/", description = "Relative to the serving host")),
  paths(
    routes::health_check_handler,
    routes::api_root_handler,
    routes::api_test_handler,
    product_handlers::list_products_handler,
    product_handlers::search_products_handler,
    product_handlers::list_by_category_handler,
    product_handlers::get_product_handler,
    product_handlers::create_product_handler,
    product_handlers::update_product_handler,
    product_handlers::delete_product_handler,
    order_handlers::list_orders_handler,
    order_handlers::get_order_handler,
    order_handlers::list_user_orders_handler,
    order_handlers::create_order_handler,
    order_handlers::update_order_status_handler,
    chat_session_handlers::get_chat_session_handler,
    chat_session_handlers::list_user_chat_sessions_handler,
    chat_session_handlers::create_chat_session_handler,
    chat_session_handlers::update_chat_session_handler,
    chat_session_handlers::delete_chat_session_handler,
    chat_handlers::chat_stream_handler,
    chat_handlers::chat_complete_handler,
    graph_handlers::run_demo_graph_handler,
  ),
  components(schemas(
    Product,
    NewProduct,
    ProductPatch,
    Order,
    OrderItem,
    OrderStatus,
    NewOrder,
    UpdateOrderStatus,
    ChatSession,
    ChatMessage,
    MessageRole,
    NewChatSession,
    UpdateChatSession,
    IncomingMessage,
    ChatRequestBody,
    ChatCompletion,
    DemoRunRequest,
  )),
  tags(
    (name = "system", description = "Liveness and smoke-test routes"),
    (name = "products", description = "Product catalogue"),
    (name = "orders", description = "Orders"),
    (name = "chat-sessions", description = "Stored chat transcripts"),
    (name = "chat", description = "Commerce assistant"),
    (name = "graph", description = "Demo state graph")
  )
)]
pub struct ApiDoc;

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Commerce API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js" crossorigin></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: "/api-docs.json", dom_id: "#swagger-ui" });
    };
  </script>
</body>
</html>
"##;

fn server(url: &str, description: &str) -> Server {
  let mut server = Server::new(url);
  server.description = Some(description.to_string());
  server
}

/// Puts `current` first and keeps the configured entries, except `/`.
pub(crate) fn rewrite_servers(current: &str, configured: Vec<Server>) -> Vec<Server> {
  let mut servers = vec![server(current, "Current server")];
  servers.extend(configured.into_iter().filter(|s| s.url != "/"));
  servers
}

/// The generated document with `public_base_url` appended to its servers.
pub fn api_document(public_base_url: &str) -> utoipa::openapi::OpenApi {
  let mut doc = ApiDoc::openapi();
  let mut servers = doc.servers.take().unwrap_or_default();
  if !public_base_url.is_empty() && servers.iter().all(|s| s.url != public_base_url) {
    servers.push(server(public_base_url, "Configured server"));
  }
  doc.servers = Some(servers);
  doc
}

#[instrument(name = "handler::openapi_json", skip(app_state, req))]
pub async fn openapi_json_handler(app_state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
  let current = {
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
  };
  let mut doc = api_document(&app_state.config.public_base_url);
  let configured = doc.servers.take().unwrap_or_default();
  doc.servers = Some(rewrite_servers(&current, configured));
  HttpResponse::Ok().json(doc)
}

pub async fn swagger_ui_handler() -> HttpResponse {
  HttpResponse::Ok()
    .content_type("text/html; charset=utf-8")
    .body(SWAGGER_UI_HTML)
}
