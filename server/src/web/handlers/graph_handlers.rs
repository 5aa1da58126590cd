// commerce_server/src/web/handlers/graph_handlers.rs

use actix_web::{web, HttpResponse};
use agent_graph::SharedState;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::agent::demo::DemoState;
use crate::errors::AppError;
use crate::state::AppState;

/// Documented request shape; the handler reads the raw JSON to report a
/// single message for every malformed variant.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DemoRunRequest {
  pub message: String,
}

pub(crate) fn demo_message(body: &Value) -> Result<&str, AppError> {
  body
    .get("message")
    .and_then(Value::as_str)
    .filter(|m| !m.is_empty())
    .ok_or_else(|| AppError::Validation("Message is required and must be a string".to_string()))
}

#[utoipa::path(
  post,
  path = "/api/langgraph/run",
  tag = "graph",
  request_body = DemoRunRequest,
  responses(
    (status = 200, description = "`{success, result: {messages, step}}`"),
    (status = 400, description = "Message is required and must be a string")
  )
)]
#[instrument(name = "handler::run_demo_graph", skip(app_state, body))]
pub async fn run_demo_graph_handler(app_state: web::Data<AppState>, body: web::Json<Value>) -> Result<HttpResponse, AppError> {
  let message = demo_message(&body)?;
  let state = SharedState::new(DemoState::from_user_message(message));
  let outcome = app_state.graphs.run(state.clone()).await?;

  let result = state.snapshot();
  info!(?outcome, steps = result.step, "Demo graph run finished.");
  Ok(HttpResponse::Ok().json(json!({ "success": true, "result": result })))
}
