// commerce_server/src/web/handlers/chat_handlers.rs

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::agent::{run_to_completion, spawn_streaming, to_llm_messages, IncomingMessage};
use crate::errors::AppError;
use crate::relay::{frame_stream, sse_response, NO_RESPONSE};
use crate::state::AppState;

/// Body of both chat routes.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequestBody {
  #[serde(default)]
  pub messages: Option<Vec<IncomingMessage>>,
}

/// Reply of `POST /api/chat/complete`: the input conversation plus the answer.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatCompletion {
  pub messages: Vec<IncomingMessage>,
  pub step: u32,
}

pub(crate) fn require_messages(body: ChatRequestBody) -> Result<Vec<IncomingMessage>, AppError> {
  match body.messages {
    Some(messages) if !messages.is_empty() => Ok(messages),
    _ => Err(AppError::Validation("Messages array is required".to_string())),
  }
}

#[utoipa::path(
  post,
  path = "/api/chat",
  tag = "chat",
  request_body = ChatRequestBody,
  responses(
    (status = 200, description = "Server-sent events: delta frames, then one done or error frame", content_type = "text/event-stream"),
    (status = 400, description = "Messages array is required")
  )
)]
#[instrument(name = "handler::chat_stream", skip(app_state, body))]
pub async fn chat_stream_handler(
  app_state: web::Data<AppState>,
  body: web::Json<ChatRequestBody>,
) -> Result<HttpResponse, AppError> {
  let messages = require_messages(body.into_inner())?;
  info!(messages = messages.len(), "Starting streaming chat.");
  let events = spawn_streaming(app_state.graphs.clone(), to_llm_messages(&messages));
  Ok(sse_response(frame_stream(events)))
}

#[utoipa::path(
  post,
  path = "/api/chat/complete",
  tag = "chat",
  request_body = ChatRequestBody,
  responses(
    (status = 200, description = "Conversation with the assistant's reply appended", body = ChatCompletion),
    (status = 400, description = "Messages array is required"),
    (status = 502, description = "Model provider rejected the request")
  )
)]
#[instrument(name = "handler::chat_complete", skip(app_state, body))]
pub async fn chat_complete_handler(
  app_state: web::Data<AppState>,
  body: web::Json<ChatRequestBody>,
) -> Result<HttpResponse, AppError> {
  let mut messages = require_messages(body.into_inner())?;
  let state = run_to_completion(&app_state.graphs, to_llm_messages(&messages)).await?;
  let reply = state.final_reply().unwrap_or(NO_RESPONSE).to_string();
  info!(turns = state.model_turns, reply_len = reply.len(), "Chat completion finished.");

  messages.push(IncomingMessage {
    role: "assistant".to_string(),
    content: reply,
  });
  Ok(HttpResponse::Ok().json(ChatCompletion { messages, step: 1 }))
}
