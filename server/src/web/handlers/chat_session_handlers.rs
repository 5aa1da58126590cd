// commerce_server/src/web/handlers/chat_session_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::chat_session::{ChatSession, NewChatSession, UpdateChatSession};
use crate::state::AppState;

fn session_not_found(id: Uuid) -> AppError {
  warn!("Chat session with ID {} not found.", id);
  AppError::NotFound(format!("Chat session with ID {} not found.", id))
}

#[utoipa::path(
  get,
  path = "/api/chat-sessions/{id}",
  tag = "chat-sessions",
  params(("id" = Uuid, Path, description = "Session id")),
  responses(
    (status = 200, description = "The session", body = ChatSession),
    (status = 404, description = "No such session")
  )
)]
#[instrument(name = "handler::get_chat_session", skip(app_state, path), fields(session_id = %path.as_ref()))]
pub async fn get_chat_session_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  db::chat_sessions::get_by_id(&app_state.db_pool, id)
    .await?
    .map(|session| HttpResponse::Ok().json(session))
    .ok_or_else(|| session_not_found(id))
}

#[utoipa::path(
  get,
  path = "/api/chat-sessions/user/{user_id}",
  tag = "chat-sessions",
  params(("user_id" = String, Path, description = "Owner of the sessions")),
  responses((status = 200, description = "Sessions, most recently updated first", body = [ChatSession]))
)]
#[instrument(name = "handler::list_user_chat_sessions", skip(app_state, path), fields(user_id = %path.as_ref()))]
pub async fn list_user_chat_sessions_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let sessions = db::chat_sessions::list_by_user(&app_state.db_pool, &path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(sessions))
}

#[utoipa::path(
  post,
  path = "/api/chat-sessions",
  tag = "chat-sessions",
  request_body = NewChatSession,
  responses((status = 201, description = "Created session", body = ChatSession))
)]
#[instrument(name = "handler::create_chat_session", skip(app_state, body))]
pub async fn create_chat_session_handler(
  app_state: web::Data<AppState>,
  body: web::Json<NewChatSession>,
) -> Result<HttpResponse, AppError> {
  let NewChatSession { user_id, messages } = body.into_inner();
  let session = db::chat_sessions::create(&app_state.db_pool, user_id.as_deref(), &messages).await?;
  info!(session_id = %session.id, "Chat session created.");
  Ok(HttpResponse::Created().json(session))
}

#[utoipa::path(
  put,
  path = "/api/chat-sessions/{id}",
  tag = "chat-sessions",
  params(("id" = Uuid, Path, description = "Session id")),
  request_body = UpdateChatSession,
  responses(
    (status = 200, description = "Session with replaced messages", body = ChatSession),
    (status = 404, description = "No such session")
  )
)]
#[instrument(name = "handler::update_chat_session", skip(app_state, path, body), fields(session_id = %path.as_ref()))]
pub async fn update_chat_session_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  body: web::Json<UpdateChatSession>,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  db::chat_sessions::update_messages(&app_state.db_pool, id, &body.messages)
    .await?
    .map(|session| HttpResponse::Ok().json(session))
    .ok_or_else(|| session_not_found(id))
}

#[utoipa::path(
  delete,
  path = "/api/chat-sessions/{id}",
  tag = "chat-sessions",
  params(("id" = Uuid, Path, description = "Session id")),
  responses(
    (status = 204, description = "Deleted"),
    (status = 404, description = "No such session")
  )
)]
#[instrument(name = "handler::delete_chat_session", skip(app_state, path), fields(session_id = %path.as_ref()))]
pub async fn delete_chat_session_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  if db::chat_sessions::delete(&app_state.db_pool, id).await? {
    Ok(HttpResponse::NoContent().finish())
  } else {
    Err(session_not_found(id))
  }
}
