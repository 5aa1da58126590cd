// commerce_server/src/db/chat_sessions.rs

use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::chat_session::{ChatMessage, ChatSession, ChatSessionRow};

const SESSION_COLUMNS: &str = "id, user_id, messages, created_at, updated_at";

fn sqlx_err(e: sqlx::Error) -> AppError {
  error!("Chat session query failed: {}", e);
  AppError::Sqlx(e)
}

#[instrument(name = "db::chat_sessions::create", skip(pool, messages), fields(message_count = messages.len()))]
pub async fn create(pool: &PgPool, user_id: Option<&str>, messages: &[ChatMessage]) -> Result<ChatSession> {
  let row: ChatSessionRow = sqlx::query_as(&format!(
    "INSERT INTO chat_sessions (user_id, messages) VALUES ($1, $2) RETURNING {}",
    SESSION_COLUMNS
  ))
  .bind(user_id)
  .bind(Json(messages))
  .fetch_one(pool)
  .await
  .map_err(sqlx_err)?;
  Ok(ChatSession::from(row))
}

#[instrument(name = "db::chat_sessions::get_by_id", skip(pool))]
pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<ChatSession>> {
  let row: Option<ChatSessionRow> =
    sqlx::query_as(&format!("SELECT {} FROM chat_sessions WHERE id = $1", SESSION_COLUMNS))
      .bind(id)
      .fetch_optional(pool)
      .await
      .map_err(sqlx_err)?;
  Ok(row.map(ChatSession::from))
}

#[instrument(name = "db::chat_sessions::list_by_user", skip(pool))]
pub async fn list_by_user(pool: &PgPool, user_id: &str) -> Result<Vec<ChatSession>> {
  let rows: Vec<ChatSessionRow> = sqlx::query_as(&format!(
    "SELECT {} FROM chat_sessions WHERE user_id = $1 ORDER BY updated_at DESC",
    SESSION_COLUMNS
  ))
  .bind(user_id)
  .fetch_all(pool)
  .await
  .map_err(sqlx_err)?;
  Ok(rows.into_iter().map(ChatSession::from).collect())
}

/// Replaces the message list. `None` when the session does not exist.
#[instrument(name = "db::chat_sessions::update_messages", skip(pool, messages), fields(message_count = messages.len()))]
pub async fn update_messages(pool: &PgPool, id: Uuid, messages: &[ChatMessage]) -> Result<Option<ChatSession>> {
  let row: Option<ChatSessionRow> = sqlx::query_as(&format!(
    "UPDATE chat_sessions SET messages = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
    SESSION_COLUMNS
  ))
  .bind(Json(messages))
  .bind(id)
  .fetch_optional(pool)
  .await
  .map_err(sqlx_err)?;
  Ok(row.map(ChatSession::from))
}

#[instrument(name = "db::chat_sessions::delete", skip(pool))]
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
  let result = sqlx::query("DELETE FROM chat_sessions WHERE id = $1")
    .bind(id)
    .execute(pool)
    .await
    .map_err(sqlx_err)?;
  Ok(result.rows_affected() > 0)
}
