// commerce_server/src/models/chat_session.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
  User,
  Assistant,
  System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
  pub role: MessageRole,
  pub content: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
  pub id: Uuid,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub user_id: Option<String>,
  pub messages: Vec<ChatMessage>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ChatSessionRow {
  pub id: Uuid,
  pub user_id: Option<String>,
  pub messages: Json<Vec<ChatMessage>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl From<ChatSessionRow> for ChatSession {
  fn from(row: ChatSessionRow) -> Self {
    Self {
      id: row.id,
      user_id: row.user_id,
      messages: row.messages.0,
      created_at: row.created_at,
      updated_at: row.updated_at,
    }
  }
}

/// Body of `POST /api/chat-sessions`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewChatSession {
  #[serde(default)]
  pub user_id: Option<String>,
  #[serde(default)]
  pub messages: Vec<ChatMessage>,
}

/// Body of `PUT /api/chat-sessions/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateChatSession {
  pub messages: Vec<ChatMessage>,
}
