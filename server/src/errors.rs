// commerce_server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use agent_graph::GraphError;
use serde_json::json;
use thiserror::Error;

use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error("LLM Error: {0}")]
  Llm(#[from] LlmError),

  #[error("Upstream Error: {0}")]
  Upstream(String),

  #[error("Graph Error: {source}")]
  Graph {
    #[from]
    source: GraphError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<AppError>() {
      Ok(app_err) => app_err,
      Err(err) => match err.downcast::<sqlx::Error>() {
        Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
        Err(err) => AppError::Internal(err.to_string()),
      },
    }
  }
}

impl AppError {
  /// Short summary used as the `error` field of the response body.
  fn summary(&self) -> &'static str {
    match self {
      AppError::Validation(_) => "Invalid request",
      AppError::NotFound(_) => "Not found",
      AppError::Config(_) => "Configuration issue",
      AppError::Sqlx(_) | AppError::Migrate(_) => "Database operation failed",
      AppError::Llm(_) => "Failed to get response from AI",
      AppError::Upstream(_) => "Upstream service error",
      AppError::Graph { .. } => "Failed to process request",
      AppError::Internal(_) => "An internal error occurred",
    }
  }

  fn detail(&self) -> String {
    match self {
      AppError::Validation(m) | AppError::NotFound(m) | AppError::Config(m) | AppError::Upstream(m) => m.clone(),
      AppError::Internal(m) => m.clone(),
      AppError::Sqlx(e) => e.to_string(),
      AppError::Migrate(e) => e.to_string(),
      AppError::Llm(e) => e.to_string(),
      AppError::Graph { source } => source.to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Llm(LlmError::Api { .. }) | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Responding with client error");
    }
    match self {
      // Client errors carry their message directly as `error`.
      AppError::Validation(m) | AppError::NotFound(m) => HttpResponse::build(status).json(json!({"error": m})),
      _ => HttpResponse::build(status).json(json!({"error": self.summary(), "message": self.detail()})),
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
