// commerce_server/src/llm/mod.rs

//! Provider-neutral chat model interface used by the commerce agent.

pub mod openai;

use async_trait::async_trait;
use futures::Stream;
use serde::Serialize;
use serde_json::Value;
use std::pin::Pin;
use thiserror::Error;

pub use openai::OpenAiClient;

#[derive(Debug, Error)]
pub enum LlmError {
  #[error("OPENAI_API_KEY is not set in environment variables")]
  MissingApiKey,

  #[error("Request to model provider failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("Model provider returned HTTP {status}: {message}")]
  Api { status: u16, message: String },

  #[error("Model provider reported an error: {0}")]
  Provider(String),

  #[error("Could not decode provider stream: {0}")]
  Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
  System,
  User,
  Assistant,
  Tool,
}

/// A tool invocation requested by the model. `arguments` is the raw JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
  pub id: String,
  pub name: String,
  pub arguments: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmMessage {
  pub role: LlmRole,
  pub content: String,
  pub tool_calls: Vec<ToolCall>,
  pub tool_call_id: Option<String>,
}

impl LlmMessage {
  fn plain(role: LlmRole, content: impl Into<String>) -> Self {
    Self {
      role,
      content: content.into(),
      tool_calls: Vec::new(),
      tool_call_id: None,
    }
  }

  pub fn system(content: impl Into<String>) -> Self {
    Self::plain(LlmRole::System, content)
  }

  pub fn user(content: impl Into<String>) -> Self {
    Self::plain(LlmRole::User, content)
  }

  pub fn assistant(content: impl Into<String>) -> Self {
    Self::plain(LlmRole::Assistant, content)
  }

  pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
    Self {
      tool_calls,
      ..Self::plain(LlmRole::Assistant, content)
    }
  }

  pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
    Self {
      tool_call_id: Some(tool_call_id.into()),
      ..Self::plain(LlmRole::Tool, content)
    }
  }
}

/// A function the model may call. `parameters` is a JSON schema object.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
  pub name: String,
  pub description: String,
  pub parameters: Value,
}

#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
  pub messages: Vec<LlmMessage>,
  pub tools: Vec<ToolSpec>,
  pub temperature: Option<f32>,
}

/// One increment of a streamed completion.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionEvent {
  TextDelta(String),
  /// A fragment of the tool call at `index`. `id` and `name` usually arrive
  /// only on the first fragment; `arguments` is appended across fragments.
  ToolCallDelta {
    index: usize,
    id: Option<String>,
    name: Option<String>,
    arguments: Option<String>,
  },
  Finished {
    reason: Option<String>,
  },
}

pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<CompletionEvent, LlmError>> + Send>>;

#[async_trait]
pub trait ChatModel: Send + Sync {
  fn model_name(&self) -> &str;

  /// Starts a streaming completion. Errors before the first byte (missing key,
  /// transport, non-2xx) are returned here; later failures arrive in the stream.
  async fn stream(&self, request: ChatRequest) -> Result<CompletionStream, LlmError>;
}
