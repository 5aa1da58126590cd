// commerce_server/src/agent/mod.rs

//! The commerce assistant: a tool-using chat agent over the storefront database.

pub mod demo;
pub mod graph;
pub mod state;
pub mod tools;

use agent_graph::{GraphRegistry, GraphResult, SharedState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, instrument};

use crate::errors::AppError;
use crate::llm::LlmMessage;

pub use graph::{build_agent_graph, AgentSettings};
pub use state::AgentState;
pub use tools::{CommerceTools, ToolBox};

pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant for an e-commerce platform.

You can help users:
- Search for products by name, category, price range, or availability
- Look up specific product details
- Search and track orders
- Answer questions about our inventory

Use the available tools to search our database and provide accurate, helpful information.
When searching, be specific and use appropriate filters to give users the most relevant results.";

const EVENT_BUFFER: usize = 64;

/// Progress reported by a running agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
  TextDelta(String),
  ToolStarted { name: String, arguments: String },
  ToolFinished { name: String, output: String },
  Completed { content: String },
  Failed { error: String },
}

/// A chat message as sent by clients. Any role other than `user` or
/// `assistant` is treated as `user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct IncomingMessage {
  pub role: String,
  pub content: String,
}

pub fn to_llm_messages(messages: &[IncomingMessage]) -> Vec<LlmMessage> {
  messages
    .iter()
    .map(|m| match m.role.as_str() {
      "assistant" => LlmMessage::assistant(m.content.clone()),
      _ => LlmMessage::user(m.content.clone()),
    })
    .collect()
}

/// Runs the agent graph registered for `AgentState` without streaming.
#[instrument(name = "agent::run_to_completion", skip_all, fields(messages = messages.len()))]
pub async fn run_to_completion(
  registry: &GraphRegistry<AppError>,
  messages: Vec<LlmMessage>,
) -> Result<AgentState, AppError> {
  let state = SharedState::new(AgentState::new(messages, None));
  let result = registry.run(state.clone()).await?;
  info!(?result, "Agent run finished.");
  Ok(state.snapshot())
}

/// Starts the agent on the actix runtime and returns its event stream. The
/// last event is `Completed` or `Failed`, unless the receiver was dropped
/// first, in which case the run stops at its next send.
pub fn spawn_streaming(registry: Arc<GraphRegistry<AppError>>, messages: Vec<LlmMessage>) -> mpsc::Receiver<AgentEvent> {
  let (tx, rx) = mpsc::channel(EVENT_BUFFER);
  actix_rt::spawn(async move {
    let state = SharedState::new(AgentState::new(messages, Some(tx.clone())));
    let terminal = match registry.run(state.clone()).await {
      Ok(GraphResult::Halted) if state.read().cancelled => {
        info!("Client disconnected; agent run abandoned.");
        return;
      }
      Ok(_) => {
        let content = state.read().response_text.clone();
        AgentEvent::Completed { content }
      }
      Err(e) => {
        error!(error = %e, "Agent run failed.");
        AgentEvent::Failed {
          error: format!("Failed to get response from AI. {}", e),
        }
      }
    };
    if tx.send(terminal).await.is_err() {
      info!("Client disconnected before the final frame.");
    }
  });
  rx
}

#[cfg(test)]
mod tests;
