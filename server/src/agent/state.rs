// commerce_server/src/agent/state.rs

use tokio::sync::mpsc;

use super::AgentEvent;
use crate::llm::{LlmMessage, LlmRole, ToolCall};

/// State carried through the commerce agent graph.
#[derive(Debug, Clone, Default)]
pub struct AgentState {
  /// Conversation without the system prompt, which is added per model call.
  pub messages: Vec<LlmMessage>,
  /// Tool calls requested by the latest model turn and not yet executed.
  pub pending_tool_calls: Vec<ToolCall>,
  /// All assistant text produced during the run, concatenated.
  pub response_text: String,
  pub model_turns: usize,
  /// Set when the event receiver went away mid-run.
  pub cancelled: bool,
  events: Option<mpsc::Sender<AgentEvent>>,
}

impl AgentState {
  pub fn new(messages: Vec<LlmMessage>, events: Option<mpsc::Sender<AgentEvent>>) -> Self {
    Self {
      messages,
      events,
      ..Default::default()
    }
  }

  pub fn events(&self) -> Option<mpsc::Sender<AgentEvent>> {
    self.events.clone()
  }

  /// Content of the last assistant message that has text.
  pub fn final_reply(&self) -> Option<&str> {
    self
      .messages
      .iter()
      .rev()
      .find(|m| m.role == LlmRole::Assistant && !m.content.is_empty())
      .map(|m| m.content.as_str())
  }
}

/// Sends `event` if a receiver is attached. Returns `false` when the receiver
/// has been dropped.
pub(crate) async fn emit(events: &Option<mpsc::Sender<AgentEvent>>, event: AgentEvent) -> bool {
  match events {
    Some(tx) => tx.send(event).await.is_ok(),
    None => true,
  }
}
