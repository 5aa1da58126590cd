// commerce_server/src/agent/graph.rs

//! The commerce agent as a two-node graph: `agent` calls the model, `tools`
//! runs the calls it asked for, and the loop ends when a turn has none.

use agent_graph::{CompiledGraph, GraphError, NodeControl, SharedState, StateGraph, END, START};
use futures::StreamExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::state::{emit, AgentState};
use super::tools::ToolBox;
use super::{AgentEvent, SYSTEM_PROMPT};
use crate::errors::AppError;
use crate::llm::{ChatModel, ChatRequest, CompletionEvent, LlmMessage, ToolCall, ToolSpec};

pub const AGENT_NODE: &str = "agent";
pub const TOOLS_NODE: &str = "tools";

#[derive(Debug, Clone, Copy)]
pub struct AgentSettings {
  pub temperature: f32,
  pub max_steps: usize,
}

impl Default for AgentSettings {
  fn default() -> Self {
    Self {
      temperature: 0.7,
      max_steps: 10,
    }
  }
}

#[derive(Debug, Default)]
struct PartialToolCall {
  id: Option<String>,
  name: String,
  arguments: String,
}

/// Reassembles streamed tool calls, keyed by their `index`.
#[derive(Debug, Default)]
pub(crate) struct ToolCallAssembler {
  calls: BTreeMap<usize, PartialToolCall>,
}

impl ToolCallAssembler {
  pub(crate) fn push(&mut self, index: usize, id: Option<String>, name: Option<String>, arguments: Option<String>) {
    let call = self.calls.entry(index).or_default();
    if let Some(id) = id.filter(|i| !i.is_empty()) {
      call.id = Some(id);
    }
    if let Some(name) = name {
      call.name.push_str(&name);
    }
    if let Some(arguments) = arguments {
      call.arguments.push_str(&arguments);
    }
  }

  pub(crate) fn finish(self) -> Vec<ToolCall> {
    self
      .calls
      .into_iter()
      .filter_map(|(index, call)| {
        if call.name.is_empty() {
          warn!(index, "Dropping streamed tool call without a name.");
          return None;
        }
        Some(ToolCall {
          id: call.id.unwrap_or_else(|| format!("call_{}", index)),
          name: call.name,
          arguments: call.arguments,
        })
      })
      .collect()
  }
}

async fn call_model(
  model: Arc<dyn ChatModel>,
  specs: Arc<Vec<ToolSpec>>,
  temperature: f32,
  state: SharedState<AgentState>,
) -> Result<NodeControl, AppError> {
  let (messages, events) = {
    let guard = state.read();
    let mut messages = Vec::with_capacity(guard.messages.len() + 1);
    messages.push(LlmMessage::system(SYSTEM_PROMPT));
    messages.extend(guard.messages.iter().cloned());
    (messages, guard.events())
  };
  let request = ChatRequest {
    messages,
    tools: specs.as_ref().clone(),
    temperature: Some(temperature),
  };

  let mut stream = model.stream(request).await?;
  let mut text = String::new();
  let mut assembler = ToolCallAssembler::default();
  let mut chunks = 0usize;

  while let Some(event) = stream.next().await {
    match event? {
      CompletionEvent::TextDelta(delta) => {
        chunks += 1;
        text.push_str(&delta);
        if !emit(&events, AgentEvent::TextDelta(delta)).await {
          info!(chunks, "Client disconnected; stopping model stream.");
          state.write().cancelled = true;
          return Ok(NodeControl::Halt);
        }
      }
      CompletionEvent::ToolCallDelta {
        index,
        id,
        name,
        arguments,
      } => assembler.push(index, id, name, arguments),
      CompletionEvent::Finished { reason } => debug!(?reason, "Model turn finished."),
    }
  }

  let tool_calls = assembler.finish();
  info!(chunks, text_len = text.len(), tool_calls = tool_calls.len(), "Model turn complete.");
  state.update(|s| {
    s.model_turns += 1;
    s.response_text.push_str(&text);
    let message = if tool_calls.is_empty() {
      LlmMessage::assistant(text)
    } else {
      LlmMessage::assistant_with_tools(text, tool_calls.clone())
    };
    s.messages.push(message);
    s.pending_tool_calls = tool_calls;
  });
  Ok(NodeControl::Continue)
}

async fn run_tools(tools: Arc<dyn ToolBox>, state: SharedState<AgentState>) -> Result<NodeControl, AppError> {
  let (calls, events) = {
    let mut guard = state.write();
    (std::mem::take(&mut guard.pending_tool_calls), guard.events())
  };

  for call in calls {
    let started = AgentEvent::ToolStarted {
      name: call.name.clone(),
      arguments: call.arguments.clone(),
    };
    if !emit(&events, started).await {
      state.write().cancelled = true;
      return Ok(NodeControl::Halt);
    }

    let output = tools.call(&call.name, &call.arguments).await;
    debug!(tool = %call.name, output_len = output.len(), "Tool call returned.");
    state
      .write()
      .messages
      .push(LlmMessage::tool_result(call.id.clone(), output.clone()));

    let finished = AgentEvent::ToolFinished { name: call.name, output };
    if !emit(&events, finished).await {
      state.write().cancelled = true;
      return Ok(NodeControl::Halt);
    }
  }
  Ok(NodeControl::Continue)
}

pub fn build_agent_graph(
  model: Arc<dyn ChatModel>,
  tools: Arc<dyn ToolBox>,
  settings: AgentSettings,
) -> Result<CompiledGraph<AgentState, AppError>, GraphError> {
  let specs = Arc::new(tools.specs());
  let mut graph = StateGraph::<AgentState, AppError>::new().with_recursion_limit(settings.max_steps);

  graph.add_node(AGENT_NODE, move |state: SharedState<AgentState>| {
    let model = model.clone();
    let specs = specs.clone();
    Box::pin(call_model(model, specs, settings.temperature, state))
  });

  graph.add_node(TOOLS_NODE, move |state: SharedState<AgentState>| {
    let tools = tools.clone();
    Box::pin(run_tools(tools, state))
  });

  graph.add_edge(START, AGENT_NODE);
  graph.add_conditional_edges(
    AGENT_NODE,
    |s: &AgentState| {
      if s.pending_tool_calls.is_empty() {
        "end".to_string()
      } else {
        "tools".to_string()
      }
    },
    &[("tools", TOOLS_NODE), ("end", END)],
  );
  graph.add_edge(TOOLS_NODE, AGENT_NODE);

  graph.compile()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn assembler_joins_fragments_by_index() {
    let mut assembler = ToolCallAssembler::default();
    assembler.push(1, Some("b".into()), Some("get_product_details".into()), Some("{\"productId\":".into()));
    assembler.push(0, Some("a".into()), Some("search_products".into()), Some("".into()));
    assembler.push(1, None, None, Some("\"42\"}".into()));
    assembler.push(0, None, None, Some("{}".into()));
    assembler.push(2, None, None, Some("orphan".into()));

    let calls = assembler.finish();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].id, "a");
    assert_eq!(calls[0].arguments, "{}");
    assert_eq!(calls[1].name, "get_product_details");
    assert_eq!(calls[1].arguments, "{\"productId\":\"42\"}");
  }

  #[test]
  fn missing_id_gets_index_based_id() {
    let mut assembler = ToolCallAssembler::default();
    assembler.push(3, None, Some("search_orders".into()), None);
    assert_eq!(assembler.finish()[0].id, "call_3");
  }
}
