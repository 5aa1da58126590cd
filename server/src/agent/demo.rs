// commerce_server/src/agent/demo.rs

//! A three-node sample graph: `validate`, then `process` repeated until
//! `step` reaches 3, then `end`.

use agent_graph::{CompiledGraph, GraphError, NodeControl, SharedState, StateGraph, END, START};
use serde::{Deserialize, Serialize};

pub const MAX_DEMO_STEPS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoMessage {
  pub role: String,
  pub content: String,
}

impl DemoMessage {
  fn new(role: &str, content: impl Into<String>) -> Self {
    Self {
      role: role.to_string(),
      content: content.into(),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoState {
  pub messages: Vec<DemoMessage>,
  pub step: u32,
}

impl DemoState {
  pub fn from_user_message(message: impl Into<String>) -> Self {
    Self {
      messages: vec![DemoMessage::new("user", message)],
      step: 0,
    }
  }
}

pub fn build_demo_graph() -> Result<CompiledGraph<DemoState, GraphError>, GraphError> {
  let mut graph = StateGraph::<DemoState, GraphError>::new();

  graph.add_node("validate", |state: SharedState<DemoState>| {
    Box::pin(async move {
      state.update(|s| {
        if s.messages.is_empty() {
          s.messages.push(DemoMessage::new("system", "No messages found. Please provide a message."));
        }
      });
      Ok::<NodeControl, GraphError>(NodeControl::Continue)
    })
  });

  graph.add_node("process", |state: SharedState<DemoState>| {
    Box::pin(async move {
      state.update(|s| {
        let last = s.messages.last().map(|m| m.content.clone()).unwrap_or_default();
        let content = format!("Processed: {} (step {})", last, s.step);
        s.messages.push(DemoMessage::new("assistant", content));
        s.step += 1;
      });
      Ok::<NodeControl, GraphError>(NodeControl::Continue)
    })
  });

  graph.add_node("end", |state: SharedState<DemoState>| {
    Box::pin(async move {
      state
        .write()
        .messages
        .push(DemoMessage::new("system", "Graph execution completed."));
      Ok::<NodeControl, GraphError>(NodeControl::Continue)
    })
  });

  graph.add_edge(START, "validate").add_edge("validate", "process");
  graph.add_conditional_edges(
    "process",
    |s: &DemoState| {
      if s.step >= MAX_DEMO_STEPS {
        "end".to_string()
      } else {
        "continue".to_string()
      }
    },
    &[("continue", "process"), ("end", "end")],
  );
  graph.add_edge("end", END);

  graph.compile()
}
