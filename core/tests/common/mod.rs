// tests/common/mod.rs
#![allow(dead_code)]

use agent_graph::{GraphError, NodeControl, SharedState};
use std::future::Future;
use std::pin::Pin;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

pub type NodeFuture = Pin<Box<dyn Future<Output = Result<NodeControl, TestError>> + Send>>;

// --- Common State Structs ---
#[derive(Clone, Debug, Default)]
pub struct TestState {
  pub counter: i32,
  pub message: String,
  pub nodes_visited: Vec<String>,
  pub halt_at: Option<String>,
  pub route: Option<String>,
}

// --- Common Error Type for Tests ---
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Graph framework error: {0}")]
  Graph(String),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<GraphError> for TestError {
  fn from(ge: GraphError) -> Self {
    TestError::Graph(format!("{:?}", ge))
  }
}

// --- Common Handler Creators ---
pub fn recording_handler(
  node_name: &'static str,
  message_to_append: &'static str,
) -> impl Fn(SharedState<TestState>) -> NodeFuture + Send + Sync + 'static {
  move |state: SharedState<TestState>| -> NodeFuture {
    Box::pin(async move {
      let mut guard = state.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.nodes_visited.push(node_name.to_string());
      tracing::debug!(target: "test_handlers", node = node_name, "executed, counter: {}", guard.counter);
      if guard.halt_at.as_deref() == Some(node_name) {
        return Ok::<NodeControl, TestError>(NodeControl::Halt);
      }
      Ok::<NodeControl, TestError>(NodeControl::Continue)
    })
  }
}

pub fn failing_handler(
  node_name: &'static str,
  error_message: &'static str,
) -> impl Fn(SharedState<TestState>) -> NodeFuture + Send + Sync + 'static {
  move |state: SharedState<TestState>| -> NodeFuture {
    Box::pin(async move {
      state.write().nodes_visited.push(node_name.to_string());
      tracing::warn!(target: "test_handlers", node = node_name, "failing with: '{}'", error_message);
      Err::<NodeControl, TestError>(TestError::Handler(error_message.to_string()))
    })
  }
}

pub fn counting_handler(
  counter: Arc<AtomicUsize>,
) -> impl Fn(SharedState<TestState>) -> NodeFuture + Send + Sync + 'static {
  move |_state: SharedState<TestState>| -> NodeFuture {
    let counter = counter.clone();
    Box::pin(async move {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok::<NodeControl, TestError>(NodeControl::Continue)
    })
  }
}

// --- Helper for Tracing Setup ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
