// tests/error_handling_tests.rs
mod common;

use agent_graph::{GraphError, NodeControl, SharedState, StateGraph, END, START};
use common::*;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_recursion_limit_stops_endless_loop() {
  setup_tracing();
  let mut graph = StateGraph::<TestState, TestError>::new().with_recursion_limit(5);
  graph.add_node("spin", recording_handler("spin", "."));
  graph.add_edge(START, "spin").add_edge("spin", "spin");
  let compiled = graph.compile().unwrap();
  assert_eq!(compiled.recursion_limit(), 5);

  let state = SharedState::new(TestState::default());
  let result = compiled.invoke(state.clone()).await;

  match result {
    Err(TestError::Graph(s)) => {
      assert!(s.contains("RecursionLimit"));
      assert!(s.contains('5'));
    }
    other => panic!("Expected recursion limit error, got {:?}", other),
  }
  assert_eq!(state.read().counter, 5);
}

#[tokio::test]
#[serial]
async fn test_unmapped_branch_is_an_error() {
  setup_tracing();
  let mut graph = StateGraph::<TestState, TestError>::new();
  graph.add_node("decide", recording_handler("decide", ""));
  graph.add_edge(START, "decide");
  graph.add_conditional_edges("decide", |_s: &TestState| "nowhere".to_string(), &[("end", END)]);
  let compiled = graph.compile().unwrap();

  let result = compiled.invoke(SharedState::new(TestState::default())).await;
  match result {
    Err(TestError::Graph(s)) => {
      assert!(s.contains("RouteUnmapped"));
      assert!(s.contains("nowhere"));
    }
    other => panic!("Expected RouteUnmapped, got {:?}", other),
  }
}

#[test]
fn test_compile_requires_entry_point() {
  let mut graph = StateGraph::<TestState, TestError>::new();
  graph.add_node("orphan", recording_handler("orphan", ""));
  graph.add_edge("orphan", END);
  assert!(matches!(graph.compile(), Err(GraphError::NoEntryPoint)));
}

#[test]
fn test_compile_rejects_unknown_edge_target() {
  let mut graph = StateGraph::<TestState, TestError>::new();
  graph.add_node("a", recording_handler("a", ""));
  graph.add_edge(START, "a").add_edge("a", "ghost");
  match graph.compile() {
    Err(GraphError::NodeNotFound { node_name }) => assert_eq!(node_name, "ghost"),
    other => panic!("Expected NodeNotFound, got {:?}", other.err()),
  }
}

#[test]
fn test_compile_rejects_node_without_outgoing_edge() {
  let mut graph = StateGraph::<TestState, TestError>::new();
  graph.add_node("a", recording_handler("a", ""));
  graph.add_node("dead_end", recording_handler("dead_end", ""));
  graph.add_edge(START, "a").add_edge("a", "dead_end");
  assert!(matches!(
    graph.compile(),
    Err(GraphError::ConfigurationError { node_name, .. }) if node_name == "dead_end"
  ));
}

#[test]
fn test_compile_rejects_declared_node_without_handlers() {
  let mut graph = StateGraph::<TestState, TestError>::new();
  graph.declare_node("empty");
  graph.add_edge(START, "empty").add_edge("empty", END);
  assert!(matches!(graph.compile(), Err(GraphError::HandlerMissing { node_name }) if node_name == "empty"));
}

#[test]
#[should_panic(expected = "already exists")]
fn test_duplicate_node_name_panics() {
  let mut graph = StateGraph::<TestState, TestError>::new();
  graph.add_node("twice", recording_handler("twice", ""));
  graph.add_node("twice", recording_handler("twice", ""));
}

#[test]
#[should_panic(expected = "not found")]
fn test_edge_from_unknown_node_panics() {
  let mut graph = StateGraph::<TestState, TestError>::new();
  graph.add_edge("missing", END);
}

#[test]
#[should_panic(expected = "already has an outgoing edge")]
fn test_second_edge_from_same_node_panics() {
  let mut graph = StateGraph::<TestState, TestError>::new();
  graph.add_node("a", recording_handler("a", ""));
  graph.add_node("b", recording_handler("b", ""));
  graph.add_edge(START, "a").add_edge("a", "b");
  graph.add_edge("a", END);
}

#[test]
#[should_panic(expected = "already has an outgoing edge")]
fn test_conditional_edge_after_direct_edge_panics() {
  let mut graph = StateGraph::<TestState, TestError>::new();
  graph.add_node("a", recording_handler("a", ""));
  graph.add_edge(START, "a").add_edge("a", END);
  graph.add_conditional_edges("a", |_s: &TestState| "end".to_string(), &[("end", END)]);
}

#[test]
#[should_panic(expected = "Entry point already set to 'a'")]
fn test_second_entry_edge_panics() {
  let mut graph = StateGraph::<TestState, TestError>::new();
  graph.add_node("a", recording_handler("a", ""));
  graph.add_node("b", recording_handler("b", ""));
  graph.add_edge(START, "a");
  graph.add_edge(START, "b");
}

// A graph whose error type IS GraphError.
#[tokio::test]
#[serial]
async fn test_graph_with_graph_error_type() {
  setup_tracing();
  let mut graph = StateGraph::<TestState, GraphError>::new();
  graph.add_node("fail", |_state: SharedState<TestState>| {
    Box::pin(async move { Err::<NodeControl, anyhow::Error>(anyhow::anyhow!("disk on fire")) })
  });
  graph.add_edge(START, "fail").add_edge("fail", END);
  let compiled = graph.compile().unwrap();

  match compiled.invoke(SharedState::new(TestState::default())).await {
    Err(GraphError::HandlerError { source }) => assert_eq!(source.to_string(), "disk on fire"),
    other => panic!("Expected HandlerError, got {:?}", other),
  }
}

#[test]
fn test_anyhow_wrapping_graph_error_is_unwrapped() {
  let wrapped = anyhow::Error::new(GraphError::NoEntryPoint);
  assert!(matches!(GraphError::from(wrapped), GraphError::NoEntryPoint));
}
