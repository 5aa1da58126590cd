// tests/graph_execution_tests.rs
mod common;

use agent_graph::{GraphResult, NodeControl, SharedState, StateGraph, END, START};
use common::*;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_graph_runs_linear_nodes_in_order() {
  setup_tracing();
  let mut graph = StateGraph::<TestState, TestError>::new();
  graph.add_node("n1", recording_handler("n1", " N1"));
  graph.add_node("n2", recording_handler("n2", " N2"));
  graph.add_node("n3", recording_handler("n3", " N3"));
  graph.add_edge(START, "n1").add_edge("n1", "n2").add_edge("n2", "n3").add_edge("n3", END);
  let compiled = graph.compile().unwrap();

  let state = SharedState::new(TestState::default());
  let result = compiled.invoke(state.clone()).await;

  assert_eq!(result.unwrap(), GraphResult::Completed);
  let guard = state.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.message, " N1 N2 N3");
  assert_eq!(guard.nodes_visited, vec!["n1", "n2", "n3"]);
}

#[tokio::test]
#[serial]
async fn test_graph_halts_on_node_control_halt() {
  setup_tracing();
  let mut graph = StateGraph::<TestState, TestError>::new();
  graph.add_node("a", recording_handler("a", "A"));
  graph.add_node("b", recording_handler("b", "B"));
  graph.add_node("c", recording_handler("c", "C"));
  graph.add_edge(START, "a").add_edge("a", "b").add_edge("b", "c").add_edge("c", END);
  let compiled = graph.compile().unwrap();

  let state = SharedState::new(TestState {
    halt_at: Some("b".to_string()),
    ..Default::default()
  });
  let result = compiled.invoke(state.clone()).await;

  assert_eq!(result.unwrap(), GraphResult::Halted);
  assert_eq!(state.read().nodes_visited, vec!["a", "b"]);
  assert_eq!(state.read().message, "AB");
}

#[tokio::test]
#[serial]
async fn test_graph_propagates_handler_error() {
  setup_tracing();
  let mut graph = StateGraph::<TestState, TestError>::new();
  graph.add_node("good", recording_handler("good", "Good"));
  graph.add_node("bad", failing_handler("bad", "I am a bad node!"));
  graph.add_node("never", recording_handler("never", "NeverRun"));
  graph.add_edge(START, "good").add_edge("good", "bad").add_edge("bad", "never").add_edge("never", END);
  let compiled = graph.compile().unwrap();

  let state = SharedState::new(TestState::default());
  let result = compiled.invoke(state.clone()).await;

  match result {
    Err(TestError::Handler(msg)) => assert_eq!(msg, "I am a bad node!"),
    other => panic!("Expected TestError::Handler, got {:?}", other),
  }
  assert_eq!(state.read().nodes_visited, vec!["good", "bad"]);
}

#[tokio::test]
#[serial]
async fn test_graph_loops_until_router_picks_end() {
  setup_tracing();
  let mut graph = StateGraph::<TestState, TestError>::new();
  graph.add_node("work", recording_handler("work", "w"));
  graph.add_node("finish", recording_handler("finish", "!"));
  graph.add_edge(START, "work");
  graph.add_conditional_edges(
    "work",
    |s: &TestState| if s.counter >= 3 { "done".to_string() } else { "again".to_string() },
    &[("again", "work"), ("done", "finish")],
  );
  graph.add_edge("finish", END);
  let compiled = graph.compile().unwrap();

  let state = SharedState::new(TestState::default());
  let result = compiled.invoke(state.clone()).await.unwrap();

  assert_eq!(result, GraphResult::Completed);
  assert_eq!(state.read().message, "www!");
  assert_eq!(state.read().nodes_visited, vec!["work", "work", "work", "finish"]);
}

#[tokio::test]
#[serial]
async fn test_conditional_edge_can_route_straight_to_end() {
  setup_tracing();
  let mut graph = StateGraph::<TestState, TestError>::new();
  graph.add_node("agent", recording_handler("agent", "a"));
  graph.add_node("tools", recording_handler("tools", "t"));
  graph.add_edge(START, "agent");
  graph.add_conditional_edges(
    "agent",
    |s: &TestState| s.route.clone().unwrap_or_else(|| "end".to_string()),
    &[("tools", "tools"), ("end", END)],
  );
  graph.add_edge("tools", END);
  let compiled = graph.compile().unwrap();

  let state = SharedState::new(TestState::default());
  assert_eq!(compiled.invoke(state.clone()).await.unwrap(), GraphResult::Completed);
  assert_eq!(state.read().nodes_visited, vec!["agent"]);

  let routed = SharedState::new(TestState {
    route: Some("tools".to_string()),
    ..Default::default()
  });
  compiled.invoke(routed.clone()).await.unwrap();
  assert_eq!(routed.read().nodes_visited, vec!["agent", "tools"]);
}

#[tokio::test]
#[serial]
async fn test_before_and_after_handlers_wrap_node() {
  setup_tracing();
  let mut graph = StateGraph::<TestState, TestError>::new();
  graph.add_node("main", recording_handler("main", "[main]"));
  graph.before_node("main", recording_handler("before", "[before]"));
  graph.after_node("main", recording_handler("after", "[after]"));
  graph.on_node("main", recording_handler("main_extra", "[extra]"));
  graph.add_edge(START, "main").add_edge("main", END);
  let compiled = graph.compile().unwrap();

  let state = SharedState::new(TestState::default());
  compiled.invoke(state.clone()).await.unwrap();

  assert_eq!(state.read().message, "[before][main][extra][after]");
}

#[tokio::test]
#[serial]
async fn test_halt_in_before_handler_skips_on_handlers() {
  setup_tracing();
  let mut graph = StateGraph::<TestState, TestError>::new();
  graph.add_node("main", recording_handler("main", "[main]"));
  graph.before_node("main", |state: SharedState<TestState>| {
    Box::pin(async move {
      state.write().nodes_visited.push("guard".to_string());
      Ok::<NodeControl, TestError>(NodeControl::Halt)
    })
  });
  graph.add_edge(START, "main").add_edge("main", END);
  let compiled = graph.compile().unwrap();

  let state = SharedState::new(TestState::default());
  assert_eq!(compiled.invoke(state.clone()).await.unwrap(), GraphResult::Halted);
  assert_eq!(state.read().nodes_visited, vec!["guard"]);
  assert!(state.read().message.is_empty());
}

#[tokio::test]
#[serial]
async fn test_compiled_graph_is_reusable_across_runs() {
  setup_tracing();
  let mut graph = StateGraph::<TestState, TestError>::new();
  graph.add_node("only", recording_handler("only", "x"));
  graph.add_edge(START, "only").add_edge("only", END);
  let compiled = std::sync::Arc::new(graph.compile().unwrap());

  let mut handles = Vec::new();
  for _ in 0..4 {
    let compiled = compiled.clone();
    handles.push(tokio::spawn(async move {
      let state = SharedState::new(TestState::default());
      compiled.invoke(state.clone()).await.unwrap();
      state.snapshot()
    }));
  }
  for handle in handles {
    let finished = handle.await.unwrap();
    assert_eq!(finished.counter, 1);
    assert_eq!(finished.message, "x");
  }
}
