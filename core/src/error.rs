// agent_graph/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
  #[error("Node not found: {node_name}")]
  NodeNotFound { node_name: String },

  #[error("Node '{node_name}' has no handlers")]
  HandlerMissing { node_name: String },

  #[error("Graph has no entry point (add an edge from START)")]
  NoEntryPoint,

  #[error("Router for node '{node_name}' returned unmapped branch '{branch}'")]
  RouteUnmapped { node_name: String, branch: String },

  #[error("Recursion limit of {limit} node executions reached without hitting END")]
  RecursionLimit { limit: usize },

  #[error("Error in user-provided handler or external operation. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Configuration error for node '{node_name}': {message}")]
  ConfigurationError { node_name: String, message: String },

  #[error("Type mismatch when dispatching graph state (expected {expected_type})")]
  TypeMismatch { expected_type: String },

  #[error("Internal graph error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for GraphError {
  fn from(err: AnyhowError) -> Self {
    // Unwrap a GraphError that was boxed into anyhow by a handler instead of nesting it.
    match err.downcast::<GraphError>() {
      Ok(graph_err) => graph_err,
      Err(source) => GraphError::HandlerError { source },
    }
  }
}

pub type GraphResultOf<T, E = GraphError> = std::result::Result<T, E>;
