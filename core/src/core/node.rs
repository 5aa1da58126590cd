// agent_graph/src/core/node.rs

//! Node definitions, handler and router type aliases.

use super::control::NodeControl;
use super::shared_state::SharedState;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for a node handler.
///
/// A handler takes ownership of a `SharedState<S>` (a clone of the run's state
/// `Arc`) and returns a boxed `Future` resolving to `Result<NodeControl, Err>`.
///
/// Handlers must drop any lock guard obtained from the state BEFORE the next
/// `.await` suspension point.
pub type Handler<S, Err> =
  Box<dyn Fn(SharedState<S>) -> Pin<Box<dyn Future<Output = Result<NodeControl, Err>> + Send>> + Send + Sync>;

/// Picks a branch key from the current state. Used by conditional edges.
pub type Router<S> = Arc<dyn Fn(&S) -> String + Send + Sync + 'static>;

/// Definition of a graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDef {
  pub name: String,
}

impl NodeDef {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into() }
  }
}

/// Outgoing edge of a node.
pub(crate) enum Edge<S: 'static + Send + Sync> {
  Direct(String),
  Conditional {
    router: Router<S>,
    branches: Vec<(String, String)>,
  },
}

impl<S: 'static + Send + Sync> Edge<S> {
  pub(crate) fn targets(&self) -> Vec<&str> {
    match self {
      Edge::Direct(target) => vec![target.as_str()],
      Edge::Conditional { branches, .. } => branches.iter().map(|(_, target)| target.as_str()).collect(),
    }
  }
}

impl<S: 'static + Send + Sync> std::fmt::Debug for Edge<S> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Edge::Direct(target) => f.debug_tuple("Direct").field(target).finish(),
      Edge::Conditional { branches, .. } => f.debug_struct("Conditional").field("branches", branches).finish(),
    }
  }
}
