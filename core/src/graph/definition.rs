// agent_graph/src/graph/definition.rs

//! Contains the `StateGraph<S, Err>` builder and its validated, runnable form
//! `CompiledGraph<S, Err>`.

use crate::core::control::{END, START};
use crate::core::node::{Edge, Handler, NodeDef, Router};
use crate::error::GraphError;
use std::collections::HashMap;
use std::sync::Arc;

/// Maximum number of node executions in one run unless configured otherwise.
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// A graph under construction, generic over the state type `S` and the error
/// type `Err` returned by its handlers.
///
/// `Err` must be `From<GraphError>` so that framework failures (unmapped
/// branches, recursion limit) surface through the same error type as handler
/// failures.
pub struct StateGraph<S, Err>
where
  S: 'static + Send + Sync,
  Err: std::error::Error + From<GraphError> + Send + Sync + 'static,
{
  pub(crate) nodes: Vec<NodeDef>,

  // Handlers for the three phases of each node.
  pub(crate) before: HashMap<String, Vec<Handler<S, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<S, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<S, Err>>>,

  pub(crate) edges: HashMap<String, Edge<S>>,
  pub(crate) entry: Option<String>,
  pub(crate) recursion_limit: usize,
}

impl<S, Err> Default for StateGraph<S, Err>
where
  S: 'static + Send + Sync,
  Err: std::error::Error + From<GraphError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<S, Err> StateGraph<S, Err>
where
  S: 'static + Send + Sync,
  Err: std::error::Error + From<GraphError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      nodes: Vec::new(),
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
      edges: HashMap::new(),
      entry: None,
      recursion_limit: DEFAULT_RECURSION_LIMIT,
    }
  }

  /// Panics if the node is unknown. A typo in a node name is a setup bug, not a runtime error.
  pub(crate) fn ensure_node_exists(&self, node_name: &str) {
    if !self.has_node(node_name) {
      panic!("Graph setup error: Node '{}' not found in graph definition.", node_name);
    }
  }

  fn ensure_no_outgoing_edge(&self, node_name: &str) {
    if self.edges.contains_key(node_name) {
      panic!("Graph setup error: Node '{}' already has an outgoing edge.", node_name);
    }
  }

  pub fn has_node(&self, node_name: &str) -> bool {
    self.nodes.iter().any(|n| n.name == node_name)
  }

  pub fn node_names(&self) -> Vec<&str> {
    self.nodes.iter().map(|n| n.name.as_str()).collect()
  }

  /// Declares a node without handlers. Handlers are attached with
  /// `before_node`, `on_node` or `after_node`.
  pub fn declare_node<N: Into<String>>(&mut self, node_name: N) -> &mut Self {
    let name: String = node_name.into();
    if name == START || name == END {
      panic!("Graph setup error: '{}' is a reserved node name.", name);
    }
    if self.has_node(&name) {
      panic!("Graph setup error: Node '{}' already exists in graph definition.", name);
    }
    self.nodes.push(NodeDef::new(name));
    self
  }

  /// Sets the maximum number of node executions per run.
  pub fn with_recursion_limit(mut self, limit: usize) -> Self {
    self.recursion_limit = limit;
    self
  }

  pub fn set_recursion_limit(&mut self, limit: usize) {
    self.recursion_limit = limit;
  }

  /// Adds an unconditional edge. An edge from `START` sets the entry node.
  /// Each node, `START` included, takes exactly one outgoing edge.
  pub fn add_edge(&mut self, from: &str, to: &str) -> &mut Self {
    if from == START {
      if let Some(existing) = &self.entry {
        panic!("Graph setup error: Entry point already set to '{}'.", existing);
      }
      self.entry = Some(to.to_string());
      return self;
    }
    self.ensure_node_exists(from);
    self.ensure_no_outgoing_edge(from);
    self.edges.insert(from.to_string(), Edge::Direct(to.to_string()));
    self
  }

  /// Adds a conditional edge. After `from` runs, `router` picks a key from the
  /// state and execution continues at the node mapped to that key.
  pub fn add_conditional_edges(
    &mut self,
    from: &str,
    router: impl Fn(&S) -> String + Send + Sync + 'static,
    branches: &[(&str, &str)],
  ) -> &mut Self {
    self.ensure_node_exists(from);
    self.ensure_no_outgoing_edge(from);
    let router: Router<S> = Arc::new(router);
    let branches = branches
      .iter()
      .map(|(key, target)| ((*key).to_string(), (*target).to_string()))
      .collect();
    self.edges.insert(from.to_string(), Edge::Conditional { router, branches });
    self
  }

  /// Validates the definition and freezes it into a runnable graph.
  pub fn compile(self) -> Result<CompiledGraph<S, Err>, GraphError> {
    let entry = self.entry.clone().ok_or(GraphError::NoEntryPoint)?;
    if entry != END && !self.has_node(&entry) {
      return Err(GraphError::NodeNotFound { node_name: entry });
    }

    for node in &self.nodes {
      let has_handlers = [&self.before, &self.on, &self.after]
        .iter()
        .any(|phase| phase.get(&node.name).is_some_and(|v| !v.is_empty()));
      if !has_handlers {
        return Err(GraphError::HandlerMissing {
          node_name: node.name.clone(),
        });
      }

      let edge = self.edges.get(&node.name).ok_or_else(|| GraphError::ConfigurationError {
        node_name: node.name.clone(),
        message: "node has no outgoing edge".to_string(),
      })?;
      for target in edge.targets() {
        if target != END && !self.has_node(target) {
          return Err(GraphError::NodeNotFound {
            node_name: target.to_string(),
          });
        }
      }
    }

    Ok(CompiledGraph {
      entry,
      inner: self,
    })
  }
}

/// A validated graph. Cheap to share behind an `Arc` and run concurrently;
/// each run owns its own `SharedState`.
pub struct CompiledGraph<S, Err>
where
  S: 'static + Send + Sync,
  Err: std::error::Error + From<GraphError> + Send + Sync + 'static,
{
  pub(crate) entry: String,
  pub(crate) inner: StateGraph<S, Err>,
}

impl<S, Err> CompiledGraph<S, Err>
where
  S: 'static + Send + Sync,
  Err: std::error::Error + From<GraphError> + Send + Sync + 'static,
{
  pub fn entry(&self) -> &str {
    &self.entry
  }

  pub fn recursion_limit(&self) -> usize {
    self.inner.recursion_limit
  }

  pub fn node_names(&self) -> Vec<&str> {
    self.inner.node_names()
  }
}
