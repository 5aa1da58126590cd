// agent_graph/src/graph/hooks.rs

//! Methods for registering node handlers. Every node has three phases,
//! `before`, `on` and `after`, each holding an ordered list of handlers.
//! A handler closure may return any error type convertible into the graph's `Err`.

use crate::core::control::NodeControl;
use crate::core::node::Handler;
use crate::core::shared_state::SharedState;
use crate::error::GraphError;
use crate::graph::definition::StateGraph;
use std::future::Future;

impl<S, Err> StateGraph<S, Err>
where
  S: 'static + Send + Sync,
  Err: std::error::Error + From<GraphError> + Send + Sync + 'static,
{
  fn wrap_handler<F, UserErr>(handler_fn: impl Fn(SharedState<S>) -> F + Send + Sync + 'static) -> Handler<S, Err>
  where
    F: Future<Output = Result<NodeControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    Box::new(move |state| {
      let user_fut = handler_fn(state);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    })
  }

  /// Declares a node and registers its main (`on`) handler.
  pub fn add_node<F, UserErr>(
    &mut self,
    node_name: &str,
    handler_fn: impl Fn(SharedState<S>) -> F + Send + Sync + 'static,
  ) -> &mut Self
  where
    F: Future<Output = Result<NodeControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.declare_node(node_name);
    self.on_node(node_name, handler_fn)
  }

  /// Registers a handler that runs before the node's `on` handlers.
  pub fn before_node<F, UserErr>(
    &mut self,
    node_name: &str,
    handler_fn: impl Fn(SharedState<S>) -> F + Send + Sync + 'static,
  ) -> &mut Self
  where
    F: Future<Output = Result<NodeControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_node_exists(node_name);
    let handler = Self::wrap_handler(handler_fn);
    self.before.entry(node_name.to_string()).or_default().push(handler);
    self
  }

  /// Appends an `on` handler to an existing node.
  pub fn on_node<F, UserErr>(
    &mut self,
    node_name: &str,
    handler_fn: impl Fn(SharedState<S>) -> F + Send + Sync + 'static,
  ) -> &mut Self
  where
    F: Future<Output = Result<NodeControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_node_exists(node_name);
    let handler = Self::wrap_handler(handler_fn);
    self.on.entry(node_name.to_string()).or_default().push(handler);
    self
  }

  /// Registers a handler that runs after the node's `on` handlers.
  pub fn after_node<F, UserErr>(
    &mut self,
    node_name: &str,
    handler_fn: impl Fn(SharedState<S>) -> F + Send + Sync + 'static,
  ) -> &mut Self
  where
    F: Future<Output = Result<NodeControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_node_exists(node_name);
    let handler = Self::wrap_handler(handler_fn);
    self.after.entry(node_name.to_string()).or_default().push(handler);
    self
  }
}
