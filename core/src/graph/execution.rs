// agent_graph/src/graph/execution.rs

//! Contains `CompiledGraph::invoke()`, which walks the graph from its entry
//! node to `END`, running each node's handlers and following its edges.

use crate::core::control::{GraphResult, NodeControl, END};
use crate::core::node::{Edge, Handler};
use crate::core::shared_state::SharedState;
use crate::error::GraphError;
use crate::graph::definition::CompiledGraph;
use tracing::{event, info_span, instrument, Instrument, Level};

enum PhaseOutcome {
  Continue,
  Halted,
}

impl<S, Err> CompiledGraph<S, Err>
where
  S: 'static + Send + Sync,
  Err: std::error::Error + From<GraphError> + Send + Sync + 'static,
{
  /// Runs the graph against `state`.
  ///
  /// Returns `GraphResult::Completed` once an edge leads to `END`, or
  /// `GraphResult::Halted` if a handler returned `NodeControl::Halt`.
  /// Handler errors are returned unchanged; framework errors (unmapped
  /// branch, recursion limit) are converted through `Err: From<GraphError>`.
  #[instrument(
    name = "CompiledGraph::invoke",
    skip_all,
    fields(
      graph_state_type = %std::any::type_name::<S>(),
      entry = %self.entry,
      recursion_limit = self.inner.recursion_limit,
    ),
    err(Display)
  )]
  pub async fn invoke(&self, state: SharedState<S>) -> Result<GraphResult, Err> {
    event!(Level::DEBUG, "Graph execution starting.");
    let mut current = self.entry.clone();
    let mut executed = 0usize;

    while current != END {
      if executed >= self.inner.recursion_limit {
        event!(Level::ERROR, executed, "Recursion limit reached.");
        return Err(Err::from(GraphError::RecursionLimit {
          limit: self.inner.recursion_limit,
        }));
      }
      executed += 1;

      let node_span = info_span!("graph_node", node_name = %current, step_index = executed);
      let outcome = self.run_node(&current, state.clone()).instrument(node_span).await?;
      if let PhaseOutcome::Halted = outcome {
        event!(Level::INFO, node_name = %current, "Graph halted by a handler.");
        return Ok(GraphResult::Halted);
      }

      current = self.next_node(&current, &state)?;
      event!(Level::TRACE, next = %current, "Following edge.");
    }

    event!(Level::DEBUG, executed, "Graph execution completed.");
    Ok(GraphResult::Completed)
  }

  async fn run_node(&self, node_name: &str, state: SharedState<S>) -> Result<PhaseOutcome, Err> {
    for (phase_name, phase) in [("before", &self.inner.before), ("on", &self.inner.on), ("after", &self.inner.after)] {
      if let Some(handlers) = phase.get(node_name) {
        if let PhaseOutcome::Halted = Self::run_phase(phase_name, handlers, &state).await? {
          return Ok(PhaseOutcome::Halted);
        }
      }
    }
    Ok(PhaseOutcome::Continue)
  }

  async fn run_phase(
    phase_name: &'static str,
    handlers: &[Handler<S, Err>],
    state: &SharedState<S>,
  ) -> Result<PhaseOutcome, Err> {
    for (handler_idx, handler_fn) in handlers.iter().enumerate() {
      event!(Level::TRACE, phase = phase_name, handler_index = handler_idx, "Executing handler.");
      match handler_fn(state.clone()).await {
        Ok(NodeControl::Continue) => {}
        Ok(NodeControl::Halt) => return Ok(PhaseOutcome::Halted),
        Err(e) => {
          event!(Level::ERROR, phase = phase_name, error = %e, "Node handler failed.");
          return Err(e);
        }
      }
    }
    Ok(PhaseOutcome::Continue)
  }

  fn next_node(&self, node_name: &str, state: &SharedState<S>) -> Result<String, Err> {
    let edge = self.inner.edges.get(node_name).ok_or_else(|| {
      Err::from(GraphError::ConfigurationError {
        node_name: node_name.to_string(),
        message: "node has no outgoing edge".to_string(),
      })
    })?;

    match edge {
      Edge::Direct(target) => Ok(target.clone()),
      Edge::Conditional { router, branches } => {
        let branch = {
          let guard = state.read();
          router(&guard)
        };
        branches
          .iter()
          .find(|(key, _)| *key == branch)
          .map(|(_, target)| target.clone())
          .ok_or_else(|| {
            Err::from(GraphError::RouteUnmapped {
              node_name: node_name.to_string(),
              branch,
            })
          })
      }
    }
  }
}
