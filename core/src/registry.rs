// agent_graph/src/registry.rs

//! Defines `GraphRegistry<E>`, a type-keyed registry of compiled graphs.
//! One graph is registered per state type; running a `SharedState<S>`
//! dispatches to the graph registered for `S`.

use crate::core::control::GraphResult;
use crate::core::shared_state::SharedState;
use crate::error::GraphError;
use crate::graph::definition::CompiledGraph;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Type-erased graph runner. `ApplicationError` is what `GraphRegistry::run` returns.
#[async_trait]
trait AnyGraphRunner<ApplicationError>: Send + Sync
where
  ApplicationError: std::error::Error + Send + Sync + 'static,
{
  /// `state_obj` must hold a `SharedState<S>` for the runner's `S`.
  async fn run_erased(&self, state_obj: Box<dyn Any + Send>) -> Result<GraphResult, ApplicationError>;
}

struct GraphWrapper<S, GraphErr, ApplicationError>
where
  S: 'static + Send + Sync,
  GraphErr: std::error::Error + From<GraphError> + Send + Sync + 'static,
  ApplicationError: std::error::Error + From<GraphErr> + From<GraphError> + Send + Sync + 'static,
{
  graph: Arc<CompiledGraph<S, GraphErr>>,
  _phantom: PhantomData<fn() -> ApplicationError>,
}

#[async_trait]
impl<S, GraphErr, ApplicationError> AnyGraphRunner<ApplicationError> for GraphWrapper<S, GraphErr, ApplicationError>
where
  S: 'static + Send + Sync,
  GraphErr: std::error::Error + From<GraphError> + Send + Sync + 'static,
  ApplicationError: std::error::Error + From<GraphErr> + From<GraphError> + Send + Sync + 'static,
{
  async fn run_erased(&self, state_obj: Box<dyn Any + Send>) -> Result<GraphResult, ApplicationError> {
    let state = match state_obj.downcast::<SharedState<S>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        let expected_type = std::any::type_name::<SharedState<S>>().to_string();
        event!(Level::ERROR, %expected_type, "Graph state type mismatch.");
        return Err(ApplicationError::from(GraphError::TypeMismatch { expected_type }));
      }
    };
    self.graph.invoke(state).await.map_err(ApplicationError::from)
  }
}

/// The graph registry. `ApplicationError` must be constructible from
/// `GraphError` to report registry-level failures such as a missing graph.
pub struct GraphRegistry<ApplicationError = GraphError>
where
  ApplicationError: std::error::Error + From<GraphError> + Send + Sync + 'static,
{
  graphs: RwLock<HashMap<TypeId, Arc<dyn AnyGraphRunner<ApplicationError>>>>,
}

impl<ApplicationError> Default for GraphRegistry<ApplicationError>
where
  ApplicationError: std::error::Error + From<GraphError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<ApplicationError> GraphRegistry<ApplicationError>
where
  ApplicationError: std::error::Error + From<GraphError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      graphs: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `graph` for its state type `S`, replacing any previous graph for `S`.
  pub fn register_graph<S, GraphErr>(&self, graph: CompiledGraph<S, GraphErr>)
  where
    S: 'static + Send + Sync,
    GraphErr: std::error::Error + From<GraphError> + Send + Sync + 'static,
    ApplicationError: From<GraphErr>,
  {
    event!(Level::DEBUG, state_type = %std::any::type_name::<S>(), "Registering graph.");
    let wrapper = GraphWrapper::<S, GraphErr, ApplicationError> {
      graph: Arc::new(graph),
      _phantom: PhantomData,
    };
    self.graphs.write().insert(TypeId::of::<S>(), Arc::new(wrapper));
  }

  pub fn contains<S: 'static + Send + Sync>(&self) -> bool {
    self.graphs.read().contains_key(&TypeId::of::<S>())
  }

  /// Runs the graph registered for `S` against `state`.
  #[instrument(name = "GraphRegistry::run", skip_all, fields(state_type = %std::any::type_name::<S>()))]
  pub async fn run<S>(&self, state: SharedState<S>) -> Result<GraphResult, ApplicationError>
  where
    S: 'static + Send + Sync,
  {
    let runner = {
      let graphs = self.graphs.read();
      graphs.get(&TypeId::of::<S>()).cloned()
    };

    let runner = runner.ok_or_else(|| {
      let type_name = std::any::type_name::<S>();
      event!(Level::ERROR, "No graph registered for state type {}.", type_name);
      ApplicationError::from(GraphError::ConfigurationError {
        node_name: "GraphRegistry::run".to_string(),
        message: format!("No graph registered for state type {}", type_name),
      })
    })?;

    runner.run_erased(Box::new(state)).await
  }
}
