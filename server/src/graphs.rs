// commerce_server/src/graphs.rs

//! Builds and registers every graph the server runs.

use agent_graph::{GraphError, GraphRegistry};
use std::sync::Arc;

use crate::agent::demo::build_demo_graph;
use crate::agent::{build_agent_graph, AgentSettings, CommerceTools, ToolBox};
use crate::errors::AppError;
use crate::llm::openai::OpenAiClient;
use crate::llm::ChatModel;
use crate::state::AppState;

/// Registers the commerce agent (OpenAI model over the storefront tools) and
/// the demo graph. Called once at startup.
pub fn register_all_graphs(registry: &GraphRegistry<AppError>, app_state: &AppState) -> Result<(), GraphError> {
  tracing::info!("Registering graphs...");

  let model: Arc<dyn ChatModel> = Arc::new(OpenAiClient::from_config(&app_state.config));
  let tools: Arc<dyn ToolBox> = Arc::new(CommerceTools::new(app_state.db_pool.clone()));
  let settings = AgentSettings {
    temperature: app_state.config.openai_temperature,
    max_steps: app_state.config.agent_max_steps,
  };
  register_agent_graph(registry, model, tools, settings)?;
  registry.register_graph(build_demo_graph()?);

  tracing::info!("All application graphs registered.");
  Ok(())
}

pub fn register_agent_graph(
  registry: &GraphRegistry<AppError>,
  model: Arc<dyn ChatModel>,
  tools: Arc<dyn ToolBox>,
  settings: AgentSettings,
) -> Result<(), GraphError> {
  tracing::info!(model = %model.model_name(), max_steps = settings.max_steps, "Registering commerce agent graph.");
  registry.register_graph(build_agent_graph(model, tools, settings)?);
  Ok(())
}
