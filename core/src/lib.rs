// agent_graph/src/lib.rs

//! agent_graph: an async, typed state-graph engine for LLM agents.
//!
//! A graph is a set of named nodes connected by edges:
//!  - Each node carries ordered `before` / `on` / `after` handlers.
//!  - Handlers are async and operate on a shared, lockable state `S`.
//!  - Edges are either direct or conditional (a router picks a branch key
//!    from the state).
//!  - Execution starts at the node reached from `START` and stops at `END`,
//!    when a handler halts, or when the recursion limit is exceeded.
//!  - A type-keyed registry holds one compiled graph per state type.
//!
//! ```ignore
//! let mut graph = StateGraph::<MyState, MyError>::new();
//! graph.add_node("agent", |state| Box::pin(async move { /* ... */ Ok::<_, MyError>(NodeControl::Continue) }));
//! graph.add_node("tools", |state| Box::pin(async move { /* ... */ Ok::<_, MyError>(NodeControl::Continue) }));
//! graph.add_edge(START, "agent");
//! graph.add_conditional_edges("agent", |s| if s.pending.is_empty() { "end".into() } else { "tools".into() },
//!   &[("tools", "tools"), ("end", END)]);
//! graph.add_edge("tools", "agent");
//! let compiled = graph.compile()?;
//! compiled.invoke(SharedState::new(MyState::default())).await?;
//! ```

pub mod core;
pub mod error;
pub mod graph;
pub mod registry;

pub use crate::core::control::{GraphResult, NodeControl, END, START};
pub use crate::core::node::{Handler, NodeDef, Router};
pub use crate::core::shared_state::SharedState;

pub use crate::graph::definition::{CompiledGraph, StateGraph, DEFAULT_RECURSION_LIMIT};

pub use crate::error::{GraphError, GraphResultOf};

pub use crate::registry::GraphRegistry;
