// agent_graph/src/graph/mod.rs

//! The `StateGraph<S, Err>` builder, its hooks, and the compiled, runnable graph.

pub mod definition;
pub mod execution;
pub mod hooks;

pub use definition::{CompiledGraph, StateGraph, DEFAULT_RECURSION_LIMIT};
