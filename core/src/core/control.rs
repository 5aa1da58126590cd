// agent_graph/src/core/control.rs

//! Signals for controlling graph flow and the outcome of a graph run.

/// Virtual node name marking where execution begins.
pub const START: &str = "__start__";

/// Virtual node name marking where execution ends.
pub const END: &str = "__end__";

/// Signal from a node handler indicating whether the run should go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeControl {
  /// Run the remaining handlers of this node, then follow its outgoing edge.
  Continue,
  /// Stop the run immediately. No further handlers or nodes are executed.
  Halt,
}

/// Outcome of a full graph execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphResult {
  /// Execution followed the edges until it reached `END`.
  Completed,
  /// A handler returned `NodeControl::Halt`.
  Halted,
}
