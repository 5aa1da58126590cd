pub mod control;
pub mod node;
pub mod shared_state;

pub use control::{GraphResult, NodeControl, END, START};
pub use node::{Handler, NodeDef, Router};
pub use shared_state::SharedState;
