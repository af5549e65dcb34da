pub mod edge;
mod graph;
pub mod node;
mod workflow;

pub(crate) use graph::WorkflowGraph;
pub use workflow::Workflow;
