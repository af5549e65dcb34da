//! Wire-level workflow shapes.
//!
//! These structs mirror the JSON written by the graph editor and read by the
//! execution runtime. They are loosely typed on purpose: `type` and `data` are
//! kept raw here and checked when converted into a [`crate::Workflow`].

mod edge;
mod node;
mod workflow;

pub use edge::EdgeModel;
pub use node::{NodeModel, Position};
pub use workflow::WorkflowModel;
