//! # Agentflow
//!
//! Agentflow models the decision graph of a supervisor agent: typed nodes
//! (start, delegate, conditional, synthesize, merge, end) joined by labeled
//! edges. It checks the graph's structure and resolves a deterministic
//! execution plan for an external runtime to walk.
//!
//! ## Core Features
//!
//! - **Typed Graph Model**: node configuration is a sum type keyed by kind
//! - **Validation**: every structural error is reported at once, for editor highlighting
//! - **Execution Plans**: layered topological order with conditional branches and OR-joins
//! - **Stable JSON**: the `{ nodes, edges }` shape shared with the editor and the runtime
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use agentflow::PlannerBuilder;
//!
//! let planner = PlannerBuilder::new().build()?;
//!
//! let workflow = planner.load(json_str)?;
//! let plan = planner.plan(&workflow)?;
//! for step in plan.steps.iter() {
//!     println!("{} after {:?}", step.node_id, step.depends_on);
//! }
//! ```

mod builder;
mod common;
mod config;
mod editor;
mod error;
mod model;
mod planner;
mod resolver;
mod store;
mod validator;
mod workflow;

pub use builder::PlannerBuilder;
pub use config::{Config, LimitsConfig};
pub use editor::Editor;
pub use error::AgentflowError;
pub use model::*;
pub use planner::Planner;
pub use resolver::{JoinPolicy, Plan, Step, resolve_order};
pub use store::{MemStore, WorkflowStore};
pub use validator::{ValidationError, ValidationResult, validate};
pub use workflow::{
    Workflow,
    edge::{Edge, EdgeId, SourceHandle},
    node::{ConditionConfig, ConditionOperator, DelegateConfig, Node, NodeConfig, NodeId, NodeKind, SynthesizeConfig},
};

/// Result type alias for Agentflow operations.
pub type Result<T> = std::result::Result<T, AgentflowError>;
