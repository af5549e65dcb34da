//! Planner - the main entry point for Agentflow.
//!
//! The planner ties the pieces together for callers that receive workflow
//! JSON from the editor or the store:
//! - Parsing the wire shape into a typed [`Workflow`]
//! - Enforcing the configured size limits
//! - Validating, then resolving an execution [`Plan`]

use tracing::{debug, warn};

use crate::{
    AgentflowError, Config, Result,
    model::WorkflowModel,
    resolver::{Plan, resolve_order},
    validator::{ValidationResult, validate},
    workflow::Workflow,
};

/// Configured workflow planner.
///
/// # Example
///
/// ```rust,ignore
/// let planner = PlannerBuilder::new().max_nodes(200).build()?;
/// let workflow = planner.load(json_str)?;
/// let plan = planner.plan(&workflow)?;
/// ```
pub struct Planner {
    config: Config,
}

impl Planner {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parses workflow JSON, rejecting graphs beyond the configured limits.
    pub fn load(
        &self,
        json: &str,
    ) -> Result<Workflow> {
        let model = WorkflowModel::from_json(json)?;
        self.load_model(&model)
    }

    pub fn load_model(
        &self,
        model: &WorkflowModel,
    ) -> Result<Workflow> {
        debug!(nodes = model.nodes.len(), edges = model.edges.len(), "loading workflow");
        self.check_limits(model.nodes.len(), model.edges.len())?;
        Workflow::try_from(model)
    }

    pub fn validate(
        &self,
        workflow: &Workflow,
    ) -> ValidationResult {
        validate(workflow)
    }

    /// Validates `workflow` and resolves its execution order.
    ///
    /// Returns [`AgentflowError::Validation`] with every structural error when
    /// the workflow is invalid, or [`AgentflowError::CyclicGraph`] when it
    /// loops without a conditional exit.
    pub fn plan(
        &self,
        workflow: &Workflow,
    ) -> Result<Plan> {
        self.check_limits(workflow.nodes.len(), workflow.edges.len())?;
        validate(workflow).into_result()?;

        let plan = resolve_order(workflow).inspect_err(|e| warn!("workflow cannot be planned: {}", e))?;
        debug!(steps = plan.steps.len(), back_edges = plan.back_edges.len(), "workflow planned");
        Ok(plan)
    }

    fn check_limits(
        &self,
        nodes: usize,
        edges: usize,
    ) -> Result<()> {
        let limits = &self.config.limits;
        if nodes > limits.max_nodes {
            return Err(AgentflowError::Workflow(format!("workflow has {} nodes, exceeds max_nodes {}", nodes, limits.max_nodes)));
        }
        if edges > limits.max_edges {
            return Err(AgentflowError::Workflow(format!("workflow has {} edges, exceeds max_edges {}", edges, limits.max_edges)));
        }
        Ok(())
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
