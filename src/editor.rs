//! Editing session for one agent's workflow.
//!
//! The editor applies graph edits in memory and writes the whole workflow to a
//! [`WorkflowStore`] only on an explicit [`Editor::save`]. Nothing is diffed:
//! every save replaces the stored document.

use tracing::debug;

use crate::{
    Result,
    model::{Position, WorkflowModel},
    store::WorkflowStore,
    workflow::{
        Workflow,
        edge::{Edge, EdgeId},
        node::{Node, NodeConfig, NodeId},
    },
};

pub struct Editor {
    agent_id: String,
    workflow: Workflow,
    /// bumped on every applied edit
    revision: u64,
    dirty: bool,
}

impl Editor {
    /// Starts an empty workflow for `agent_id`.
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self::with_workflow(agent_id, Workflow::new())
    }

    pub fn with_workflow(
        agent_id: impl Into<String>,
        workflow: Workflow,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            workflow,
            revision: 0,
            dirty: false,
        }
    }

    /// Opens the workflow stored for `agent_id`, or an empty one.
    pub fn open(
        store: &dyn WorkflowStore,
        agent_id: &str,
    ) -> Result<Self> {
        let workflow = match store.load(agent_id)? {
            Some(model) => Workflow::try_from(&model)?,
            None => Workflow::new(),
        };
        Ok(Self::with_workflow(agent_id, workflow))
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether there are edits not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn add_node(
        &mut self,
        node: Node,
    ) -> NodeId {
        self.touch();
        self.workflow.add_node(node)
    }

    pub fn add_edge(
        &mut self,
        edge: Edge,
    ) -> EdgeId {
        self.touch();
        self.workflow.add_edge(edge)
    }

    pub fn connect(
        &mut self,
        source: &str,
        target: &str,
    ) -> EdgeId {
        self.touch();
        self.workflow.connect(source, target)
    }

    pub fn connect_branch(
        &mut self,
        source: &str,
        target: &str,
        branch: bool,
    ) -> EdgeId {
        self.touch();
        self.workflow.connect_branch(source, target, branch)
    }

    pub fn remove_node(
        &mut self,
        id: &str,
    ) -> Option<Node> {
        let removed = self.workflow.remove_node(id);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    pub fn remove_edge(
        &mut self,
        id: &str,
    ) -> Option<Edge> {
        let removed = self.workflow.remove_edge(id);
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    pub fn move_node(
        &mut self,
        id: &str,
        position: Position,
    ) -> Result<()> {
        self.workflow.move_node(id, position)?;
        self.touch();
        Ok(())
    }

    pub fn update_config(
        &mut self,
        id: &str,
        config: NodeConfig,
    ) -> Result<()> {
        self.workflow.update_config(id, config)?;
        self.touch();
        Ok(())
    }

    /// Writes the workflow if it has unsaved edits. Returns whether it wrote.
    pub fn save(
        &mut self,
        store: &dyn WorkflowStore,
    ) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }

        let model = WorkflowModel::try_from(&self.workflow)?;
        store.save(&self.agent_id, &model)?;
        self.dirty = false;
        debug!(agent = %self.agent_id, revision = self.revision, "workflow saved");
        Ok(true)
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.dirty = true;
    }
}
