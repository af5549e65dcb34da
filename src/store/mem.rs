use tracing::trace;

use crate::{Result, common::MemCache, model::WorkflowModel, store::WorkflowStore};

/// In-memory [`WorkflowStore`], mainly for tests and single-process use.
#[derive(Clone)]
pub struct MemStore {
    workflows: MemCache<String, WorkflowModel>,
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStore {
    /// Creates an empty store. Saved workflows are never evicted.
    pub fn new() -> Self {
        Self {
            workflows: MemCache::new(),
        }
    }
}

impl WorkflowStore for MemStore {
    fn load(
        &self,
        agent_id: &str,
    ) -> Result<Option<WorkflowModel>> {
        trace!("load workflow {}", agent_id);
        Ok(self.workflows.get(&agent_id.to_string()))
    }

    fn save(
        &self,
        agent_id: &str,
        workflow: &WorkflowModel,
    ) -> Result<()> {
        trace!("save workflow {} ({} nodes, {} edges)", agent_id, workflow.nodes.len(), workflow.edges.len());
        self.workflows.set(agent_id.to_string(), workflow.clone());
        Ok(())
    }

    fn remove(
        &self,
        agent_id: &str,
    ) -> Result<()> {
        trace!("remove workflow {}", agent_id);
        self.workflows.remove(&agent_id.to_string());
        Ok(())
    }
}
