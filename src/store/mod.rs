//! Persistence seam for workflows.
//!
//! Workflows are stored wholesale, one document per agent, and the last
//! write wins. The editor talks to any [`WorkflowStore`]; [`MemStore`] keeps
//! documents in memory.

mod mem;

use crate::{Result, model::WorkflowModel};

pub use mem::MemStore;

pub trait WorkflowStore: Send + Sync {
    /// Loads the workflow saved for `agent_id`, if any.
    fn load(
        &self,
        agent_id: &str,
    ) -> Result<Option<WorkflowModel>>;

    /// Replaces the workflow saved for `agent_id`.
    fn save(
        &self,
        agent_id: &str,
        workflow: &WorkflowModel,
    ) -> Result<()>;

    fn remove(
        &self,
        agent_id: &str,
    ) -> Result<()>;
}
