use crate::{AgentflowError, Config, Planner, Result};

pub struct PlannerBuilder {
    config: Config,
}

impl Default for PlannerBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
        }
    }
}

impl PlannerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn max_nodes(
        mut self,
        n: usize,
    ) -> Self {
        self.config.limits.max_nodes = n;
        self
    }

    pub fn max_edges(
        mut self,
        n: usize,
    ) -> Self {
        self.config.limits.max_edges = n;
        self
    }

    pub fn build(&self) -> Result<Planner> {
        if self.config.limits.max_nodes == 0 {
            return Err(AgentflowError::Config("max_nodes must be greater than 0".to_string()));
        }
        if self.config.limits.max_edges == 0 {
            return Err(AgentflowError::Config("max_edges must be greater than 0".to_string()));
        }

        Ok(Planner::new(self.config.clone()))
    }
}
