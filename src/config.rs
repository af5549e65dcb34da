use std::{fs, path::Path};

use serde::Deserialize;

use crate::Result;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// graph size limits applied when loading and planning
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LimitsConfig {
    /// maximum number of nodes in a workflow, defaults to 1000
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    /// maximum number of edges in a workflow, defaults to 4000
    #[serde(default = "default_max_edges")]
    pub max_edges: usize,
}

fn default_max_nodes() -> usize {
    1000
}

fn default_max_edges() -> usize {
    4000
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_nodes: default_max_nodes(),
            max_edges: default_max_edges(),
        }
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str)?;
        Ok(config)
    }
}
