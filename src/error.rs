//! Error types for Agentflow.
//!
//! All errors in Agentflow are represented by the `AgentflowError` enum,
//! which provides specific variants for different error categories.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validator::ValidationError;

/// Unified error type for all Agentflow operations.
///
/// Each variant represents a specific category of error that can occur
/// while loading, editing, validating or resolving a workflow.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum AgentflowError {
    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML).
    #[error("{0}")]
    Convert(String),

    /// Workflow definition errors.
    #[error("{0}")]
    Workflow(String),

    /// Node definition errors.
    #[error("{0}")]
    Node(String),

    /// Edge definition errors.
    #[error("{0}")]
    Edge(String),

    /// Storage operation errors.
    #[error("{0}")]
    Store(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),

    /// A node carries a `type` this version does not know.
    #[error("unsupported node kind '{0}'")]
    UnsupportedNodeKind(String),

    /// The graph contains a cycle that no conditional branch can leave.
    #[error("cyclic graph: {}", .node_ids.join(" -> "))]
    CyclicGraph {
        node_ids: Vec<String>,
    },

    /// The workflow failed structural validation.
    #[error("invalid workflow: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Validation(Vec<ValidationError>),
}

impl From<std::io::Error> for AgentflowError {
    fn from(error: std::io::Error) -> Self {
        AgentflowError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for AgentflowError {
    fn from(error: serde_json::Error) -> Self {
        AgentflowError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for AgentflowError {
    fn from(error: toml::de::Error) -> Self {
        AgentflowError::Config(error.to_string())
    }
}
