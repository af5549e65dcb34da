//! Workflow edge definitions for connecting nodes.
//!
//! Edges define the flow between nodes, supporting conditional branching
//! through source handles (`true`/`false` for conditional nodes).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AgentflowError, Result, model::EdgeModel, workflow::node::NodeId};

/// Unique identifier for an edge within a workflow.
pub type EdgeId = String;

/// Output port of the source node an edge leaves from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceHandle {
    /// Sequential flow; the only handle non-conditional nodes use.
    #[default]
    Default,
    /// True branch for conditional nodes.
    True,
    /// False branch for conditional nodes.
    False,
}

impl SourceHandle {
    /// The branch this handle selects, if any.
    pub fn branch(self) -> Option<bool> {
        match self {
            SourceHandle::Default => None,
            SourceHandle::True => Some(true),
            SourceHandle::False => Some(false),
        }
    }
}

impl From<bool> for SourceHandle {
    fn from(branch: bool) -> Self {
        if branch { SourceHandle::True } else { SourceHandle::False }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Unique edge identifier.
    pub id: EdgeId,
    /// ID of the source node.
    pub source: NodeId,
    /// ID of the target node.
    pub target: NodeId,
    /// Which output handle this edge connects from.
    pub source_handle: SourceHandle,
    /// Label shown on the canvas.
    pub label: String,
}

impl Edge {
    /// Creates a default-handle edge with a fresh unique id.
    pub fn new(
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self::with_id(nanoid::nanoid!(), source, target, SourceHandle::Default)
    }

    /// Creates a conditional branch edge with a fresh unique id.
    pub fn branch(
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        branch: bool,
    ) -> Self {
        Self::with_id(nanoid::nanoid!(), source, target, branch.into())
    }

    pub fn with_id(
        id: impl Into<EdgeId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        source_handle: SourceHandle,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle,
            label: String::new(),
        }
    }

    pub fn with_label(
        mut self,
        label: impl Into<String>,
    ) -> Self {
        self.label = label.into();
        self
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

impl TryFrom<&EdgeModel> for Edge {
    type Error = AgentflowError;

    fn try_from(model: &EdgeModel) -> Result<Self> {
        let source_handle = match model.source_handle.as_deref() {
            None => SourceHandle::Default,
            Some(handle) => SourceHandle::from_str(handle).map_err(|_| AgentflowError::Edge(format!("invalid source handle '{}' on edge {}", handle, model.id)))?,
        };

        Ok(Self {
            id: model.id.clone(),
            source: model.source.clone(),
            target: model.target.clone(),
            source_handle,
            label: model.label.clone(),
        })
    }
}

impl From<&Edge> for EdgeModel {
    fn from(edge: &Edge) -> Self {
        Self {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            source_handle: Some(edge.source_handle.to_string()),
            label: edge.label.clone(),
        }
    }
}
