//! Workflow node definitions.
//!
//! A node's kind is derived from its configuration, so a node can never carry
//! fields that belong to another kind.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AgentflowError, Result, model::NodeModel, model::Position};

/// Unique identifier for a node within a workflow.
pub type NodeId = String;

/// Closed set of node kinds understood by the validator and resolver.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    Start,
    Delegate,
    Conditional,
    Synthesize,
    Merge,
    End,
}

/// Comparison operator of a conditional node.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConditionOperator {
    // for number or any scalar
    #[default]
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    // for string or array
    Contains,
    NotContains,
    StartWith,
    EndWith,
    Empty,
    NotEmpty,
}

/// Hands a sub-task to a named sub-agent.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DelegateConfig {
    #[serde(default)]
    pub target_agent: String,
    #[serde(default)]
    pub task_template: String,
}

/// Binary decision evaluated by the runtime against a named variable.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConditionConfig {
    #[serde(default)]
    pub variable: String,
    #[serde(default)]
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: Value,
}

/// Asks the runtime to synthesize the results gathered so far.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeConfig {
    #[serde(default)]
    pub instructions: String,
}

/// Per-kind node configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeConfig {
    Start,
    Delegate(DelegateConfig),
    Conditional(ConditionConfig),
    Synthesize(SynthesizeConfig),
    Merge,
    End,
}

impl NodeConfig {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeConfig::Start => NodeKind::Start,
            NodeConfig::Delegate(_) => NodeKind::Delegate,
            NodeConfig::Conditional(_) => NodeKind::Conditional,
            NodeConfig::Synthesize(_) => NodeKind::Synthesize,
            NodeConfig::Merge => NodeKind::Merge,
            NodeConfig::End => NodeKind::End,
        }
    }

    /// Builds the config of `kind` from the raw `data` object of a node.
    ///
    /// Start, merge and end nodes ignore `data`. A missing or null `data`
    /// gives the kind's defaults.
    fn from_data(
        kind: NodeKind,
        data: &Value,
    ) -> std::result::Result<Self, serde_json::Error> {
        let data = if data.is_null() { Value::Object(Default::default()) } else { data.clone() };

        let config = match kind {
            NodeKind::Start => NodeConfig::Start,
            NodeKind::Merge => NodeConfig::Merge,
            NodeKind::End => NodeConfig::End,
            NodeKind::Delegate => NodeConfig::Delegate(serde_json::from_value(data)?),
            NodeKind::Conditional => NodeConfig::Conditional(serde_json::from_value(data)?),
            NodeKind::Synthesize => NodeConfig::Synthesize(serde_json::from_value(data)?),
        };
        Ok(config)
    }

    fn to_data(&self) -> std::result::Result<Value, serde_json::Error> {
        match self {
            NodeConfig::Start | NodeConfig::Merge | NodeConfig::End => Ok(Value::Object(Default::default())),
            NodeConfig::Delegate(c) => serde_json::to_value(c),
            NodeConfig::Conditional(c) => serde_json::to_value(c),
            NodeConfig::Synthesize(c) => serde_json::to_value(c),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// node id
    pub id: NodeId,
    /// canvas position, also used to order independent steps
    pub position: Position,
    /// kind-specific configuration
    pub config: NodeConfig,
}

impl Node {
    /// Creates a node with a fresh unique id.
    pub fn new(
        config: NodeConfig,
        position: Position,
    ) -> Self {
        Self::with_id(nanoid::nanoid!(), config, position)
    }

    pub fn with_id(
        id: impl Into<NodeId>,
        config: NodeConfig,
        position: Position,
    ) -> Self {
        Self {
            id: id.into(),
            position,
            config,
        }
    }

    pub fn start(position: Position) -> Self {
        Self::new(NodeConfig::Start, position)
    }

    pub fn end(position: Position) -> Self {
        Self::new(NodeConfig::End, position)
    }

    pub fn merge(position: Position) -> Self {
        Self::new(NodeConfig::Merge, position)
    }

    pub fn delegate(
        position: Position,
        target_agent: impl Into<String>,
        task_template: impl Into<String>,
    ) -> Self {
        Self::new(
            NodeConfig::Delegate(DelegateConfig {
                target_agent: target_agent.into(),
                task_template: task_template.into(),
            }),
            position,
        )
    }

    pub fn conditional(
        position: Position,
        variable: impl Into<String>,
        operator: ConditionOperator,
        value: Value,
    ) -> Self {
        Self::new(
            NodeConfig::Conditional(ConditionConfig {
                variable: variable.into(),
                operator,
                value,
            }),
            position,
        )
    }

    pub fn synthesize(
        position: Position,
        instructions: impl Into<String>,
    ) -> Self {
        Self::new(
            NodeConfig::Synthesize(SynthesizeConfig {
                instructions: instructions.into(),
            }),
            position,
        )
    }

    pub fn kind(&self) -> NodeKind {
        self.config.kind()
    }
}

impl TryFrom<&NodeModel> for Node {
    type Error = AgentflowError;

    fn try_from(model: &NodeModel) -> Result<Self> {
        let kind = NodeKind::from_str(&model.kind).map_err(|_| AgentflowError::UnsupportedNodeKind(model.kind.clone()))?;
        let config = NodeConfig::from_data(kind, &model.data).map_err(|e| AgentflowError::Node(format!("invalid data for node {}: {}", model.id, e)))?;

        Ok(Self {
            id: model.id.clone(),
            position: model.position,
            config,
        })
    }
}

impl TryFrom<&Node> for NodeModel {
    type Error = AgentflowError;

    fn try_from(node: &Node) -> Result<Self> {
        Ok(Self {
            id: node.id.clone(),
            kind: node.kind().to_string(),
            position: node.position,
            data: node.config.to_data()?,
        })
    }
}
