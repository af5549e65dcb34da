//! Structural validation of a workflow graph.
//!
//! Every check runs independently and all findings are collected, so the
//! editor can highlight every offending node or edge at once. Cycles are
//! not a validation error; only the resolver rejects unconditional ones.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    AgentflowError, Result,
    workflow::{
        Workflow, WorkflowGraph,
        edge::{EdgeId, SourceHandle},
        node::{NodeId, NodeKind},
    },
};

/// A structural problem the user can fix in the editor.
#[derive(Serialize, Deserialize, Error, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "code", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ValidationError {
    #[error("workflow has no start node")]
    MissingStart,

    #[error("workflow has more than one start node: {}", .node_ids.join(", "))]
    MultipleStart {
        node_ids: Vec<NodeId>,
    },

    #[error("workflow has no end node")]
    MissingEnd,

    #[error("node {node_id} is not reachable from the start node")]
    UnreachableNode {
        node_id: NodeId,
    },

    #[error("node {node_id} has no path to an end node")]
    DeadEnd {
        node_id: NodeId,
    },

    #[error("conditional node {node_id} needs exactly one true and one false edge")]
    IncompleteConditional {
        node_id: NodeId,
    },

    #[error("edge {edge_id} connects a node to itself")]
    SelfLoop {
        edge_id: EdgeId,
    },

    #[error("edge {edge_id} references a node that does not exist")]
    DanglingEdge {
        edge_id: EdgeId,
    },

    #[error("node id {node_id} is used more than once")]
    DuplicateNodeId {
        node_id: NodeId,
    },

    #[error("edge id {edge_id} is used more than once")]
    DuplicateEdgeId {
        edge_id: EdgeId,
    },
}

impl ValidationError {
    /// Ids of the nodes or edges the editor should highlight.
    pub fn subjects(&self) -> Vec<&str> {
        match self {
            ValidationError::MissingStart | ValidationError::MissingEnd => Vec::new(),
            ValidationError::MultipleStart { node_ids } => node_ids.iter().map(String::as_str).collect(),
            ValidationError::UnreachableNode { node_id }
            | ValidationError::DeadEnd { node_id }
            | ValidationError::IncompleteConditional { node_id }
            | ValidationError::DuplicateNodeId { node_id } => vec![node_id.as_str()],
            ValidationError::SelfLoop { edge_id } | ValidationError::DanglingEdge { edge_id } | ValidationError::DuplicateEdgeId { edge_id } => vec![edge_id.as_str()],
        }
    }
}

/// Outcome of [`validate`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationResult {
    Valid,
    Invalid {
        errors: Vec<ValidationError>,
    },
}

impl ValidationResult {
    fn from_errors(errors: Vec<ValidationError>) -> Self {
        if errors.is_empty() { ValidationResult::Valid } else { ValidationResult::Invalid { errors } }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            ValidationResult::Valid => &[],
            ValidationResult::Invalid { errors } => errors,
        }
    }

    /// Converts an invalid result into [`AgentflowError::Validation`].
    pub fn into_result(self) -> Result<()> {
        match self {
            ValidationResult::Valid => Ok(()),
            ValidationResult::Invalid { errors } => Err(AgentflowError::Validation(errors)),
        }
    }
}

/// Checks the structural invariants of `workflow`.
///
/// Errors are reported in check order; within a check, nodes and edges keep
/// their input order.
pub fn validate(workflow: &Workflow) -> ValidationResult {
    debug!(nodes = workflow.nodes.len(), edges = workflow.edges.len(), "validating workflow");

    let graph = WorkflowGraph::new(workflow);
    let mut errors = Vec::new();

    let starts = graph.nodes_of_kind(NodeKind::Start);
    let ends = graph.nodes_of_kind(NodeKind::End);

    match starts.len() {
        0 => errors.push(ValidationError::MissingStart),
        1 => {}
        _ => errors.push(ValidationError::MultipleStart {
            node_ids: starts.iter().map(|ix| graph.node(*ix).id.clone()).collect(),
        }),
    }

    if ends.is_empty() {
        errors.push(ValidationError::MissingEnd);
    }

    // Without a start every node would look unreachable; MissingStart covers it.
    if !starts.is_empty() {
        let reachable = graph.reachable_from(&starts);
        for ix in graph.node_indices() {
            let node = graph.node(ix);
            if node.kind() != NodeKind::Start && graph.is_canonical(ix) && !reachable.contains(&ix) {
                errors.push(ValidationError::UnreachableNode { node_id: node.id.clone() });
            }
        }
    }

    if !ends.is_empty() {
        let reaching = graph.reaching(&ends);
        for ix in graph.node_indices() {
            let node = graph.node(ix);
            if node.kind() != NodeKind::End && graph.is_canonical(ix) && !reaching.contains(&ix) {
                errors.push(ValidationError::DeadEnd { node_id: node.id.clone() });
            }
        }
    }

    for ix in graph.nodes_of_kind(NodeKind::Conditional) {
        let node = graph.node(ix);
        if graph.is_canonical(ix) && !is_complete_conditional(workflow, &node.id) {
            errors.push(ValidationError::IncompleteConditional { node_id: node.id.clone() });
        }
    }

    for edge in workflow.edges.iter() {
        if edge.is_self_loop() {
            errors.push(ValidationError::SelfLoop { edge_id: edge.id.clone() });
        }
    }

    for edge in workflow.edges.iter() {
        if !graph.contains(&edge.source) || !graph.contains(&edge.target) {
            errors.push(ValidationError::DanglingEdge { edge_id: edge.id.clone() });
        }
    }

    for node_id in repeated(workflow.nodes.iter().map(|n| n.id.as_str())) {
        errors.push(ValidationError::DuplicateNodeId { node_id });
    }
    for edge_id in repeated(workflow.edges.iter().map(|e| e.id.as_str())) {
        errors.push(ValidationError::DuplicateEdgeId { edge_id });
    }

    if !errors.is_empty() {
        warn!(errors = errors.len(), "workflow failed validation");
    }

    ValidationResult::from_errors(errors)
}

fn is_complete_conditional(
    workflow: &Workflow,
    id: &str,
) -> bool {
    let mut counts: HashMap<SourceHandle, usize> = HashMap::new();
    for edge in workflow.outgoing(id) {
        *counts.entry(edge.source_handle).or_default() += 1;
    }

    counts.get(&SourceHandle::True) == Some(&1) && counts.get(&SourceHandle::False) == Some(&1) && !counts.contains_key(&SourceHandle::Default)
}

/// Ids that appear more than once, each reported once in first-seen order.
fn repeated<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut repeated = Vec::new();
    for id in ids {
        if !seen.insert(id) && reported.insert(id) {
            repeated.push(id.to_string());
        }
    }
    repeated
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        model::Position,
        workflow::{
            edge::Edge,
            node::{ConditionOperator, Node, NodeConfig},
        },
    };

    fn node(
        id: &str,
        config: NodeConfig,
    ) -> Node {
        Node::with_id(id, config, Position::default())
    }

    fn delegate(id: &str) -> Node {
        node(
            id,
            NodeConfig::Delegate(crate::workflow::node::DelegateConfig {
                target_agent: "researcher".to_string(),
                task_template: "Find trends".to_string(),
            }),
        )
    }

    fn conditional(id: &str) -> Node {
        Node::with_id(
            id,
            NodeConfig::Conditional(crate::workflow::node::ConditionConfig {
                variable: "score".to_string(),
                operator: ConditionOperator::Ge,
                value: json!(5),
            }),
            Position::default(),
        )
    }

    fn edge(
        id: &str,
        source: &str,
        target: &str,
    ) -> Edge {
        Edge::with_id(id, source, target, SourceHandle::Default)
    }

    fn branch(
        id: &str,
        source: &str,
        target: &str,
        value: bool,
    ) -> Edge {
        Edge::with_id(id, source, target, value.into())
    }

    fn linear() -> Workflow {
        Workflow {
            nodes: vec![node("start", NodeConfig::Start), delegate("a"), delegate("b"), node("end", NodeConfig::End)],
            edges: vec![edge("e1", "start", "a"), edge("e2", "a", "b"), edge("e3", "b", "end")],
        }
    }

    fn branching() -> Workflow {
        Workflow {
            nodes: vec![
                node("start", NodeConfig::Start),
                conditional("check"),
                delegate("x"),
                delegate("y"),
                node("merge", NodeConfig::Merge),
                node("end", NodeConfig::End),
            ],
            edges: vec![
                edge("e1", "start", "check"),
                branch("e2", "check", "x", true),
                branch("e3", "check", "y", false),
                edge("e4", "x", "merge"),
                edge("e5", "y", "merge"),
                edge("e6", "merge", "end"),
            ],
        }
    }

    #[test]
    fn test_valid_linear() {
        assert_eq!(validate(&linear()), ValidationResult::Valid);
    }

    #[test]
    fn test_valid_branching() {
        let result = validate(&branching());
        assert!(result.is_valid());
        assert!(result.errors().is_empty());
        assert!(result.into_result().is_ok());
    }

    #[test]
    fn test_cycles_are_allowed() {
        let mut w = linear();
        w.edges.push(edge("back", "b", "a"));
        assert!(validate(&w).is_valid());
    }

    #[test]
    fn test_missing_start_has_no_unreachable_noise() {
        let mut w = linear();
        w.remove_node("start");
        let result = validate(&w);
        assert_eq!(result.errors(), &[ValidationError::MissingStart]);
    }

    #[test]
    fn test_multiple_start() {
        let mut w = linear();
        w.nodes.push(node("start2", NodeConfig::Start));
        w.edges.push(edge("e4", "start2", "b"));
        assert_eq!(
            validate(&w).errors(),
            &[ValidationError::MultipleStart {
                node_ids: vec!["start".to_string(), "start2".to_string()],
            }]
        );
    }

    #[test]
    fn test_missing_end() {
        let mut w = linear();
        w.remove_node("end");
        let errors = validate(&w).errors().to_vec();
        assert_eq!(errors, vec![ValidationError::MissingEnd]);
    }

    #[test]
    fn test_unreachable_and_dead_end() {
        let mut w = linear();
        w.nodes.push(delegate("orphan"));
        w.nodes.push(delegate("stuck"));
        w.edges.push(edge("e4", "a", "stuck"));

        let errors = validate(&w).errors().to_vec();
        assert_eq!(
            errors,
            vec![
                ValidationError::UnreachableNode { node_id: "orphan".to_string() },
                ValidationError::DeadEnd { node_id: "orphan".to_string() },
                ValidationError::DeadEnd { node_id: "stuck".to_string() },
            ]
        );
    }

    #[test]
    fn test_conditional_missing_false_branch() {
        let mut w = branching();
        w.remove_edge("e3");
        w.edges.push(edge("e7", "start", "y"));
        let errors = validate(&w).errors().to_vec();
        assert_eq!(errors, vec![ValidationError::IncompleteConditional { node_id: "check".to_string() }]);
    }

    #[test]
    fn test_conditional_duplicate_or_default_branch() {
        let mut w = branching();
        w.edges.push(branch("e7", "check", "merge", true));
        assert_eq!(validate(&w).errors(), &[ValidationError::IncompleteConditional { node_id: "check".to_string() }]);

        let mut w = branching();
        w.edges.push(edge("e7", "check", "merge"));
        assert_eq!(validate(&w).errors(), &[ValidationError::IncompleteConditional { node_id: "check".to_string() }]);
    }

    #[test]
    fn test_self_loop_and_dangling_edge() {
        let mut w = linear();
        w.edges.push(edge("loop", "a", "a"));
        w.edges.push(edge("ghost", "b", "nowhere"));
        let errors = validate(&w).errors().to_vec();
        assert_eq!(
            errors,
            vec![ValidationError::SelfLoop { edge_id: "loop".to_string() }, ValidationError::DanglingEdge { edge_id: "ghost".to_string() },]
        );
    }

    #[test]
    fn test_duplicate_ids() {
        let mut w = linear();
        w.nodes.push(delegate("a"));
        w.edges.push(edge("e1", "a", "b"));
        let errors = validate(&w).errors().to_vec();
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateNodeId { node_id: "a".to_string() }, ValidationError::DuplicateEdgeId { edge_id: "e1".to_string() },]
        );
    }

    #[test]
    fn test_errors_are_collected_not_short_circuited() {
        let w = Workflow {
            nodes: vec![delegate("a")],
            edges: vec![edge("e1", "a", "a")],
        };
        let errors = validate(&w).errors().to_vec();
        assert_eq!(errors, vec![ValidationError::MissingStart, ValidationError::MissingEnd, ValidationError::SelfLoop { edge_id: "e1".to_string() },]);
    }

    #[test]
    fn test_into_result() {
        let w = Workflow::new();
        let err = validate(&w).into_result().unwrap_err();
        assert_eq!(err, AgentflowError::Validation(vec![ValidationError::MissingStart, ValidationError::MissingEnd]));
    }

    #[test]
    fn test_serialized_shape() {
        let result = ValidationResult::Invalid {
            errors: vec![ValidationError::DeadEnd { node_id: "n1".to_string() }, ValidationError::MissingEnd],
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "invalid",
                "errors": [
                    { "code": "dead_end", "nodeId": "n1" },
                    { "code": "missing_end" }
                ]
            })
        );
    }

    #[test]
    fn test_subjects() {
        assert_eq!(ValidationError::SelfLoop { edge_id: "e1".to_string() }.subjects(), vec!["e1"]);
        assert!(ValidationError::MissingStart.subjects().is_empty());
    }
}
