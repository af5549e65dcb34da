//! Typed workflow graph.
//!
//! A [`Workflow`] is a plain value: nodes and edges in the order the editor
//! created them. Validation and resolution take it by reference and never
//! mutate it.

use crate::{
    AgentflowError, Result,
    model::{EdgeModel, NodeModel, Position, WorkflowModel},
    workflow::{
        edge::{Edge, EdgeId, SourceHandle},
        node::{Node, NodeConfig, NodeId, NodeKind},
    },
};

/// Directed graph of typed nodes and labeled edges owned by one agent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workflow {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Workflow {
    /// create an empty workflow
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the editor's JSON shape into a typed workflow.
    pub fn from_json(s: &str) -> Result<Self> {
        let model = WorkflowModel::from_json(s)?;
        Self::try_from(&model)
    }

    /// Serializes the whole workflow into the editor's JSON shape.
    pub fn to_json(&self) -> Result<String> {
        WorkflowModel::try_from(self)?.to_json()
    }

    /// Output a human-readable representation of the workflow graph
    pub fn schema(&self) -> String {
        let mut lines = Vec::new();

        lines.push("=== Workflow Graph ===".to_string());
        lines.push(format!("Nodes: {}, Edges: {}", self.nodes.len(), self.edges.len()));
        lines.push(String::new());

        lines.push("--- Nodes ---".to_string());
        for node in self.nodes.iter() {
            lines.push(format!("[{}] {} at ({}, {})", node.id, node.kind(), node.position.x, node.position.y));
        }
        lines.push(String::new());

        lines.push("--- Edges ---".to_string());
        for edge in self.edges.iter() {
            lines.push(format!("{} --[{}]--> {} (id: {}, label: {})", edge.source, edge.source_handle, edge.target, edge.id, edge.label));
        }
        lines.push(String::new());

        // adjacency list style
        lines.push("--- Graph Structure ---".to_string());
        for node in self.nodes.iter() {
            let outgoing: Vec<String> = self.outgoing(&node.id).map(|e| format!("{}({})", e.target, e.source_handle)).collect();

            if outgoing.is_empty() {
                lines.push(format!("{} -> (end)", node.id));
            } else {
                lines.push(format!("{} -> {}", node.id, outgoing.join(", ")));
            }
        }

        lines.join("\n")
    }

    /// add node to graph
    pub fn add_node(
        &mut self,
        node: Node,
    ) -> NodeId {
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    /// add edge to graph
    pub fn add_edge(
        &mut self,
        edge: Edge,
    ) -> EdgeId {
        let id = edge.id.clone();
        self.edges.push(edge);
        id
    }

    /// connect two nodes through the default handle
    pub fn connect(
        &mut self,
        source: &str,
        target: &str,
    ) -> EdgeId {
        self.add_edge(Edge::new(source, target))
    }

    /// connect a conditional node's `true` or `false` handle to a target
    pub fn connect_branch(
        &mut self,
        source: &str,
        target: &str,
        branch: bool,
    ) -> EdgeId {
        self.add_edge(Edge::branch(source, target, branch))
    }

    /// Removes a node together with every edge touching it.
    pub fn remove_node(
        &mut self,
        id: &str,
    ) -> Option<Node> {
        let pos = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(pos);
        self.edges.retain(|e| e.source != id && e.target != id);
        Some(node)
    }

    pub fn remove_edge(
        &mut self,
        id: &str,
    ) -> Option<Edge> {
        let pos = self.edges.iter().position(|e| e.id == id)?;
        Some(self.edges.remove(pos))
    }

    pub fn move_node(
        &mut self,
        id: &str,
        position: Position,
    ) -> Result<()> {
        self.node_mut(id)?.position = position;
        Ok(())
    }

    pub fn update_config(
        &mut self,
        id: &str,
        config: NodeConfig,
    ) -> Result<()> {
        self.node_mut(id)?.config = config;
        Ok(())
    }

    /// get node by id
    pub fn node(
        &self,
        id: &str,
    ) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// get edge by id
    pub fn edge(
        &self,
        id: &str,
    ) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// first start node, if any
    pub fn start_node(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.kind() == NodeKind::Start)
    }

    pub fn outgoing<'a>(
        &'a self,
        id: &'a str,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == id)
    }

    pub fn incoming<'a>(
        &'a self,
        id: &'a str,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target == id)
    }

    /// outgoing edges of `id` leaving through `handle`
    pub fn outgoing_on<'a>(
        &'a self,
        id: &'a str,
        handle: SourceHandle,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        self.outgoing(id).filter(move |e| e.source_handle == handle)
    }

    fn node_mut(
        &mut self,
        id: &str,
    ) -> Result<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id).ok_or(AgentflowError::Node(format!("node {} not found", id)))
    }
}

impl TryFrom<&WorkflowModel> for Workflow {
    type Error = AgentflowError;

    fn try_from(model: &WorkflowModel) -> Result<Self> {
        let nodes = model.nodes.iter().map(Node::try_from).collect::<Result<Vec<_>>>()?;
        let edges = model.edges.iter().map(Edge::try_from).collect::<Result<Vec<_>>>()?;

        Ok(Self { nodes, edges })
    }
}

impl TryFrom<&Workflow> for WorkflowModel {
    type Error = AgentflowError;

    fn try_from(workflow: &Workflow) -> Result<Self> {
        let nodes = workflow.nodes.iter().map(NodeModel::try_from).collect::<Result<Vec<_>>>()?;
        let edges = workflow.edges.iter().map(EdgeModel::from).collect();

        Ok(Self { nodes, edges })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::workflow::node::ConditionOperator;

    fn pos(
        x: f64,
        y: f64,
    ) -> Position {
        Position::new(x, y)
    }

    fn sample() -> Workflow {
        let mut w = Workflow::new();
        let start = w.add_node(Node::with_id("start", NodeConfig::Start, pos(0.0, 0.0)));
        let check = w.add_node(Node::conditional(pos(0.0, 100.0), "brief.approved", ConditionOperator::Eq, json!(true)));
        let write = w.add_node(Node::delegate(pos(-150.5, 200.25), "copywriter", "Draft hooks for {{brand}}"));
        let revise = w.add_node(Node::synthesize(pos(150.0, 200.0), "Merge reviewer notes"));
        let merge = w.add_node(Node::merge(pos(0.0, 300.0)));
        let end = w.add_node(Node::end(pos(0.0, 400.0)));

        w.connect(&start, &check);
        w.add_edge(Edge::branch(check.as_str(), write.as_str(), true).with_label("approved"));
        w.connect_branch(&check, &revise, false);
        w.connect(&write, &merge);
        w.connect(&revise, &merge);
        w.connect(&merge, &end);
        w
    }

    #[test]
    fn test_json_round_trip() {
        let w = sample();
        let text = w.to_json().unwrap();
        assert_eq!(Workflow::from_json(&text).unwrap(), w);
    }

    #[test]
    fn test_json_round_trip_keeps_exact_positions() {
        let mut xs = vec![11499939.149472421, 3910712.4430984827, 12895624.715211103, 13118049.715836287, 0.1 + 0.2, -1e-7, 5e-324];
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..500 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            xs.push((seed >> 11) as f64 / (1u64 << 53) as f64 * 2.0e7);
        }

        let mut w = Workflow::new();
        for (i, x) in xs.iter().enumerate() {
            w.add_node(Node::with_id(format!("n{}", i), NodeConfig::Start, pos(*x, -x)));
        }

        let parsed = Workflow::from_json(&w.to_json().unwrap()).unwrap();
        for (before, after) in w.nodes.iter().zip(parsed.nodes.iter()) {
            assert_eq!(before.position.x.to_bits(), after.position.x.to_bits(), "x of {} drifted", before.id);
            assert_eq!(before.position.y.to_bits(), after.position.y.to_bits(), "y of {} drifted", before.id);
        }
        assert_eq!(parsed, w);
    }

    #[test]
    fn test_json_round_trip_varied_configs() {
        let values = vec![
            json!(null),
            json!(false),
            json!(-4),
            json!(0.30000000000000004),
            json!(""),
            json!(["a", 1, null]),
            json!({ "score": 7.5, "tags": [] }),
        ];

        let mut w = Workflow::new();
        let start = w.add_node(Node::with_id("start", NodeConfig::Start, pos(-0.5, 1234.5678)));
        let end = w.add_node(Node::with_id("end", NodeConfig::End, pos(1e-3, 98765.4321)));
        for (i, value) in values.into_iter().enumerate() {
            let y = 100.0 + i as f64 * 33.333333333333336;
            let cond = w.add_node(Node::conditional(pos(i as f64 / 3.0, y), "", ConditionOperator::NotContains, value));
            w.add_edge(Edge::with_id(format!("in{}", i), start.as_str(), cond.as_str(), SourceHandle::Default).with_label(""));
            w.add_edge(Edge::branch(cond.as_str(), end.as_str(), true).with_label("yes"));
            w.add_edge(Edge::branch(cond.as_str(), end.as_str(), false));
        }
        w.add_node(Node::delegate(pos(-7.1, 0.7), "", ""));
        w.add_node(Node::synthesize(pos(2.2, -3.3), ""));

        assert_eq!(Workflow::from_json(&w.to_json().unwrap()).unwrap(), w);

        let text = r#"{
            "nodes": [
                { "id": "s", "type": "start", "position": { "x": 0.1, "y": -0.2 }, "data": {} },
                { "id": "c", "type": "conditional", "position": { "x": 12.75, "y": 100.125 },
                  "data": { "variable": "brief", "operator": "empty", "value": { "nested": [true, 1.5, "x"] } } },
                { "id": "e", "type": "end", "position": { "x": 3.0e-5, "y": 2.5e6 }, "data": {} }
            ],
            "edges": [
                { "id": "e1", "source": "s", "target": "c", "sourceHandle": "default", "label": "" },
                { "id": "e2", "source": "c", "target": "e", "sourceHandle": "true", "label": "" },
                { "id": "e3", "source": "c", "target": "e", "sourceHandle": "false", "label": "no" }
            ]
        }"#;
        let model = WorkflowModel::from_json(text).unwrap();
        let parsed = Workflow::try_from(&model).unwrap();
        assert_eq!(parsed.edges[0].source_handle, SourceHandle::Default);
        assert_eq!(parsed.edges[0].label, "");
        assert_eq!(WorkflowModel::try_from(&parsed).unwrap(), model);
        assert_eq!(Workflow::from_json(&parsed.to_json().unwrap()).unwrap(), parsed);
    }

    #[test]
    fn test_json_field_names() {
        let w = sample();
        let value: serde_json::Value = serde_json::from_str(&w.to_json().unwrap()).unwrap();
        let node = &value["nodes"][2];
        assert_eq!(node["type"], "delegate");
        assert_eq!(node["position"]["x"], -150.5);
        assert_eq!(node["data"]["targetAgent"], "copywriter");
        assert_eq!(node["data"]["taskTemplate"], "Draft hooks for {{brand}}");
        assert_eq!(value["edges"][1]["sourceHandle"], "true");
        assert_eq!(value["edges"][1]["label"], "approved");
    }

    #[test]
    fn test_from_json_unsupported_kind() {
        let text = r#"{ "nodes": [{ "id": "x", "type": "webhook", "position": {"x": 0, "y": 0}, "data": {} }], "edges": [] }"#;
        assert_eq!(Workflow::from_json(text).unwrap_err(), AgentflowError::UnsupportedNodeKind("webhook".to_string()));
    }

    #[test]
    fn test_remove_node_removes_incident_edges() {
        let mut w = sample();
        let merge = w.nodes[4].id.clone();
        let removed = w.remove_node(&merge).unwrap();
        assert_eq!(removed.kind(), NodeKind::Merge);
        assert_eq!(w.edges.len(), 3);
        assert!(w.edges.iter().all(|e| e.source != merge && e.target != merge));
        assert!(w.remove_node(&merge).is_none());
    }

    #[test]
    fn test_remove_edge() {
        let mut w = sample();
        let id = w.edges[0].id.clone();
        assert_eq!(w.remove_edge(&id).unwrap().source, "start");
        assert!(w.edge(&id).is_none());
    }

    #[test]
    fn test_move_and_update() {
        let mut w = sample();
        w.move_node("start", pos(5.0, 6.0)).unwrap();
        assert_eq!(w.node("start").unwrap().position, pos(5.0, 6.0));

        w.update_config("start", NodeConfig::End).unwrap();
        assert_eq!(w.node("start").unwrap().kind(), NodeKind::End);

        assert!(matches!(w.move_node("missing", pos(0.0, 0.0)), Err(AgentflowError::Node(_))));
    }

    #[test]
    fn test_lookups() {
        let w = sample();
        let check = w.nodes[1].id.clone();
        assert_eq!(w.start_node().unwrap().id, "start");
        assert_eq!(w.outgoing(&check).count(), 2);
        assert_eq!(w.outgoing_on(&check, SourceHandle::False).count(), 1);
        assert_eq!(w.incoming(&check).count(), 1);
    }

    #[test]
    fn test_schema() {
        let schema = sample().schema();
        assert!(schema.contains("Nodes: 6, Edges: 6"));
        assert!(schema.contains("[start] start at (0, 0)"));
    }
}
