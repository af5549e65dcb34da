//! Indexed directed-graph view over a [`Workflow`].
//!
//! The view is built once per validation or resolution pass using petgraph.
//! Node weights are positions in `Workflow::nodes` and edge weights positions
//! in `Workflow::edges`. Dangling and self-loop edges are left out: the
//! validator reports them from the raw edge list, and neither affects order.

use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
};

use petgraph::{
    Direction,
    graph::{DiGraph, EdgeIndex, EdgeReference, NodeIndex},
    visit::{Dfs, EdgeRef, IntoNeighbors, Reversed, Visitable},
};

use crate::workflow::{Workflow, edge::Edge, node::Node, node::NodeKind};

/// Visual ordering key: top-to-bottom, then left-to-right, then input order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OrderKey {
    y: f64,
    x: f64,
    seq: usize,
}

impl Ord for OrderKey {
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering {
        self.y.total_cmp(&other.y).then(self.x.total_cmp(&other.x)).then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for OrderKey {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OrderKey {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderKey {}

pub(crate) struct WorkflowGraph<'a> {
    workflow: &'a Workflow,
    graph: DiGraph<usize, usize>,
    /// First node carrying each id.
    index: HashMap<&'a str, NodeIndex>,
}

impl<'a> WorkflowGraph<'a> {
    pub fn new(workflow: &'a Workflow) -> Self {
        let mut graph = DiGraph::with_capacity(workflow.nodes.len(), workflow.edges.len());
        let mut index = HashMap::with_capacity(workflow.nodes.len());

        for (i, node) in workflow.nodes.iter().enumerate() {
            let ix = graph.add_node(i);
            index.entry(node.id.as_str()).or_insert(ix);
        }

        for (i, edge) in workflow.edges.iter().enumerate() {
            if edge.is_self_loop() {
                continue;
            }
            let (Some(&source), Some(&target)) = (index.get(edge.source.as_str()), index.get(edge.target.as_str())) else {
                continue;
            };
            graph.add_edge(source, target, i);
        }

        Self { workflow, graph, index }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    pub fn node(
        &self,
        ix: NodeIndex,
    ) -> &'a Node {
        &self.workflow.nodes[self.graph[ix]]
    }

    pub fn edge(
        &self,
        ix: EdgeIndex,
    ) -> &'a Edge {
        &self.workflow.edges[self.graph[ix]]
    }

    /// Position of the edge in `Workflow::edges`.
    pub fn edge_seq(
        &self,
        ix: EdgeIndex,
    ) -> usize {
        self.graph[ix]
    }

    pub fn contains(
        &self,
        id: &str,
    ) -> bool {
        self.index.contains_key(id)
    }

    /// Whether `ix` is the node edges attach to for its id. Later nodes
    /// repeating an id are isolated and only reported as duplicates.
    pub fn is_canonical(
        &self,
        ix: NodeIndex,
    ) -> bool {
        self.index.get(self.node(ix).id.as_str()) == Some(&ix)
    }

    pub fn nodes_of_kind(
        &self,
        kind: NodeKind,
    ) -> Vec<NodeIndex> {
        self.graph.node_indices().filter(|ix| self.node(*ix).kind() == kind).collect()
    }

    pub fn order_key(
        &self,
        ix: NodeIndex,
    ) -> OrderKey {
        let position = self.node(ix).position;
        OrderKey {
            y: position.y,
            x: position.x,
            seq: self.graph[ix],
        }
    }

    pub fn incoming(
        &self,
        ix: NodeIndex,
    ) -> impl Iterator<Item = EdgeReference<'_, usize>> {
        self.graph.edges_directed(ix, Direction::Incoming)
    }

    /// Outgoing edges of `ix` ordered by target position, then edge input order.
    pub fn successors(
        &self,
        ix: NodeIndex,
    ) -> Vec<(EdgeIndex, NodeIndex)> {
        let mut successors: Vec<(EdgeIndex, NodeIndex)> = self.graph.edges_directed(ix, Direction::Outgoing).map(|e| (e.id(), e.target())).collect();
        successors.sort_by(|a, b| self.order_key(a.1).cmp(&self.order_key(b.1)).then(self.graph[a.0].cmp(&self.graph[b.0])));
        successors
    }

    /// Nodes reachable from any of `roots`, roots included.
    pub fn reachable_from(
        &self,
        roots: &[NodeIndex],
    ) -> HashSet<NodeIndex> {
        visit_from(&self.graph, roots)
    }

    /// Nodes with a forward path into any of `targets`, targets included.
    pub fn reaching(
        &self,
        targets: &[NodeIndex],
    ) -> HashSet<NodeIndex> {
        visit_from(Reversed(&self.graph), targets)
    }
}

fn visit_from<G>(
    graph: G,
    roots: &[NodeIndex],
) -> HashSet<NodeIndex>
where
    G: IntoNeighbors<NodeId = NodeIndex> + Visitable<NodeId = NodeIndex>,
{
    let mut dfs = Dfs::empty(graph);
    let mut seen = HashSet::new();
    for root in roots {
        dfs.move_to(*root);
        while let Some(ix) = dfs.next(graph) {
            seen.insert(ix);
        }
    }
    seen
}
