//! Execution-order resolution.
//!
//! [`resolve_order`] turns a workflow into a [`Plan`]: a layered topological
//! order an external runtime can walk. Both arms of a conditional are planned;
//! the runtime picks one when it evaluates the condition. Loops that pass
//! through a conditional arm are cut at their closing edge, which is reported
//! in [`Plan::back_edges`]. A loop with no conditional exit cannot be planned.

use std::collections::{HashMap, HashSet};

use petgraph::{
    algo::tarjan_scc,
    graph::{DiGraph, EdgeIndex, NodeIndex},
    visit::EdgeRef,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    AgentflowError, Result,
    workflow::{
        Workflow, WorkflowGraph,
        edge::EdgeId,
        node::{NodeId, NodeKind},
    },
};

/// How many of a step's dependencies must complete before it runs.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JoinPolicy {
    /// Every dependency must complete.
    All,
    /// One completed dependency suffices (merge after a conditional).
    Any,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub node_id: NodeId,
    pub kind: NodeKind,
    /// Resolution layer; steps sharing a depth do not depend on each other.
    pub depth: usize,
    pub depends_on: Vec<NodeId>,
    /// Set when the step is entered only through one arm of a conditional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<bool>,
    pub join_policy: JoinPolicy,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub steps: Vec<Step>,
    /// Edges that re-enter an earlier step of a conditional loop.
    #[serde(default)]
    pub back_edges: Vec<EdgeId>,
}

impl Plan {
    pub fn step(
        &self,
        node_id: &str,
    ) -> Option<&Step> {
        self.steps.iter().find(|s| s.node_id == node_id)
    }

    pub fn node_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.node_id.as_str()).collect()
    }

    /// Steps grouped by depth.
    pub fn layers(&self) -> Vec<Vec<&Step>> {
        let mut layers: Vec<Vec<&Step>> = Vec::new();
        for step in self.steps.iter() {
            if layers.len() <= step.depth {
                layers.resize_with(step.depth + 1, Vec::new);
            }
            layers[step.depth].push(step);
        }
        layers
    }
}

/// Resolves a deterministic execution order for `workflow`.
///
/// Independent steps within a layer are ordered by ascending `(y, x)`
/// position. Fails with [`AgentflowError::CyclicGraph`] when a cycle has no
/// conditional edge on it. A node repeating an earlier node's id is not
/// planned; only the first node with an id gets a step.
pub fn resolve_order(workflow: &Workflow) -> Result<Plan> {
    debug!(nodes = workflow.nodes.len(), edges = workflow.edges.len(), "resolving execution order");

    let graph = WorkflowGraph::new(workflow);

    if let Some(cycle) = find_unconditional_cycle(&graph) {
        let node_ids: Vec<NodeId> = cycle.into_iter().map(|ix| graph.node(ix).id.clone()).collect();
        debug!(?node_ids, "unconditional cycle");
        return Err(AgentflowError::CyclicGraph { node_ids });
    }

    let back_edges = find_back_edges(&graph);
    for eix in back_edges.iter() {
        trace!(edge = %graph.edge(*eix).id, "loop back edge");
    }

    let steps = layered_order(&graph, &back_edges)?;

    let mut back_edges: Vec<EdgeIndex> = back_edges.into_iter().collect();
    back_edges.sort_by_key(|eix| graph.edge_seq(*eix));

    Ok(Plan {
        steps,
        back_edges: back_edges.into_iter().map(|eix| graph.edge(eix).id.clone()).collect(),
    })
}

/// Finds a cycle made only of edges that do not leave a conditional.
///
/// The cycle starts at the visually first node of the visually first
/// strongly connected component that contains one.
fn find_unconditional_cycle(graph: &WorkflowGraph) -> Option<Vec<NodeIndex>> {
    let mut plain: DiGraph<(), ()> = DiGraph::with_capacity(graph.node_count(), 0);
    for _ in graph.node_indices() {
        plain.add_node(());
    }
    for ix in graph.node_indices() {
        if graph.node(ix).kind() == NodeKind::Conditional {
            continue;
        }
        for (_, target) in graph.successors(ix) {
            plain.add_edge(ix, target, ());
        }
    }

    let start = tarjan_scc(&plain)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .filter_map(|scc| scc.iter().copied().min_by_key(|ix| graph.order_key(*ix)).map(|first| (first, scc)))
        .min_by_key(|(first, _)| graph.order_key(*first))?;

    let (first, scc) = start;
    let members: HashSet<NodeIndex> = scc.into_iter().collect();

    // breadth-first inside the component until an edge returns to `first`
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = std::collections::VecDeque::from([first]);
    let mut visited = HashSet::from([first]);
    while let Some(ix) = queue.pop_front() {
        let mut successors: Vec<NodeIndex> = plain.neighbors(ix).filter(|t| members.contains(t)).collect();
        successors.sort_by_key(|t| graph.order_key(*t));
        successors.dedup();

        for target in successors {
            if target == first {
                let mut cycle = vec![ix];
                let mut cur = ix;
                while let Some(&p) = parent.get(&cur) {
                    cycle.push(p);
                    cur = p;
                }
                cycle.reverse();
                return Some(cycle);
            }
            if visited.insert(target) {
                parent.insert(target, ix);
                queue.push_back(target);
            }
        }
    }

    // a strongly connected component always closes back on itself
    let mut members: Vec<NodeIndex> = members.into_iter().collect();
    members.sort_by_key(|ix| graph.order_key(*ix));
    Some(members)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

struct Frame {
    node: NodeIndex,
    successors: Vec<(EdgeIndex, NodeIndex)>,
    cursor: usize,
}

/// Depth-first search from the start node(s), then from any node left
/// over, collecting the edges that close a loop.
fn find_back_edges(graph: &WorkflowGraph) -> HashSet<EdgeIndex> {
    let mut roots = graph.nodes_of_kind(NodeKind::Start);
    roots.sort_by_key(|ix| graph.order_key(*ix));
    let mut rest: Vec<NodeIndex> = graph.node_indices().filter(|ix| graph.is_canonical(*ix)).collect();
    rest.sort_by_key(|ix| graph.order_key(*ix));
    roots.extend(rest);

    let mut state = vec![Visit::New; graph.node_count()];
    let mut back_edges = HashSet::new();

    for root in roots {
        if state[root.index()] != Visit::New {
            continue;
        }
        state[root.index()] = Visit::Active;
        let mut stack = vec![Frame {
            node: root,
            successors: graph.successors(root),
            cursor: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let node = frame.node;
            let next = frame.successors.get(frame.cursor).copied();
            frame.cursor += 1;

            match next {
                Some((eix, target)) => match state[target.index()] {
                    Visit::New => {
                        state[target.index()] = Visit::Active;
                        stack.push(Frame {
                            node: target,
                            successors: graph.successors(target),
                            cursor: 0,
                        });
                    }
                    Visit::Active => {
                        back_edges.insert(eix);
                    }
                    Visit::Done => {}
                },
                None => {
                    state[node.index()] = Visit::Done;
                    stack.pop();
                }
            }
        }
    }

    back_edges
}

/// Kahn's algorithm, one layer at a time, ignoring back edges.
fn layered_order(
    graph: &WorkflowGraph,
    back_edges: &HashSet<EdgeIndex>,
) -> Result<Vec<Step>> {
    let mut in_degree = vec![0usize; graph.node_count()];
    for ix in graph.node_indices() {
        for (eix, target) in graph.successors(ix) {
            if !back_edges.contains(&eix) {
                in_degree[target.index()] += 1;
            }
        }
    }

    let planned: Vec<NodeIndex> = graph.node_indices().filter(|ix| graph.is_canonical(*ix)).collect();
    let mut layer: Vec<NodeIndex> = planned.iter().copied().filter(|ix| in_degree[ix.index()] == 0).collect();
    layer.sort_by_key(|ix| graph.order_key(*ix));

    let mut placed: HashMap<NodeIndex, usize> = HashMap::new();
    let mut steps = Vec::with_capacity(planned.len());
    let mut depth = 0;

    while !layer.is_empty() {
        let mut next = Vec::new();
        for ix in layer {
            let step = build_step(graph, ix, depth, back_edges, &placed);
            trace!(node = %step.node_id, depth, "planned step");
            placed.insert(ix, steps.len());
            steps.push(step);

            for (eix, target) in graph.successors(ix) {
                if back_edges.contains(&eix) {
                    continue;
                }
                in_degree[target.index()] -= 1;
                if in_degree[target.index()] == 0 {
                    next.push(target);
                }
            }
        }
        next.sort_by_key(|ix| graph.order_key(*ix));
        layer = next;
        depth += 1;
    }

    if steps.len() < planned.len() {
        let node_ids = planned.iter().filter(|ix| !placed.contains_key(*ix)).map(|ix| graph.node(*ix).id.clone()).collect();
        return Err(AgentflowError::CyclicGraph { node_ids });
    }

    Ok(steps)
}

fn build_step(
    graph: &WorkflowGraph,
    ix: NodeIndex,
    depth: usize,
    back_edges: &HashSet<EdgeIndex>,
    placed: &HashMap<NodeIndex, usize>,
) -> Step {
    let node = graph.node(ix);
    let incoming: Vec<_> = graph.incoming(ix).filter(|e| !back_edges.contains(&e.id())).collect();

    let mut sources: Vec<NodeIndex> = incoming.iter().map(|e| e.source()).collect();
    sources.sort_by_key(|s| placed.get(s).copied().unwrap_or(usize::MAX));
    sources.dedup();

    // a branch tag only when every way in is the same conditional arm
    let arms: Vec<Option<bool>> = incoming
        .iter()
        .map(|e| {
            let from_conditional = graph.node(e.source()).kind() == NodeKind::Conditional;
            if from_conditional { graph.edge(e.id()).source_handle.branch() } else { None }
        })
        .collect();
    let branch = match arms.first() {
        Some(Some(first)) if arms.iter().all(|arm| *arm == Some(*first)) => Some(*first),
        _ => None,
    };

    let join_policy = if node.kind() == NodeKind::Merge { JoinPolicy::Any } else { JoinPolicy::All };

    Step {
        node_id: node.id.clone(),
        kind: node.kind(),
        depth,
        depends_on: sources.into_iter().map(|s| graph.node(s).id.clone()).collect(),
        branch,
        join_policy,
    }
}
