//! Bounded-depth neighborhood (subgraph) queries.
//!
//! Round-based frontier expansion from a center node: each round scans the
//! edge list, pulls unvisited endpoints of edges touching the visited set
//! into the frontier, and records every edge whose endpoints are both
//! inside the running set. Terminates at the depth bound or at a fixed
//! point, whichever comes first.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::GraphError;
use crate::model::{Edge, EdgeId, Node, NodeId, NodeType};

use super::store::GraphStore;
use super::GraphResult;

/// Maximum accepted traversal depth.
///
/// Precondition: `depth` must be in `0..=MAX_DEPTH`; larger values are
/// rejected with [`GraphError::DepthOutOfRange`]. Depth 0 returns only the
/// center node and no edges.
pub const MAX_DEPTH: usize = 3;

/// The induced neighborhood of a center node.
///
/// Nodes always include the center. Every returned edge has both endpoints
/// in the node set, and no edge between two returned nodes is omitted, so
/// every path of length ≤ `depth` from the center is reconstructible.
#[derive(Debug, Clone, Serialize)]
pub struct Subgraph {
    pub center: NodeId,
    pub depth: usize,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Extract the subgraph reachable from `center` within `depth` hops.
///
/// `type_filter` restricts which nodes may join the frontier; the center is
/// always included even when it does not match. Complexity is
/// O(depth × |E|) over a single edge snapshot.
pub fn subgraph(
    store: &GraphStore,
    center: &NodeId,
    depth: usize,
    type_filter: Option<NodeType>,
) -> GraphResult<Subgraph> {
    if depth > MAX_DEPTH {
        return Err(GraphError::DepthOutOfRange {
            depth,
            max: MAX_DEPTH,
        });
    }
    // NodeNotFound surfaces before any traversal work.
    let center_node = store.get_node(center)?;

    // Depth 0 is the center alone; even self-loops stay out.
    if depth == 0 {
        return Ok(Subgraph {
            center: center.clone(),
            depth,
            nodes: vec![center_node],
            edges: Vec::new(),
        });
    }

    let all_edges = store.edges();
    let mut visited: HashSet<NodeId> = HashSet::new();
    visited.insert(center.clone());
    let mut relevant: HashMap<EdgeId, Edge> = HashMap::new();

    let admits = |store: &GraphStore, id: &NodeId| -> bool {
        match type_filter {
            None => store.contains_node(id),
            Some(t) => store
                .get_node(id)
                .map(|n| n.node_type == t)
                .unwrap_or(false),
        }
    };

    for _round in 0..depth {
        let mut frontier: HashSet<NodeId> = HashSet::new();
        for edge in &all_edges {
            let source_in = visited.contains(&edge.source);
            let target_in = visited.contains(&edge.target);
            match (source_in, target_in) {
                (true, true) => {
                    relevant.insert(edge.id.clone(), edge.clone());
                }
                (true, false) => {
                    if admits(store, &edge.target) {
                        frontier.insert(edge.target.clone());
                        relevant.insert(edge.id.clone(), edge.clone());
                    }
                }
                (false, true) => {
                    if admits(store, &edge.source) {
                        frontier.insert(edge.source.clone());
                        relevant.insert(edge.id.clone(), edge.clone());
                    }
                }
                (false, false) => {}
            }
        }
        if frontier.is_empty() {
            break;
        }
        visited.extend(frontier);
    }

    // Closing sweep: edges between nodes that joined in the same round were
    // unseen above; no edge between two included nodes may be omitted.
    for edge in &all_edges {
        if visited.contains(&edge.source) && visited.contains(&edge.target) {
            relevant.insert(edge.id.clone(), edge.clone());
        }
    }

    let mut nodes: Vec<Node> = visited
        .iter()
        .filter_map(|id| store.get_node(id).ok())
        .collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));

    let mut edges: Vec<Edge> = relevant.into_values().collect();
    edges.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(Subgraph {
        center: center.clone(),
        depth,
        nodes,
        edges,
    })
}
