//! In-memory graph store with identity indices.
//!
//! Uses `petgraph` for the graph structure and `DashMap` for O(1) lookups
//! by node/edge identity. Mutations serialize on a coarse write lock;
//! reads share a read lock and never hold iteration state between calls.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::error::GraphError;
use crate::model::{Edge, EdgeId, GraphMetadata, Node, NodeId, SCHEMA_VERSION};

use super::GraphResult;

/// In-memory knowledge graph store.
///
/// `StableDiGraph` keeps node indices valid across evictions. Direction is
/// preserved in storage; [`GraphStore::neighbors`] matches either endpoint.
pub struct GraphStore {
    /// The directed graph: node weights are identities, edge weights too.
    /// Authoritative node/edge data lives in the identity maps.
    graph: RwLock<StableDiGraph<NodeId, EdgeId>>,
    nodes: DashMap<NodeId, Node>,
    node_index: DashMap<NodeId, NodeIndex>,
    edges: DashMap<EdgeId, Edge>,
    edge_index: DashMap<EdgeId, EdgeIndex>,
    last_updated: RwLock<DateTime<Utc>>,
    /// Optional growth bound; `None` means unbounded.
    max_nodes: Option<usize>,
}

impl GraphStore {
    /// Create a new empty, unbounded graph store.
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    /// Create a store that evicts lowest-importance nodes beyond `max_nodes`.
    pub fn with_capacity(max_nodes: Option<usize>) -> Self {
        Self {
            graph: RwLock::new(StableDiGraph::new()),
            nodes: DashMap::new(),
            node_index: DashMap::new(),
            edges: DashMap::new(),
            edge_index: DashMap::new(),
            last_updated: RwLock::new(Utc::now()),
            max_nodes,
        }
    }

    fn touch(&self) {
        *self.last_updated.write().expect("metadata lock poisoned") = Utc::now();
    }

    /// Insert a node, or merge into the existing node with the same identity.
    ///
    /// Returns `true` when the node is new. Merging keeps non-empty incoming
    /// fields, never lowers importance, and bumps `updated_at`.
    pub fn upsert_node(&self, node: Node) -> bool {
        if let Some(mut existing) = self.nodes.get_mut(&node.id) {
            existing.merge(&node);
            drop(existing);
            self.touch();
            return false;
        }

        {
            let mut graph = self.graph.write().expect("graph lock poisoned");
            // Double-check after acquiring the write lock.
            if let Some(mut existing) = self.nodes.get_mut(&node.id) {
                existing.merge(&node);
                drop(existing);
                drop(graph);
                self.touch();
                return false;
            }
            let idx = graph.add_node(node.id.clone());
            self.node_index.insert(node.id.clone(), idx);
            self.nodes.insert(node.id.clone(), node);
        }
        self.touch();
        self.enforce_capacity();
        true
    }

    /// Insert an edge between two existing nodes.
    ///
    /// Fails with [`GraphError::EndpointMissing`] when either endpoint is
    /// absent. Idempotent on identity: re-inserting an existing edge id is a
    /// no-op and returns `false`.
    pub fn upsert_edge(&self, edge: Edge) -> GraphResult<bool> {
        if self.edges.contains_key(&edge.id) {
            return Ok(false);
        }

        let mut graph = self.graph.write().expect("graph lock poisoned");
        if self.edges.contains_key(&edge.id) {
            return Ok(false);
        }

        let source_idx = self
            .node_index
            .get(&edge.source)
            .map(|r| *r.value())
            .ok_or_else(|| GraphError::EndpointMissing {
                edge: edge.id.to_string(),
                endpoint: edge.source.to_string(),
            })?;
        let target_idx = self
            .node_index
            .get(&edge.target)
            .map(|r| *r.value())
            .ok_or_else(|| GraphError::EndpointMissing {
                edge: edge.id.to_string(),
                endpoint: edge.target.to_string(),
            })?;

        let idx = graph.add_edge(source_idx, target_idx, edge.id.clone());
        self.edge_index.insert(edge.id.clone(), idx);
        self.edges.insert(edge.id.clone(), edge);
        drop(graph);
        self.touch();
        Ok(true)
    }

    /// Look up a node by identity.
    pub fn get_node(&self, id: &NodeId) -> GraphResult<Node> {
        self.nodes
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| GraphError::NodeNotFound { id: id.to_string() })
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up an edge by identity.
    pub fn get_edge(&self, id: &EdgeId) -> Option<Edge> {
        self.edges.get(id).map(|r| r.value().clone())
    }

    /// All edges touching `id`, paired with the identity of the other
    /// endpoint. Direction-agnostic; built fresh per call.
    pub fn neighbors(&self, id: &NodeId) -> Vec<(Edge, NodeId)> {
        let graph = self.graph.read().expect("graph lock poisoned");
        let Some(idx) = self.node_index.get(id).map(|r| *r.value()) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for direction in [Direction::Outgoing, Direction::Incoming] {
            for edge_ref in graph.edges_directed(idx, direction) {
                let other_idx = match direction {
                    Direction::Outgoing => edge_ref.target(),
                    Direction::Incoming => edge_ref.source(),
                };
                let Some(other) = graph.node_weight(other_idx) else {
                    continue;
                };
                if let Some(edge) = self.edges.get(edge_ref.weight()) {
                    out.push((edge.value().clone(), other.clone()));
                }
            }
        }
        out
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Snapshot of all nodes.
    pub fn nodes(&self) -> Vec<Node> {
        self.nodes.iter().map(|e| e.value().clone()).collect()
    }

    /// Snapshot of all edges.
    pub fn edges(&self) -> Vec<Edge> {
        self.edges.iter().map(|e| e.value().clone()).collect()
    }

    /// Current counts and last-updated timestamp. Read-your-writes within a
    /// single caller: counters change atomically with the mutation.
    pub fn metadata(&self) -> GraphMetadata {
        GraphMetadata {
            total_nodes: self.nodes.len(),
            total_edges: self.edges.len(),
            last_updated: *self.last_updated.read().expect("metadata lock poisoned"),
            schema_version: SCHEMA_VERSION.to_string(),
        }
    }

    /// Evict lowest-(importance, updated_at) nodes until within `max_nodes`.
    fn enforce_capacity(&self) {
        let Some(max) = self.max_nodes else { return };
        while self.nodes.len() > max {
            let victim = self
                .nodes
                .iter()
                .map(|e| {
                    let n = e.value();
                    (n.id.clone(), n.importance, n.updated_at)
                })
                .min_by(|a, b| {
                    a.1.partial_cmp(&b.1)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(a.2.cmp(&b.2))
                });
            let Some((id, importance, _)) = victim else { return };
            tracing::debug!(node = %id, importance, "evicting node to stay within capacity");
            self.remove_node(&id);
        }
    }

    /// Remove a node and its incident edges. Eviction-only path; there is no
    /// general deletion API.
    fn remove_node(&self, id: &NodeId) {
        let mut graph = self.graph.write().expect("graph lock poisoned");
        let Some((_, idx)) = self.node_index.remove(id) else {
            return;
        };

        let incident: Vec<EdgeId> = graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.weight().clone())
            .collect();
        for edge_id in incident {
            self.edges.remove(&edge_id);
            self.edge_index.remove(&edge_id);
        }

        graph.remove_node(idx);
        self.nodes.remove(id);
        drop(graph);
        self.touch();
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdgeType, NodeType};

    fn topic(label: &str) -> Node {
        Node::new(NodeType::Topic, label)
    }

    #[test]
    fn upsert_and_lookup() {
        let store = GraphStore::new();
        assert!(store.upsert_node(topic("Rust")));
        assert!(store.contains_node(&NodeId::new("topic:rust")));
        let node = store.get_node(&NodeId::new("topic:rust")).unwrap();
        assert_eq!(node.label, "Rust");
        assert_eq!(store.metadata().total_nodes, 1);
    }

    #[test]
    fn reinsert_merges_instead_of_duplicating() {
        let store = GraphStore::new();
        store.upsert_node(topic("Rust").with_importance(0.8));
        let fresh = store.upsert_node(topic("Rust").with_importance(0.3).with_description("lang"));
        assert!(!fresh);
        assert_eq!(store.node_count(), 1);

        let node = store.get_node(&NodeId::new("topic:rust")).unwrap();
        // Importance never lowered, new description merged in.
        assert!((node.importance - 0.8).abs() < f64::EPSILON);
        assert_eq!(node.description.as_deref(), Some("lang"));
    }

    #[test]
    fn edge_requires_both_endpoints() {
        let store = GraphStore::new();
        store.upsert_node(topic("Rust"));
        let edge = Edge::new(
            NodeId::new("topic:rust"),
            EdgeType::RelatedTo,
            NodeId::new("topic:zig"),
        );
        let err = store.upsert_edge(edge).unwrap_err();
        assert!(matches!(err, GraphError::EndpointMissing { .. }));

        store.upsert_node(topic("Zig"));
        let edge = Edge::new(
            NodeId::new("topic:rust"),
            EdgeType::RelatedTo,
            NodeId::new("topic:zig"),
        );
        assert!(store.upsert_edge(edge).unwrap());
    }

    #[test]
    fn duplicate_edge_is_noop() {
        let store = GraphStore::new();
        store.upsert_node(topic("Rust"));
        store.upsert_node(topic("Zig"));
        let mk = || {
            Edge::new(
                NodeId::new("topic:rust"),
                EdgeType::RelatedTo,
                NodeId::new("topic:zig"),
            )
        };
        assert!(store.upsert_edge(mk()).unwrap());
        assert!(!store.upsert_edge(mk()).unwrap());
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn get_edge_by_identity() {
        let store = GraphStore::new();
        store.upsert_node(topic("Rust"));
        store.upsert_node(topic("Zig"));
        let edge = Edge::new(
            NodeId::new("topic:rust"),
            EdgeType::RelatedTo,
            NodeId::new("topic:zig"),
        );
        let id = edge.id.clone();
        store.upsert_edge(edge).unwrap();

        let found = store.get_edge(&id).unwrap();
        assert_eq!(found.id, id);
        assert!(store.get_edge(&EdgeId::derive(
            &NodeId::new("topic:zig"),
            EdgeType::RelatedTo,
            &NodeId::new("topic:rust"),
        )).is_none());
    }

    #[test]
    fn neighbors_match_either_endpoint() {
        let store = GraphStore::new();
        store.upsert_node(topic("Rust"));
        store.upsert_node(topic("Zig"));
        store
            .upsert_edge(Edge::new(
                NodeId::new("topic:rust"),
                EdgeType::RelatedTo,
                NodeId::new("topic:zig"),
            ))
            .unwrap();

        let from_source = store.neighbors(&NodeId::new("topic:rust"));
        assert_eq!(from_source.len(), 1);
        assert_eq!(from_source[0].1, NodeId::new("topic:zig"));

        let from_target = store.neighbors(&NodeId::new("topic:zig"));
        assert_eq!(from_target.len(), 1);
        assert_eq!(from_target[0].1, NodeId::new("topic:rust"));
    }

    #[test]
    fn neighbors_of_unknown_node_is_empty() {
        let store = GraphStore::new();
        assert!(store.neighbors(&NodeId::new("topic:ghost")).is_empty());
    }

    #[test]
    fn capacity_evicts_lowest_importance() {
        let store = GraphStore::with_capacity(Some(2));
        store.upsert_node(topic("Keep A").with_importance(0.9));
        store.upsert_node(topic("Keep B").with_importance(0.8));
        store.upsert_node(topic("Drop Me").with_importance(0.1));

        assert_eq!(store.node_count(), 2);
        assert!(store.contains_node(&NodeId::new("topic:keep-a")));
        assert!(store.contains_node(&NodeId::new("topic:keep-b")));
        assert!(!store.contains_node(&NodeId::new("topic:drop-me")));
    }

    #[test]
    fn eviction_removes_incident_edges() {
        let store = GraphStore::with_capacity(Some(2));
        store.upsert_node(topic("Hub").with_importance(0.2));
        store.upsert_node(topic("Spoke").with_importance(0.9));
        store
            .upsert_edge(Edge::new(
                NodeId::new("topic:hub"),
                EdgeType::RelatedTo,
                NodeId::new("topic:spoke"),
            ))
            .unwrap();

        store.upsert_node(topic("Newcomer").with_importance(0.9));
        assert_eq!(store.node_count(), 2);
        assert!(!store.contains_node(&NodeId::new("topic:hub")));
        assert_eq!(store.edge_count(), 0);
        assert!(store.neighbors(&NodeId::new("topic:spoke")).is_empty());
    }

    #[test]
    fn metadata_tracks_mutations() {
        let store = GraphStore::new();
        let before = store.metadata();
        assert_eq!(before.total_nodes, 0);
        assert_eq!(before.total_edges, 0);

        store.upsert_node(topic("Rust"));
        store.upsert_node(topic("Zig"));
        store
            .upsert_edge(Edge::new(
                NodeId::new("topic:rust"),
                EdgeType::RelatedTo,
                NodeId::new("topic:zig"),
            ))
            .unwrap();

        let after = store.metadata();
        assert_eq!(after.total_nodes, 2);
        assert_eq!(after.total_edges, 1);
        assert!(after.last_updated >= before.last_updated);
        assert_eq!(after.schema_version, SCHEMA_VERSION);
    }
}
