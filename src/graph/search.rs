//! Node ranking and search over labels/descriptions.
//!
//! Two distinct truncation policies live here and must not be conflated:
//!
//! - [`search_nodes`] is the text-search entry point: candidates are ranked
//!   by tiered relevance with importance as tie-break, then truncated.
//! - [`capped_graph`] is the "give me the graph, but capped" entry point:
//!   when the filtered node count exceeds the limit, the top nodes by
//!   importance alone are kept.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::GraphError;
use crate::model::{Edge, GraphMetadata, Node, NodeId, NodeType};

use super::store::GraphStore;
use super::GraphResult;

/// Relevance for an exact (lowercased) label match.
const EXACT_MATCH: u32 = 100;
/// Relevance when the label starts with the query.
const PREFIX_MATCH: u32 = 50;
/// Relevance when the label merely contains the query.
const CONTAINS_MATCH: u32 = 25;
/// Added when the description also contains the query, independent of the
/// label tier.
const DESCRIPTION_BONUS: u32 = 10;

/// Tiered relevance of a node against a lowercased query. Zero means no
/// match on either label or description.
fn relevance(node: &Node, query: &str) -> u32 {
    let label = node.label.to_lowercase();
    let mut score = if label == query {
        EXACT_MATCH
    } else if label.starts_with(query) {
        PREFIX_MATCH
    } else if label.contains(query) {
        CONTAINS_MATCH
    } else {
        0
    };
    if let Some(description) = &node.description {
        if description.to_lowercase().contains(query) {
            score += DESCRIPTION_BONUS;
        }
    }
    score
}

/// Free-text search over node labels and descriptions.
///
/// Nodes matching neither label nor description are excluded entirely.
/// Results are ordered by (relevance desc, importance desc); `limit`
/// truncates after that sort. An empty query returns no results.
pub fn search_nodes(
    store: &GraphStore,
    query: &str,
    type_filter: Option<NodeType>,
    limit: Option<usize>,
) -> GraphResult<Vec<Node>> {
    if limit == Some(0) {
        return Err(GraphError::LimitOutOfRange { limit: 0 });
    }
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let mut scored: Vec<(u32, Node)> = store
        .nodes()
        .into_iter()
        .filter(|n| type_filter.map_or(true, |t| n.node_type == t))
        .filter_map(|n| {
            let score = relevance(&n, &query);
            (score > 0).then_some((score, n))
        })
        .collect();

    scored.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then(
                b.1.importance
                    .partial_cmp(&a.1.importance)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(a.1.id.cmp(&b.1.id))
    });

    if let Some(limit) = limit {
        scored.truncate(limit);
    }
    Ok(scored.into_iter().map(|(_, n)| n).collect())
}

/// A filtered view of the whole graph, with metadata.
#[derive(Debug, Clone, Serialize)]
pub struct GraphView {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub metadata: GraphMetadata,
}

/// The whole graph, optionally filtered and capped by importance.
///
/// `text_filter` keeps nodes whose label or description contains the text
/// (case-insensitive). When more than `limit` nodes remain, the top `limit`
/// by importance are kept — importance-based truncation, not a ranked text
/// search. Returned edges are those with both endpoints retained.
pub fn capped_graph(
    store: &GraphStore,
    limit: Option<usize>,
    type_filter: Option<NodeType>,
    text_filter: Option<&str>,
) -> GraphResult<GraphView> {
    if limit == Some(0) {
        return Err(GraphError::LimitOutOfRange { limit: 0 });
    }
    let text = text_filter.map(|t| t.trim().to_lowercase());

    let mut nodes: Vec<Node> = store
        .nodes()
        .into_iter()
        .filter(|n| type_filter.map_or(true, |t| n.node_type == t))
        .filter(|n| {
            text.as_deref().map_or(true, |t| {
                n.label.to_lowercase().contains(t)
                    || n.description
                        .as_ref()
                        .is_some_and(|d| d.to_lowercase().contains(t))
            })
        })
        .collect();

    if let Some(limit) = limit {
        if nodes.len() > limit {
            nodes.sort_by(|a, b| {
                b.importance
                    .partial_cmp(&a.importance)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.id.cmp(&b.id))
            });
            nodes.truncate(limit);
        }
    }
    nodes.sort_by(|a, b| a.id.cmp(&b.id));

    let kept: HashSet<&NodeId> = nodes.iter().map(|n| &n.id).collect();
    let mut edges: Vec<Edge> = store
        .edges()
        .into_iter()
        .filter(|e| kept.contains(&e.source) && kept.contains(&e.target))
        .collect();
    edges.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(GraphView {
        nodes,
        edges,
        metadata: store.metadata(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EdgeType;

    fn seed_store() -> GraphStore {
        let store = GraphStore::new();
        store.upsert_node(
            Node::new(NodeType::Topic, "Rust")
                .with_importance(0.9)
                .with_description("systems programming language"),
        );
        store.upsert_node(
            Node::new(NodeType::Topic, "Rust Belt")
                .with_importance(0.4)
                .with_description("industrial region"),
        );
        store.upsert_node(
            Node::new(NodeType::Topic, "Trust")
                .with_importance(0.7)
                .with_description("reliance on others"),
        );
        store.upsert_node(
            Node::new(NodeType::Person, "Rusty Shackleford").with_importance(0.5),
        );
        store.upsert_node(
            Node::new(NodeType::Topic, "Gardening")
                .with_importance(0.95)
                .with_description("rust-resistant tomato varieties"),
        );
        store
    }

    #[test]
    fn tier_ordering_exact_then_prefix_then_contains() {
        let store = seed_store();
        let results = search_nodes(&store, "rust", None, None).unwrap();
        let labels: Vec<_> = results.iter().map(|n| n.label.as_str()).collect();
        // exact(100) > prefix(50) > prefix(50) > contains(25)
        assert_eq!(labels[0], "Rust");
        // Prefix matches: "Rust Belt" (0.4) and "Rusty Shackleford" (0.5) —
        // importance breaks the tie.
        assert_eq!(labels[1], "Rusty Shackleford");
        assert_eq!(labels[2], "Rust Belt");
        assert_eq!(labels[3], "Trust");
    }

    #[test]
    fn description_only_match_is_included() {
        let store = seed_store();
        let results = search_nodes(&store, "tomato", None, None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].label, "Gardening");
    }

    #[test]
    fn non_matching_nodes_are_excluded() {
        let store = seed_store();
        let results = search_nodes(&store, "quantum", None, None).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn type_filter_applies() {
        let store = seed_store();
        let results = search_nodes(&store, "rust", Some(NodeType::Person), None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].label, "Rusty Shackleford");
    }

    #[test]
    fn limit_truncates_after_relevance_sort() {
        let store = seed_store();
        let results = search_nodes(&store, "rust", None, Some(2)).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].label, "Rust");
        assert_eq!(results[1].label, "Rusty Shackleford");
    }

    #[test]
    fn zero_limit_is_rejected() {
        let store = seed_store();
        let err = search_nodes(&store, "rust", None, Some(0)).unwrap_err();
        assert!(matches!(err, GraphError::LimitOutOfRange { limit: 0 }));
        let err = capped_graph(&store, Some(0), None, None).unwrap_err();
        assert!(matches!(err, GraphError::LimitOutOfRange { limit: 0 }));
    }

    #[test]
    fn empty_query_returns_nothing() {
        let store = seed_store();
        assert!(search_nodes(&store, "   ", None, None).unwrap().is_empty());
    }

    #[test]
    fn capped_graph_truncates_by_importance_alone() {
        let store = seed_store();
        let view = capped_graph(&store, Some(2), None, None).unwrap();
        let labels: Vec<_> = view.nodes.iter().map(|n| n.label.as_str()).collect();
        // Top-2 by importance: Gardening (0.95) and Rust (0.9) — relevance
        // plays no part here.
        assert!(labels.contains(&"Gardening"));
        assert!(labels.contains(&"Rust"));
        assert_eq!(view.metadata.total_nodes, 5);
    }

    #[test]
    fn capped_graph_keeps_edges_between_retained_nodes() {
        let store = seed_store();
        store
            .upsert_edge(Edge::new(
                NodeId::for_entity(NodeType::Topic, "Rust"),
                EdgeType::RelatedTo,
                NodeId::for_entity(NodeType::Topic, "Gardening"),
            ))
            .unwrap();
        store
            .upsert_edge(Edge::new(
                NodeId::for_entity(NodeType::Topic, "Rust"),
                EdgeType::RelatedTo,
                NodeId::for_entity(NodeType::Topic, "Trust"),
            ))
            .unwrap();

        let view = capped_graph(&store, Some(2), None, None).unwrap();
        // Only the Rust–Gardening edge survives; Trust was truncated away.
        assert_eq!(view.edges.len(), 1);
        assert_eq!(view.edges[0].target, NodeId::for_entity(NodeType::Topic, "Gardening"));
    }

    #[test]
    fn text_filter_on_whole_graph() {
        let store = seed_store();
        let view = capped_graph(&store, None, None, Some("rust")).unwrap();
        // Label or description contains "rust": Rust, Rust Belt, Rusty
        // Shackleford, Gardening (description), Trust (label contains).
        assert_eq!(view.nodes.len(), 5);

        let view = capped_graph(&store, None, Some(NodeType::Person), Some("rust")).unwrap();
        assert_eq!(view.nodes.len(), 1);
    }
}
