//! Reconciles extracted entities into the graph.
//!
//! Ingestion is idempotent: node identities derive from type + slug and
//! edge identities from the (source, type, target) triple, so replaying the
//! same extraction produces zero new nodes and zero new edges. When the
//! configured extractor is unavailable the content node is still recorded
//! and the summary is marked degraded.

use serde::{Deserialize, Serialize};

use crate::capability::{EntityExtractor, ExtractedEntities};
use crate::graph::store::GraphStore;
use crate::graph::GraphResult;
use crate::model::{ContentItem, Edge, EdgeId, EdgeType, Node, NodeId, NodeType};

/// What one ingestion pass changed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestSummary {
    pub new_nodes: usize,
    pub new_edges: usize,
    /// True when entity extraction failed and only the content node was
    /// recorded.
    pub degraded: bool,
    /// Every node written or re-merged this pass, for write-through
    /// persistence.
    pub touched_nodes: Vec<NodeId>,
    pub touched_edges: Vec<EdgeId>,
}

impl IngestSummary {
    fn absorb(&mut self, other: IngestSummary) {
        self.new_nodes += other.new_nodes;
        self.new_edges += other.new_edges;
        self.degraded |= other.degraded;
        self.touched_nodes.extend(other.touched_nodes);
        self.touched_edges.extend(other.touched_edges);
    }
}

/// Pre-extracted entities supplied directly, e.g. from a file.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionPayload {
    pub content_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    pub entities: ExtractedEntities,
}

/// Map an extraction kind name to a node type.
pub fn node_type_for_kind(kind: &str) -> NodeType {
    match kind.trim().to_lowercase().as_str() {
        "people" | "person" => NodeType::Person,
        "organizations" | "organization" | "orgs" => NodeType::Organization,
        "topics" | "topic" => NodeType::Topic,
        "concepts" | "concept" => NodeType::Concept,
        "authors" | "author" => NodeType::Author,
        other => NodeType::parse(other),
    }
}

fn upsert_node(store: &GraphStore, node: Node, summary: &mut IngestSummary) {
    let id = node.id.clone();
    if store.upsert_node(node) {
        summary.new_nodes += 1;
    }
    summary.touched_nodes.push(id);
}

fn upsert_edge(store: &GraphStore, edge: Edge, summary: &mut IngestSummary) -> GraphResult<()> {
    let id = edge.id.clone();
    if store.upsert_edge(edge)? {
        summary.new_edges += 1;
    }
    summary.touched_edges.push(id);
    Ok(())
}

/// Write a content node plus its extracted entities into the graph.
///
/// Every entity gets a `mentions` edge from the content node, and entities
/// co-occurring in the same extraction are linked pairwise with
/// `related_to` edges.
pub fn ingest_extraction(
    store: &GraphStore,
    content_id: &str,
    title: Option<&str>,
    source_url: Option<&str>,
    entities: &ExtractedEntities,
) -> GraphResult<IngestSummary> {
    let mut summary = IngestSummary::default();

    let content_node_id = NodeId::for_content(content_id);
    let mut content_node = Node::new(NodeType::Content, title.unwrap_or(content_id))
        .with_id(content_node_id.clone())
        .with_importance(0.3)
        .with_property("content_id", content_id);
    if let Some(url) = source_url {
        content_node = content_node.with_property("url", url);
    }
    upsert_node(store, content_node, &mut summary);

    let mut entity_ids: Vec<NodeId> = Vec::new();
    for (kind, labels) in entities {
        let node_type = node_type_for_kind(kind);
        for label in labels {
            if label.trim().is_empty() {
                continue;
            }
            let node = Node::new(node_type, label.trim());
            let entity_id = node.id.clone();
            upsert_node(store, node, &mut summary);
            upsert_edge(
                store,
                Edge::new(content_node_id.clone(), EdgeType::Mentions, entity_id.clone())
                    .with_weight(1.0)
                    .with_confidence(0.8),
                &mut summary,
            )?;
            entity_ids.push(entity_id);
        }
    }

    // Pairwise co-occurrence links, one direction per pair.
    entity_ids.sort();
    entity_ids.dedup();
    for (i, a) in entity_ids.iter().enumerate() {
        for b in entity_ids.iter().skip(i + 1) {
            upsert_edge(
                store,
                Edge::new(a.clone(), EdgeType::RelatedTo, b.clone())
                    .with_weight(0.5)
                    .with_confidence(0.6),
                &mut summary,
            )?;
        }
    }

    Ok(summary)
}

/// Extract entities from a content item and reconcile them into the graph.
///
/// Extraction failure is not fatal: the content node is still written and
/// the summary comes back with `degraded = true`.
pub fn ingest_content(
    store: &GraphStore,
    extractor: &dyn EntityExtractor,
    item: &ContentItem,
) -> GraphResult<IngestSummary> {
    let text = item.full_text();
    match extractor.extract(&text) {
        Ok(entities) => ingest_extraction(
            store,
            &item.id,
            item.title.as_deref(),
            item.url.as_deref(),
            &entities,
        ),
        Err(err) => {
            tracing::warn!(
                error = %err,
                content = %item.id,
                "entity extraction failed, recording content node only"
            );
            let mut summary = ingest_extraction(
                store,
                &item.id,
                item.title.as_deref(),
                item.url.as_deref(),
                &ExtractedEntities::new(),
            )?;
            summary.degraded = true;
            Ok(summary)
        }
    }
}

/// Ingest a batch of content items, accumulating one summary.
pub fn ingest_batch(
    store: &GraphStore,
    extractor: &dyn EntityExtractor,
    items: &[ContentItem],
) -> GraphResult<IngestSummary> {
    let mut total = IngestSummary::default();
    for item in items {
        total.absorb(ingest_content(store, extractor, item)?);
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CapabilityResult, KeywordExtractor};
    use crate::error::CapabilityError;
    use chrono::Utc;

    fn entities(pairs: &[(&str, &[&str])]) -> ExtractedEntities {
        pairs
            .iter()
            .map(|(kind, labels)| {
                (
                    kind.to_string(),
                    labels.iter().map(|l| l.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn extraction_creates_content_entity_and_edges() {
        let store = GraphStore::new();
        let extracted = entities(&[("people", &["Ada Lovelace"]), ("topics", &["computing"])]);
        let summary = ingest_extraction(&store, "c1", Some("History"), None, &extracted).unwrap();

        // content + 2 entities
        assert_eq!(summary.new_nodes, 3);
        // 2 mentions + 1 related_to
        assert_eq!(summary.new_edges, 3);
        assert!(!summary.degraded);
        assert!(store.contains_node(&NodeId::for_content("c1")));
        assert!(store.contains_node(&NodeId::for_entity(NodeType::Person, "Ada Lovelace")));
    }

    #[test]
    fn reingesting_is_a_no_op() {
        let store = GraphStore::new();
        let extracted = entities(&[("people", &["Ada Lovelace"]), ("topics", &["computing"])]);
        ingest_extraction(&store, "c1", Some("History"), None, &extracted).unwrap();
        let second = ingest_extraction(&store, "c1", Some("History"), None, &extracted).unwrap();

        assert_eq!(second.new_nodes, 0);
        assert_eq!(second.new_edges, 0);
        // Touched sets still cover everything, so persistence stays in sync.
        assert_eq!(second.touched_nodes.len(), 3);
    }

    #[test]
    fn same_entity_across_contents_converges_on_one_node() {
        let store = GraphStore::new();
        let extracted = entities(&[("topics", &["rust"])]);
        ingest_extraction(&store, "c1", None, None, &extracted).unwrap();
        let second = ingest_extraction(&store, "c2", None, None, &extracted).unwrap();

        // Only the new content node; the topic already exists.
        assert_eq!(second.new_nodes, 1);
        assert_eq!(store.node_count(), 3);
    }

    struct OfflineExtractor;
    impl EntityExtractor for OfflineExtractor {
        fn extract(&self, _text: &str) -> CapabilityResult<ExtractedEntities> {
            Err(CapabilityError::ServiceUnavailable {
                service: "entity-extraction".into(),
                message: "connection refused".into(),
            })
        }
    }

    #[test]
    fn unavailable_extractor_degrades_but_records_content() {
        let store = GraphStore::new();
        let item = ContentItem::new("c1", Utc::now()).with_title("Breaking news");
        let summary = ingest_content(&store, &OfflineExtractor, &item).unwrap();

        assert!(summary.degraded);
        assert_eq!(summary.new_nodes, 1);
        assert_eq!(summary.new_edges, 0);
        assert!(store.contains_node(&NodeId::for_content("c1")));
    }

    #[test]
    fn keyword_extractor_end_to_end() {
        let store = GraphStore::new();
        let item = ContentItem::new("c1", Utc::now())
            .with_title("Grace Hopper on compilers")
            .with_text("Grace Hopper discussed AI at Google");
        let summary = ingest_content(&store, &KeywordExtractor::new(), &item).unwrap();

        assert!(!summary.degraded);
        assert!(store.contains_node(&NodeId::for_entity(NodeType::Person, "Grace Hopper")));
        assert!(store.contains_node(&NodeId::for_entity(NodeType::Organization, "google")));
        assert!(summary.new_edges >= 2);
    }

    #[test]
    fn kind_names_map_to_node_types() {
        assert_eq!(node_type_for_kind("people"), NodeType::Person);
        assert_eq!(node_type_for_kind("Organizations"), NodeType::Organization);
        assert_eq!(node_type_for_kind("topics"), NodeType::Topic);
        assert_eq!(node_type_for_kind("gibberish"), NodeType::Other);
    }
}
