//! Core data model: typed graph nodes/edges and feed content items.
//!
//! Node identities are stable strings derived from type + name so that
//! re-extracting the same entity always lands on the same node. Content
//! items belong to the feed subsystem; the engine only reads them and
//! produces ephemeral derived scores.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version recorded in [`GraphMetadata`].
pub const SCHEMA_VERSION: &str = "1";

/// Turn a display label into a stable, url-safe slug.
pub fn slugify(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

// ---------------------------------------------------------------------------
// Node & edge types
// ---------------------------------------------------------------------------

/// Classification of a node in the knowledge graph.
///
/// Closed enum with an explicit [`NodeType::Other`] case so that exhaustive
/// matches remain safe when upstream extractors start emitting new kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Person,
    Organization,
    Topic,
    Content,
    Concept,
    Author,
    Entity,
    Other,
}

impl NodeType {
    /// Canonical lowercase name, used in node identities.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Person => "person",
            NodeType::Organization => "organization",
            NodeType::Topic => "topic",
            NodeType::Content => "content",
            NodeType::Concept => "concept",
            NodeType::Author => "author",
            NodeType::Entity => "entity",
            NodeType::Other => "other",
        }
    }

    /// Parse a type name; unknown strings map to [`NodeType::Other`].
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "person" => NodeType::Person,
            "organization" => NodeType::Organization,
            "topic" => NodeType::Topic,
            "content" => NodeType::Content,
            "concept" => NodeType::Concept,
            "author" => NodeType::Author,
            "entity" => NodeType::Entity,
            _ => NodeType::Other,
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of an edge in the knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Mentions,
    RelatedTo,
    PartOf,
    CreatedBy,
    References,
    SimilarTo,
    Authored,
    Other,
}

impl EdgeType {
    /// Canonical lowercase name, used in edge identities.
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeType::Mentions => "mentions",
            EdgeType::RelatedTo => "related_to",
            EdgeType::PartOf => "part_of",
            EdgeType::CreatedBy => "created_by",
            EdgeType::References => "references",
            EdgeType::SimilarTo => "similar_to",
            EdgeType::Authored => "authored",
            EdgeType::Other => "other",
        }
    }

    /// Parse a type name; unknown strings map to [`EdgeType::Other`].
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "mentions" => EdgeType::Mentions,
            "related_to" => EdgeType::RelatedTo,
            "part_of" => EdgeType::PartOf,
            "created_by" => EdgeType::CreatedBy,
            "references" => EdgeType::References,
            "similar_to" => EdgeType::SimilarTo,
            "authored" => EdgeType::Authored,
            _ => EdgeType::Other,
        }
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

/// Stable node identity, unique within a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(raw: impl Into<String>) -> Self {
        NodeId(raw.into())
    }

    /// Derive the identity of an extracted entity: `"{type}:{slug(label)}"`.
    pub fn for_entity(node_type: NodeType, label: &str) -> Self {
        NodeId(format!("{}:{}", node_type.as_str(), slugify(label)))
    }

    /// Derive the identity of a content node from its feed-side content id.
    pub fn for_content(content_id: &str) -> Self {
        NodeId(format!("content:{content_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable edge identity: `"{source}|{type}|{target}"`.
///
/// Deduplication key for the ordered (source, target, type) triple —
/// re-extraction of an existing relation derives the same identity and
/// becomes a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    pub fn derive(source: &NodeId, edge_type: EdgeType, target: &NodeId) -> Self {
        EdgeId(format!("{source}|{}|{target}", edge_type.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// Presentation-only layout hints. Carried along but never invariant-bearing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutHints {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
}

/// A typed node in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub node_type: NodeType,
    /// Display name.
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Ranking weight in [0.0, 1.0]; independent of search relevance.
    pub importance: f64,
    /// Free-form property bag from extraction.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub layout: Option<LayoutHints>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Create a node with the derived entity identity and default importance.
    pub fn new(node_type: NodeType, label: impl Into<String>) -> Self {
        let label = label.into();
        let now = Utc::now();
        Self {
            id: NodeId::for_entity(node_type, &label),
            node_type,
            label,
            description: None,
            importance: 0.5,
            properties: BTreeMap::new(),
            layout: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Override the derived identity (content nodes use the feed content id).
    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = id;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the importance, clamped to [0.0, 1.0].
    pub fn with_importance(mut self, importance: f64) -> Self {
        self.importance = importance.clamp(0.0, 1.0);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Merge a re-inserted node into this one.
    ///
    /// Non-empty incoming fields win; importance is never lowered;
    /// `updated_at` is bumped, `created_at` preserved.
    pub fn merge(&mut self, incoming: &Node) {
        if !incoming.label.is_empty() {
            self.label = incoming.label.clone();
        }
        if let Some(desc) = &incoming.description {
            if !desc.is_empty() {
                self.description = Some(desc.clone());
            }
        }
        if incoming.importance > self.importance {
            self.importance = incoming.importance;
        }
        for (k, v) in &incoming.properties {
            if !v.is_empty() {
                self.properties.insert(k.clone(), v.clone());
            }
        }
        if incoming.layout.is_some() {
            self.layout = incoming.layout.clone();
        }
        self.updated_at = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// A typed, weighted relationship between two nodes.
///
/// Direction is preserved in storage for semantics; traversal treats edges
/// as undirected when discovering neighbors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub edge_type: EdgeType,
    /// Relative strength, typically [0.0, 1.0].
    pub weight: f64,
    /// Extraction confidence in [0.0, 1.0].
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

impl Edge {
    pub fn new(source: NodeId, edge_type: EdgeType, target: NodeId) -> Self {
        Self {
            id: EdgeId::derive(&source, edge_type, &target),
            source,
            target,
            edge_type,
            weight: 1.0,
            confidence: 1.0,
            created_at: Utc::now(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Set the confidence, clamped to [0.0, 1.0].
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

/// Graph-level bookkeeping, kept in step with every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub last_updated: DateTime<Utc>,
    pub schema_version: String,
}

// ---------------------------------------------------------------------------
// Content items
// ---------------------------------------------------------------------------

/// Interaction counters for a content item. Monotonically non-decreasing
/// over the item's life.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interactions {
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub bookmarks: u64,
    #[serde(default)]
    pub shares: u64,
}

/// A feed content item as seen by the scoring engine.
///
/// Owned by the ingestion/feed subsystem; the engine reads it and produces
/// derived scores, never persisting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub published_at: DateTime<Utc>,
    /// Source-provided base quality score. The engine is agnostic to the
    /// caller's convention (0–1 or 0–100) and uses it as a multiplicative
    /// weight; missing means neutral.
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub interactions: Interactions,
}

impl ContentItem {
    pub fn new(id: impl Into<String>, published_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: None,
            source: None,
            url: None,
            text: None,
            tags: Vec::new(),
            published_at,
            score: None,
            interactions: Interactions::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_interactions(mut self, interactions: Interactions) -> Self {
        self.interactions = interactions;
        self
    }

    /// Base quality score; missing defaults to the neutral weight 1.0.
    pub fn base_score(&self) -> f64 {
        self.score.unwrap_or(1.0)
    }

    /// Wall-clock hours since publication, clamped at 0 for future timestamps.
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        let secs = (now - self.published_at).num_milliseconds() as f64 / 1000.0;
        (secs / 3600.0).max(0.0)
    }

    /// Wall-clock days since publication, clamped at 0.
    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        self.age_hours(now) / 24.0
    }

    /// Title and body concatenated, for text-based heuristics.
    pub fn full_text(&self) -> String {
        match (&self.title, &self.text) {
            (Some(t), Some(b)) => format!("{t} {b}"),
            (Some(t), None) => t.clone(),
            (None, Some(b)) => b.clone(),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
        assert_eq!(slugify("special!@#chars"), "special-chars");
        assert_eq!(slugify("OpenAI"), "openai");
    }

    #[test]
    fn node_type_round_trip() {
        for t in [
            NodeType::Person,
            NodeType::Organization,
            NodeType::Topic,
            NodeType::Content,
            NodeType::Concept,
            NodeType::Author,
            NodeType::Entity,
        ] {
            assert_eq!(NodeType::parse(t.as_str()), t);
        }
        assert_eq!(NodeType::parse("hologram"), NodeType::Other);
    }

    #[test]
    fn edge_type_round_trip() {
        for t in [
            EdgeType::Mentions,
            EdgeType::RelatedTo,
            EdgeType::PartOf,
            EdgeType::CreatedBy,
            EdgeType::References,
            EdgeType::SimilarTo,
            EdgeType::Authored,
        ] {
            assert_eq!(EdgeType::parse(t.as_str()), t);
        }
        assert_eq!(EdgeType::parse("teleports"), EdgeType::Other);
    }

    #[test]
    fn entity_id_is_type_plus_slug() {
        let id = NodeId::for_entity(NodeType::Person, "Ada Lovelace");
        assert_eq!(id.as_str(), "person:ada-lovelace");
    }

    #[test]
    fn edge_id_dedups_ordered_triple() {
        let a = NodeId::new("topic:rust");
        let b = NodeId::new("topic:systems");
        let e1 = Edge::new(a.clone(), EdgeType::RelatedTo, b.clone());
        let e2 = Edge::new(a.clone(), EdgeType::RelatedTo, b.clone());
        assert_eq!(e1.id, e2.id);
        // Reversed direction is a different identity.
        let e3 = Edge::new(b, EdgeType::RelatedTo, a);
        assert_ne!(e1.id, e3.id);
    }

    #[test]
    fn merge_never_lowers_importance() {
        let mut node = Node::new(NodeType::Topic, "Rust").with_importance(0.9);
        let incoming = Node::new(NodeType::Topic, "Rust").with_importance(0.2);
        node.merge(&incoming);
        assert!((node.importance - 0.9).abs() < f64::EPSILON);

        let higher = Node::new(NodeType::Topic, "Rust").with_importance(0.95);
        node.merge(&higher);
        assert!((node.importance - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn merge_keeps_existing_when_incoming_empty() {
        let mut node = Node::new(NodeType::Topic, "Rust")
            .with_description("systems language")
            .with_property("lang", "rust");
        let incoming = Node::new(NodeType::Topic, "Rust").with_property("lang", "");
        node.merge(&incoming);
        assert_eq!(node.description.as_deref(), Some("systems language"));
        assert_eq!(node.properties.get("lang").map(String::as_str), Some("rust"));
    }

    #[test]
    fn importance_clamped() {
        assert!((Node::new(NodeType::Topic, "x").with_importance(7.0).importance - 1.0).abs() < f64::EPSILON);
        assert!(Node::new(NodeType::Topic, "x").with_importance(-1.0).importance.abs() < f64::EPSILON);
    }

    #[test]
    fn age_clamps_future_timestamps() {
        let now = Utc::now();
        let future = ContentItem::new("a", now + Duration::hours(5));
        assert_eq!(future.age_hours(now), 0.0);

        let past = ContentItem::new("b", now - Duration::hours(12));
        assert!((past.age_hours(now) - 12.0).abs() < 0.01);
    }

    #[test]
    fn base_score_defaults_to_neutral() {
        let item = ContentItem::new("a", Utc::now());
        assert!((item.base_score() - 1.0).abs() < f64::EPSILON);
        assert!((item.clone().with_score(0.3).base_score() - 0.3).abs() < f64::EPSILON);
    }

    // Persisted types must survive bincode, which cannot tolerate skipped
    // fields: the format is not self-describing, so every field is encoded
    // whether optional values are present or absent.

    #[test]
    fn node_bincode_round_trip() {
        let full = Node::new(NodeType::Topic, "Rust")
            .with_description("systems language")
            .with_importance(0.9)
            .with_property("lang", "rust");
        let back: Node = bincode::deserialize(&bincode::serialize(&full).unwrap()).unwrap();
        assert_eq!(back, full);

        let bare = Node::new(NodeType::Person, "Ada Lovelace");
        let back: Node = bincode::deserialize(&bincode::serialize(&bare).unwrap()).unwrap();
        assert_eq!(back, bare);
    }

    #[test]
    fn edge_bincode_round_trip() {
        let edge = Edge::new(
            NodeId::new("topic:rust"),
            EdgeType::RelatedTo,
            NodeId::new("topic:systems"),
        )
        .with_weight(0.5)
        .with_confidence(0.6);
        let back: Edge = bincode::deserialize(&bincode::serialize(&edge).unwrap()).unwrap();
        assert_eq!(back, edge);
    }

    #[test]
    fn content_item_bincode_round_trip() {
        let full = ContentItem::new("c1", Utc::now())
            .with_title("Title")
            .with_source("hackernews")
            .with_tags(["rust"])
            .with_score(0.7);
        let back: ContentItem =
            bincode::deserialize(&bincode::serialize(&full).unwrap()).unwrap();
        assert_eq!(back, full);

        let bare = ContentItem::new("c2", Utc::now());
        let back: ContentItem =
            bincode::deserialize(&bincode::serialize(&bare).unwrap()).unwrap();
        assert_eq!(back, bare);
    }
}
