//! Engine facade: top-level API for the feedgraph system.
//!
//! The `Engine` owns the in-memory graph, the optional durable repository,
//! and the intelligence capabilities, and exposes everything callers need
//! for ingesting content, querying the graph, and scoring feeds.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use crate::capability::{
    EntityExtractor, HttpAiService, KeywordExtractor, SimilarityRanker,
};
use crate::content::filter::{self, FilterConfig, FilterOutcome};
use crate::content::recommend::{self, RecommendConfig};
use crate::content::relevance;
use crate::content::similarity;
use crate::content::trending::{self, TrendingWeights};
use crate::content::RankedContent;
use crate::error::{EngineError, FeedGraphResult};
use crate::graph::search::{self, GraphView};
use crate::graph::store::GraphStore;
use crate::graph::traverse::{self, Subgraph};
use crate::ingest::{self, IngestSummary};
use crate::model::{ContentItem, Edge, Node, NodeId, NodeType};
use crate::repo::{GraphRepository, RedbRepository};

/// Configuration for the feedgraph engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Data directory for persistence. `None` for memory-only mode.
    pub data_dir: Option<PathBuf>,
    /// Cap on resident nodes; lowest-importance nodes are evicted past it.
    /// `None` means unbounded.
    pub max_nodes: Option<usize>,
    /// Base URL of the sidecar AI service; `None` uses the keyword
    /// extractor and tag-overlap similarity.
    pub ai_service_url: Option<String>,
    pub ai_timeout_secs: u64,
    pub trending: TrendingWeights,
    pub filter: FilterConfig,
    pub recommend: RecommendConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            max_nodes: None,
            ai_service_url: None,
            ai_timeout_secs: HttpAiService::DEFAULT_TIMEOUT_SECS,
            trending: TrendingWeights::default(),
            filter: FilterConfig::default(),
            recommend: RecommendConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml(path: &std::path::Path) -> FeedGraphResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| EngineError::InvalidConfig {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        let config: EngineConfig =
            toml::from_str(&contents).map_err(|e| EngineError::InvalidConfig {
                message: format!("failed to parse {}: {e}", path.display()),
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.max_nodes == Some(0) {
            return Err(EngineError::InvalidConfig {
                message: "max_nodes must be > 0 when set".into(),
            });
        }
        Ok(())
    }
}

/// The feedgraph knowledge-graph and content-scoring engine.
pub struct Engine {
    config: EngineConfig,
    store: Arc<GraphStore>,
    repo: Option<Box<dyn GraphRepository>>,
    extractor: Box<dyn EntityExtractor>,
    ranker: Option<Box<dyn SimilarityRanker>>,
}

impl Engine {
    /// Create a new engine with the given configuration.
    ///
    /// With a `data_dir`, the persisted graph is replayed into memory
    /// before the engine is handed out.
    pub fn new(config: EngineConfig) -> FeedGraphResult<Self> {
        config.validate()?;

        tracing::info!(
            persistent = config.data_dir.is_some(),
            ai_service = config.ai_service_url.is_some(),
            max_nodes = ?config.max_nodes,
            "initializing feedgraph engine"
        );

        let store = Arc::new(GraphStore::with_capacity(config.max_nodes));

        let repo: Option<Box<dyn GraphRepository>> = match &config.data_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(|_| EngineError::DataDir {
                    path: dir.display().to_string(),
                })?;
                let repo = RedbRepository::open(dir)?;
                repo.load(&store)?;
                tracing::info!(
                    nodes = store.node_count(),
                    edges = store.edge_count(),
                    "loaded persisted graph"
                );
                Some(Box::new(repo))
            }
            None => None,
        };

        let (extractor, ranker): (Box<dyn EntityExtractor>, Option<Box<dyn SimilarityRanker>>) =
            match &config.ai_service_url {
                Some(url) => {
                    let timeout = std::time::Duration::from_secs(config.ai_timeout_secs);
                    (
                        Box::new(HttpAiService::with_timeout(url.clone(), timeout)),
                        Some(Box::new(HttpAiService::with_timeout(url.clone(), timeout))),
                    )
                }
                None => (Box::new(KeywordExtractor::new()), None),
            };

        Ok(Self {
            config,
            store,
            repo,
            extractor,
            ranker,
        })
    }

    /// Swap in a different entity extractor. Used by tests and by callers
    /// embedding their own extraction.
    pub fn with_extractor(mut self, extractor: Box<dyn EntityExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Graph mutation
    // -----------------------------------------------------------------------

    /// Insert or merge a node, writing through to the repository.
    pub fn upsert_node(&self, node: Node) -> FeedGraphResult<bool> {
        let id = node.id.clone();
        let created = self.store.upsert_node(node);
        self.persist_nodes(std::slice::from_ref(&id))?;
        Ok(created)
    }

    /// Insert an edge, writing through to the repository.
    pub fn upsert_edge(&self, edge: Edge) -> FeedGraphResult<bool> {
        let id = edge.id.clone();
        let created = self.store.upsert_edge(edge)?;
        if let Some(repo) = &self.repo {
            if let Some(edge) = self.store.get_edge(&id) {
                repo.save_edge(&edge)?;
            }
        }
        Ok(created)
    }

    fn persist_nodes(&self, ids: &[NodeId]) -> FeedGraphResult<()> {
        if let Some(repo) = &self.repo {
            for id in ids {
                // Evicted nodes may already be gone; persist what remains.
                if let Ok(node) = self.store.get_node(id) {
                    repo.save_node(&node)?;
                }
            }
        }
        Ok(())
    }

    fn persist_summary(&self, summary: &IngestSummary) -> FeedGraphResult<()> {
        self.persist_nodes(&summary.touched_nodes)?;
        if let Some(repo) = &self.repo {
            for id in &summary.touched_edges {
                // Edges can vanish with an evicted endpoint; persist survivors.
                if let Some(edge) = self.store.get_edge(id) {
                    repo.save_edge(&edge)?;
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Ingestion
    // -----------------------------------------------------------------------

    /// Extract entities from a content item and reconcile into the graph.
    pub fn ingest_content(&self, item: &ContentItem) -> FeedGraphResult<IngestSummary> {
        let summary = ingest::ingest_content(&self.store, self.extractor.as_ref(), item)?;
        self.persist_summary(&summary)?;
        Ok(summary)
    }

    /// Ingest a batch of content items.
    pub fn ingest_batch(&self, items: &[ContentItem]) -> FeedGraphResult<IngestSummary> {
        let summary = ingest::ingest_batch(&self.store, self.extractor.as_ref(), items)?;
        self.persist_summary(&summary)?;
        Ok(summary)
    }

    /// Reconcile pre-extracted entities into the graph.
    pub fn ingest_extraction(
        &self,
        content_id: &str,
        title: Option<&str>,
        source_url: Option<&str>,
        entities: &crate::capability::ExtractedEntities,
    ) -> FeedGraphResult<IngestSummary> {
        let summary =
            ingest::ingest_extraction(&self.store, content_id, title, source_url, entities)?;
        self.persist_summary(&summary)?;
        Ok(summary)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Bounded-depth subgraph around a center node.
    pub fn get_subgraph(
        &self,
        center: &NodeId,
        depth: usize,
        type_filter: Option<NodeType>,
    ) -> FeedGraphResult<Subgraph> {
        Ok(traverse::subgraph(&self.store, center, depth, type_filter)?)
    }

    /// Relevance-ranked free-text node search.
    pub fn search_nodes(
        &self,
        query: &str,
        type_filter: Option<NodeType>,
        limit: Option<usize>,
    ) -> FeedGraphResult<Vec<Node>> {
        Ok(search::search_nodes(&self.store, query, type_filter, limit)?)
    }

    /// Whole-graph view, optionally filtered and capped by importance.
    pub fn get_graph(
        &self,
        limit: Option<usize>,
        type_filter: Option<NodeType>,
        text_filter: Option<&str>,
    ) -> FeedGraphResult<GraphView> {
        Ok(search::capped_graph(&self.store, limit, type_filter, text_filter)?)
    }

    // -----------------------------------------------------------------------
    // Content scoring
    // -----------------------------------------------------------------------

    /// Rank items by trending score, highest first.
    pub fn rank_trending(&self, items: &[ContentItem]) -> Vec<RankedContent> {
        trending::rank_trending(items, chrono::Utc::now(), &self.config.trending)
    }

    /// Rank candidates by similarity to `item`, degrading to tag overlap
    /// when the external ranker is unavailable.
    pub fn similar_items(
        &self,
        item: &ContentItem,
        candidates: &[ContentItem],
        top_k: usize,
    ) -> Vec<RankedContent> {
        similarity::rank_similar(self.ranker.as_deref(), item, candidates, top_k)
    }

    /// Order a feed by composite relevance/age score.
    pub fn order_feed(&self, items: &[(ContentItem, f64)]) -> Vec<RankedContent> {
        relevance::order_feed(items, chrono::Utc::now())
    }

    /// Quality-filter a batch of items.
    pub fn filter_items(&self, items: &[ContentItem]) -> FilterOutcome {
        filter::filter_items(items, &self.config.filter)
    }

    /// Recommend candidates against a user's interaction history.
    pub fn recommend(
        &self,
        history: &[ContentItem],
        candidates: &[ContentItem],
        limit: usize,
    ) -> Vec<RankedContent> {
        recommend::recommend(history, candidates, limit, &self.config.recommend)
    }

    /// Summary information about the engine state.
    pub fn info(&self) -> EngineInfo {
        let metadata = self.store.metadata();
        EngineInfo {
            node_count: metadata.total_nodes,
            edge_count: metadata.total_edges,
            schema_version: metadata.schema_version,
            persistent: self.repo.is_some(),
            ai_service: self.config.ai_service_url.clone(),
        }
    }
}

/// Summary information about the engine state.
#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub node_count: usize,
    pub edge_count: usize,
    pub schema_version: String,
    pub persistent: bool,
    pub ai_service: Option<String>,
}

impl std::fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "feedgraph engine info")?;
        writeln!(f, "  nodes:       {}", self.node_count)?;
        writeln!(f, "  edges:       {}", self.edge_count)?;
        writeln!(f, "  schema:      {}", self.schema_version)?;
        writeln!(f, "  persistent:  {}", self.persistent)?;
        writeln!(
            f,
            "  ai service:  {}",
            self.ai_service.as_deref().unwrap_or("none (local heuristics)")
        )?;
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("nodes", &self.store.node_count())
            .field("edges", &self.store.edge_count())
            .finish_non_exhaustive()
    }
}
