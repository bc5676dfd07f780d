//! # feedgraph
//!
//! A knowledge-graph query and content-ranking engine for feed curation.
//!
//! ## Architecture
//!
//! - **Graph** (`graph`): typed node/edge store with bounded-depth subgraph
//!   traversal and relevance-ranked search
//! - **Content scoring** (`content`): trending, similarity, composite feed
//!   relevance, quality filtering, and recommendations
//! - **Capabilities** (`capability`): optional AI sidecar for entity
//!   extraction and semantic similarity, with local heuristic fallbacks
//! - **Ingestion** (`ingest`): idempotent reconciliation of extracted
//!   entities into the graph
//! - **Persistence** (`repo`): redb-backed write-through repository
//!
//! ## Library usage
//!
//! ```no_run
//! use feedgraph::engine::{Engine, EngineConfig};
//! use feedgraph::model::{Node, NodeType};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let rust = Node::new(NodeType::Topic, "Rust");
//! let id = rust.id.clone();
//! engine.upsert_node(rust).unwrap();
//! let subgraph = engine.get_subgraph(&id, 2, None).unwrap();
//! println!("{} nodes", subgraph.nodes.len());
//! ```

pub mod capability;
pub mod content;
pub mod engine;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod model;
pub mod repo;
