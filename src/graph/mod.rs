//! Knowledge graph: store, bounded traversal, and ranking/search.
//!
//! - [`store::GraphStore`]: petgraph-backed node/edge store with identity
//!   indices and referential integrity checks
//! - [`traverse`]: bounded-depth neighborhood (subgraph) queries
//! - [`search`]: text relevance search and importance-capped graph views
//!
//! All queries are pure functions of current graph state: each call builds
//! its own visited set or candidate list, so concurrent readers never share
//! iteration state.

pub mod search;
pub mod store;
pub mod traverse;

use crate::error::GraphError;

/// Result type for graph operations.
pub type GraphResult<T> = std::result::Result<T, GraphError>;
