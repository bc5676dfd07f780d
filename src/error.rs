//! Rich diagnostic error types for the feedgraph engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so callers know exactly what went wrong
//! and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the feedgraph engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source chains) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum FeedGraphError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("node not found: \"{id}\"")]
    #[diagnostic(
        code(feedgraph::graph::node_not_found),
        help(
            "No node with this identity exists in the graph. \
             Ingest content that mentions it first, or check the id \
             (entity ids are \"{{type}}:{{slug}}\")."
        )
    )]
    NodeNotFound { id: String },

    #[error("edge \"{edge}\" references missing node \"{endpoint}\"")]
    #[diagnostic(
        code(feedgraph::graph::endpoint_missing),
        help(
            "Both endpoints of an edge must exist before the edge can be \
             inserted. Upsert the missing node first."
        )
    )]
    EndpointMissing { edge: String, endpoint: String },

    #[error("traversal depth {depth} exceeds maximum of {max}")]
    #[diagnostic(
        code(feedgraph::graph::depth_out_of_range),
        help(
            "Subgraph queries accept depths 0 through {max}. Depth 0 returns \
             only the center node. Split deeper explorations into repeated \
             queries from frontier nodes."
        )
    )]
    DepthOutOfRange { depth: usize, max: usize },

    #[error("result limit {limit} is out of range")]
    #[diagnostic(
        code(feedgraph::graph::limit_out_of_range),
        help("Result limits must be at least 1. Omit the limit to return everything.")
    )]
    LimitOutOfRange { limit: usize },
}

// ---------------------------------------------------------------------------
// Capability errors (external AI service)
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CapabilityError {
    #[error("{service} capability unavailable: {message}")]
    #[diagnostic(
        code(feedgraph::capability::service_unavailable),
        help(
            "The external AI service did not respond within the timeout or \
             returned an error. Ingestion degrades to \"no entities extracted\" \
             and similarity ranking falls back to tag overlap; check the \
             service URL and health endpoint."
        )
    )]
    ServiceUnavailable { service: String, message: String },

    #[error("unexpected response from {service}: {message}")]
    #[diagnostic(
        code(feedgraph::capability::invalid_response),
        help(
            "The service responded but the payload could not be parsed. \
             This usually indicates a version mismatch between the engine \
             and the AI service."
        )
    )]
    InvalidResponse { service: String, message: String },
}

// ---------------------------------------------------------------------------
// Repository errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RepoError {
    #[error("I/O error: {source}")]
    #[diagnostic(
        code(feedgraph::repo::io),
        help(
            "A filesystem operation failed. Check that the data directory \
             exists, has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("redb transaction error: {message}")]
    #[diagnostic(
        code(feedgraph::repo::redb),
        help(
            "The embedded database encountered a transaction error. \
             This may indicate corruption — try running with a fresh data \
             directory."
        )
    )]
    Redb { message: String },

    #[error("serialization error: {message}")]
    #[diagnostic(
        code(feedgraph::repo::serde),
        help(
            "Failed to serialize or deserialize graph data. This usually \
             means the stored format has changed between versions; re-ingest \
             from source."
        )
    )]
    Serialization { message: String },
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EngineError {
    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(feedgraph::engine::invalid_config),
        help("Check the EngineConfig fields. {message}")
    )]
    InvalidConfig { message: String },

    #[error("data directory error: {path}")]
    #[diagnostic(
        code(feedgraph::engine::data_dir),
        help(
            "The data directory could not be accessed. \
             Ensure the path exists and has read/write permissions."
        )
    )]
    DataDir { path: String },
}

/// Convenience alias for functions returning feedgraph results.
pub type FeedGraphResult<T> = std::result::Result<T, FeedGraphError>;
