//! feedgraph CLI: knowledge-graph query and content-ranking engine.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use feedgraph::engine::{Engine, EngineConfig};
use feedgraph::ingest::ExtractionPayload;
use feedgraph::model::{ContentItem, NodeId, NodeType};

#[derive(Parser)]
#[command(name = "feedgraph", version, about = "Knowledge-graph feed curation engine")]
struct Cli {
    /// Data directory for persistent storage.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new feedgraph data directory.
    Init,

    /// Ingest extractions or content items from a JSON file.
    Ingest {
        /// Path to a JSON file of extraction payloads or content items.
        #[arg(long)]
        file: PathBuf,

        /// Treat the file as raw content items and run entity extraction.
        #[arg(long)]
        extract: bool,
    },

    /// Show the bounded-depth subgraph around a node.
    Subgraph {
        /// Center node id, e.g. "topic:rust".
        center: String,

        /// Traversal depth (1-3).
        #[arg(long, default_value = "2")]
        depth: usize,

        /// Restrict expansion to one node type.
        #[arg(long)]
        node_type: Option<String>,
    },

    /// Search nodes by label and description.
    Search {
        query: String,

        /// Restrict results to one node type.
        #[arg(long)]
        node_type: Option<String>,

        /// Maximum number of results.
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Dump the graph, optionally filtered and capped by importance.
    Graph {
        /// Keep at most this many nodes, highest importance first.
        #[arg(long)]
        limit: Option<usize>,

        /// Restrict to one node type.
        #[arg(long)]
        node_type: Option<String>,

        /// Keep nodes whose label or description contains this text.
        #[arg(long)]
        filter: Option<String>,
    },

    /// Rank content items from a JSON file by trending score.
    Trending {
        /// Path to a JSON file of content items.
        #[arg(long)]
        file: PathBuf,

        /// Number of items to show.
        #[arg(long, default_value = "10")]
        top_k: usize,
    },

    /// Show engine info and statistics.
    Info,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_toml(path).into_diagnostic()?,
        None => EngineConfig::default(),
    };
    if cli.data_dir.is_some() {
        config.data_dir = cli.data_dir.clone();
    }

    match cli.command {
        Commands::Init => {
            let data_dir = config
                .data_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(".feedgraph"));
            config.data_dir = Some(data_dir.clone());
            let engine = Engine::new(config).into_diagnostic()?;
            println!("Initialized feedgraph at {}", data_dir.display());
            println!("{}", engine.info());
        }

        Commands::Ingest { file, extract } => {
            let engine = Engine::new(config).into_diagnostic()?;
            let contents = std::fs::read_to_string(&file).into_diagnostic()?;

            let summary = if extract {
                let items: Vec<ContentItem> =
                    serde_json::from_str(&contents).into_diagnostic()?;
                engine.ingest_batch(&items).into_diagnostic()?
            } else {
                let payloads: Vec<ExtractionPayload> =
                    serde_json::from_str(&contents).into_diagnostic()?;
                let mut total = feedgraph::ingest::IngestSummary::default();
                for payload in &payloads {
                    let summary = engine
                        .ingest_extraction(
                            &payload.content_id,
                            payload.title.as_deref(),
                            payload.source_url.as_deref(),
                            &payload.entities,
                        )
                        .into_diagnostic()?;
                    total.new_nodes += summary.new_nodes;
                    total.new_edges += summary.new_edges;
                    total.degraded |= summary.degraded;
                }
                total
            };

            println!(
                "Ingested {} from {}: {} new nodes, {} new edges{}",
                if extract { "content items" } else { "extractions" },
                file.display(),
                summary.new_nodes,
                summary.new_edges,
                if summary.degraded {
                    " (degraded: extraction unavailable)"
                } else {
                    ""
                }
            );
            println!("{}", engine.info());
        }

        Commands::Subgraph {
            center,
            depth,
            node_type,
        } => {
            let engine = Engine::new(config).into_diagnostic()?;
            let type_filter = node_type.as_deref().map(NodeType::parse);
            let sub = engine
                .get_subgraph(&NodeId::new(center), depth, type_filter)
                .into_diagnostic()?;

            println!(
                "Subgraph around \"{}\" (depth {}): {} nodes, {} edges",
                sub.center,
                sub.depth,
                sub.nodes.len(),
                sub.edges.len()
            );
            for node in &sub.nodes {
                println!(
                    "  {} [{}] importance={:.2}",
                    node.label, node.node_type, node.importance
                );
            }
            for edge in &sub.edges {
                println!("  {} -[{}]-> {}", edge.source, edge.edge_type, edge.target);
            }
        }

        Commands::Search {
            query,
            node_type,
            limit,
        } => {
            let engine = Engine::new(config).into_diagnostic()?;
            let type_filter = node_type.as_deref().map(NodeType::parse);
            let hits = engine
                .search_nodes(&query, type_filter, Some(limit))
                .into_diagnostic()?;

            if hits.is_empty() {
                println!("No matches for \"{query}\".");
            } else {
                println!("Matches for \"{query}\" ({}):", hits.len());
                for node in &hits {
                    println!(
                        "  {} / {} [{}] importance={:.2}",
                        node.label, node.id, node.node_type, node.importance
                    );
                }
            }
        }

        Commands::Graph {
            limit,
            node_type,
            filter,
        } => {
            let engine = Engine::new(config).into_diagnostic()?;
            let type_filter = node_type.as_deref().map(NodeType::parse);
            let view = engine
                .get_graph(limit, type_filter, filter.as_deref())
                .into_diagnostic()?;
            let json = serde_json::to_string_pretty(&view).into_diagnostic()?;
            println!("{json}");
        }

        Commands::Trending { file, top_k } => {
            let engine = Engine::new(config).into_diagnostic()?;
            let contents = std::fs::read_to_string(&file).into_diagnostic()?;
            let items: Vec<ContentItem> = serde_json::from_str(&contents).into_diagnostic()?;

            let ranked = engine.rank_trending(&items);
            println!("Trending (top {top_k} of {}):", ranked.len());
            for (i, entry) in ranked.iter().take(top_k).enumerate() {
                println!(
                    "  {}. {} (score: {:.2})",
                    i + 1,
                    entry.item.title.as_deref().unwrap_or(&entry.item.id),
                    entry.score
                );
            }
        }

        Commands::Info => {
            let engine = Engine::new(config).into_diagnostic()?;
            println!("{}", engine.info());
        }
    }

    Ok(())
}
