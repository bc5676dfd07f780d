//! Durable graph persistence backed by redb.
//!
//! Nodes and edges are stored in separate tables keyed by their stable
//! string identity, bincode-encoded. The repository is write-through: the
//! engine persists exactly the records an operation touched, and replays
//! the full tables into the in-memory store at startup.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use crate::error::RepoError;
use crate::graph::store::GraphStore;
use crate::model::{Edge, Node};

pub type RepoResult<T> = Result<T, RepoError>;

const NODE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("nodes");
const EDGE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("edges");

/// Persistence seam for the graph. The engine only knows this trait, so
/// tests can run fully in memory.
pub trait GraphRepository: Send + Sync {
    /// Replay every persisted node and edge into `store`.
    fn load(&self, store: &GraphStore) -> RepoResult<()>;
    fn save_node(&self, node: &Node) -> RepoResult<()>;
    fn save_edge(&self, edge: &Edge) -> RepoResult<()>;
}

/// redb-backed repository with full transactional guarantees.
pub struct RedbRepository {
    db: Arc<Database>,
}

impl RedbRepository {
    /// Open or create the database under `data_dir`, creating both tables
    /// so a fresh database loads cleanly.
    pub fn open(data_dir: &Path) -> RepoResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| RepoError::Io { source: e })?;
        let db_path = data_dir.join("feedgraph.redb");
        let db = Database::create(&db_path).map_err(|e| RepoError::Redb {
            message: format!("failed to open redb at {}: {e}", db_path.display()),
        })?;

        let txn = db.begin_write().map_err(|e| RepoError::Redb {
            message: format!("begin_write failed: {e}"),
        })?;
        txn.open_table(NODE_TABLE).map_err(|e| RepoError::Redb {
            message: format!("open_table failed: {e}"),
        })?;
        txn.open_table(EDGE_TABLE).map_err(|e| RepoError::Redb {
            message: format!("open_table failed: {e}"),
        })?;
        txn.commit().map_err(|e| RepoError::Redb {
            message: format!("commit failed: {e}"),
        })?;

        Ok(Self { db: Arc::new(db) })
    }

    fn put(&self, table: TableDefinition<&str, &[u8]>, key: &str, value: &[u8]) -> RepoResult<()> {
        let txn = self.db.begin_write().map_err(|e| RepoError::Redb {
            message: format!("begin_write failed: {e}"),
        })?;
        {
            let mut table = txn.open_table(table).map_err(|e| RepoError::Redb {
                message: format!("open_table failed: {e}"),
            })?;
            table.insert(key, value).map_err(|e| RepoError::Redb {
                message: format!("insert failed: {e}"),
            })?;
        }
        txn.commit().map_err(|e| RepoError::Redb {
            message: format!("commit failed: {e}"),
        })?;
        Ok(())
    }
}

impl GraphRepository for RedbRepository {
    fn load(&self, store: &GraphStore) -> RepoResult<()> {
        let txn = self.db.begin_read().map_err(|e| RepoError::Redb {
            message: format!("begin_read failed: {e}"),
        })?;

        let nodes = txn.open_table(NODE_TABLE).map_err(|e| RepoError::Redb {
            message: format!("open_table failed: {e}"),
        })?;
        for entry in nodes.iter().map_err(|e| RepoError::Redb {
            message: format!("iter failed: {e}"),
        })? {
            let (_, value) = entry.map_err(|e| RepoError::Redb {
                message: format!("cursor failed: {e}"),
            })?;
            let node: Node =
                bincode::deserialize(value.value()).map_err(|e| RepoError::Serialization {
                    message: format!("node decode failed: {e}"),
                })?;
            store.upsert_node(node);
        }

        // Nodes first so every edge endpoint resolves.
        let edges = txn.open_table(EDGE_TABLE).map_err(|e| RepoError::Redb {
            message: format!("open_table failed: {e}"),
        })?;
        for entry in edges.iter().map_err(|e| RepoError::Redb {
            message: format!("iter failed: {e}"),
        })? {
            let (key, value) = entry.map_err(|e| RepoError::Redb {
                message: format!("cursor failed: {e}"),
            })?;
            let edge: Edge =
                bincode::deserialize(value.value()).map_err(|e| RepoError::Serialization {
                    message: format!("edge decode failed: {e}"),
                })?;
            if let Err(err) = store.upsert_edge(edge) {
                // Endpoint evicted after the edge was persisted; skip it.
                tracing::warn!(edge = key.value(), error = %err, "skipping orphaned edge");
            }
        }

        Ok(())
    }

    fn save_node(&self, node: &Node) -> RepoResult<()> {
        let bytes = bincode::serialize(node).map_err(|e| RepoError::Serialization {
            message: format!("node encode failed: {e}"),
        })?;
        self.put(NODE_TABLE, node.id.as_str(), &bytes)
    }

    fn save_edge(&self, edge: &Edge) -> RepoResult<()> {
        let bytes = bincode::serialize(edge).map_err(|e| RepoError::Serialization {
            message: format!("edge encode failed: {e}"),
        })?;
        self.put(EDGE_TABLE, edge.id.as_str(), &bytes)
    }
}

impl std::fmt::Debug for RedbRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbRepository").finish()
    }
}
