//! SQLite-backed graph persistence.

use super::schema::{get_schema_version, initialize_schema, is_initialized};
use super::{Edge, Node};
use crate::config::GraphConfig;
use crate::error::{Error, Result};
use crate::graph::Graph;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Transaction};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

/// SQLite-backed store holding one graph.
///
/// `save_graph` replaces the stored graph wholesale inside a transaction, so a
/// reader never observes a half-written state.
#[derive(Clone)]
pub struct SqliteGraphStore {
    conn: Arc<Mutex<Connection>>,
}

/// Row counts of the stored graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub schema_version: i32,
}

impl SqliteGraphStore {
    /// Open or create a graph store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(storage_error)?;

        if !is_initialized(&conn) {
            initialize_schema(&conn).map_err(storage_error)?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage_error)?;
        initialize_schema(&conn).map_err(storage_error)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::storage(format!("Failed to lock connection: {}", e)))?;
        f(&conn).map_err(storage_error)
    }

    fn with_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| Error::storage(format!("Failed to lock connection: {}", e)))?;
        let tx = conn.transaction().map_err(storage_error)?;
        let value = f(&tx)?;
        tx.commit().map_err(storage_error)?;
        Ok(value)
    }

    // ==================== Graph Operations ====================

    /// Replace the stored graph with `graph`.
    #[instrument(skip(self, graph))]
    pub fn save_graph(&self, graph: &Graph) -> Result<()> {
        self.with_transaction(|tx| {
            tx.execute("DELETE FROM edges", []).map_err(storage_error)?;
            tx.execute("DELETE FROM nodes", []).map_err(storage_error)?;

            for node in graph.nodes() {
                insert_node(tx, node)?;
            }
            for edge in graph.edges() {
                insert_edge(tx, edge)?;
            }
            Ok(())
        })?;

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Saved graph to store"
        );
        Ok(())
    }

    /// Load the stored graph with the default configuration.
    pub fn load_graph(&self) -> Result<Graph> {
        self.load_graph_with_config(GraphConfig::default())
    }

    /// Load the stored graph.
    ///
    /// Nodes and edges are re-added through the graph's own checks, so rows
    /// that reference missing nodes or repeat ids are reported as errors.
    #[instrument(skip(self, config))]
    pub fn load_graph_with_config(&self, config: GraphConfig) -> Result<Graph> {
        let (node_rows, edge_rows) = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, node_type, data, confidence, created_at, last_accessed,
                        memory_strength, persistent, metadata
                 FROM nodes ORDER BY id",
            )?;
            let nodes = stmt
                .query_map([], NodeRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut stmt = conn.prepare(
                "SELECT id, source, target, relation, strength, emotional_charge,
                        created_at, last_used, last_decayed, pending_reinforcement, metadata
                 FROM edges ORDER BY id",
            )?;
            let edges = stmt
                .query_map([], EdgeRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok((nodes, edges))
        })?;

        let mut graph = Graph::with_config(config)?;
        for row in node_rows {
            let mut node = row.into_node()?;
            node.normalize();
            graph.add_node(node)?;
        }
        for row in edge_rows {
            let mut edge = row.into_edge()?;
            edge.normalize();
            graph.add_edge(edge)?;
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Loaded graph from store"
        );
        Ok(graph)
    }

    /// Remove everything from the store.
    pub fn clear(&self) -> Result<()> {
        self.with_transaction(|tx| {
            tx.execute("DELETE FROM edges", []).map_err(storage_error)?;
            tx.execute("DELETE FROM nodes", []).map_err(storage_error)?;
            Ok(())
        })?;
        debug!("Cleared graph store");
        Ok(())
    }

    /// Get store statistics.
    pub fn stats(&self) -> Result<StoreStats> {
        self.with_conn(|conn| {
            let node_count: i64 =
                conn.query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))?;
            let edge_count: i64 =
                conn.query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))?;

            Ok(StoreStats {
                node_count: node_count as usize,
                edge_count: edge_count as usize,
                schema_version: get_schema_version(conn)?,
            })
        })
    }
}

fn storage_error(e: rusqlite::Error) -> Error {
    Error::storage(e.to_string())
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn insert_node(tx: &Transaction<'_>, node: &Node) -> Result<()> {
    tx.execute(
        "INSERT INTO nodes (
            id, node_type, data, confidence, created_at, last_accessed,
            memory_strength, persistent, metadata
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            node.id().as_str(),
            node.node_type,
            serde_json::to_string(&node.data)?,
            node.confidence(),
            format_timestamp(node.created_at()),
            format_timestamp(node.last_accessed()),
            node.memory_strength(),
            node.persistent,
            serde_json::to_string(&node.metadata)?,
        ],
    )
    .map_err(storage_error)?;
    Ok(())
}

fn insert_edge(tx: &Transaction<'_>, edge: &Edge) -> Result<()> {
    tx.execute(
        "INSERT INTO edges (
            id, source, target, relation, strength, emotional_charge,
            created_at, last_used, last_decayed, pending_reinforcement, metadata
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            edge.id().as_str(),
            edge.source().as_str(),
            edge.target().as_str(),
            edge.relation.as_str(),
            edge.strength(),
            edge.emotional_charge(),
            format_timestamp(edge.created_at()),
            format_timestamp(edge.last_used()),
            edge.last_decayed().map(format_timestamp),
            edge.pending_reinforcement(),
            serde_json::to_string(&edge.metadata)?,
        ],
    )
    .map_err(storage_error)?;
    Ok(())
}

/// Raw `nodes` columns, decoded into a `Node` through serde.
struct NodeRow {
    id: String,
    node_type: String,
    data: String,
    confidence: f64,
    created_at: String,
    last_accessed: String,
    memory_strength: f64,
    persistent: bool,
    metadata: String,
}

impl NodeRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            node_type: row.get(1)?,
            data: row.get(2)?,
            confidence: row.get(3)?,
            created_at: row.get(4)?,
            last_accessed: row.get(5)?,
            memory_strength: row.get(6)?,
            persistent: row.get(7)?,
            metadata: row.get(8)?,
        })
    }

    fn into_node(self) -> Result<Node> {
        let data: Value = serde_json::from_str(&self.data)?;
        let metadata: Value = serde_json::from_str(&self.metadata)?;
        Ok(serde_json::from_value(json!({
            "id": self.id,
            "node_type": self.node_type,
            "data": data,
            "confidence": self.confidence,
            "created_at": self.created_at,
            "last_accessed": self.last_accessed,
            "memory_strength": self.memory_strength,
            "persistent": self.persistent,
            "metadata": metadata,
        }))?)
    }
}

/// Raw `edges` columns, decoded into an `Edge` through serde.
struct EdgeRow {
    id: String,
    source: String,
    target: String,
    relation: String,
    strength: f64,
    emotional_charge: f64,
    created_at: String,
    last_used: String,
    last_decayed: Option<String>,
    pending_reinforcement: Option<f64>,
    metadata: String,
}

impl EdgeRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            source: row.get(1)?,
            target: row.get(2)?,
            relation: row.get(3)?,
            strength: row.get(4)?,
            emotional_charge: row.get(5)?,
            created_at: row.get(6)?,
            last_used: row.get(7)?,
            last_decayed: row.get(8)?,
            pending_reinforcement: row.get(9)?,
            metadata: row.get(10)?,
        })
    }

    fn into_edge(self) -> Result<Edge> {
        let metadata: Value = serde_json::from_str(&self.metadata)?;
        Ok(serde_json::from_value(json!({
            "id": self.id,
            "source": self.source,
            "target": self.target,
            "relation": self.relation,
            "strength": self.strength,
            "emotional_charge": self.emotional_charge,
            "created_at": self.created_at,
            "last_used": self.last_used,
            "last_decayed": self.last_decayed,
            "pending_reinforcement": self.pending_reinforcement,
            "metadata": metadata,
        }))?)
    }
}
