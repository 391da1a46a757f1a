//! JSON snapshots of the full graph state.

use super::Graph;
use crate::config::GraphConfig;
use crate::error::{Error, Result};
use crate::memory::{Edge, Node};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    nodes: Vec<&'a Node>,
    edges: Vec<&'a Edge>,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Graph {
    fn snapshot(&self) -> SnapshotRef<'_> {
        SnapshotRef {
            version: SNAPSHOT_VERSION,
            nodes: self.nodes.values().collect(),
            edges: self.edges.values().collect(),
        }
    }

    /// Rebuild a graph from decoded snapshot data.
    ///
    /// Every edge goes through `add_edge`, so the adjacency index is derived
    /// from the loaded edges and dangling references are rejected.
    fn from_snapshot(snapshot: Snapshot, config: GraphConfig) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::UnsupportedSnapshot {
                version: snapshot.version,
            });
        }

        let mut graph = Graph::with_config(config)?;
        for mut node in snapshot.nodes {
            node.normalize();
            graph.add_node(node)?;
        }
        for mut edge in snapshot.edges {
            edge.normalize();
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }

    /// Export node and edge state as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    /// Import a graph from `to_json` output, using the default configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_with_config(json, GraphConfig::default())
    }

    pub fn from_json_with_config(json: &str, config: GraphConfig) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot, config)
    }

    /// Write the full node and edge state to `path`.
    ///
    /// The file is written beside the target and renamed into place, so a
    /// crash never leaves a half-written snapshot at `path`.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = temp_path(path);

        if let Err(e) = self.write_snapshot(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        info!(
            nodes = self.node_count(),
            edges = self.edge_count(),
            "Saved graph snapshot"
        );
        Ok(())
    }

    fn write_snapshot(&self, tmp: &Path, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(tmp)?);
        serde_json::to_writer_pretty(&mut writer, &self.snapshot())?;
        writer.flush()?;
        drop(writer);
        fs::rename(tmp, path)?;
        Ok(())
    }

    /// Read a snapshot written by `save`, using the default configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_config(path, GraphConfig::default())
    }

    /// Read a snapshot written by `save`.
    #[instrument(skip(path, config), fields(path = %path.as_ref().display()))]
    pub fn load_with_config(path: impl AsRef<Path>, config: GraphConfig) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let snapshot: Snapshot = serde_json::from_reader(reader)?;
        let graph = Self::from_snapshot(snapshot, config)?;

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Loaded graph snapshot"
        );
        Ok(graph)
    }
}

/// `graph.json` -> `graph.json.tmp`, so distinct targets never share a temp file.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
