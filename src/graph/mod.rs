//! The memory graph: owner of all nodes and edges.
//!
//! The graph is a directed multigraph. Parallel edges between the same pair of
//! nodes are kept as distinct edges (one per relation or per insertion) and
//! indexed as `source -> target -> {edge ids}`.
//!
//! Invariants maintained by every operation:
//!
//! - every edge's endpoints are present in the node map
//! - the adjacency index lists exactly the edges in the edge map, with no
//!   empty inner entries left behind
//!
//! Operations that fail leave the graph untouched.

mod maintenance;
mod proptest;
mod snapshot;

pub use maintenance::{GraphStatistics, MaintenanceReport};
pub use snapshot::SNAPSHOT_VERSION;

use crate::config::GraphConfig;
use crate::error::{Error, Result};
use crate::memory::{Edge, EdgeId, Emotion, Node, NodeId};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

type Adjacency = BTreeMap<NodeId, BTreeMap<NodeId, BTreeSet<EdgeId>>>;

/// Time-aware directed multigraph of memories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeId, Edge>,
    adjacency: Adjacency,
    config: GraphConfig,
}

impl Graph {
    /// Create an empty graph with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with a validated configuration.
    pub fn with_config(config: GraphConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    // ==================== Node Operations ====================

    /// Add a node. Fails if the id is already taken.
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(node.id()) {
            return Err(Error::DuplicateNode(node.id().to_string()));
        }
        debug!(node_id = %node.id(), node_type = %node.node_type, "Adding node");
        self.nodes.insert(node.id().clone(), node);
        Ok(())
    }

    /// Get a node by ID.
    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get a mutable node by ID.
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Iterate over all nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Remove a node and every edge that touches it.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        let node = self.nodes.remove(id)?;

        let incident: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|e| e.source() == id || e.target() == id)
            .map(|e| e.id().clone())
            .collect();
        for edge_id in &incident {
            self.remove_edge(edge_id);
        }
        self.adjacency.remove(id);

        debug!(node_id = %id, removed_edges = incident.len(), "Removed node");
        Some(node)
    }

    /// Reinforce a node as if it had just been recalled.
    pub fn reinforce_node(&mut self, id: &NodeId, amount: f64, now: DateTime<Utc>) -> Result<()> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| Error::NodeNotFound(id.to_string()))?
            .reinforce(amount, now)
    }

    // ==================== Edge Operations ====================

    /// Add an edge. Both endpoints must already be in the graph.
    pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
        if self.edges.contains_key(edge.id()) {
            return Err(Error::DuplicateEdge(edge.id().to_string()));
        }
        for endpoint in [edge.source(), edge.target()] {
            if !self.nodes.contains_key(endpoint) {
                return Err(Error::missing_endpoint(edge.id().as_str(), endpoint.as_str()));
            }
        }

        debug!(
            edge_id = %edge.id(),
            source = %edge.source(),
            target = %edge.target(),
            relation = %edge.relation,
            "Adding edge"
        );
        self.adjacency
            .entry(edge.source().clone())
            .or_default()
            .entry(edge.target().clone())
            .or_default()
            .insert(edge.id().clone());
        self.edges.insert(edge.id().clone(), edge);
        Ok(())
    }

    /// Get an edge by ID.
    pub fn get_edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Get a mutable edge by ID. Ids and endpoints cannot change through it.
    pub fn edge_mut(&mut self, id: &EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id)
    }

    pub fn contains_edge(&self, id: &EdgeId) -> bool {
        self.edges.contains_key(id)
    }

    /// Iterate over all edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All edges from `source` to `target`, any relation, in id order.
    pub fn get_edges(&self, source: &NodeId, target: &NodeId) -> Vec<&Edge> {
        self.adjacency
            .get(source)
            .and_then(|targets| targets.get(target))
            .map(|ids| ids.iter().filter_map(|id| self.edges.get(id)).collect())
            .unwrap_or_default()
    }

    /// All edges leaving `node_id`, in id order.
    pub fn outgoing_edges(&self, node_id: &NodeId) -> Vec<&Edge> {
        let mut edges: Vec<&Edge> = self
            .adjacency
            .get(node_id)
            .into_iter()
            .flat_map(|targets| targets.values())
            .flatten()
            .filter_map(|id| self.edges.get(id))
            .collect();
        edges.sort_by(|a, b| a.id().cmp(b.id()));
        edges
    }

    /// All edges arriving at `node_id`, in id order.
    pub fn incoming_edges(&self, node_id: &NodeId) -> Vec<&Edge> {
        self.edges
            .values()
            .filter(|e| e.target() == node_id)
            .collect()
    }

    /// Distinct direct successors of `node_id`, in id order.
    pub fn successors(&self, node_id: &NodeId) -> Vec<&NodeId> {
        self.adjacency
            .get(node_id)
            .map(|targets| targets.keys().collect())
            .unwrap_or_default()
    }

    /// Remove a single edge.
    pub fn remove_edge(&mut self, id: &EdgeId) -> Option<Edge> {
        let edge = self.edges.remove(id)?;

        if let Some(targets) = self.adjacency.get_mut(edge.source()) {
            if let Some(ids) = targets.get_mut(edge.target()) {
                ids.remove(id);
                if ids.is_empty() {
                    targets.remove(edge.target());
                }
            }
            if targets.is_empty() {
                self.adjacency.remove(edge.source());
            }
        }

        debug!(edge_id = %id, "Removed edge");
        Some(edge)
    }

    fn existing_edge_mut(&mut self, id: &EdgeId) -> Result<&mut Edge> {
        self.edges
            .get_mut(id)
            .ok_or_else(|| Error::EdgeNotFound(id.to_string()))
    }

    /// Mark an edge as traversed.
    pub fn touch_edge(&mut self, id: &EdgeId, now: DateTime<Utc>) -> Result<()> {
        self.existing_edge_mut(id)?.touch(now);
        Ok(())
    }

    /// Strengthen an edge immediately.
    pub fn reinforce_edge(&mut self, id: &EdgeId, amount: f64, now: DateTime<Utc>) -> Result<()> {
        self.existing_edge_mut(id)?.reinforce(amount, now)
    }

    /// Weaken an edge immediately.
    pub fn weaken_edge(&mut self, id: &EdgeId, amount: f64, now: DateTime<Utc>) -> Result<()> {
        self.existing_edge_mut(id)?.weaken(amount, now)
    }

    /// Register an emotion on an edge using the configured emotion table.
    pub fn register_emotion(
        &mut self,
        id: &EdgeId,
        emotion: Emotion,
        intensity: f64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let table = self.config.emotions.clone();
        self.existing_edge_mut(id)?
            .register_emotion_with(&table, emotion, intensity, now)
    }

    /// Record a reinforcement awaiting an outcome.
    pub fn schedule_reinforcement(&mut self, id: &EdgeId, amount: f64) -> Result<()> {
        self.existing_edge_mut(id)?.schedule_reinforcement(amount)
    }

    /// Resolve a scheduled reinforcement. Returns false if nothing was pending.
    pub fn apply_reinforcement(&mut self, id: &EdgeId, success: bool) -> Result<bool> {
        Ok(self.existing_edge_mut(id)?.apply_reinforcement(success))
    }

    // ==================== Views ====================

    /// The graph as it existed at time `t`.
    ///
    /// Keeps nodes and edges created at or before `t`; an edge survives only if
    /// both of its endpoints do. The live graph is not touched.
    pub fn subgraph_at_time(&self, t: DateTime<Utc>) -> Graph {
        let mut view = Graph {
            config: self.config.clone(),
            ..Graph::default()
        };

        for node in self.nodes.values().filter(|n| n.created_at() <= t) {
            view.nodes.insert(node.id().clone(), node.clone());
        }
        for edge in self.edges.values().filter(|e| e.created_at() <= t) {
            // Rejected when an endpoint was created after `t`.
            let _ = view.add_edge(edge.clone());
        }

        view
    }

    /// Copy of the subgraph induced by `ids`: those nodes and every edge
    /// between two of them. Unknown ids are ignored.
    pub fn induced_subgraph<'a>(&self, ids: impl IntoIterator<Item = &'a NodeId>) -> Graph {
        let mut view = Graph {
            config: self.config.clone(),
            ..Graph::default()
        };

        for id in ids {
            if let Some(node) = self.nodes.get(id) {
                view.nodes.insert(id.clone(), node.clone());
            }
        }
        for edge in self.edges.values() {
            if view.nodes.contains_key(edge.source()) && view.nodes.contains_key(edge.target()) {
                let _ = view.add_edge(edge.clone());
            }
        }

        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Relation;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn sample() -> Graph {
        let mut g = Graph::new();
        g.add_node(Node::new("stress", "problem")).unwrap();
        g.add_node(Node::new("meditation", "strategy")).unwrap();
        g.add_node(Node::new("exercise", "strategy")).unwrap();
        g.add_edge(Edge::new("e1", "stress", "meditation", Relation::Elicits, 0.7)).unwrap();
        g.add_edge(Edge::new("e2", "stress", "exercise", Relation::Elicits, 0.5)).unwrap();
        g
    }

    fn ids(edges: Vec<&Edge>) -> Vec<&str> {
        edges.into_iter().map(|e| e.id().as_str()).collect()
    }

    #[test]
    fn test_add_and_get() {
        let g = sample();
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(
            g.get_node(&"stress".into()).unwrap().node_type,
            "problem".to_string()
        );
        assert_eq!(g.get_edge(&"e2".into()).unwrap().strength(), 0.5);
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut g = sample();
        let err = g.add_node(Node::new("stress", "other")).unwrap_err();
        assert!(matches!(err, Error::DuplicateNode(id) if id == "stress"));
        assert_eq!(g.get_node(&"stress".into()).unwrap().node_type, "problem");
    }

    #[test]
    fn test_duplicate_edge_rejected() {
        let mut g = sample();
        let err = g
            .add_edge(Edge::new("e1", "meditation", "exercise", Relation::Supports, 0.1))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateEdge(_)));
        assert_eq!(g.get_edge(&"e1".into()).unwrap().target().as_str(), "meditation");
    }

    #[test]
    fn test_missing_endpoint_leaves_graph_unchanged() {
        let mut g = sample();
        let before = g.clone();

        let err = g
            .add_edge(Edge::new("e3", "stress", "ghost", Relation::Causes, 0.4))
            .unwrap_err();

        assert!(matches!(
            err,
            Error::MissingEndpoint { ref edge_id, ref node_id }
                if edge_id == "e3" && node_id == "ghost"
        ));
        assert_eq!(g, before);
        assert!(g.successors(&"stress".into()).iter().all(|n| n.as_str() != "ghost"));

        let err = g
            .add_edge(Edge::new("e4", "ghost", "stress", Relation::Causes, 0.4))
            .unwrap_err();
        assert!(matches!(err, Error::MissingEndpoint { .. }));
        assert_eq!(g, before);
    }

    #[test]
    fn test_parallel_edges() {
        let mut g = sample();
        g.add_edge(Edge::new("e0", "stress", "meditation", Relation::Supports, 0.2)).unwrap();

        let between = g.get_edges(&"stress".into(), &"meditation".into());
        assert_eq!(ids(between), vec!["e0", "e1"]);
        assert!(g.get_edges(&"meditation".into(), &"stress".into()).is_empty());
        assert!(g.get_edges(&"nobody".into(), &"stress".into()).is_empty());
    }

    #[test]
    fn test_outgoing_and_incoming() {
        let mut g = sample();
        g.add_edge(Edge::new("a9", "meditation", "exercise", Relation::RelatesTo, 0.3)).unwrap();

        assert_eq!(ids(g.outgoing_edges(&"stress".into())), vec!["e1", "e2"]);
        assert_eq!(ids(g.incoming_edges(&"exercise".into())), vec!["a9", "e2"]);
        assert!(g.outgoing_edges(&"exercise".into()).is_empty());
    }

    #[test]
    fn test_remove_edge_cleans_adjacency() {
        let mut g = sample();
        let removed = g.remove_edge(&"e1".into()).unwrap();
        assert_eq!(removed.id().as_str(), "e1");
        assert!(g.get_edges(&"stress".into(), &"meditation".into()).is_empty());
        assert_eq!(g.successors(&"stress".into()).len(), 1);

        g.remove_edge(&"e2".into()).unwrap();
        assert!(g.adjacency.is_empty());
        assert!(g.remove_edge(&"e2".into()).is_none());
    }

    #[test]
    fn test_remove_node_cascades() {
        let mut g = sample();
        g.add_edge(Edge::new("back", "meditation", "stress", Relation::Supports, 0.5)).unwrap();

        g.remove_node(&"meditation".into()).unwrap();

        assert_eq!(g.node_count(), 2);
        assert_eq!(ids(g.edges().collect()), vec!["e2"]);
        assert!(!g.adjacency.contains_key(&NodeId::from("meditation")));
        assert_eq!(g.successors(&"stress".into()), vec![&NodeId::from("exercise")]);
    }

    #[test]
    fn test_edge_mutators() {
        let now = Utc::now();
        let mut g = sample();
        let e1: EdgeId = "e1".into();

        g.register_emotion(&e1, Emotion::Excited, 0.5, now).unwrap();
        assert!((g.get_edge(&e1).unwrap().emotional_charge() - 0.2).abs() < 1e-9);

        g.schedule_reinforcement(&e1, 0.2).unwrap();
        assert!(g.apply_reinforcement(&e1, true).unwrap());
        assert!(!g.apply_reinforcement(&e1, true).unwrap());
        assert!((g.get_edge(&e1).unwrap().strength() - 0.9).abs() < 1e-9);

        g.weaken_edge(&e1, 0.4, now).unwrap();
        g.reinforce_edge(&e1, 0.1, now).unwrap();
        assert!((g.get_edge(&e1).unwrap().strength() - 0.6).abs() < 1e-9);

        g.touch_edge(&e1, now).unwrap();
        assert_eq!(g.get_edge(&e1).unwrap().last_used(), now);

        assert!(matches!(
            g.touch_edge(&"missing".into(), now),
            Err(Error::EdgeNotFound(_))
        ));
        assert!(matches!(
            g.reinforce_node(&"missing".into(), 0.1, now),
            Err(Error::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_register_emotion_uses_configured_table() {
        let now = Utc::now();
        let config = GraphConfig::default().with_emotions(
            crate::config::EmotionTable::default().with_delta(Emotion::Happy, 0.6),
        );
        let mut g = Graph::with_config(config).unwrap();
        g.add_node(Node::new("a", "t")).unwrap();
        g.add_node(Node::new("b", "t")).unwrap();
        g.add_edge(Edge::new("e", "a", "b", Relation::Supports, 0.5)).unwrap();

        g.register_emotion(&"e".into(), Emotion::Happy, 1.0, now).unwrap();

        assert!((g.get_edge(&"e".into()).unwrap().emotional_charge() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_with_config_validates() {
        assert!(Graph::with_config(GraphConfig::default().with_decay_rate(-0.5)).is_err());
    }

    #[test]
    fn test_subgraph_at_time() {
        let t0 = Utc::now();
        let t1 = t0 + Duration::hours(1);
        let t2 = t0 + Duration::hours(2);

        let mut g = Graph::new();
        g.add_node(Node::new("a", "t").with_created_at(t0)).unwrap();
        g.add_node(Node::new("b", "t").with_created_at(t0)).unwrap();
        g.add_node(Node::new("c", "t").with_created_at(t2)).unwrap();
        g.add_edge(Edge::new("ab", "a", "b", Relation::Supports, 0.5).with_created_at(t1)).unwrap();
        g.add_edge(Edge::new("ac", "a", "c", Relation::Supports, 0.5).with_created_at(t1)).unwrap();
        let before = g.clone();

        let at_t0 = g.subgraph_at_time(t0);
        assert_eq!(at_t0.node_count(), 2);
        assert_eq!(at_t0.edge_count(), 0);

        let at_t1 = g.subgraph_at_time(t1);
        assert_eq!(at_t1.node_count(), 2);
        assert_eq!(ids(at_t1.edges().collect()), vec!["ab"]);

        let at_t2 = g.subgraph_at_time(t2);
        assert_eq!(at_t2, g);
        assert_eq!(g, before);
    }

    #[test]
    fn test_induced_subgraph() {
        let g = sample();
        let view = g.induced_subgraph(&[
            NodeId::from("stress"),
            NodeId::from("exercise"),
            NodeId::from("nope"),
        ]);
        assert_eq!(view.node_count(), 2);
        assert_eq!(ids(view.edges().collect()), vec!["e2"]);
        assert_eq!(ids(view.outgoing_edges(&"stress".into())), vec!["e2"]);
    }
}
