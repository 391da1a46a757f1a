//! Neighbor ranking.

use super::context::{bounded_score, ContextMatcher};
use crate::graph::Graph;
use crate::memory::{Edge, Node, NodeId};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// A ranked neighbor: the target node and the edge that leads to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredNeighbor<'a> {
    pub score: f64,
    pub node: &'a Node,
    pub edge: &'a Edge,
}

/// A ranked edge, for graph-wide queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredEdge<'a> {
    pub score: f64,
    pub edge: &'a Edge,
}

/// Higher score first; equal scores by edge id ascending.
fn rank(a_score: f64, a_edge: &Edge, b_score: f64, b_edge: &Edge) -> Ordering {
    b_score
        .total_cmp(&a_score)
        .then_with(|| a_edge.id().cmp(b_edge.id()))
}

/// Rank the targets of `source`'s outgoing edges.
///
/// Each candidate scores
/// `target.retrieval_score(now) * edge.importance_score(now) * context_match`.
/// The best `top_k` come back highest first; ties are ordered by edge id so
/// the result is deterministic. A missing source yields an empty list.
pub fn retrieve_neighbors<'a>(
    graph: &'a Graph,
    source: &NodeId,
    now: DateTime<Utc>,
    top_k: usize,
    matcher: &dyn ContextMatcher,
) -> Vec<ScoredNeighbor<'a>> {
    let mut scored: Vec<ScoredNeighbor<'a>> = graph
        .outgoing_edges(source)
        .into_iter()
        .filter_map(|edge| {
            let node = graph.get_node(edge.target())?;
            let score = node.retrieval_score(now)
                * edge.importance_score(now)
                * bounded_score(matcher, node);
            Some(ScoredNeighbor { score, node, edge })
        })
        .collect();

    scored.sort_by(|a, b| rank(a.score, a.edge, b.score, b.edge));
    scored.truncate(top_k);
    scored
}

/// The `top_k` most important edges in the whole graph at `now`.
pub fn strongest_edges(graph: &Graph, now: DateTime<Utc>, top_k: usize) -> Vec<ScoredEdge<'_>> {
    let mut scored: Vec<ScoredEdge<'_>> = graph
        .edges()
        .map(|edge| ScoredEdge {
            score: edge.importance_score(now),
            edge,
        })
        .collect();

    scored.sort_by(|a, b| rank(a.score, a.edge, b.score, b.edge));
    scored.truncate(top_k);
    scored
}
