//! Subgraph expansion and shortest-path retrieval.

use crate::graph::Graph;
use crate::memory::{Edge, NodeId};
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, VecDeque};

/// Distances closer than this are treated as equal when collecting all
/// shortest paths.
const DISTANCE_EPSILON: f64 = 1e-12;

/// Edge cost that prefers strong relations: `1 - strength`.
pub fn inverse_strength(edge: &Edge) -> f64 {
    1.0 - edge.strength()
}

/// Copy of everything reachable within `k` outgoing hops of any seed.
///
/// Seeds are always included (when present). The result is the induced
/// subgraph over the reached nodes, detached from the live graph.
pub fn retrieve_subgraph(graph: &Graph, seeds: &[NodeId], k: usize) -> Graph {
    let mut reached: BTreeSet<&NodeId> = BTreeSet::new();

    for seed in seeds {
        let Some(start) = graph.get_node(seed).map(|n| n.id()) else {
            continue;
        };

        let mut depth: BTreeMap<&NodeId, usize> = BTreeMap::new();
        let mut queue = VecDeque::new();
        depth.insert(start, 0);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            let d = depth[current];
            if d == k {
                continue;
            }
            for next in graph.successors(current) {
                if !depth.contains_key(next) {
                    depth.insert(next, d + 1);
                    queue.push_back(next);
                }
            }
        }

        reached.extend(depth.into_keys());
    }

    graph.induced_subgraph(reached)
}

/// All shortest paths from `start` to `end` as node id sequences.
///
/// Without a weight function every edge costs one hop. With one, the path
/// cost is the sum of the weights; among parallel edges the cheapest counts,
/// negative or NaN weights count as zero and infinite weights make an edge
/// impassable. Paths come back in lexicographic order. Missing endpoints or no
/// connection give an empty list.
pub fn retrieve_path(
    graph: &Graph,
    start: &NodeId,
    end: &NodeId,
    weight: Option<&dyn Fn(&Edge) -> f64>,
) -> Vec<Vec<NodeId>> {
    let (Some(start_node), Some(end_node)) = (graph.get_node(start), graph.get_node(end)) else {
        return Vec::new();
    };
    let (start, end) = (start_node.id(), end_node.id());

    if start == end {
        return vec![vec![start.clone()]];
    }

    let predecessors = match weight {
        None => hop_predecessors(graph, start, end),
        Some(weight) => weighted_predecessors(graph, start, weight),
    };

    if !predecessors.contains_key(end) {
        return Vec::new();
    }

    let mut paths = Vec::new();
    let mut stack = Vec::new();
    unwind(end, start, &predecessors, &mut stack, &mut paths);
    paths.sort();
    paths
}

type Predecessors<'a> = BTreeMap<&'a NodeId, Vec<&'a NodeId>>;

/// Breadth-first search recording every predecessor on a shortest route.
fn hop_predecessors<'a>(graph: &'a Graph, start: &'a NodeId, end: &NodeId) -> Predecessors<'a> {
    let mut dist: BTreeMap<&NodeId, usize> = BTreeMap::new();
    let mut preds: Predecessors<'a> = BTreeMap::new();
    let mut queue = VecDeque::new();
    dist.insert(start, 0);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        let d = dist[current];
        if let Some(&end_dist) = dist.get(end) {
            if d >= end_dist {
                break;
            }
        }
        for next in graph.successors(current) {
            match dist.get(next) {
                None => {
                    dist.insert(next, d + 1);
                    preds.insert(next, vec![current]);
                    queue.push_back(next);
                }
                Some(&nd) if nd == d + 1 => {
                    preds.entry(next).or_default().push(current);
                }
                _ => {}
            }
        }
    }

    preds
}

#[derive(PartialEq)]
struct Cost(f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Dijkstra recording every predecessor on a cheapest route.
fn weighted_predecessors<'a>(
    graph: &'a Graph,
    start: &'a NodeId,
    weight: &dyn Fn(&Edge) -> f64,
) -> Predecessors<'a> {
    let mut dist: BTreeMap<&NodeId, f64> = BTreeMap::new();
    let mut preds: Predecessors<'a> = BTreeMap::new();
    let mut heap = BinaryHeap::new();
    dist.insert(start, 0.0);
    heap.push(Reverse((Cost(0.0), start)));

    while let Some(Reverse((Cost(d), current))) = heap.pop() {
        if d > dist[current] + DISTANCE_EPSILON {
            continue;
        }
        for next in graph.successors(current) {
            let step = graph
                .get_edges(current, next)
                .into_iter()
                .map(|e| weight(e).max(0.0))
                .fold(f64::INFINITY, f64::min);
            let candidate = d + step;
            if !candidate.is_finite() {
                continue;
            }

            match dist.get(next) {
                Some(&known) if (candidate - known).abs() <= DISTANCE_EPSILON => {
                    let entry = preds.entry(next).or_default();
                    if !entry.contains(&current) {
                        entry.push(current);
                    }
                }
                Some(&known) if candidate >= known => {}
                _ => {
                    dist.insert(next, candidate);
                    preds.insert(next, vec![current]);
                    heap.push(Reverse((Cost(candidate), next)));
                }
            }
        }
    }

    preds
}

/// Walk predecessor lists back from `node` to `start`, emitting each path
/// front to back. Nodes already on the current path are skipped so zero-cost
/// cycles cannot recurse forever.
fn unwind<'a>(
    node: &'a NodeId,
    start: &NodeId,
    preds: &Predecessors<'a>,
    stack: &mut Vec<&'a NodeId>,
    paths: &mut Vec<Vec<NodeId>>,
) {
    stack.push(node);
    if node == start {
        paths.push(stack.iter().rev().map(|id| (*id).clone()).collect());
    } else if let Some(previous) = preds.get(node) {
        for &p in previous {
            if !stack.contains(&p) {
                unwind(p, start, preds, stack, paths);
            }
        }
    }
    stack.pop();
}
