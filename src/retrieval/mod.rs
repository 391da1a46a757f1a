//! Read-only queries over a [`Graph`](crate::graph::Graph).
//!
//! - [`retrieve_neighbors`]: context-aware ranking of a node's outgoing relations
//! - [`strongest_edges`]: graph-wide importance ranking
//! - [`retrieve_subgraph`]: k-hop expansion around seed nodes
//! - [`retrieve_path`]: all shortest paths, by hops or a custom edge cost
//!
//! Retrieval never mutates the graph. Callers that want a retrieval to count
//! as a use should follow up with `touch_edge` or `reinforce_node`.

mod context;
mod neighbors;
mod paths;

pub use context::{ContextMatcher, NodeTypeContext, UniformContext};
pub use neighbors::{retrieve_neighbors, strongest_edges, ScoredEdge, ScoredNeighbor};
pub use paths::{inverse_strength, retrieve_path, retrieve_subgraph};
