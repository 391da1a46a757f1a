//! # dialograph-core
//!
//! A temporal memory graph for dialogue agents. Memories are nodes that fade
//! along a forgetting curve; relations between them are typed, directed edges
//! whose strength is reinforced by use, eroded by inactivity and modulated by
//! short-lived emotional charge.
//!
//! ## Core Components
//!
//! - **Memory**: `Node` and `Edge` with their scoring and decay rules
//! - **Graph**: the multigraph container, maintenance ticks and JSON snapshots
//! - **Retrieval**: neighbor ranking, k-hop subgraphs and shortest paths
//! - **Store**: SQLite persistence (feature `sqlite`, on by default)
//!
//! Time never advances implicitly. Every time-dependent operation takes `now`.
//!
//! ## Example
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use dialograph_core::{retrieve_neighbors, Edge, Emotion, Graph, Node, Relation, UniformContext};
//!
//! let now = Utc::now();
//! let mut graph = Graph::new();
//! graph.add_node(Node::new("stress", "problem").with_created_at(now))?;
//! graph.add_node(Node::new("meditation", "strategy").with_created_at(now))?;
//! graph.add_edge(
//!     Edge::new("e1", "stress", "meditation", Relation::Elicits, 0.7).with_created_at(now),
//! )?;
//! graph.register_emotion(&"e1".into(), Emotion::Happy, 1.0, now)?;
//!
//! let later = now + Duration::minutes(10);
//! let ranked = retrieve_neighbors(&graph, &"stress".into(), later, 3, &UniformContext);
//! assert_eq!(ranked[0].node.id().as_str(), "meditation");
//!
//! graph.tick_and_prune(later)?;
//! # Ok::<(), dialograph_core::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod memory;
pub mod retrieval;

// Re-exports for convenience
pub use config::{EmotionTable, GraphConfig};
pub use error::{Error, Result};
pub use graph::{Graph, GraphStatistics, MaintenanceReport, SNAPSHOT_VERSION};
#[cfg(feature = "sqlite")]
pub use memory::{SqliteGraphStore, StoreStats};
pub use memory::{Edge, EdgeId, Emotion, Node, NodeId, Relation};
pub use retrieval::{
    inverse_strength, retrieve_neighbors, retrieve_path, retrieve_subgraph, strongest_edges,
    ContextMatcher, NodeTypeContext, ScoredEdge, ScoredNeighbor, UniformContext,
};
