//! Memory units: forgetting nodes and reinforced, emotionally modulated edges.
//!
//! - **Node**: a concept or belief with time-independent `confidence` and an
//!   `availability` that follows an exponential forgetting curve
//! - **Edge**: a typed, directed relation with long-term `strength` and
//!   short-term `emotional_charge`
//!
//! Nothing here reads the wall clock except constructors. Every scoring and
//! decay operation takes an explicit `now`.
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use dialograph_core::memory::{Edge, Emotion, Node, Relation};
//!
//! let now = Utc::now();
//! let node = Node::new("stress", "problem").with_created_at(now);
//! assert_eq!(node.availability(now), 1.0);
//!
//! let mut edge = Edge::new("e1", "stress", "meditation", Relation::Elicits, 0.7)
//!     .with_created_at(now);
//! edge.register_emotion(Emotion::Happy, 1.0, now).unwrap();
//! assert!((edge.importance_score(now) - 0.742).abs() < 1e-9);
//! ```

mod edge;
mod node;
#[cfg(feature = "sqlite")]
mod schema;
#[cfg(feature = "sqlite")]
mod store;
mod types;

pub use edge::{Edge, LAST_EMOTION_AT_KEY, LAST_EMOTION_KEY};
pub use node::Node;
#[cfg(feature = "sqlite")]
pub use schema::{get_schema_version, initialize_schema, is_initialized, SCHEMA_VERSION};
#[cfg(feature = "sqlite")]
pub use store::{SqliteGraphStore, StoreStats};
pub use types::{EdgeId, Emotion, NodeId, Relation};

/// Forgetting time constant for new nodes (one hour).
pub const DEFAULT_MEMORY_STRENGTH: f64 = 3600.0;

/// Smallest allowed forgetting time constant.
pub const MIN_MEMORY_STRENGTH: f64 = 1.0;

/// Largest allowed forgetting time constant (one week).
pub const MAX_MEMORY_STRENGTH: f64 = 7.0 * 24.0 * 3600.0;

/// Confidence gained per node reinforcement.
pub const CONFIDENCE_STEP: f64 = 0.05;

/// Seconds per unit of edge recency and decay time.
pub const RECENCY_SCALE_SECS: f64 = 3600.0;

/// Weight of emotional charge in the importance score.
pub const EMOTIONAL_WEIGHT: f64 = 0.2;

/// Strength floor used when scaling decay.
pub const IMPORTANCE_FLOOR: f64 = 0.3;
