//! Error types for dialograph-core.

use thiserror::Error;

/// Result type alias using dialograph-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during graph operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A node with this id is already in the graph
    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    /// An edge with this id is already in the graph
    #[error("Duplicate edge id: {0}")]
    DuplicateEdge(String),

    /// Edge references a node that is not in the graph
    #[error("Edge {edge_id} references missing node {node_id}")]
    MissingEndpoint { edge_id: String, node_id: String },

    /// Node lookup failed
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Edge lookup failed
    #[error("Edge not found: {0}")]
    EdgeNotFound(String),

    /// Caller-supplied value outside its declared range
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Relation name outside the known vocabulary
    #[error("Unknown relation: {0}")]
    UnknownRelation(String),

    /// Emotion name outside the emotion table
    #[error("Unknown emotion: {0}")]
    UnknownEmotion(String),

    /// Snapshot written by an incompatible format version
    #[error("Unsupported snapshot version {version}")]
    UnsupportedSnapshot { version: u32 },

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a missing endpoint error.
    pub fn missing_endpoint(edge_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self::MissingEndpoint {
            edge_id: edge_id.into(),
            node_id: node_id.into(),
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

/// Reject non-finite or negative amounts.
pub(crate) fn ensure_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "{} must be a finite value >= 0, got {}",
            name, value
        )))
    }
}

/// Reject values outside a closed interval (NaN included).
pub(crate) fn ensure_in_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "{} must be in [{}, {}], got {}",
            name, min, max, value
        )))
    }
}
