//! Identifier and vocabulary types shared by nodes and edges.

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a memory node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Generate a new random node ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Unique identifier for an edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Generate a new random edge ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Semantic relation carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Source is evidence for the target.
    Supports,
    /// Source conflicts with the target.
    Contradicts,
    /// Source tends to bring up the target in conversation.
    Elicits,
    /// Source causes the target.
    Causes,
    /// Source depends on the target.
    DependsOn,
    /// Source must be known before the target.
    Prerequisite,
    /// Loose association.
    RelatesTo,
}

impl Relation {
    /// All known relations.
    pub const ALL: [Relation; 7] = [
        Self::Supports,
        Self::Contradicts,
        Self::Elicits,
        Self::Causes,
        Self::DependsOn,
        Self::Prerequisite,
        Self::RelatesTo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supports => "supports",
            Self::Contradicts => "contradicts",
            Self::Elicits => "elicits",
            Self::Causes => "causes",
            Self::DependsOn => "depends_on",
            Self::Prerequisite => "prerequisite",
            Self::RelatesTo => "relates_to",
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| Error::UnknownRelation(s.to_string()))
    }
}

/// Emotion observed while an edge was in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Happy,
    Excited,
    Surprised,
    Neutral,
    Anxious,
    Sad,
    Angry,
}

impl Emotion {
    /// All known emotions.
    pub const ALL: [Emotion; 7] = [
        Self::Happy,
        Self::Excited,
        Self::Surprised,
        Self::Neutral,
        Self::Anxious,
        Self::Sad,
        Self::Angry,
    ];

    /// Charge delta at full intensity.
    pub fn default_delta(&self) -> f64 {
        match self {
            Self::Happy => 0.3,
            Self::Excited => 0.4,
            Self::Surprised => 0.1,
            Self::Neutral => 0.0,
            Self::Anxious => -0.1,
            Self::Sad => -0.2,
            Self::Angry => -0.4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Excited => "excited",
            Self::Surprised => "surprised",
            Self::Neutral => "neutral",
            Self::Anxious => "anxious",
            Self::Sad => "sad",
            Self::Angry => "angry",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == lower)
            .ok_or_else(|| Error::UnknownEmotion(s.to_string()))
    }
}

/// Seconds from `earlier` to `later`, floored at zero.
pub(crate) fn seconds_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    let delta = later.signed_duration_since(earlier);
    let secs = match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    };
    secs.max(0.0)
}
