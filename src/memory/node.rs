//! Memory nodes with time-independent confidence and time-dependent availability.

use super::types::{seconds_between, NodeId};
use super::{CONFIDENCE_STEP, DEFAULT_MEMORY_STRENGTH, MAX_MEMORY_STRENGTH, MIN_MEMORY_STRENGTH};
use crate::error::{ensure_non_negative, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A concept or belief held in memory.
///
/// Confidence says how reliable the content is and never decays on its own.
/// Availability says how accessible the memory is right now and follows an
/// exponential forgetting curve governed by `memory_strength`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,

    /// Open tag describing what kind of memory this is.
    pub node_type: String,

    /// Opaque payload owned by the caller.
    #[serde(default)]
    pub data: HashMap<String, Value>,

    confidence: f64,
    created_at: DateTime<Utc>,
    last_accessed: DateTime<Utc>,

    /// Forgetting time constant in seconds.
    memory_strength: f64,

    /// Persistent memories are always fully available.
    #[serde(default)]
    pub persistent: bool,

    /// Auxiliary annotations kept apart from the payload.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Node {
    /// Create a node created and last accessed now.
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            node_type: node_type.into(),
            data: HashMap::new(),
            confidence: 1.0,
            created_at: now,
            last_accessed: now,
            memory_strength: DEFAULT_MEMORY_STRENGTH,
            persistent: false,
            metadata: HashMap::new(),
        }
    }

    /// Create a node with a random id.
    pub fn generated(node_type: impl Into<String>) -> Self {
        Self::new(NodeId::new(), node_type)
    }

    /// Add a payload entry.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Add metadata.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Set the confidence, clamped to [0, 1].
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_unit(confidence);
        self
    }

    /// Set the forgetting time constant, clamped to [1, one week].
    pub fn with_memory_strength(mut self, seconds: f64) -> Self {
        self.memory_strength = clamp_strength(seconds);
        self
    }

    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Set the creation time. Also resets last access to the same instant.
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self.last_accessed = at;
        self
    }

    pub fn with_last_accessed(mut self, at: DateTime<Utc>) -> Self {
        self.last_accessed = at;
        self
    }

    // ==================== Accessors ====================

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn memory_strength(&self) -> f64 {
        self.memory_strength
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_accessed(&self) -> DateTime<Utc> {
        self.last_accessed
    }

    /// Get a payload value.
    pub fn get_data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    // ==================== Forgetting ====================

    /// Probability that the memory is accessible at `now`.
    ///
    /// `exp(-elapsed / memory_strength)` with elapsed seconds since last access;
    /// always 1 for persistent nodes.
    pub fn availability(&self, now: DateTime<Utc>) -> f64 {
        if self.persistent {
            return 1.0;
        }
        let elapsed = seconds_between(self.last_accessed, now);
        (-elapsed / self.memory_strength).exp().clamp(0.0, 1.0)
    }

    /// Spaced-repetition reinforcement.
    ///
    /// Resets the forgetting clock, multiplies `memory_strength` by
    /// `1 + amount` (capped at one week) and nudges confidence up.
    pub fn reinforce(&mut self, amount: f64, now: DateTime<Utc>) -> Result<()> {
        ensure_non_negative("reinforcement amount", amount)?;

        self.last_accessed = now;
        self.memory_strength = (self.memory_strength * (1.0 + amount)).min(MAX_MEMORY_STRENGTH);
        self.confidence = (self.confidence + CONFIDENCE_STEP).min(1.0);
        Ok(())
    }

    /// Ranking value used by retrieval: confidence times availability.
    pub fn retrieval_score(&self, now: DateTime<Utc>) -> f64 {
        self.confidence * self.availability(now)
    }

    /// Pull externally loaded values back into range.
    pub(crate) fn normalize(&mut self) {
        self.confidence = clamp_unit(self.confidence);
        self.memory_strength = clamp_strength(self.memory_strength);
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn clamp_strength(seconds: f64) -> f64 {
    if seconds.is_nan() {
        DEFAULT_MEMORY_STRENGTH
    } else {
        seconds.clamp(MIN_MEMORY_STRENGTH, MAX_MEMORY_STRENGTH)
    }
}
