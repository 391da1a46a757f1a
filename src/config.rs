//! Graph configuration.

use crate::error::{ensure_in_range, ensure_non_negative, Result};
use crate::memory::Emotion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Emotion to charge-delta mapping.
///
/// Starts from the built-in deltas; individual entries can be overridden.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionTable {
    overrides: BTreeMap<Emotion, f64>,
}

impl EmotionTable {
    /// Override the delta for one emotion. Values are clamped to [-1, 1].
    pub fn with_delta(mut self, emotion: Emotion, delta: f64) -> Self {
        let delta = if delta.is_nan() { 0.0 } else { delta.clamp(-1.0, 1.0) };
        self.overrides.insert(emotion, delta);
        self
    }

    /// Charge delta at full intensity.
    pub fn delta(&self, emotion: Emotion) -> f64 {
        self.overrides
            .get(&emotion)
            .copied()
            .unwrap_or_else(|| emotion.default_delta())
    }
}

/// Configuration for graph maintenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Edges below this strength count as weak and are pruned by `tick_and_prune`
    pub weak_edge_threshold: f64,
    /// Base decay rate per hour applied by `tick`
    pub decay_rate: f64,
    /// Emotion deltas used by graph-level emotion registration
    pub emotions: EmotionTable,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            weak_edge_threshold: 0.1,
            decay_rate: 0.01,
            emotions: EmotionTable::default(),
        }
    }
}

impl GraphConfig {
    /// Slow decay, prunes only nearly dead edges.
    pub fn conservative() -> Self {
        Self {
            weak_edge_threshold: 0.02,
            decay_rate: 0.002,
            emotions: EmotionTable::default(),
        }
    }

    /// Fast decay with a higher pruning bar, for short-lived sessions.
    pub fn aggressive() -> Self {
        Self {
            weak_edge_threshold: 0.2,
            decay_rate: 0.05,
            emotions: EmotionTable::default(),
        }
    }

    pub fn with_weak_edge_threshold(mut self, threshold: f64) -> Self {
        self.weak_edge_threshold = threshold;
        self
    }

    pub fn with_decay_rate(mut self, rate: f64) -> Self {
        self.decay_rate = rate;
        self
    }

    pub fn with_emotions(mut self, emotions: EmotionTable) -> Self {
        self.emotions = emotions;
        self
    }

    /// Check that thresholds and rates are usable.
    pub fn validate(&self) -> Result<()> {
        ensure_in_range("weak_edge_threshold", self.weak_edge_threshold, 0.0, 1.0)?;
        ensure_non_negative("decay_rate", self.decay_rate)?;
        Ok(())
    }
}
