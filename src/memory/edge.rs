//! Typed, directed relations between memory nodes.
//!
//! An edge carries two independent signals:
//!
//! - **strength**: long-term structural importance in [0, 1], changed by explicit
//!   reinforcement and by inactivity decay
//! - **emotional charge**: short-term modulation in [-1, 1] that relaxes toward
//!   neutral over time
//!
//! Both are clamped after every mutation. Caller requests that fall outside their
//! declared ranges are rejected instead.

use super::types::{seconds_between, EdgeId, Emotion, NodeId, Relation};
use super::{EMOTIONAL_WEIGHT, IMPORTANCE_FLOOR, RECENCY_SCALE_SECS};
use crate::config::EmotionTable;
use crate::error::{ensure_in_range, ensure_non_negative, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Metadata key holding the most recently registered emotion.
pub const LAST_EMOTION_KEY: &str = "last_emotion";
/// Metadata key holding when the most recent emotion was registered.
pub const LAST_EMOTION_AT_KEY: &str = "last_emotion_at";

/// A directed relation from `source` to `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    id: EdgeId,
    source: NodeId,
    target: NodeId,

    /// Type of relationship.
    pub relation: Relation,

    strength: f64,
    emotional_charge: f64,
    created_at: DateTime<Utc>,
    last_used: DateTime<Utc>,

    /// Last instant decay was accounted for, if ever.
    #[serde(default)]
    last_decayed: Option<DateTime<Utc>>,

    #[serde(default)]
    pending_reinforcement: Option<f64>,

    /// Auxiliary annotations.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Edge {
    /// Create an edge with neutral charge, created and last used now.
    pub fn new(
        id: impl Into<EdgeId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        relation: Relation,
        strength: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            relation,
            strength: clamp_strength(strength),
            emotional_charge: 0.0,
            created_at: now,
            last_used: now,
            last_decayed: None,
            pending_reinforcement: None,
            metadata: HashMap::new(),
        }
    }

    /// Create an edge with a random id.
    pub fn generated(
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        relation: Relation,
        strength: f64,
    ) -> Self {
        Self::new(EdgeId::new(), source, target, relation, strength)
    }

    /// Set the initial emotional charge, clamped to [-1, 1].
    pub fn with_emotional_charge(mut self, charge: f64) -> Self {
        self.emotional_charge = clamp_charge(charge);
        self
    }

    /// Set the creation time. Also resets last use to the same instant.
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self.last_used = at;
        self
    }

    pub fn with_last_used(mut self, at: DateTime<Utc>) -> Self {
        self.last_used = at;
        self
    }

    /// Add metadata.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    // ==================== Accessors ====================

    pub fn id(&self) -> &EdgeId {
        &self.id
    }

    pub fn source(&self) -> &NodeId {
        &self.source
    }

    pub fn target(&self) -> &NodeId {
        &self.target
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn emotional_charge(&self) -> f64 {
        self.emotional_charge
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_used(&self) -> DateTime<Utc> {
        self.last_used
    }

    pub fn last_decayed(&self) -> Option<DateTime<Utc>> {
        self.last_decayed
    }

    pub fn pending_reinforcement(&self) -> Option<f64> {
        self.pending_reinforcement
    }

    /// The emotion recorded by the last `register_emotion` call.
    pub fn last_emotion(&self) -> Option<Emotion> {
        self.metadata
            .get(LAST_EMOTION_KEY)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    // ==================== Scoring ====================

    /// Hyperbolic recency in (0, 1]: `1 / (1 + hours_since_last_use)`.
    pub fn recency_factor(&self, now: DateTime<Utc>) -> f64 {
        let hours = seconds_between(self.last_used, now) / RECENCY_SCALE_SECS;
        1.0 / (1.0 + hours)
    }

    /// Composite of strength, recency and emotional charge. Never negative.
    pub fn importance_score(&self, now: DateTime<Utc>) -> f64 {
        let emotional_boost = 1.0 + self.emotional_charge * EMOTIONAL_WEIGHT;
        (self.strength * self.recency_factor(now) * emotional_boost).max(0.0)
    }

    // ==================== Emotion ====================

    /// Register an emotion using the built-in emotion table.
    pub fn register_emotion(
        &mut self,
        emotion: Emotion,
        intensity: f64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.register_emotion_with(&EmotionTable::default(), emotion, intensity, now)
    }

    /// Register an emotion using a caller-provided emotion table.
    ///
    /// The table delta scaled by `intensity` is added to the charge. The
    /// emotion and its time are recorded in metadata and the edge counts as used.
    pub fn register_emotion_with(
        &mut self,
        table: &EmotionTable,
        emotion: Emotion,
        intensity: f64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        ensure_in_range("emotion intensity", intensity, 0.0, 1.0)?;

        let delta = table.delta(emotion) * intensity;
        self.emotional_charge = clamp_charge(self.emotional_charge + delta);
        self.metadata
            .insert(LAST_EMOTION_KEY.to_string(), Value::from(emotion.as_str()));
        self.metadata
            .insert(LAST_EMOTION_AT_KEY.to_string(), Value::from(now.to_rfc3339()));
        self.last_used = now;
        Ok(())
    }

    /// Relax the emotional charge toward zero by `rate`.
    pub fn cool_down(&mut self, rate: f64) -> Result<()> {
        ensure_non_negative("cool-down rate", rate)?;
        self.relax_charge(rate);
        Ok(())
    }

    fn relax_charge(&mut self, rate: f64) {
        if self.emotional_charge.abs() <= rate {
            self.emotional_charge = 0.0;
        } else {
            self.emotional_charge =
                clamp_charge(self.emotional_charge - rate * self.emotional_charge.signum());
        }
    }

    // ==================== Strength ====================

    /// Mark the edge as traversed.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_used = now;
    }

    /// Strengthen the edge immediately.
    pub fn reinforce(&mut self, amount: f64, now: DateTime<Utc>) -> Result<()> {
        ensure_non_negative("reinforcement amount", amount)?;
        self.strength = clamp_strength(self.strength + amount);
        self.last_used = now;
        Ok(())
    }

    /// Weaken the edge immediately.
    pub fn weaken(&mut self, amount: f64, now: DateTime<Utc>) -> Result<()> {
        ensure_non_negative("weakening amount", amount)?;
        self.strength = clamp_strength(self.strength - amount);
        self.last_used = now;
        Ok(())
    }

    /// Record a reinforcement that waits for an outcome.
    ///
    /// Replaces any earlier pending value.
    pub fn schedule_reinforcement(&mut self, amount: f64) -> Result<()> {
        ensure_in_range("scheduled reinforcement", amount, -1.0, 1.0)?;
        self.pending_reinforcement = Some(amount);
        Ok(())
    }

    /// Resolve the pending reinforcement against an observed outcome.
    ///
    /// Success applies the full pending amount. Failure removes half of its
    /// magnitude whatever its sign. Returns false if nothing was pending.
    pub fn apply_reinforcement(&mut self, success: bool) -> bool {
        let Some(pending) = self.pending_reinforcement.take() else {
            return false;
        };

        let delta = if success { pending } else { -pending.abs() / 2.0 };
        self.strength = clamp_strength(self.strength + delta);
        true
    }

    /// Inactivity decay with base rate per hour.
    ///
    /// Weak edges lose strength fastest; edges near full strength barely move
    /// because the loss is scaled by `1 - max(0.3, strength)`. Emotional charge
    /// cools by `base_rate * hours` in the same step. Elapsed time is counted
    /// from the later of the last use and the previous decay. Returns the
    /// strength lost.
    pub fn decay(&mut self, base_rate: f64, now: DateTime<Utc>) -> Result<f64> {
        ensure_non_negative("decay rate", base_rate)?;

        let anchor = match self.last_decayed {
            Some(at) if at > self.last_used => at,
            _ => self.last_used,
        };
        let hours = seconds_between(anchor, now) / RECENCY_SCALE_SECS;

        // Charge spans [-1, 1], so no cool-down step needs to exceed 2
        let exposure = base_rate * hours;
        let importance_factor = self.strength.max(IMPORTANCE_FLOOR);
        let decay_amount = if importance_factor >= 1.0 {
            0.0
        } else {
            exposure * (1.0 - importance_factor)
        };

        let before = self.strength;
        self.strength = clamp_strength(self.strength - decay_amount);
        self.relax_charge(exposure.min(2.0));
        self.last_decayed = Some(anchor.max(now));

        Ok(before - self.strength)
    }

    /// True when the strength has fallen below `threshold`.
    pub fn should_prune(&self, threshold: f64) -> bool {
        self.strength < threshold
    }

    /// Pull externally loaded values back into range.
    pub(crate) fn normalize(&mut self) {
        self.strength = clamp_strength(self.strength);
        self.emotional_charge = clamp_charge(self.emotional_charge);
        self.pending_reinforcement = self
            .pending_reinforcement
            .filter(|p| (-1.0..=1.0).contains(p));
    }
}

fn clamp_strength(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn clamp_charge(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}
