//! Caller-driven maintenance: statistics, decay ticks and pruning.
//!
//! Nothing here runs on its own. The host decides when to call `tick` or
//! `prune_weak_edges`, and passes the current time explicitly.

use super::Graph;
use crate::error::{ensure_non_negative, Result};
use crate::memory::EdgeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Aggregate view of edge health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub num_nodes: usize,
    pub num_edges: usize,
    /// Mean edge strength, 0 when there are no edges
    pub avg_strength: f64,
    /// Edges strictly below `weak_threshold`
    pub weak_edges: usize,
    pub weak_threshold: f64,
}

/// Outcome of a maintenance pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceReport {
    /// Edges whose strength went down
    pub edges_decayed: usize,
    /// Total strength removed by decay
    pub strength_lost: f64,
    /// Edges removed by pruning
    pub edges_pruned: usize,
}

impl Graph {
    /// Statistics using the configured weak-edge threshold.
    pub fn statistics(&self) -> GraphStatistics {
        self.statistics_with_threshold(self.config.weak_edge_threshold)
    }

    pub fn statistics_with_threshold(&self, weak_threshold: f64) -> GraphStatistics {
        let num_edges = self.edges.len();
        let avg_strength = if num_edges == 0 {
            0.0
        } else {
            self.edges.values().map(|e| e.strength()).sum::<f64>() / num_edges as f64
        };
        let weak_edges = self
            .edges
            .values()
            .filter(|e| e.should_prune(weak_threshold))
            .count();

        GraphStatistics {
            num_nodes: self.nodes.len(),
            num_edges,
            avg_strength,
            weak_edges,
            weak_threshold,
        }
    }

    /// Remove every edge with strength below `threshold`. Nodes are kept.
    ///
    /// Returns the number of edges removed.
    #[instrument(skip(self))]
    pub fn prune_weak_edges(&mut self, threshold: f64) -> usize {
        if threshold.is_nan() {
            warn!("NaN prune threshold, nothing pruned");
            return 0;
        }

        let weak: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|e| e.should_prune(threshold))
            .map(|e| e.id().clone())
            .collect();

        for id in &weak {
            self.remove_edge(id);
        }

        if !weak.is_empty() {
            info!(pruned = weak.len(), remaining = self.edges.len(), "Pruned weak edges");
        }
        weak.len()
    }

    /// Decay every edge with an explicit base rate per hour.
    #[instrument(skip(self))]
    pub fn decay_all(&mut self, base_rate: f64, now: DateTime<Utc>) -> Result<MaintenanceReport> {
        ensure_non_negative("decay rate", base_rate)?;

        let mut report = MaintenanceReport::default();
        for edge in self.edges.values_mut() {
            let lost = edge.decay(base_rate, now)?;
            if lost > 0.0 {
                debug!(edge_id = %edge.id(), lost, strength = edge.strength(), "Edge decayed");
                report.edges_decayed += 1;
                report.strength_lost += lost;
            }
        }
        Ok(report)
    }

    /// Relax every edge's emotional charge toward neutral.
    pub fn cool_down_all(&mut self, rate: f64) -> Result<()> {
        ensure_non_negative("cool-down rate", rate)?;
        for edge in self.edges.values_mut() {
            edge.cool_down(rate)?;
        }
        Ok(())
    }

    /// One maintenance step: decay with the configured rate.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Result<MaintenanceReport> {
        self.decay_all(self.config.decay_rate, now)
    }

    /// Decay with the configured rate, then prune below the configured threshold.
    pub fn tick_and_prune(&mut self, now: DateTime<Utc>) -> Result<MaintenanceReport> {
        let mut report = self.tick(now)?;
        report.edges_pruned = self.prune_weak_edges(self.config.weak_edge_threshold);
        info!(
            decayed = report.edges_decayed,
            pruned = report.edges_pruned,
            "Maintenance tick complete"
        );
        Ok(report)
    }
}
