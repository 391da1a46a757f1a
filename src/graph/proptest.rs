//! Property-based tests for the memory graph using proptest.
//!
//! These tests check the numeric invariants that every operation sequence
//! must preserve:
//!
//! - availability stays in [0, 1] and never rises without reinforcement
//! - edge strength and emotional charge stay in their ranges under any mix
//!   of reinforcement, emotion, decay and cool-down
//! - importance is never negative
//! - pruning removes exactly the weak edges and no nodes
//! - snapshots restore an identical graph

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::graph::Graph;
    use crate::memory::{Edge, Emotion, Node, Relation, MAX_MEMORY_STRENGTH};
    use crate::retrieval::{retrieve_neighbors, UniformContext};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn unit() -> impl Strategy<Value = f64> {
        prop_oneof![Just(0.0), Just(1.0), 0.0f64..=1.0f64]
    }

    fn emotion() -> impl Strategy<Value = Emotion> {
        prop::sample::select(Emotion::ALL.to_vec())
    }

    #[derive(Debug, Clone)]
    enum EdgeOp {
        Reinforce(f64),
        Weaken(f64),
        Emotion(Emotion, f64),
        CoolDown(f64),
        Decay(f64, i64),
        Schedule(f64, bool),
    }

    fn edge_op() -> impl Strategy<Value = EdgeOp> {
        prop_oneof![
            (0.0f64..2.0).prop_map(EdgeOp::Reinforce),
            (0.0f64..2.0).prop_map(EdgeOp::Weaken),
            (emotion(), unit()).prop_map(|(e, i)| EdgeOp::Emotion(e, i)),
            (0.0f64..1.0).prop_map(EdgeOp::CoolDown),
            (0.0f64..0.5, 0i64..500).prop_map(|(r, m)| EdgeOp::Decay(r, m)),
            (-1.0f64..=1.0, any::<bool>()).prop_map(|(a, s)| EdgeOp::Schedule(a, s)),
        ]
    }

    // =========================================================================
    // Node Properties
    // =========================================================================

    proptest! {
        /// Availability is in [0, 1] and non-increasing in elapsed time.
        #[test]
        fn availability_is_bounded_and_monotone(
            strength in 1.0f64..=MAX_MEMORY_STRENGTH,
            a in 0i64..10_000_000,
            b in 0i64..10_000_000,
        ) {
            let node = Node::new("n", "t")
                .with_memory_strength(strength)
                .with_created_at(epoch());
            let (early, late) = (a.min(b), a.max(b));

            let at_early = node.availability(epoch() + Duration::seconds(early));
            let at_late = node.availability(epoch() + Duration::seconds(late));

            prop_assert!((0.0..=1.0).contains(&at_early));
            prop_assert!((0.0..=1.0).contains(&at_late));
            prop_assert!(at_late <= at_early, "{} > {}", at_late, at_early);
        }

        /// Persistent nodes are always fully available.
        #[test]
        fn persistent_nodes_never_fade(seconds in 0i64..100_000_000) {
            let node = Node::new("n", "t").with_persistent(true).with_created_at(epoch());
            prop_assert_eq!(node.availability(epoch() + Duration::seconds(seconds)), 1.0);
        }

        /// Reinforcement never lowers memory strength and respects the cap.
        #[test]
        fn reinforcement_grows_strength_up_to_cap(
            amounts in prop::collection::vec(0.0f64..5.0, 1..20),
        ) {
            let mut node = Node::new("n", "t").with_created_at(epoch());
            let mut previous = node.memory_strength();

            for (i, amount) in amounts.into_iter().enumerate() {
                node.reinforce(amount, epoch() + Duration::minutes(i as i64)).unwrap();
                prop_assert!(node.memory_strength() >= previous);
                prop_assert!(node.memory_strength() <= MAX_MEMORY_STRENGTH);
                prop_assert!(node.confidence() <= 1.0);
                previous = node.memory_strength();
            }
        }
    }

    // =========================================================================
    // Edge Properties
    // =========================================================================

    proptest! {
        /// Strength and charge stay clamped under any operation sequence.
        #[test]
        fn edge_state_stays_in_range(
            initial in unit(),
            ops in prop::collection::vec(edge_op(), 0..40),
        ) {
            let mut edge = Edge::new("e", "a", "b", Relation::Supports, initial)
                .with_created_at(epoch());
            let mut now = epoch();

            for op in ops {
                match op {
                    EdgeOp::Reinforce(amount) => edge.reinforce(amount, now).unwrap(),
                    EdgeOp::Weaken(amount) => edge.weaken(amount, now).unwrap(),
                    EdgeOp::Emotion(emotion, intensity) => {
                        edge.register_emotion(emotion, intensity, now).unwrap()
                    }
                    EdgeOp::CoolDown(rate) => edge.cool_down(rate).unwrap(),
                    EdgeOp::Decay(rate, minutes) => {
                        now += Duration::minutes(minutes);
                        let lost = edge.decay(rate, now).unwrap();
                        prop_assert!(lost >= 0.0);
                    }
                    EdgeOp::Schedule(amount, success) => {
                        edge.schedule_reinforcement(amount).unwrap();
                        prop_assert!(edge.apply_reinforcement(success));
                    }
                }

                prop_assert!((0.0..=1.0).contains(&edge.strength()));
                prop_assert!((-1.0..=1.0).contains(&edge.emotional_charge()));
                let importance = edge.importance_score(now);
                prop_assert!(importance.is_finite() && importance >= 0.0);
            }
        }

        /// Decaying twice to the same instant loses nothing the second time.
        #[test]
        fn decay_is_not_double_counted(
            strength in unit(),
            rate in 0.0f64..1.0,
            minutes in 0i64..10_000,
        ) {
            let mut edge = Edge::new("e", "a", "b", Relation::Causes, strength)
                .with_created_at(epoch());
            let now = epoch() + Duration::minutes(minutes);

            edge.decay(rate, now).unwrap();
            let after_first = edge.strength();
            let lost = edge.decay(rate, now).unwrap();

            prop_assert_eq!(lost, 0.0);
            prop_assert_eq!(edge.strength(), after_first);
        }
    }

    // =========================================================================
    // Graph Properties
    // =========================================================================

    fn random_graph(strengths: &[f64]) -> Graph {
        let mut g = Graph::new();
        for i in 0..4 {
            g.add_node(Node::new(format!("n{}", i), "t").with_created_at(epoch())).unwrap();
        }
        for (i, strength) in strengths.iter().enumerate() {
            let source = format!("n{}", i % 4);
            let target = format!("n{}", (i * 7 + 1) % 4);
            g.add_edge(
                Edge::new(format!("e{:03}", i), source, target, Relation::RelatesTo, *strength)
                    .with_created_at(epoch()),
            )
            .unwrap();
        }
        g
    }

    proptest! {
        /// Pruning removes exactly the edges below the threshold and keeps nodes.
        #[test]
        fn prune_accounting(
            strengths in prop::collection::vec(unit(), 0..30),
            threshold in unit(),
        ) {
            let mut g = random_graph(&strengths);
            let expected = strengths.iter().filter(|s| **s < threshold).count();

            let removed = g.prune_weak_edges(threshold);

            prop_assert_eq!(removed, expected);
            prop_assert_eq!(g.edge_count(), strengths.len() - expected);
            prop_assert_eq!(g.node_count(), 4);
            prop_assert!(g.edges().all(|e| e.strength() >= threshold));
            for edge in g.edges() {
                let parallel = g.get_edges(edge.source(), edge.target());
                prop_assert!(parallel.iter().any(|p| p.id() == edge.id()));
            }
        }

        /// Neighbor results are bounded by `top_k` and sorted by score.
        #[test]
        fn neighbors_sorted_and_bounded(
            strengths in prop::collection::vec(unit(), 0..30),
            top_k in 0usize..10,
        ) {
            let g = random_graph(&strengths);
            let results = retrieve_neighbors(&g, &"n0".into(), epoch(), top_k, &UniformContext);

            prop_assert!(results.len() <= top_k);
            prop_assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        }

        /// A JSON snapshot restores an identical graph.
        #[test]
        fn snapshot_restores_graph(strengths in prop::collection::vec(unit(), 0..20)) {
            let g = random_graph(&strengths);
            let restored = Graph::from_json(&g.to_json().unwrap()).unwrap();
            prop_assert_eq!(restored, g);
        }
    }
}
