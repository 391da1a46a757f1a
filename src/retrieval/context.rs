//! Context matching strategies for neighbor retrieval.

use crate::memory::Node;

/// Scores how well a candidate node fits the current conversational context.
///
/// Scores are expected in [0, 1]; retrieval clamps whatever comes back and
/// treats NaN as no match.
pub trait ContextMatcher {
    fn score(&self, node: &Node) -> f64;
}

/// Matches every node equally.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformContext;

impl ContextMatcher for UniformContext {
    fn score(&self, _node: &Node) -> f64 {
        1.0
    }
}

impl<F> ContextMatcher for F
where
    F: Fn(&Node) -> f64,
{
    fn score(&self, node: &Node) -> f64 {
        self(node)
    }
}

/// Matches nodes whose `node_type` is in a set, with a fallback score for the rest.
#[derive(Debug, Clone)]
pub struct NodeTypeContext {
    types: Vec<String>,
    miss_score: f64,
}

impl NodeTypeContext {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
            miss_score: 0.0,
        }
    }

    /// Score given to nodes of other types.
    pub fn with_miss_score(mut self, score: f64) -> Self {
        self.miss_score = score;
        self
    }
}

impl ContextMatcher for NodeTypeContext {
    fn score(&self, node: &Node) -> f64 {
        if self.types.iter().any(|t| *t == node.node_type) {
            1.0
        } else {
            self.miss_score
        }
    }
}

/// Clamp a matcher score into [0, 1].
pub(crate) fn bounded_score(matcher: &dyn ContextMatcher, node: &Node) -> f64 {
    let score = matcher.score(node);
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}
