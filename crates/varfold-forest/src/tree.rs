//! CART decision tree stored as a node arena.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::split::{SplitCriterion, best_split};

/// A node of a [`DecisionTree`]. Children are arena indices.
#[derive(Debug, Clone)]
pub enum Node {
    /// Interior node: samples with `feature <= threshold` go left.
    Split {
        /// Feature column tested.
        feature: usize,
        /// Split threshold.
        threshold: f64,
        /// Arena index of the left child.
        left: usize,
        /// Arena index of the right child.
        right: usize,
    },
    /// Terminal node holding the class distribution of its training samples.
    Leaf {
        /// Normalized class probabilities.
        distribution: Vec<f64>,
    },
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub(crate) criterion: SplitCriterion,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: usize,
}

/// A fitted classification tree.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grow a tree on `samples` (row indices into `columns`, may repeat).
    ///
    /// Inputs are validated by the forest before any tree is grown.
    pub(crate) fn grow(
        columns: &[Vec<f64>],
        labels: &[usize],
        samples: &[usize],
        n_classes: usize,
        params: &TreeParams,
        seed: u64,
    ) -> Self {
        let mut builder = Builder {
            columns,
            labels,
            n_classes,
            params,
            rng: ChaCha8Rng::seed_from_u64(seed),
            nodes: Vec::new(),
        };
        builder.build(samples, 0);
        Self { nodes: builder.nodes }
    }

    /// Return the class distribution of the leaf `sample` falls into.
    #[must_use]
    pub fn predict_proba(&self, sample: &[f64]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Split { feature, threshold, left, right } => {
                    index = if sample[*feature] <= *threshold { *left } else { *right };
                }
                Node::Leaf { distribution } => return distribution,
            }
        }
    }

    /// Return the number of nodes.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the nodes in arena order. The root is at index 0.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

struct Builder<'a> {
    columns: &'a [Vec<f64>],
    labels: &'a [usize],
    n_classes: usize,
    params: &'a TreeParams,
    rng: ChaCha8Rng,
    nodes: Vec<Node>,
}

impl Builder<'_> {
    fn build(&mut self, samples: &[usize], depth: usize) -> usize {
        let mut counts = vec![0usize; self.n_classes];
        for &s in samples {
            counts[self.labels[s]] += 1;
        }
        let n = samples.len();
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let too_deep = self.params.max_depth.is_some_and(|d| depth >= d);

        let split = if pure || too_deep || n < self.params.min_samples_split {
            None
        } else {
            best_split(
                self.columns,
                self.labels,
                samples,
                self.n_classes,
                self.params.criterion,
                self.params.max_features,
                self.params.min_samples_leaf,
                &mut self.rng,
            )
        };

        let index = self.nodes.len();
        let Some(split) = split else {
            let total = n.max(1) as f64;
            self.nodes.push(Node::Leaf {
                distribution: counts.iter().map(|&c| c as f64 / total).collect(),
            });
            return index;
        };

        // Reserve the slot so children get higher indices, then patch it.
        self.nodes.push(Node::Leaf { distribution: Vec::new() });
        let left = self.build(&split.left, depth + 1);
        let right = self.build(&split.right, depth + 1);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TreeParams {
        TreeParams {
            criterion: SplitCriterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 2,
        }
    }

    #[test]
    fn separable_data_is_memorized() {
        let columns = vec![vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0], vec![5.0; 6]];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let samples: Vec<usize> = (0..6).collect();
        let tree = DecisionTree::grow(&columns, &labels, &samples, 2, &params(), 42);
        assert_eq!(tree.predict_proba(&[1.5, 5.0]), &[1.0, 0.0]);
        assert_eq!(tree.predict_proba(&[11.5, 5.0]), &[0.0, 1.0]);
        assert_eq!(tree.n_nodes(), 3);
    }

    #[test]
    fn depth_limit_yields_mixed_leaf() {
        let columns = vec![vec![0.0, 1.0, 2.0, 3.0]];
        let labels = vec![0, 1, 0, 1];
        let samples: Vec<usize> = (0..4).collect();
        let p = TreeParams { max_depth: Some(0), max_features: 1, ..params() };
        let tree = DecisionTree::grow(&columns, &labels, &samples, 2, &p, 42);
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict_proba(&[0.0]), &[0.5, 0.5]);
    }

    #[test]
    fn distribution_has_declared_class_count() {
        let columns = vec![vec![0.0, 1.0]];
        let labels = vec![0, 0];
        let samples = vec![0, 1];
        let p = TreeParams { max_features: 1, ..params() };
        let tree = DecisionTree::grow(&columns, &labels, &samples, 3, &p, 42);
        assert_eq!(tree.predict_proba(&[0.5]).len(), 3);
    }
}
