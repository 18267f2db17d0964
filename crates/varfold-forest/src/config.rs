//! Configuration builder for Random Forest training.

use crate::error::ForestError;
use crate::forest::RandomForest;
use crate::split::SplitCriterion;

/// Strategy for determining the number of features to consider at each split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    /// Square root of total features.
    Sqrt,
    /// `log2(n_features) + 1`, the usual choice for Weka-style forests.
    Log2Plus1,
    /// A fraction of total features (must be in (0.0, 1.0]).
    Fraction(f64),
    /// A fixed count.
    Fixed(usize),
    /// All features (no subsampling).
    All,
}

impl MaxFeatures {
    /// Resolve to a concrete count for `n_features` columns.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidMaxFeatures`] if the count falls outside `[1, n_features]`.
    pub fn resolve(self, n_features: usize) -> Result<usize, ForestError> {
        let n = n_features as f64;
        let resolved = match self {
            MaxFeatures::Sqrt => n.sqrt().ceil() as usize,
            MaxFeatures::Log2Plus1 => (n.log2().floor() as usize + 1).min(n_features),
            MaxFeatures::Fraction(f) => (n * f).ceil() as usize,
            MaxFeatures::Fixed(k) => k,
            MaxFeatures::All => n_features,
        };
        if resolved == 0 || resolved > n_features {
            return Err(ForestError::InvalidMaxFeatures {
                max_features: resolved,
                n_features,
            });
        }
        Ok(resolved)
    }
}

/// Configuration for Random Forest training.
///
/// Construct via [`RandomForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter            | Default      |
/// |----------------------|--------------|
/// | `max_features`       | `Log2Plus1`  |
/// | `max_depth`          | `None`       |
/// | `min_samples_split`  | 2            |
/// | `min_samples_leaf`   | 1            |
/// | `criterion`          | `Gini`       |
/// | `seed`               | 42           |
#[derive(Debug, Clone)]
pub struct RandomForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) seed: u64,
}

impl RandomForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, ForestError> {
        if n_trees == 0 {
            return Err(ForestError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_features: MaxFeatures::Log2Plus1,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: SplitCriterion::Gini,
            seed: 42,
        })
    }

    /// Set the max features strategy.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the maximum tree depth. `None` means unlimited.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of samples required in each leaf after a split.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf.max(1);
        self
    }

    /// Set the split quality criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the max features strategy.
    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    /// Return the maximum depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the split criterion.
    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train a Random Forest.
    ///
    /// `features[sample][feature]` is row-major; `labels[sample]` is a class
    /// index below `n_classes`. Every prediction of the fitted forest has
    /// exactly `n_classes` probabilities, even when some class is absent
    /// from the training data.
    ///
    /// # Errors
    ///
    /// | Variant                                | When                                             |
    /// |----------------------------------------|--------------------------------------------------|
    /// | [`ForestError::EmptyDataset`]          | `features` is empty                              |
    /// | [`ForestError::ZeroFeatures`]          | rows have zero feature columns                   |
    /// | [`ForestError::LabelCountMismatch`]    | `labels.len() != features.len()`                 |
    /// | [`ForestError::LabelOutOfRange`]       | a label is `>= n_classes`                        |
    /// | [`ForestError::FeatureCountMismatch`]  | rows have inconsistent lengths                   |
    /// | [`ForestError::NonFiniteValue`]        | any value is NaN or infinite                     |
    /// | [`ForestError::InvalidMaxFeatures`]    | resolved max_features is outside [1, n_features] |
    /// | [`ForestError::InvalidMaxDepth`]       | `max_depth` is `Some(0)`                         |
    /// | [`ForestError::InvalidMinSamplesSplit`]| `min_samples_split` < 2                          |
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
    ) -> Result<RandomForest, ForestError> {
        crate::forest::train(self, features, labels, n_classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_trees_rejected() {
        assert!(matches!(
            RandomForestConfig::new(0),
            Err(ForestError::InvalidTreeCount { n_trees: 0 })
        ));
    }

    #[test]
    fn resolve_max_features() {
        assert_eq!(MaxFeatures::Sqrt.resolve(20).unwrap(), 5);
        assert_eq!(MaxFeatures::Log2Plus1.resolve(20).unwrap(), 5);
        assert_eq!(MaxFeatures::Log2Plus1.resolve(1).unwrap(), 1);
        assert_eq!(MaxFeatures::All.resolve(7).unwrap(), 7);
        assert_eq!(MaxFeatures::Fraction(0.5).resolve(7).unwrap(), 4);
        assert!(MaxFeatures::Fixed(9).resolve(7).is_err());
        assert!(MaxFeatures::Fixed(0).resolve(7).is_err());
    }

    #[test]
    fn builder_sets_fields() {
        let config = RandomForestConfig::new(10)
            .unwrap()
            .with_seed(7)
            .with_max_depth(Some(4))
            .with_criterion(SplitCriterion::Entropy);
        assert_eq!(config.n_trees(), 10);
        assert_eq!(config.seed(), 7);
        assert_eq!(config.max_depth(), Some(4));
        assert_eq!(config.criterion(), SplitCriterion::Entropy);
    }
}
