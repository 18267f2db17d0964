//! Random Forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, instrument};

use crate::config::RandomForestConfig;
use crate::error::ForestError;
use crate::tree::{DecisionTree, TreeParams};

/// A fitted Random Forest ensemble.
#[derive(Debug, Clone)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

/// Check shape, finiteness, and label range of a training set.
pub(crate) fn validate(
    features: &[Vec<f64>],
    labels: &[usize],
    n_classes: usize,
) -> Result<usize, ForestError> {
    if features.is_empty() {
        return Err(ForestError::EmptyDataset);
    }
    if labels.len() != features.len() {
        return Err(ForestError::LabelCountMismatch {
            n_features_rows: features.len(),
            n_labels: labels.len(),
        });
    }
    let n_features = features[0].len();
    if n_features == 0 {
        return Err(ForestError::ZeroFeatures);
    }
    for (sample_index, (row, &label)) in features.iter().zip(labels).enumerate() {
        if row.len() != n_features {
            return Err(ForestError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(ForestError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
        if label >= n_classes {
            return Err(ForestError::LabelOutOfRange {
                sample_index,
                label,
                n_classes,
            });
        }
    }
    Ok(n_features)
}

/// Train the Random Forest ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    n_classes: usize,
) -> Result<RandomForest, ForestError> {
    let n_features = validate(features, labels, n_classes)?;
    if config.max_depth == Some(0) {
        return Err(ForestError::InvalidMaxDepth { max_depth: 0 });
    }
    if config.min_samples_split < 2 {
        return Err(ForestError::InvalidMinSamplesSplit {
            min_samples_split: config.min_samples_split,
        });
    }

    let params = TreeParams {
        criterion: config.criterion,
        max_depth: config.max_depth,
        min_samples_split: config.min_samples_split,
        min_samples_leaf: config.min_samples_leaf,
        max_features: config.max_features.resolve(n_features)?,
    };
    let n_samples = features.len();

    // Column-major copy shared by all trees.
    let columns: Vec<Vec<f64>> = (0..n_features)
        .map(|f| features.iter().map(|row| row[f]).collect())
        .collect();

    // Per-tree seeds come from one master generator so the ensemble does not
    // depend on rayon's scheduling.
    let mut master = ChaCha8Rng::seed_from_u64(config.seed);
    let seeds: Vec<u64> = (0..config.n_trees).map(|_| master.r#gen()).collect();

    let trees: Vec<DecisionTree> = seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let bootstrap: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
            DecisionTree::grow(&columns, labels, &bootstrap, n_classes, &params, rng.r#gen())
        })
        .collect();

    debug!(
        n_trees = trees.len(),
        n_features,
        n_classes,
        max_features = params.max_features,
        "random forest trained"
    );

    Ok(RandomForest {
        trees,
        n_features,
        n_classes,
    })
}
