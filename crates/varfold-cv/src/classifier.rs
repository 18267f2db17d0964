//! The classifier capability consumed by the cross-validation runner.

use std::fmt;

use varfold_data::DatasetView;

use crate::error::CvError;

/// One held-out prediction: the predicted class and a probability for every
/// label class of the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassPrediction {
    /// Predicted class index.
    pub label: usize,
    /// Class probabilities, indexed by class.
    pub distribution: Vec<f64>,
}

impl ClassPrediction {
    /// Build a prediction from a distribution, picking the most probable
    /// class (lowest index on ties).
    #[must_use]
    pub fn from_distribution(distribution: Vec<f64>) -> Self {
        let label = distribution
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, &p)| if p > best.1 { (i, p) } else { best })
            .0;
        Self { label, distribution }
    }
}

/// A classifier that can be trained on one view and applied to another.
///
/// The runner builds a fresh value per fold through a factory closure, so
/// implementations hold configuration only; fitted state lives in
/// [`Classifier::Model`].
pub trait Classifier {
    /// The fitted model.
    type Model;
    /// The classifier's own failure type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Short identity used in reports.
    fn name(&self) -> &str;

    /// Rendered configuration used in reports.
    fn options(&self) -> String;

    /// Fit a model on the training view.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn train(&self, data: &DatasetView<'_>) -> Result<Self::Model, Self::Error>;

    /// Predict every record of `data`, in view order.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn predict(
        &self,
        model: &Self::Model,
        data: &DatasetView<'_>,
    ) -> Result<Vec<ClassPrediction>, Self::Error>;
}

/// Options for the tree-ensemble classifiers.
///
/// The harness never interprets these; they are handed to classifier
/// constructors and echoed in the report.
///
/// # Defaults
///
/// | Option                | Default |
/// |-----------------------|---------|
/// | `distribution_spread` | 0.0     |
/// | `oversample_percent`  | 0.0     |
/// | `workers`             | 1       |
/// | `seed`                | 42      |
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierOptions {
    iterations: usize,
    n_learners: usize,
    distribution_spread: f64,
    oversample_percent: f64,
    workers: usize,
    seed: u64,
}

impl ClassifierOptions {
    /// Create options with `iterations` resampling rounds of `n_learners`
    /// base learners each.
    ///
    /// # Errors
    ///
    /// Returns [`CvError::InvalidClassifierOption`] if either count is zero.
    pub fn new(iterations: usize, n_learners: usize) -> Result<Self, CvError> {
        if iterations == 0 {
            return Err(CvError::InvalidClassifierOption {
                name: "iterations",
                value: iterations,
            });
        }
        if n_learners == 0 {
            return Err(CvError::InvalidClassifierOption {
                name: "n_learners",
                value: n_learners,
            });
        }
        Ok(Self {
            iterations,
            n_learners,
            distribution_spread: 0.0,
            oversample_percent: 0.0,
            workers: 1,
            seed: 42,
        })
    }

    /// Set the class-distribution spread.
    #[must_use]
    pub fn with_distribution_spread(mut self, spread: f64) -> Self {
        self.distribution_spread = spread;
        self
    }

    /// Set the minority over-sampling percentage.
    #[must_use]
    pub fn with_oversample_percent(mut self, percent: f64) -> Self {
        self.oversample_percent = percent;
        self
    }

    /// Set the number of worker threads used during training.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return a copy seeded for fold `fold`: `seed + fold`, wrapping.
    #[must_use]
    pub fn for_fold(&self, fold: usize) -> Self {
        let mut options = self.clone();
        options.seed = self.seed.wrapping_add(fold as u64);
        options
    }

    /// Number of resampling iterations.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Number of base learners per iteration.
    #[must_use]
    pub fn n_learners(&self) -> usize {
        self.n_learners
    }

    /// Class-distribution spread.
    #[must_use]
    pub fn distribution_spread(&self) -> f64 {
        self.distribution_spread
    }

    /// Over-sampling percentage.
    #[must_use]
    pub fn oversample_percent(&self) -> f64 {
        self.oversample_percent
    }

    /// Worker thread count.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl fmt::Display for ClassifierOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "iterations={} learners={} spread={} oversample={}% workers={} seed={}",
            self.iterations,
            self.n_learners,
            self.distribution_spread,
            self.oversample_percent,
            self.workers,
            self.seed
        )
    }
}
