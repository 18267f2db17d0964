//! [`Classifier`] adapters for the tree ensembles of `varfold-forest`.

use varfold_data::{DataError, DatasetView};
use varfold_forest::{ForestError, RandomForest, RandomForestConfig, ResamplingConfig, ResamplingForest};

use crate::classifier::{ClassPrediction, Classifier, ClassifierOptions};

/// Failure of a tree-ensemble adapter.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The view's labels could not be read.
    #[error(transparent)]
    Data(#[from] DataError),
    /// The ensemble rejected its input or configuration.
    #[error(transparent)]
    Forest(#[from] ForestError),
}

/// Replaces missing feature values with training-column means.
#[derive(Debug, Clone)]
pub struct Imputer {
    means: Vec<f64>,
}

impl Imputer {
    /// Learn column means from rows with missing cells. A column with no
    /// values at all imputes 0.0.
    #[must_use]
    pub fn fit(rows: &[Vec<Option<f64>>]) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let mut sums = vec![0.0; width];
        let mut counts = vec![0usize; width];
        for row in rows {
            for (j, value) in row.iter().enumerate() {
                if let Some(v) = value {
                    sums[j] += v;
                    counts[j] += 1;
                }
            }
        }
        let means = sums
            .iter()
            .zip(&counts)
            .map(|(&s, &c)| if c == 0 { 0.0 } else { s / c as f64 })
            .collect();
        Self { means }
    }

    /// Fill the missing cells of `rows`.
    #[must_use]
    pub fn transform(&self, rows: Vec<Vec<Option<f64>>>) -> Vec<Vec<f64>> {
        rows.into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&self.means)
                    .map(|(value, &mean)| value.unwrap_or(mean))
                    .collect()
            })
            .collect()
    }
}

fn training_matrix(data: &DatasetView<'_>) -> Result<(Imputer, Vec<Vec<f64>>, Vec<usize>), ModelError> {
    let raw = data.features();
    let imputer = Imputer::fit(&raw);
    let features = imputer.transform(raw);
    Ok((imputer, features, data.labels()?))
}

/// A fitted Random Forest with its imputer.
#[derive(Debug, Clone)]
pub struct FittedForest {
    forest: RandomForest,
    imputer: Imputer,
}

/// Plain Random Forest of `n_learners` trees.
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    options: ClassifierOptions,
}

impl RandomForestClassifier {
    /// Create a classifier from shared options. Only `n_learners` and
    /// `seed` affect training.
    #[must_use]
    pub fn new(options: ClassifierOptions) -> Self {
        Self { options }
    }

    /// The classifier for fold `fold`, seeded `seed + fold`.
    #[must_use]
    pub fn for_fold(&self, fold: usize) -> Self {
        Self::new(self.options.for_fold(fold))
    }
}

impl Classifier for RandomForestClassifier {
    type Model = FittedForest;
    type Error = ModelError;

    fn name(&self) -> &str {
        "RandomForest"
    }

    fn options(&self) -> String {
        format!("trees={} seed={}", self.options.n_learners(), self.options.seed())
    }

    fn train(&self, data: &DatasetView<'_>) -> Result<FittedForest, ModelError> {
        let (imputer, features, labels) = training_matrix(data)?;
        let forest = RandomForestConfig::new(self.options.n_learners())?
            .with_seed(self.options.seed())
            .fit(&features, &labels, data.n_classes())?;
        Ok(FittedForest { forest, imputer })
    }

    fn predict(
        &self,
        model: &FittedForest,
        data: &DatasetView<'_>,
    ) -> Result<Vec<ClassPrediction>, ModelError> {
        let features = model.imputer.transform(data.features());
        Ok(model
            .forest
            .predict_proba_batch(&features)?
            .into_iter()
            .map(|d| ClassPrediction::from_distribution(d.into_vec()))
            .collect())
    }
}

/// A fitted resampling ensemble with its imputer.
#[derive(Debug, Clone)]
pub struct FittedResampling {
    ensemble: ResamplingForest,
    imputer: Imputer,
}

/// Partitioned, over-sampled forest ensemble for imbalanced data.
///
/// `iterations` majority partitions, `n_learners` trees per partition,
/// minority over-sampled by `oversample_percent`, trained on a dedicated
/// pool of `workers` threads. The minority is class 0.
#[derive(Debug, Clone)]
pub struct ResamplingClassifier {
    options: ClassifierOptions,
}

impl ResamplingClassifier {
    /// Create a classifier from shared options.
    #[must_use]
    pub fn new(options: ClassifierOptions) -> Self {
        Self { options }
    }

    /// The classifier for fold `fold`, seeded `seed + fold`.
    #[must_use]
    pub fn for_fold(&self, fold: usize) -> Self {
        Self::new(self.options.for_fold(fold))
    }

    fn config(&self) -> Result<ResamplingConfig, ForestError> {
        let forest = RandomForestConfig::new(self.options.n_learners())?;
        Ok(ResamplingConfig::new(self.options.iterations(), forest)?
            .with_minority_class(varfold_data::MINORITY_CLASS)
            .with_oversample_percent(self.options.oversample_percent())
            .with_workers(self.options.workers())
            .with_seed(self.options.seed()))
    }
}

impl Classifier for ResamplingClassifier {
    type Model = FittedResampling;
    type Error = ModelError;

    fn name(&self) -> &str {
        "ResamplingForest"
    }

    fn options(&self) -> String {
        self.options.to_string()
    }

    fn train(&self, data: &DatasetView<'_>) -> Result<FittedResampling, ModelError> {
        let (imputer, features, labels) = training_matrix(data)?;
        let ensemble = self.config()?.fit(&features, &labels, data.n_classes())?;
        Ok(FittedResampling { ensemble, imputer })
    }

    fn predict(
        &self,
        model: &FittedResampling,
        data: &DatasetView<'_>,
    ) -> Result<Vec<ClassPrediction>, ModelError> {
        let features = model.imputer.transform(data.features());
        Ok(model
            .ensemble
            .predict_proba_batch(&features)?
            .into_iter()
            .map(|d| ClassPrediction::from_distribution(d.into_vec()))
            .collect())
    }
}
