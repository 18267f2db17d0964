//! Cross-validation over a fold partition with a fresh classifier per fold.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{info, instrument, warn};

use varfold_data::Dataset;

use crate::classifier::Classifier;
use crate::collector::{Prediction, PredictionCollector, PredictionTable};
use crate::error::{CvError, Stage};
use crate::metrics::{AggregateMetrics, FoldMetrics, MetricsAccumulator, RunSetup};
use crate::partition::{FoldMode, FoldPartitioner};

/// Cross-validation configuration.
///
/// Construct via [`CrossValidation::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter  | Default      |
/// |------------|--------------|
/// | `seed`     | 42           |
/// | `mode`     | `Stratified` |
/// | `parallel` | `false`      |
#[derive(Debug, Clone)]
pub struct CrossValidation {
    n_folds: usize,
    seed: u64,
    mode: FoldMode,
    parallel: bool,
}

/// Output of a cross-validation run.
#[derive(Debug, Clone)]
pub struct CrossValidationResult {
    /// Held-out predictions, one per input record, in fold order.
    pub predictions: PredictionTable,
    /// Counts and rates summed over folds.
    pub metrics: AggregateMetrics,
}

struct FoldOutcome {
    predictions: Vec<Prediction>,
    metrics: FoldMetrics,
}

impl CrossValidation {
    /// Create a config with `n_folds` folds.
    ///
    /// # Errors
    ///
    /// Returns [`CvError::InvalidFoldCount`] if `n_folds` < 2.
    pub fn new(n_folds: usize) -> Result<Self, CvError> {
        if n_folds < 2 {
            return Err(CvError::InvalidFoldCount { n_folds });
        }
        Ok(Self {
            n_folds,
            seed: 42,
            mode: FoldMode::Stratified,
            parallel: false,
        })
    }

    /// Set the seed for stratified fold assignment.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the fold assignment mode.
    #[must_use]
    pub fn with_mode(mut self, mode: FoldMode) -> Self {
        self.mode = mode;
        self
    }

    /// Run folds on the rayon pool instead of one after another.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Return the number of folds.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Return the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the fold mode.
    #[must_use]
    pub fn mode(&self) -> &FoldMode {
        &self.mode
    }

    /// Cross-validate the classifiers built by `factory` on `dataset`.
    ///
    /// `factory(k)` must return the classifier for fold `k`, configured
    /// independently of every other fold. It is also called once with `0`
    /// before any training to read the classifier's name and options, so it
    /// runs `n_folds + 1` times and must not assume one call per fold.
    ///
    /// Each fold trains on its train view and predicts its test view; folds
    /// with an empty test view are skipped.
    /// Results are merged in fold order whether or not folds run in parallel.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CvError::EmptyDataset`] | `dataset` has no records |
    /// | [`CvError::Schema`] | Missing label column, unlabeled record, bad fold column |
    /// | [`CvError::MissingFoldId`] / [`CvError::FoldIdOutOfRange`] | Bad fold-ids |
    /// | [`CvError::ClassifierTraining`] | A fold's train or predict failed |
    /// | [`CvError::PredictionCountMismatch`] | Wrong number of predictions |
    /// | [`CvError::DistributionLength`] | A distribution does not cover every class |
    /// | [`CvError::PredictedClassOutOfRange`] | A predicted label is not a class |
    #[instrument(skip_all, fields(dataset = dataset.name(), n_folds = self.n_folds, parallel = self.parallel))]
    pub fn run<C, F>(&self, dataset: &Dataset, factory: F) -> Result<CrossValidationResult, CvError>
    where
        C: Classifier,
        F: Fn(usize) -> C + Sync,
    {
        if dataset.is_empty() {
            return Err(CvError::EmptyDataset {
                dataset: dataset.name().to_string(),
            });
        }
        let labels = dataset.labels()?;
        let partitioner = FoldPartitioner::new(dataset, self.n_folds, &self.mode, self.seed)?;
        let n_classes = dataset.n_classes();

        let identity = factory(0);
        let setup = RunSetup {
            classifier: identity.name().to_string(),
            options: identity.options(),
            dataset: dataset.name().to_string(),
            n_records: dataset.len(),
            n_folds: self.n_folds,
            seed: self.seed,
            mode: self.mode.clone(),
        };
        drop(identity);

        let run_fold = |fold: usize| self.run_fold(&partitioner, fold, factory(fold), &labels, n_classes);
        let outcomes: Vec<FoldOutcome> = if self.parallel {
            (0..self.n_folds).into_par_iter().map(run_fold).collect::<Result<_, _>>()?
        } else {
            (0..self.n_folds).map(run_fold).collect::<Result<_, _>>()?
        };

        let mut collector = PredictionCollector::new(dataset.class_names().to_vec(), dataset.len());
        let mut accumulator = MetricsAccumulator::new(n_classes);
        for outcome in outcomes {
            collector.append(outcome.predictions);
            accumulator.add(outcome.metrics);
        }
        let predictions = collector.finalize();
        let metrics = accumulator.finish(setup, dataset.class_names().to_vec());

        info!(
            n_predictions = predictions.len(),
            accuracy = metrics.confusion().accuracy(),
            "cross-validation complete"
        );
        Ok(CrossValidationResult {
            predictions,
            metrics,
        })
    }

    fn run_fold<C: Classifier>(
        &self,
        partitioner: &FoldPartitioner<'_>,
        fold: usize,
        classifier: C,
        labels: &[usize],
        n_classes: usize,
    ) -> Result<FoldOutcome, CvError> {
        let views = partitioner.fold(fold)?;
        if views.test.is_empty() {
            warn!(fold = fold + 1, n_folds = self.n_folds, "fold has no test records, skipping");
            return Ok(FoldOutcome {
                predictions: Vec::new(),
                metrics: FoldMetrics::empty(fold, views.train.len(), n_classes),
            });
        }
        info!(
            fold = fold + 1,
            n_folds = self.n_folds,
            n_train = views.train.len(),
            n_test = views.test.len(),
            "training fold"
        );

        let failed = |stage: Stage| {
            move |e: C::Error| CvError::ClassifierTraining {
                fold,
                stage,
                source: Box::new(e),
            }
        };
        let model = classifier.train(&views.train).map_err(failed(Stage::Train))?;
        let raw = classifier
            .predict(&model, &views.test)
            .map_err(failed(Stage::Predict))?;
        if raw.len() != views.test.len() {
            return Err(CvError::PredictionCountMismatch {
                fold,
                expected: views.test.len(),
                got: raw.len(),
            });
        }

        let predictions = views
            .test
            .indices()
            .iter()
            .zip(raw)
            .map(|(&record, p)| {
                if p.distribution.len() != n_classes {
                    return Err(CvError::DistributionLength {
                        fold,
                        record,
                        expected: n_classes,
                        got: p.distribution.len(),
                    });
                }
                if p.label >= n_classes {
                    return Err(CvError::PredictedClassOutOfRange {
                        fold,
                        record,
                        class: p.label,
                        n_classes,
                    });
                }
                Ok(Prediction::new(record, fold, labels[record], p.label, p.distribution))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let metrics = FoldMetrics::from_predictions(fold, views.train.len(), &predictions, n_classes);
        Ok(FoldOutcome {
            predictions,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassPrediction;
    use varfold_data::{Attribute, DatasetView, Record, Schema};

    /// Predicts the training majority class with a fixed distribution.
    struct Majority;

    impl Classifier for Majority {
        type Model = usize;
        type Error = std::io::Error;

        fn name(&self) -> &str {
            "Majority"
        }

        fn options(&self) -> String {
            String::new()
        }

        fn train(&self, data: &DatasetView<'_>) -> Result<usize, std::io::Error> {
            let mut counts = vec![0usize; data.n_classes()];
            for label in data.labels().map_err(std::io::Error::other)? {
                counts[label] += 1;
            }
            Ok((0..counts.len()).max_by_key(|&c| (counts[c], std::cmp::Reverse(c))).unwrap_or(0))
        }

        fn predict(
            &self,
            model: &usize,
            data: &DatasetView<'_>,
        ) -> Result<Vec<ClassPrediction>, std::io::Error> {
            let mut dist = vec![0.0; data.n_classes()];
            dist[*model] = 1.0;
            Ok(vec![ClassPrediction::from_distribution(dist); data.len()])
        }
    }

    fn dataset(n: usize) -> Dataset {
        let schema = Schema::new(vec![
            Attribute::numeric("x"),
            Attribute::nominal("class", vec!["a".into(), "b".into()]),
        ]);
        let records = (0..n)
            .map(|i| Record::new(vec![Some(i as f64), Some(f64::from(u8::from(i % 3 == 0)))]))
            .collect();
        let label = schema.lookup("class");
        Dataset::new("toy", schema, records, label).unwrap()
    }

    #[test]
    fn every_record_predicted_once() {
        let data = dataset(30);
        let result = CrossValidation::new(5).unwrap().run(&data, |_| Majority).unwrap();
        let mut records: Vec<usize> = result.predictions.rows().iter().map(|p| p.record).collect();
        records.sort_unstable();
        assert_eq!(records, (0..30).collect::<Vec<_>>());
        assert_eq!(result.metrics.n_evaluated(), 30);
        assert_eq!(result.metrics.setup().classifier, "Majority");
    }

    #[test]
    fn rows_in_fold_order() {
        let data = dataset(20);
        let result = CrossValidation::new(4).unwrap().run(&data, |_| Majority).unwrap();
        let folds: Vec<usize> = result.predictions.rows().iter().map(|p| p.fold).collect();
        assert!(folds.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn factory_receives_each_fold_index() {
        let data = dataset(20);
        let seen = std::sync::Mutex::new(Vec::new());
        CrossValidation::new(4)
            .unwrap()
            .run(&data, |fold| {
                seen.lock().unwrap().push(fold);
                Majority
            })
            .unwrap();
        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 0, 1, 2, 3]);
    }

    #[test]
    fn empty_dataset_rejected() {
        let data = dataset(0);
        let err = CrossValidation::new(2).unwrap().run(&data, |_| Majority).unwrap_err();
        assert!(matches!(err, CvError::EmptyDataset { .. }));
    }
}
