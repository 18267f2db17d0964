//! Per-fold and aggregated evaluation counts.

use serde::Serialize;

use crate::collector::Prediction;
use crate::confusion::ConfusionMatrix;
use crate::partition::FoldMode;

/// Counts from one fold's held-out predictions.
///
/// Error sums are kept raw so folds can be added together before any rate
/// is computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldMetrics {
    /// Zero-based fold index.
    pub fold: usize,
    /// Number of training records.
    pub n_train: usize,
    /// Number of test records.
    pub n_test: usize,
    /// Confusion counts over the test records.
    pub confusion: ConfusionMatrix,
    /// Sum over records and classes of `|p - y|`.
    pub abs_error_sum: f64,
    /// Sum over records and classes of `(p - y)^2`.
    pub sq_error_sum: f64,
}

impl FoldMetrics {
    /// Counts for a fold with no test records.
    #[must_use]
    pub fn empty(fold: usize, n_train: usize, n_classes: usize) -> Self {
        Self {
            fold,
            n_train,
            n_test: 0,
            confusion: ConfusionMatrix::zeros(n_classes),
            abs_error_sum: 0.0,
            sq_error_sum: 0.0,
        }
    }

    /// Count a fold's predictions. `y` is 1 for the actual class, 0 otherwise.
    #[must_use]
    pub fn from_predictions(
        fold: usize,
        n_train: usize,
        predictions: &[Prediction],
        n_classes: usize,
    ) -> Self {
        let mut metrics = Self::empty(fold, n_train, n_classes);
        metrics.n_test = predictions.len();
        for p in predictions {
            metrics.confusion.record(p.actual, p.predicted);
            for (class, &prob) in p.distribution.iter().enumerate() {
                let target = if class == p.actual { 1.0 } else { 0.0 };
                let err = prob - target;
                metrics.abs_error_sum += err.abs();
                metrics.sq_error_sum += err * err;
            }
        }
        metrics
    }

    /// Return `true` if the fold had no test records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n_test == 0
    }

    /// Accuracy on this fold, `None` when the fold is empty.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        (!self.is_empty()).then(|| self.confusion.accuracy())
    }
}

/// What was evaluated and how.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSetup {
    /// Classifier name.
    pub classifier: String,
    /// Rendered classifier options.
    pub options: String,
    /// Dataset relation name.
    pub dataset: String,
    /// Number of input records.
    pub n_records: usize,
    /// Number of folds.
    pub n_folds: usize,
    /// Base random seed.
    pub seed: u64,
    /// Fold assignment mode.
    pub mode: FoldMode,
}

/// The terminal, read-only metrics of a run.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateMetrics {
    setup: RunSetup,
    class_names: Vec<String>,
    folds: Vec<FoldMetrics>,
    confusion: ConfusionMatrix,
    abs_error_sum: f64,
    sq_error_sum: f64,
}

impl AggregateMetrics {
    /// Return the run setup.
    #[must_use]
    pub fn setup(&self) -> &RunSetup {
        &self.setup
    }

    /// Return the label class names.
    #[must_use]
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    /// Return the per-fold counts in fold order.
    #[must_use]
    pub fn folds(&self) -> &[FoldMetrics] {
        &self.folds
    }

    /// Return the confusion counts summed over folds.
    #[must_use]
    pub fn confusion(&self) -> &ConfusionMatrix {
        &self.confusion
    }

    /// Number of evaluated records.
    #[must_use]
    pub fn n_evaluated(&self) -> usize {
        self.confusion.total()
    }

    /// Mean absolute error of the class probability estimates.
    #[must_use]
    pub fn mean_absolute_error(&self) -> f64 {
        let cells = (self.n_evaluated() * self.class_names.len()) as f64;
        if cells == 0.0 { 0.0 } else { self.abs_error_sum / cells }
    }

    /// Root mean squared error of the class probability estimates.
    #[must_use]
    pub fn root_mean_squared_error(&self) -> f64 {
        let cells = (self.n_evaluated() * self.class_names.len()) as f64;
        if cells == 0.0 { 0.0 } else { (self.sq_error_sum / cells).sqrt() }
    }

    /// Accuracies of the non-empty folds, in fold order.
    #[must_use]
    pub fn fold_accuracies(&self) -> Vec<f64> {
        self.folds.iter().filter_map(FoldMetrics::accuracy).collect()
    }

    /// Mean and population standard deviation of the fold accuracies.
    #[must_use]
    pub fn fold_accuracy_stats(&self) -> (f64, f64) {
        let accs = self.fold_accuracies();
        if accs.is_empty() {
            return (0.0, 0.0);
        }
        let n = accs.len() as f64;
        let mean = accs.iter().sum::<f64>() / n;
        let var = accs.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n;
        (mean, var.sqrt())
    }

    /// Number of folds that had no test records.
    #[must_use]
    pub fn n_empty_folds(&self) -> usize {
        self.folds.iter().filter(|f| f.is_empty()).count()
    }
}

/// Sums fold counts into [`AggregateMetrics`].
#[derive(Debug)]
pub struct MetricsAccumulator {
    folds: Vec<FoldMetrics>,
    confusion: ConfusionMatrix,
    abs_error_sum: f64,
    sq_error_sum: f64,
}

impl MetricsAccumulator {
    /// Start an empty accumulator.
    #[must_use]
    pub fn new(n_classes: usize) -> Self {
        Self {
            folds: Vec::new(),
            confusion: ConfusionMatrix::zeros(n_classes),
            abs_error_sum: 0.0,
            sq_error_sum: 0.0,
        }
    }

    /// Add one fold's counts.
    pub fn add(&mut self, fold: FoldMetrics) {
        self.confusion.merge(&fold.confusion);
        self.abs_error_sum += fold.abs_error_sum;
        self.sq_error_sum += fold.sq_error_sum;
        self.folds.push(fold);
    }

    /// Close the accumulator.
    #[must_use]
    pub fn finish(mut self, setup: RunSetup, class_names: Vec<String>) -> AggregateMetrics {
        self.folds.sort_by_key(|f| f.fold);
        AggregateMetrics {
            setup,
            class_names,
            folds: self.folds,
            confusion: self.confusion,
            abs_error_sum: self.abs_error_sum,
            sq_error_sum: self.sq_error_sum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> RunSetup {
        RunSetup {
            classifier: "test".into(),
            options: String::new(),
            dataset: "d".into(),
            n_records: 4,
            n_folds: 3,
            seed: 1,
            mode: FoldMode::Stratified,
        }
    }

    #[test]
    fn fold_error_sums() {
        let preds = vec![
            Prediction::new(0, 0, 0, 0, vec![0.75, 0.25]),
            Prediction::new(1, 0, 1, 0, vec![1.0, 0.0]),
        ];
        let m = FoldMetrics::from_predictions(0, 8, &preds, 2);
        assert_eq!(m.n_test, 2);
        assert!((m.abs_error_sum - 2.5).abs() < 1e-12);
        assert!((m.sq_error_sum - 2.125).abs() < 1e-12);
        assert_eq!(m.accuracy(), Some(0.5));
    }

    #[test]
    fn aggregate_sums_counts_not_rates() {
        let mut acc = MetricsAccumulator::new(2);
        // Fold 0: 1 of 1 correct. Fold 1: 1 of 3 correct.
        acc.add(FoldMetrics::from_predictions(
            1,
            1,
            &[
                Prediction::new(1, 1, 0, 0, vec![1.0, 0.0]),
                Prediction::new(2, 1, 1, 0, vec![1.0, 0.0]),
                Prediction::new(3, 1, 1, 0, vec![1.0, 0.0]),
            ],
            2,
        ));
        acc.add(FoldMetrics::from_predictions(
            0,
            3,
            &[Prediction::new(0, 0, 1, 1, vec![0.0, 1.0])],
            2,
        ));
        acc.add(FoldMetrics::empty(2, 4, 2));
        let agg = acc.finish(setup(), vec!["a".into(), "b".into()]);

        assert!((agg.confusion().accuracy() - 0.5).abs() < 1e-12);
        assert_eq!(agg.n_evaluated(), 4);
        assert_eq!(agg.n_empty_folds(), 1);
        let folds: Vec<usize> = agg.folds().iter().map(|f| f.fold).collect();
        assert_eq!(folds, vec![0, 1, 2]);
        assert_eq!(agg.fold_accuracies(), vec![1.0, 1.0 / 3.0]);
        let (mean, std) = agg.fold_accuracy_stats();
        assert!((mean - 2.0 / 3.0).abs() < 1e-12);
        assert!((std - 1.0 / 3.0).abs() < 1e-12);
        // Two wrong records with error 1 on both classes.
        assert!((agg.mean_absolute_error() - 0.5).abs() < 1e-12);
        assert!((agg.root_mean_squared_error() - 0.5f64.sqrt()).abs() < 1e-12);
    }
}
