//! End-to-end cross-validation properties: coverage, disjointness,
//! determinism, metric consistency, and failure handling.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use varfold_cv::{
    ClassPrediction, Classifier, ClassifierOptions, CrossValidation, CvError, FoldMode,
    FoldPartitioner, MetricsReporter, RandomForestClassifier, ResamplingClassifier, Stage,
};
use varfold_data::{Attribute, Dataset, DatasetView, Record, Schema, SyntheticConfig, imbalance};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// 100 records, 10 per fold-id 0..10, binary label driven by feature `x`.
fn grouped_dataset() -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let schema = Schema::new(vec![
        Attribute::numeric("x"),
        Attribute::numeric("noise"),
        Attribute::integer("fold"),
        Attribute::nominal("label", vec!["pathogenic".into(), "benign".into()]),
    ]);
    let records = (0..100)
        .map(|i| {
            let class = usize::from(i % 4 != 0);
            Record::new(vec![
                Some(class as f64 * 2.0 + rng.r#gen::<f64>()),
                Some(rng.r#gen::<f64>()),
                Some((i / 10) as f64),
                Some(class as f64),
            ])
        })
        .collect();
    let label = schema.lookup("label");
    Dataset::new("variants", schema, records, label).unwrap()
}

fn rf_options() -> ClassifierOptions {
    ClassifierOptions::new(1, 10).unwrap().with_seed(7)
}

/// Records how often it was trained and predicts class 1 everywhere.
struct Counting<'a> {
    trained: &'a AtomicUsize,
}

impl Classifier for Counting<'_> {
    type Model = ();
    type Error = std::io::Error;

    fn name(&self) -> &str {
        "Counting"
    }

    fn options(&self) -> String {
        String::new()
    }

    fn train(&self, _data: &DatasetView<'_>) -> Result<(), std::io::Error> {
        self.trained.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn predict(&self, _model: &(), data: &DatasetView<'_>) -> Result<Vec<ClassPrediction>, std::io::Error> {
        Ok(vec![ClassPrediction::from_distribution(vec![0.0, 1.0]); data.len()])
    }
}

/// Fails to train in one chosen fold.
struct FailsIn {
    fold: usize,
    failing: usize,
}

impl Classifier for FailsIn {
    type Model = ();
    type Error = std::io::Error;

    fn name(&self) -> &str {
        "FailsIn"
    }

    fn options(&self) -> String {
        String::new()
    }

    fn train(&self, _data: &DatasetView<'_>) -> Result<(), std::io::Error> {
        if self.fold == self.failing {
            Err(std::io::Error::other("diverged"))
        } else {
            Ok(())
        }
    }

    fn predict(&self, _model: &(), data: &DatasetView<'_>) -> Result<Vec<ClassPrediction>, std::io::Error> {
        Ok(vec![ClassPrediction::from_distribution(vec![1.0, 0.0]); data.len()])
    }
}

// ---------------------------------------------------------------------------
// Group-aware runs
// ---------------------------------------------------------------------------

#[test]
fn grouped_ten_fold_covers_every_record_once() {
    let dataset = grouped_dataset();
    let base = RandomForestClassifier::new(rf_options());
    let result = CrossValidation::new(10)
        .unwrap()
        .with_mode(FoldMode::grouped("fold"))
        .run(&dataset, |fold| base.for_fold(fold))
        .unwrap();

    assert_eq!(result.predictions.len(), 100);
    let mut records: Vec<usize> = result.predictions.rows().iter().map(|p| p.record).collect();
    records.sort_unstable();
    assert_eq!(records, (0..100).collect::<Vec<_>>());
    assert_eq!(result.metrics.confusion().total(), 100);

    for p in result.predictions.rows() {
        assert_eq!(p.fold, p.record / 10, "record {} held out in wrong fold", p.record);
        assert_eq!(p.distribution.len(), 2);
        assert_eq!(p.misclassified, p.actual != p.predicted);
    }
}

#[test]
fn train_and_test_views_are_disjoint_and_complete() {
    let dataset = grouped_dataset();
    for mode in [FoldMode::grouped("fold"), FoldMode::Stratified] {
        let partitioner = FoldPartitioner::new(&dataset, 10, &mode, 3).unwrap();
        let mut seen = vec![0usize; dataset.len()];
        for k in 0..10 {
            let fold = partitioner.fold(k).unwrap();
            assert!(fold.test.indices().iter().all(|i| !fold.train.indices().contains(i)));
            assert_eq!(fold.train.len() + fold.test.len(), dataset.len());
            for &i in fold.test.indices() {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&n| n == 1), "mode {mode}: coverage {seen:?}");
    }
}

#[test]
fn summed_counts_match_prediction_table() {
    let dataset = grouped_dataset();
    let base = RandomForestClassifier::new(rf_options());
    let result = CrossValidation::new(10)
        .unwrap()
        .with_mode(FoldMode::grouped("fold"))
        .run(&dataset, |fold| base.for_fold(fold))
        .unwrap();
    assert_eq!(*result.metrics.confusion(), result.predictions.confusion());

    let report = MetricsReporter::summarize(&result.metrics);
    assert_eq!(report.summary.incorrect, result.predictions.n_misclassified());
    assert_eq!(report.setup.n_folds, 10);
    assert_eq!(report.setup.dataset, "variants");
    assert!(report.summary.accuracy > 0.9, "accuracy {}", report.summary.accuracy);
}

#[test]
fn more_folds_than_groups_skips_empty_folds() {
    let dataset = grouped_dataset();
    let trained = AtomicUsize::new(0);
    let result = CrossValidation::new(12)
        .unwrap()
        .with_mode(FoldMode::grouped("fold"))
        .run(&dataset, |_| Counting { trained: &trained })
        .unwrap();
    assert_eq!(trained.load(Ordering::SeqCst), 10);
    assert_eq!(result.predictions.len(), 100);
    assert_eq!(result.metrics.n_empty_folds(), 2);
    assert_eq!(result.metrics.folds().len(), 12);
}

#[test]
fn missing_fold_column_fails_before_training() {
    let dataset = grouped_dataset();
    let trained = AtomicUsize::new(0);
    let err = CrossValidation::new(10)
        .unwrap()
        .with_mode(FoldMode::grouped("group"))
        .run(&dataset, |_| Counting { trained: &trained })
        .unwrap_err();
    assert!(err.is_schema_error(), "{err}");
    assert_eq!(trained.load(Ordering::SeqCst), 0);
}

#[test]
fn fold_ids_beyond_fold_count_fail_before_training() {
    let dataset = grouped_dataset();
    let trained = AtomicUsize::new(0);
    let err = CrossValidation::new(5)
        .unwrap()
        .with_mode(FoldMode::grouped("fold"))
        .run(&dataset, |_| Counting { trained: &trained })
        .unwrap_err();
    assert!(matches!(err, CvError::FoldIdOutOfRange { fold_id: 5, n_folds: 5, .. }));
    assert_eq!(trained.load(Ordering::SeqCst), 0);
}

#[test]
fn failing_fold_aborts_run() {
    let dataset = grouped_dataset();
    for parallel in [false, true] {
        let err = CrossValidation::new(10)
            .unwrap()
            .with_mode(FoldMode::grouped("fold"))
            .with_parallel(parallel)
            .run(&dataset, |fold| FailsIn { fold, failing: 6 })
            .unwrap_err();
        match err {
            CvError::ClassifierTraining { fold, stage, source } => {
                assert_eq!(fold, 6);
                assert_eq!(stage, Stage::Train);
                assert_eq!(source.to_string(), "diverged");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Determinism and parallelism
// ---------------------------------------------------------------------------

#[test]
fn same_seed_same_predictions() {
    let dataset = grouped_dataset();
    let base = RandomForestClassifier::new(rf_options());
    let run = || {
        CrossValidation::new(5)
            .unwrap()
            .with_seed(11)
            .run(&dataset, |fold| base.for_fold(fold))
            .unwrap()
    };
    let a = run();
    let b = run();
    assert_eq!(a.predictions.rows(), b.predictions.rows());
    assert_eq!(
        MetricsReporter::summarize(&a.metrics).to_string(),
        MetricsReporter::summarize(&b.metrics).to_string()
    );
}

#[test]
fn parallel_matches_sequential() {
    let dataset = grouped_dataset();
    let base = RandomForestClassifier::new(rf_options());
    let cv = CrossValidation::new(10).unwrap().with_mode(FoldMode::grouped("fold"));
    let sequential = cv.run(&dataset, |fold| base.for_fold(fold)).unwrap();
    let parallel = cv
        .clone()
        .with_parallel(true)
        .run(&dataset, |fold| base.for_fold(fold))
        .unwrap();
    assert_eq!(sequential.predictions.rows(), parallel.predictions.rows());
    assert_eq!(sequential.metrics.confusion(), parallel.metrics.confusion());
}

// ---------------------------------------------------------------------------
// Synthetic scenario
// ---------------------------------------------------------------------------

#[test]
fn synthetic_imbalanced_stratified_run() {
    let generated = SyntheticConfig::new(2000, 5).unwrap().with_seed(5).generate().unwrap();
    let minority_before = generated.class_counts()[0];
    let dataset = imbalance(&generated, 50, 5).unwrap();
    assert_eq!(dataset.class_counts()[0], minority_before.min(50));

    let options = ClassifierOptions::new(3, 5)
        .unwrap()
        .with_oversample_percent(200.0)
        .with_seed(5);
    let base = ResamplingClassifier::new(options);
    let result = CrossValidation::new(5)
        .unwrap()
        .with_seed(5)
        .run(&dataset, |fold| base.for_fold(fold))
        .unwrap();

    assert_eq!(result.predictions.len(), dataset.len());
    let report = MetricsReporter::summarize(&result.metrics);
    assert_eq!(report.setup.classifier, "ResamplingForest");
    assert_eq!(report.details[0].support, dataset.class_counts()[0]);
    assert_eq!(report.summary.n_empty_folds, 0);
}
