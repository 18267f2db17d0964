//! Accuracy regression tests for varfold-forest.
//!
//! Guards against algorithmic changes that degrade classification quality
//! on deterministic synthetic data, balanced and imbalanced.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use varfold_forest::{MaxFeatures, RandomForestConfig, ResamplingConfig};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// 300 samples, 10 features, 3 classes. Features 0-2 are informative.
fn make_classification() -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut features = Vec::with_capacity(300);
    let mut labels = Vec::with_capacity(300);
    for i in 0..300 {
        let class = i % 3;
        labels.push(class);
        features.push(
            (0..10)
                .map(|f| {
                    let base = if f < 3 { class as f64 * 3.0 } else { 0.0 };
                    base + rng.r#gen::<f64>() * 0.5
                })
                .collect(),
        );
    }
    (features, labels)
}

/// 40 minority samples (class 0) and 400 majority samples (class 1).
/// The minority class lives in a shifted region of features 0 and 1.
fn make_imbalanced(seed: u64) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::new();
    let mut labels = Vec::new();
    for i in 0..440 {
        let class = usize::from(i >= 40);
        let shift = if class == 0 { 2.0 } else { 0.0 };
        features.push(vec![
            shift + rng.r#gen::<f64>(),
            shift + rng.r#gen::<f64>(),
            rng.r#gen::<f64>(),
            rng.r#gen::<f64>(),
        ]);
        labels.push(class);
    }
    (features, labels)
}

fn accuracy(predicted: &[usize], actual: &[usize]) -> f64 {
    let correct = predicted.iter().zip(actual).filter(|(p, a)| p == a).count();
    correct as f64 / actual.len() as f64
}

// ---------------------------------------------------------------------------
// Random forest
// ---------------------------------------------------------------------------

/// Held-out accuracy on the 3-class problem must exceed 0.9.
#[test]
fn forest_holdout_accuracy() {
    let (features, labels) = make_classification();
    let (train_x, test_x) = features.split_at(240);
    let (train_y, test_y) = labels.split_at(240);

    let forest = RandomForestConfig::new(50)
        .unwrap()
        .with_seed(42)
        .fit(train_x, train_y, 3)
        .unwrap();
    let predicted = forest.predict_batch(test_x).unwrap();
    let acc = accuracy(&predicted, test_y);
    assert!(acc > 0.9, "holdout accuracy {acc} <= 0.9");
}

/// Distributions are proper probability vectors.
#[test]
fn forest_distributions_sum_to_one() {
    let (features, labels) = make_classification();
    let forest = RandomForestConfig::new(20)
        .unwrap()
        .with_max_features(MaxFeatures::Sqrt)
        .fit(&features, &labels, 3)
        .unwrap();
    for dist in forest.predict_proba_batch(&features).unwrap() {
        let sum: f64 = dist.as_slice().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "distribution sums to {sum}");
        assert!(dist.as_slice().iter().all(|p| (0.0..=1.0).contains(p)));
    }
}

// ---------------------------------------------------------------------------
// Resampling ensemble
// ---------------------------------------------------------------------------

/// The resampling ensemble recalls most of the minority class on unseen data.
#[test]
fn resampling_minority_recall() {
    let (train_x, train_y) = make_imbalanced(1);
    let (test_x, test_y) = make_imbalanced(2);

    let model = ResamplingConfig::new(5, RandomForestConfig::new(10).unwrap())
        .unwrap()
        .with_oversample_percent(200.0)
        .with_seed(42)
        .fit(&train_x, &train_y, 2)
        .unwrap();

    let dists = model.predict_proba_batch(&test_x).unwrap();
    let minority_hits = dists
        .iter()
        .zip(&test_y)
        .filter(|(d, y)| **y == 0 && d.predicted_class() == 0)
        .count();
    let recall = minority_hits as f64 / 40.0;
    assert!(recall > 0.8, "minority recall {recall} <= 0.8");
    assert_eq!(model.n_members(), 5);
}

/// Oversampling does not change the number of members or distribution width.
#[test]
fn resampling_without_oversampling() {
    let (features, labels) = make_imbalanced(3);
    let model = ResamplingConfig::new(2, RandomForestConfig::new(10).unwrap())
        .unwrap()
        .with_oversample_percent(0.0)
        .fit(&features, &labels, 2)
        .unwrap();
    assert_eq!(model.n_members(), 2);
    let dist = model.predict_proba(&features[0]).unwrap();
    assert_eq!(dist.as_slice().len(), 2);
}
