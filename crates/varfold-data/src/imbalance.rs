//! Down-sampling of the minority class to a fixed count.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{info, instrument};

use crate::DataError;
use crate::dataset::Dataset;

/// Class index treated as the minority class.
pub const MINORITY_CLASS: usize = 0;

/// Builds an imbalanced copy of a labeled dataset.
///
/// Records are visited in a seeded shuffled order. The first
/// `minority_target` records of class [`MINORITY_CLASS`] are kept and the
/// rest of that class dropped; every other record is kept, including
/// unlabeled ones. The result is shuffled again with the same generator so
/// the two classes are interleaved.
#[derive(Debug, Clone)]
pub struct Imbalancer {
    minority_target: usize,
    seed: u64,
}

impl Imbalancer {
    /// Create an imbalancer keeping at most `minority_target` minority records.
    #[must_use]
    pub fn new(minority_target: usize) -> Self {
        Self { minority_target, seed: 42 }
    }

    /// Set the random seed for both shuffles.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the minority target count.
    #[must_use]
    pub fn minority_target(&self) -> usize {
        self.minority_target
    }

    /// Produce the imbalanced dataset.
    ///
    /// The output holds `min(minority_target, minority count)` minority
    /// records and all other records.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NoLabel`] if the dataset has no label column.
    #[instrument(skip_all, fields(minority_target = self.minority_target, n_records = dataset.len()))]
    pub fn apply(&self, dataset: &Dataset) -> Result<Dataset, DataError> {
        if dataset.label().is_none() {
            return Err(DataError::NoLabel {
                dataset: dataset.name().to_string(),
            });
        }
        info!(class_counts = ?dataset.class_counts(), "before imbalancing");

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut order: Vec<usize> = (0..dataset.len()).collect();
        order.shuffle(&mut rng);

        let mut remaining = self.minority_target;
        let mut kept = Vec::with_capacity(dataset.len());
        for index in order {
            if dataset.class_of(index) == Some(MINORITY_CLASS) {
                if remaining > 0 {
                    kept.push(index);
                    remaining -= 1;
                }
            } else {
                kept.push(index);
            }
        }
        kept.shuffle(&mut rng);

        let imbalanced = dataset.select(&kept)?;
        info!(class_counts = ?imbalanced.class_counts(), "after imbalancing");
        Ok(imbalanced)
    }
}

/// Shorthand for `Imbalancer::new(minority_target).with_seed(seed).apply(dataset)`.
///
/// # Errors
///
/// See [`Imbalancer::apply`].
pub fn imbalance(dataset: &Dataset, minority_target: usize, seed: u64) -> Result<Dataset, DataError> {
    Imbalancer::new(minority_target).with_seed(seed).apply(dataset)
}
