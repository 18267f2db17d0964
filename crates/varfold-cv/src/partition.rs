//! Fold assignment and per-fold train/test views.
//!
//! Two modes are supported. [`FoldMode::Grouped`] reads a pre-assigned
//! integer fold-id from a named attribute and hides that attribute from the
//! classifier. [`FoldMode::Stratified`] shuffles record positions with a
//! seeded generator, stable-sorts them by class, and deals them round-robin
//! over the folds, so fold sizes differ by at most one and every class is
//! spread as evenly as the counts allow.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, instrument};

use varfold_data::{AttributeHandle, Dataset, DatasetView};

use crate::error::CvError;

/// How records are assigned to folds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FoldMode {
    /// Use the integer fold-id stored in the named attribute.
    Grouped {
        /// Name of the fold-id attribute.
        column: String,
    },
    /// Seeded, class-stratified assignment.
    Stratified,
}

impl FoldMode {
    /// Group-aware mode over the named fold-id attribute.
    #[must_use]
    pub fn grouped(column: impl Into<String>) -> Self {
        FoldMode::Grouped {
            column: column.into(),
        }
    }
}

impl std::fmt::Display for FoldMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FoldMode::Grouped { column } => write!(f, "grouped by \"{column}\""),
            FoldMode::Stratified => f.write_str("stratified"),
        }
    }
}

/// The train and test views of one fold.
#[derive(Debug, Clone)]
pub struct Fold<'a> {
    /// Zero-based fold index.
    pub index: usize,
    /// Every record not in this fold.
    pub train: DatasetView<'a>,
    /// The records of this fold, in dataset order.
    pub test: DatasetView<'a>,
}

/// Fold assignments for one dataset.
#[derive(Debug, Clone)]
pub struct FoldPartitioner<'a> {
    dataset: &'a Dataset,
    n_folds: usize,
    assignments: Vec<usize>,
    hidden: Option<AttributeHandle>,
}

impl<'a> FoldPartitioner<'a> {
    /// Assign every record of `dataset` to one of `n_folds` folds.
    ///
    /// `seed` only matters for [`FoldMode::Stratified`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CvError::InvalidFoldCount`] | `n_folds` < 2 |
    /// | [`CvError::Schema`] | Fold attribute unknown or not integer-valued; label missing for stratification |
    /// | [`CvError::MissingFoldId`] | A record has no fold-id |
    /// | [`CvError::FoldIdOutOfRange`] | A fold-id is outside `0..n_folds` |
    #[instrument(skip_all, fields(dataset = dataset.name(), n_folds = n_folds, mode = %mode))]
    pub fn new(
        dataset: &'a Dataset,
        n_folds: usize,
        mode: &FoldMode,
        seed: u64,
    ) -> Result<Self, CvError> {
        if n_folds < 2 {
            return Err(CvError::InvalidFoldCount { n_folds });
        }
        let (assignments, hidden) = match mode {
            FoldMode::Grouped { column } => {
                let handle = dataset.require_attribute(column)?;
                (grouped(dataset, handle, column, n_folds)?, Some(handle))
            }
            FoldMode::Stratified => (stratified(&dataset.labels()?, n_folds, seed), None),
        };
        debug!(n_records = assignments.len(), "folds assigned");
        Ok(Self {
            dataset,
            n_folds,
            assignments,
            hidden,
        })
    }

    /// Return the number of folds.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Return the fold index of every record, in dataset order.
    #[must_use]
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    /// Return the number of test records in each fold.
    #[must_use]
    pub fn fold_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_folds];
        for &fold in &self.assignments {
            sizes[fold] += 1;
        }
        sizes
    }

    /// Build the train/test views for fold `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CvError::FoldIndexOutOfRange`] if `index >= n_folds`.
    pub fn fold(&self, index: usize) -> Result<Fold<'a>, CvError> {
        if index >= self.n_folds {
            return Err(CvError::FoldIndexOutOfRange {
                fold: index,
                n_folds: self.n_folds,
            });
        }
        let (test, train): (Vec<usize>, Vec<usize>) =
            (0..self.assignments.len()).partition(|&i| self.assignments[i] == index);
        let mut train = self.dataset.view(train);
        let mut test = self.dataset.view(test);
        if let Some(handle) = self.hidden {
            train = train.with_hidden(handle);
            test = test.with_hidden(handle);
        }
        Ok(Fold { index, train, test })
    }
}

/// Build the views of one fold directly.
///
/// # Errors
///
/// Same as [`FoldPartitioner::new`] and [`FoldPartitioner::fold`].
pub fn for_fold<'a>(
    dataset: &'a Dataset,
    fold_index: usize,
    n_folds: usize,
    mode: &FoldMode,
    seed: u64,
) -> Result<Fold<'a>, CvError> {
    FoldPartitioner::new(dataset, n_folds, mode, seed)?.fold(fold_index)
}

fn grouped(
    dataset: &Dataset,
    handle: AttributeHandle,
    column: &str,
    n_folds: usize,
) -> Result<Vec<usize>, CvError> {
    dataset
        .integer_values(handle)?
        .into_iter()
        .enumerate()
        .map(|(record, value)| {
            let fold_id = value.ok_or_else(|| CvError::MissingFoldId {
                attribute: column.to_string(),
                record,
            })?;
            usize::try_from(fold_id)
                .ok()
                .filter(|&f| f < n_folds)
                .ok_or_else(|| CvError::FoldIdOutOfRange {
                    attribute: column.to_string(),
                    record,
                    fold_id,
                    n_folds,
                })
        })
        .collect()
}

fn stratified(labels: &[usize], n_folds: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.shuffle(&mut rng);
    order.sort_by_key(|&i| labels[i]);

    let mut assignments = vec![0; labels.len()];
    for (position, &record) in order.iter().enumerate() {
        assignments[record] = position % n_folds;
    }
    assignments
}
