//! Error types for varfold-cv.

use std::fmt;
use std::path::PathBuf;

use varfold_data::DataError;

/// Which half of a fold's train/predict cycle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Fitting the classifier on the training view.
    Train,
    /// Predicting the held-out test view.
    Predict,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Train => f.write_str("train"),
            Stage::Predict => f.write_str("predict"),
        }
    }
}

/// Errors from fold partitioning, cross-validation runs, and result output.
#[derive(Debug, thiserror::Error)]
pub enum CvError {
    /// Returned when fewer than two folds are requested.
    #[error("n_folds must be at least 2, got {n_folds}")]
    InvalidFoldCount {
        /// The invalid fold count.
        n_folds: usize,
    },

    /// Returned when a fold index past the fold count is requested.
    #[error("fold index {fold} out of range for {n_folds} folds")]
    FoldIndexOutOfRange {
        /// The requested fold.
        fold: usize,
        /// Number of folds.
        n_folds: usize,
    },

    /// Returned when a classifier option is outside its valid range.
    #[error("invalid classifier option {name} = {value}: must be at least 1")]
    InvalidClassifierOption {
        /// Option name.
        name: &'static str,
        /// The rejected value.
        value: usize,
    },

    /// Returned when the dataset to cross-validate has no records.
    #[error("dataset \"{dataset}\" has no records")]
    EmptyDataset {
        /// Dataset name.
        dataset: String,
    },

    /// Returned when the fold-id or label attribute is absent or mistyped.
    #[error("schema error")]
    Schema(#[from] DataError),

    /// Returned when a record has no fold-id.
    #[error("record {record} has no value for fold attribute \"{attribute}\"")]
    MissingFoldId {
        /// Fold attribute name.
        attribute: String,
        /// Record position.
        record: usize,
    },

    /// Returned when a fold-id is outside `0..n_folds`.
    #[error("record {record} has fold id {fold_id} in \"{attribute}\", expected 0..{n_folds}")]
    FoldIdOutOfRange {
        /// Fold attribute name.
        attribute: String,
        /// Record position.
        record: usize,
        /// The offending fold-id.
        fold_id: i64,
        /// Number of folds.
        n_folds: usize,
    },

    /// Returned when a fold's classifier fails to train or predict.
    #[error("classifier failed in fold {fold} during {stage}")]
    ClassifierTraining {
        /// Zero-based fold index.
        fold: usize,
        /// The failing stage.
        stage: Stage,
        /// The classifier's own error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Returned when a classifier returns the wrong number of predictions.
    #[error("fold {fold}: classifier returned {got} predictions for {expected} test records")]
    PredictionCountMismatch {
        /// Zero-based fold index.
        fold: usize,
        /// Number of test records.
        expected: usize,
        /// Number of predictions returned.
        got: usize,
    },

    /// Returned when a class distribution does not cover every class.
    #[error("fold {fold}, record {record}: distribution has {got} entries, expected {expected}")]
    DistributionLength {
        /// Zero-based fold index.
        fold: usize,
        /// Record position.
        record: usize,
        /// Number of label classes.
        expected: usize,
        /// Distribution length returned.
        got: usize,
    },

    /// Returned when a predicted class index is not a declared class.
    #[error("fold {fold}, record {record}: predicted class {class} but only {n_classes} classes exist")]
    PredictedClassOutOfRange {
        /// Zero-based fold index.
        fold: usize,
        /// Record position.
        record: usize,
        /// The predicted class index.
        class: usize,
        /// Number of label classes.
        n_classes: usize,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the prediction CSV cannot be written.
    #[error("cannot write CSV {path}")]
    Csv {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the report cannot be serialized.
    #[error("cannot serialize report")]
    Json(#[from] serde_json::Error),
}

impl CvError {
    /// Return `true` for errors raised before any training because the
    /// dataset's fold-id or label columns are unusable.
    #[must_use]
    pub fn is_schema_error(&self) -> bool {
        match self {
            CvError::Schema(e) => e.is_schema_error(),
            CvError::MissingFoldId { .. } | CvError::FoldIdOutOfRange { .. } => true,
            _ => false,
        }
    }
}
