//! Cross-validation harness: fold partitioning, per-fold training,
//! prediction collection, and metrics.
//!
//! A [`CrossValidation`] run splits a [`varfold_data::Dataset`] with a
//! [`FoldPartitioner`], builds a fresh [`Classifier`] per fold from a factory
//! closure, and merges the held-out predictions into a [`PredictionTable`]
//! and the confusion counts into [`AggregateMetrics`].
//! [`MetricsReporter::summarize`] turns the metrics into a [`Report`].

mod classifier;
mod collector;
mod confusion;
mod error;
mod forest;
mod metrics;
mod partition;
mod report;
mod runner;
mod writer;

pub use classifier::{ClassPrediction, Classifier, ClassifierOptions};
pub use collector::{Prediction, PredictionCollector, PredictionTable};
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use error::{CvError, Stage};
pub use forest::{
    FittedForest, FittedResampling, Imputer, ModelError, RandomForestClassifier, ResamplingClassifier,
};
pub use metrics::{AggregateMetrics, FoldMetrics, MetricsAccumulator, RunSetup};
pub use partition::{Fold, FoldMode, FoldPartitioner, for_fold};
pub use report::{ClassDetail, MetricsReporter, Report, Summary};
pub use runner::{CrossValidation, CrossValidationResult};
pub use writer::ResultWriter;
