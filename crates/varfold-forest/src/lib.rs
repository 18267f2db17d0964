//! Tree-ensemble classifiers: train, predict.
//!
//! Provides a Random Forest of CART trees with bootstrap bagging and
//! rayon-parallel training, and a partitioned resampling ensemble of such
//! forests for imbalanced data. Every fitted model predicts a probability
//! for each declared class.

mod config;
mod error;
mod forest;
mod predict;
mod resampling;
mod split;
mod tree;

pub use config::{MaxFeatures, RandomForestConfig};
pub use error::ForestError;
pub use forest::RandomForest;
pub use predict::ClassDistribution;
pub use resampling::{ResamplingConfig, ResamplingForest};
pub use split::SplitCriterion;
pub use tree::{DecisionTree, Node};
