//! Labeled tabular datasets for cross-validation.
//!
//! Provides a typed attribute schema, an in-memory [`Dataset`] with borrowed
//! [`DatasetView`] subsets, a CSV loader, a seeded synthetic data generator,
//! and the minority-class [`Imbalancer`].

mod dataset;
mod domain;
mod error;
mod imbalance;
mod reader;
mod schema;
mod synthetic;

pub use dataset::{Dataset, DatasetView, Record};
pub use domain::ExperimentName;
pub use error::DataError;
pub use imbalance::{Imbalancer, MINORITY_CLASS, imbalance};
pub use reader::{DatasetReader, load};
pub use schema::{Attribute, AttributeHandle, AttributeKind, Schema};
pub use synthetic::SyntheticConfig;
