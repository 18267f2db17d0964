//! Held-out predictions gathered across folds.

use serde::Serialize;

use crate::confusion::ConfusionMatrix;

/// One held-out prediction for one input record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Position of the record in the input dataset.
    pub record: usize,
    /// Fold in which the record was held out.
    pub fold: usize,
    /// Actual class index.
    pub actual: usize,
    /// Predicted class index.
    pub predicted: usize,
    /// Probability for every class.
    pub distribution: Vec<f64>,
    /// `true` when `predicted != actual`.
    pub misclassified: bool,
}

impl Prediction {
    /// Build a row, deriving the misclassified flag.
    #[must_use]
    pub fn new(
        record: usize,
        fold: usize,
        actual: usize,
        predicted: usize,
        distribution: Vec<f64>,
    ) -> Self {
        Self {
            record,
            fold,
            actual,
            predicted,
            distribution,
            misclassified: actual != predicted,
        }
    }
}

/// The merged prediction table of a run, in fold order.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionTable {
    class_names: Vec<String>,
    rows: Vec<Prediction>,
}

impl PredictionTable {
    /// Return the label class names.
    #[must_use]
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    /// Return every row: fold 0 first, then fold 1, and so on.
    #[must_use]
    pub fn rows(&self) -> &[Prediction] {
        &self.rows
    }

    /// Return the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Return `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Return the row of one input record.
    #[must_use]
    pub fn for_record(&self, record: usize) -> Option<&Prediction> {
        self.rows.iter().find(|p| p.record == record)
    }

    /// Number of misclassified rows.
    #[must_use]
    pub fn n_misclassified(&self) -> usize {
        self.rows.iter().filter(|p| p.misclassified).count()
    }

    /// Recount the confusion matrix from the rows.
    #[must_use]
    pub fn confusion(&self) -> ConfusionMatrix {
        let mut cm = ConfusionMatrix::zeros(self.class_names.len());
        for p in &self.rows {
            cm.record(p.actual, p.predicted);
        }
        cm
    }
}

/// Accumulates per-fold predictions into one [`PredictionTable`].
#[derive(Debug)]
pub struct PredictionCollector {
    class_names: Vec<String>,
    rows: Vec<Prediction>,
}

impl PredictionCollector {
    /// Create an empty collector for a dataset with these classes.
    #[must_use]
    pub fn new(class_names: Vec<String>, capacity: usize) -> Self {
        Self {
            class_names,
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Append one fold's predictions after those already collected.
    pub fn append(&mut self, fold_predictions: Vec<Prediction>) {
        self.rows.extend(fold_predictions);
    }

    /// Return the number of rows collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Return `true` if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Close the collector and return the table.
    #[must_use]
    pub fn finalize(self) -> PredictionTable {
        PredictionTable {
            class_names: self.class_names,
            rows: self.rows,
        }
    }
}
