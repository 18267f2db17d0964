//! Confusion counts and the per-class rates derived from them.

use std::fmt;

use serde::Serialize;

/// Confusion counts for a multi-class problem.
///
/// `matrix[actual][predicted]` counts records of class `actual` predicted as
/// `predicted`. Matrices from different folds combine with
/// [`ConfusionMatrix::merge`]; rates are always derived from the summed
/// counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
}

/// Per-class rates derived from confusion counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    /// The class index.
    pub class: usize,
    /// TP / (TP + FN). Same as recall.
    pub tp_rate: f64,
    /// FP / (FP + TN).
    pub fp_rate: f64,
    /// TP / (TP + FP). 0.0 if the class was never predicted.
    pub precision: f64,
    /// TP / (TP + FN). 0.0 if the class has no records.
    pub recall: f64,
    /// Harmonic mean of precision and recall. 0.0 if both are zero.
    pub f_measure: f64,
    /// Matthews correlation coefficient of the one-vs-rest split.
    pub mcc: f64,
    /// Number of records whose actual class is this one.
    pub support: usize,
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}

impl ConfusionMatrix {
    /// An all-zero matrix over `n_classes` classes.
    #[must_use]
    pub fn zeros(n_classes: usize) -> Self {
        Self {
            matrix: vec![vec![0; n_classes]; n_classes],
        }
    }

    /// Build a matrix from paired actual and predicted labels.
    ///
    /// # Panics
    ///
    /// Panics if a label is not below `n_classes`.
    #[must_use]
    pub fn from_labels(actual: &[usize], predicted: &[usize], n_classes: usize) -> Self {
        let mut cm = Self::zeros(n_classes);
        for (&a, &p) in actual.iter().zip(predicted) {
            cm.record(a, p);
        }
        cm
    }

    /// Count one prediction.
    ///
    /// # Panics
    ///
    /// Panics if either class is not below [`ConfusionMatrix::n_classes`].
    pub fn record(&mut self, actual: usize, predicted: usize) {
        self.matrix[actual][predicted] += 1;
    }

    /// Add another matrix's counts into this one.
    ///
    /// # Panics
    ///
    /// Panics if the class counts differ.
    pub fn merge(&mut self, other: &ConfusionMatrix) {
        assert_eq!(self.n_classes(), other.n_classes(), "class count mismatch");
        for (row, other_row) in self.matrix.iter_mut().zip(&other.matrix) {
            for (cell, &count) in row.iter_mut().zip(other_row) {
                *cell += count;
            }
        }
    }

    /// Total number of counted predictions.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Number of correct predictions.
    #[must_use]
    pub fn correct(&self) -> usize {
        (0..self.n_classes()).map(|i| self.matrix[i][i]).sum()
    }

    /// Overall accuracy. 0.0 for an empty matrix.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct() as f64, self.total() as f64)
    }

    /// Cohen's kappa: agreement beyond what the marginals predict by chance.
    #[must_use]
    pub fn kappa(&self) -> f64 {
        let total = self.total() as f64;
        if total == 0.0 {
            return 0.0;
        }
        let n = self.n_classes();
        let chance: f64 = (0..n)
            .map(|c| {
                let row: usize = self.matrix[c].iter().sum();
                let col: usize = (0..n).map(|r| self.matrix[r][c]).sum();
                row as f64 * col as f64
            })
            .sum::<f64>()
            / (total * total);
        let observed = self.accuracy();
        if (1.0 - chance).abs() < f64::EPSILON {
            return if (observed - 1.0).abs() < f64::EPSILON { 1.0 } else { 0.0 };
        }
        (observed - chance) / (1.0 - chance)
    }

    /// Per-class rates, one-vs-rest.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        let n = self.n_classes();
        let total = self.total();
        (0..n)
            .map(|c| {
                let tp = self.matrix[c][c];
                let fn_ = self.matrix[c].iter().sum::<usize>() - tp;
                let fp = (0..n).map(|r| self.matrix[r][c]).sum::<usize>() - tp;
                let tn = total - tp - fn_ - fp;
                let (tp, fp, fn_, tn) = (tp as f64, fp as f64, fn_ as f64, tn as f64);

                let precision = ratio(tp, tp + fp);
                let recall = ratio(tp, tp + fn_);
                let f_measure = ratio(2.0 * precision * recall, precision + recall);
                let mcc = ratio(
                    tp * tn - fp * fn_,
                    ((tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_)).sqrt(),
                );
                ClassMetrics {
                    class: c,
                    tp_rate: recall,
                    fp_rate: ratio(fp, fp + tn),
                    precision,
                    recall,
                    f_measure,
                    mcc,
                    support: (tp + fn_) as usize,
                }
            })
            .collect()
    }

    /// Return the underlying matrix rows.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.matrix.len()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", "")?;
        for j in 0..self.n_classes() {
            write!(f, " pred_{j:>3}")?;
        }
        writeln!(f)?;
        for (i, row) in self.matrix.iter().enumerate() {
            write!(f, "true_{i:>3}")?;
            for val in row {
                write!(f, " {val:>8}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
