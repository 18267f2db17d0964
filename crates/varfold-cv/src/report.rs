//! Structured evaluation report and its text rendering.

use std::fmt;

use serde::Serialize;

use crate::confusion::ClassMetrics;
use crate::metrics::{AggregateMetrics, RunSetup};

/// Overall figures of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Records evaluated across all folds.
    pub n_evaluated: usize,
    /// Correctly classified records.
    pub correct: usize,
    /// Misclassified records.
    pub incorrect: usize,
    /// `correct / n_evaluated`.
    pub accuracy: f64,
    /// Cohen's kappa.
    pub kappa: f64,
    /// Mean absolute error of the probability estimates.
    pub mean_absolute_error: f64,
    /// Root mean squared error of the probability estimates.
    pub root_mean_squared_error: f64,
    /// Accuracy of each non-empty fold, in fold order.
    pub fold_accuracies: Vec<f64>,
    /// Mean of `fold_accuracies`.
    pub fold_accuracy_mean: f64,
    /// Population standard deviation of `fold_accuracies`.
    pub fold_accuracy_std: f64,
    /// Folds without test records.
    pub n_empty_folds: usize,
}

/// Rates for one class, or their support-weighted average.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDetail {
    /// Class name, or `"weighted avg"`.
    pub class: String,
    pub tp_rate: f64,
    pub fp_rate: f64,
    pub precision: f64,
    pub recall: f64,
    pub f_measure: f64,
    pub mcc: f64,
    /// Records of this class (total records for the weighted row).
    pub support: usize,
}

impl ClassDetail {
    fn from_metrics(name: &str, m: &ClassMetrics) -> Self {
        Self {
            class: name.to_string(),
            tp_rate: m.tp_rate,
            fp_rate: m.fp_rate,
            precision: m.precision,
            recall: m.recall,
            f_measure: m.f_measure,
            mcc: m.mcc,
            support: m.support,
        }
    }

    fn weighted(rows: &[ClassDetail]) -> Self {
        let total: usize = rows.iter().map(|r| r.support).sum();
        let avg = |field: fn(&ClassDetail) -> f64| {
            if total == 0 {
                0.0
            } else {
                rows.iter().map(|r| field(r) * r.support as f64).sum::<f64>() / total as f64
            }
        };
        Self {
            class: "weighted avg".to_string(),
            tp_rate: avg(|r| r.tp_rate),
            fp_rate: avg(|r| r.fp_rate),
            precision: avg(|r| r.precision),
            recall: avg(|r| r.recall),
            f_measure: avg(|r| r.f_measure),
            mcc: avg(|r| r.mcc),
            support: total,
        }
    }
}

/// The final report of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Classifier, dataset, folds, seed.
    pub setup: RunSetup,
    /// Overall figures.
    pub summary: Summary,
    /// One row per class.
    pub details: Vec<ClassDetail>,
    /// Support-weighted average of `details`.
    pub weighted: ClassDetail,
    /// Label class names, indexing the confusion matrix.
    pub class_names: Vec<String>,
    /// `confusion[actual][predicted]`, summed over folds.
    pub confusion: Vec<Vec<usize>>,
}

/// Turns [`AggregateMetrics`] into a [`Report`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsReporter;

impl MetricsReporter {
    /// Build the report. Every rate comes from the summed confusion counts.
    #[must_use]
    pub fn summarize(metrics: &AggregateMetrics) -> Report {
        let cm = metrics.confusion();
        let (fold_accuracy_mean, fold_accuracy_std) = metrics.fold_accuracy_stats();
        let summary = Summary {
            n_evaluated: cm.total(),
            correct: cm.correct(),
            incorrect: cm.total() - cm.correct(),
            accuracy: cm.accuracy(),
            kappa: cm.kappa(),
            mean_absolute_error: metrics.mean_absolute_error(),
            root_mean_squared_error: metrics.root_mean_squared_error(),
            fold_accuracies: metrics.fold_accuracies(),
            fold_accuracy_mean,
            fold_accuracy_std,
            n_empty_folds: metrics.n_empty_folds(),
        };
        let details: Vec<ClassDetail> = cm
            .class_metrics()
            .iter()
            .zip(metrics.class_names())
            .map(|(m, name)| ClassDetail::from_metrics(name, m))
            .collect();
        let weighted = ClassDetail::weighted(&details);

        Report {
            setup: metrics.setup().clone(),
            summary,
            details,
            weighted,
            class_names: metrics.class_names().to_vec(),
            confusion: cm.as_rows().to_vec(),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.setup;
        writeln!(f, "=== Run information ===")?;
        writeln!(f, "Scheme:    {} {}", s.classifier, s.options)?;
        writeln!(f, "Relation:  {}", s.dataset)?;
        writeln!(f, "Instances: {}", s.n_records)?;
        writeln!(f, "Test mode: {}-fold cross-validation, {}, seed {}", s.n_folds, s.mode, s.seed)?;
        writeln!(f)?;

        let m = &self.summary;
        let pct = |n: usize| {
            if m.n_evaluated == 0 { 0.0 } else { 100.0 * n as f64 / m.n_evaluated as f64 }
        };
        writeln!(f, "=== Summary ===")?;
        writeln!(f, "Correctly Classified Instances   {:>8} {:>10.4} %", m.correct, pct(m.correct))?;
        writeln!(f, "Incorrectly Classified Instances {:>8} {:>10.4} %", m.incorrect, pct(m.incorrect))?;
        writeln!(f, "Kappa statistic                  {:>8.4}", m.kappa)?;
        writeln!(f, "Mean absolute error              {:>8.4}", m.mean_absolute_error)?;
        writeln!(f, "Root mean squared error          {:>8.4}", m.root_mean_squared_error)?;
        writeln!(
            f,
            "Fold accuracy                    {:>8.4} +/- {:.4}",
            m.fold_accuracy_mean, m.fold_accuracy_std
        )?;
        if m.n_empty_folds > 0 {
            writeln!(f, "Empty folds                      {:>8}", m.n_empty_folds)?;
        }
        writeln!(f, "Total Number of Instances        {:>8}", m.n_evaluated)?;
        writeln!(f)?;

        writeln!(f, "=== Detailed Accuracy By Class ===")?;
        writeln!(
            f,
            "{:>8} {:>8} {:>9} {:>8} {:>9} {:>8}  Class",
            "TP Rate", "FP Rate", "Precision", "Recall", "F-Measure", "MCC"
        )?;
        for d in self.details.iter().chain(std::iter::once(&self.weighted)) {
            writeln!(
                f,
                "{:>8.3} {:>8.3} {:>9.3} {:>8.3} {:>9.3} {:>8.3}  {}",
                d.tp_rate, d.fp_rate, d.precision, d.recall, d.f_measure, d.mcc, d.class
            )?;
        }
        writeln!(f)?;

        writeln!(f, "=== Confusion Matrix ===")?;
        for j in 0..self.class_names.len() {
            write!(f, " {:>8}", column_tag(j))?;
        }
        writeln!(f, "   <-- classified as")?;
        for (i, row) in self.confusion.iter().enumerate() {
            for val in row {
                write!(f, " {val:>8}")?;
            }
            writeln!(f, " | {} = {}", column_tag(i), self.class_names[i])?;
        }
        Ok(())
    }
}

/// Spreadsheet-style column tag: a, b, ..., z, aa, ab, ...
fn column_tag(mut index: usize) -> String {
    let mut tag = Vec::new();
    loop {
        tag.push(b'a' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    tag.reverse();
    String::from_utf8_lossy(&tag).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Prediction;
    use crate::metrics::{FoldMetrics, MetricsAccumulator};
    use crate::partition::FoldMode;

    fn metrics() -> AggregateMetrics {
        let mut acc = MetricsAccumulator::new(2);
        acc.add(FoldMetrics::from_predictions(
            0,
            2,
            &[
                Prediction::new(0, 0, 0, 0, vec![0.9, 0.1]),
                Prediction::new(1, 0, 1, 0, vec![0.6, 0.4]),
            ],
            2,
        ));
        acc.add(FoldMetrics::from_predictions(
            1,
            2,
            &[
                Prediction::new(2, 1, 1, 1, vec![0.2, 0.8]),
                Prediction::new(3, 1, 1, 1, vec![0.3, 0.7]),
            ],
            2,
        ));
        let setup = RunSetup {
            classifier: "RandomForest".into(),
            options: "iterations=1".into(),
            dataset: "toy".into(),
            n_records: 4,
            n_folds: 2,
            seed: 7,
            mode: FoldMode::Stratified,
        };
        acc.finish(setup, vec!["neg".into(), "pos".into()])
    }

    #[test]
    fn summary_from_summed_counts() {
        let report = MetricsReporter::summarize(&metrics());
        assert_eq!(report.summary.n_evaluated, 4);
        assert_eq!(report.summary.correct, 3);
        assert!((report.summary.accuracy - 0.75).abs() < 1e-12);
        assert_eq!(report.confusion, vec![vec![1, 0], vec![1, 2]]);
        assert_eq!(report.details[1].class, "pos");
        assert!((report.details[1].recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.weighted.support, 4);
        // (1 * 1.0 + 3 * 2/3) / 4
        assert!((report.weighted.recall - 0.75).abs() < 1e-12);
    }

    #[test]
    fn summarize_is_deterministic() {
        let m = metrics();
        let a = MetricsReporter::summarize(&m);
        let b = MetricsReporter::summarize(&m);
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(a.summary, b.summary);
    }

    #[test]
    fn rendering_has_every_section() {
        let text = MetricsReporter::summarize(&metrics()).to_string();
        for section in ["Run information", "Summary", "Detailed Accuracy By Class", "Confusion Matrix"] {
            assert!(text.contains(section), "missing {section}");
        }
        assert!(text.contains("RandomForest iterations=1"));
        assert!(text.contains("b = pos"));
    }

    #[test]
    fn column_tags() {
        assert_eq!(column_tag(0), "a");
        assert_eq!(column_tag(25), "z");
        assert_eq!(column_tag(26), "aa");
        assert_eq!(column_tag(27), "ab");
    }
}
