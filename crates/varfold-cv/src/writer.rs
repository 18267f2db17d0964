//! Prediction-table CSV and report JSON output.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use varfold_data::ExperimentName;

use crate::collector::PredictionTable;
use crate::error::CvError;
use crate::report::Report;

/// Writes run artifacts into one directory.
///
/// Output files are named `{experiment}_predictions.csv` and
/// `{experiment}_report.json`. The directory is created on construction.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a writer targeting `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`CvError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, CvError> {
        fs::create_dir_all(output_dir).map_err(|source| CvError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    fn path(&self, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{suffix}", self.experiment.as_str()))
    }

    /// Write the prediction table, one row per record, in table order.
    ///
    /// Columns: `record, fold, actual, predicted, misclassified`, then one
    /// `p_{class}` column per class.
    ///
    /// # Errors
    ///
    /// Returns [`CvError::Csv`] if the file cannot be created or written.
    #[instrument(skip_all)]
    pub fn write_predictions(&self, table: &PredictionTable) -> Result<PathBuf, CvError> {
        let path = self.path("predictions.csv");
        let csv_err = |source: csv::Error| CvError::Csv {
            path: path.clone(),
            source,
        };
        let mut writer = csv::Writer::from_path(&path).map_err(csv_err)?;

        let names = table.class_names();
        let mut header: Vec<String> = ["record", "fold", "actual", "predicted", "misclassified"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        header.extend(names.iter().map(|c| format!("p_{c}")));
        writer.write_record(&header).map_err(csv_err)?;

        for p in table.rows() {
            let mut row = vec![
                p.record.to_string(),
                p.fold.to_string(),
                names[p.actual].clone(),
                names[p.predicted].clone(),
                p.misclassified.to_string(),
            ];
            row.extend(p.distribution.iter().map(|v| format!("{v:.6}")));
            writer.write_record(&row).map_err(csv_err)?;
        }
        writer
            .flush()
            .map_err(|source| CvError::WriteFile {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), rows = table.len(), "predictions written");
        Ok(path)
    }

    /// Write the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CvError::Json`] | The report cannot be serialized |
    /// | [`CvError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all)]
    pub fn write_report(&self, report: &Report) -> Result<PathBuf, CvError> {
        let path = self.path("report.json");
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json).map_err(|source| CvError::WriteFile {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "report written");
        Ok(path)
    }
}
