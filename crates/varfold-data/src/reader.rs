//! CSV dataset reader with column type inference.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::DataError;
use crate::dataset::{Dataset, Record};
use crate::schema::{Attribute, Schema};

/// Reads a labeled dataset from a headered CSV file.
///
/// Column types are inferred from the cells:
/// - every present cell parses as a finite number: numeric, or integer when
///   all of them are integral
/// - otherwise nominal, with categories sorted lexicographically
///
/// Empty cells and `?` are missing values. The label column is the last
/// column unless [`DatasetReader::with_label`] names another; it is always
/// read as nominal. The relation name is the file stem.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`DataError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`DataError::CsvParse`] | Malformed CSV record |
/// | [`DataError::NoColumns`] | Header is empty |
/// | [`DataError::DuplicateColumn`] | Two columns share a name |
/// | [`DataError::EmptyDataset`] | Zero data rows after header |
/// | [`DataError::InconsistentRowLength`] | Row has different column count than header |
/// | [`DataError::UnknownAttribute`] | The requested label column does not exist |
pub struct DatasetReader {
    path: PathBuf,
    label: Option<String>,
}

impl DatasetReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            label: None,
        }
    }

    /// Use the named column as the label instead of the last column.
    #[must_use]
    pub fn with_label(mut self, name: impl Into<String>) -> Self {
        self.label = Some(name.into());
        self
    }

    /// Read and validate the CSV file, returning a [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Dataset, DataError> {
        let file = std::fs::File::open(&self.path).map_err(|e| DataError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets the row-length check below report the row.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let n_columns = header.len();
        if n_columns == 0 || (n_columns == 1 && header.get(0) == Some("")) {
            return Err(DataError::NoColumns { path: self.path.clone() });
        }
        let names: Vec<String> = header.iter().map(String::from).collect();
        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(DataError::DuplicateColumn {
                    path: self.path.clone(),
                    name: name.clone(),
                });
            }
        }
        debug!(n_columns, "read CSV header");

        let label_index = match &self.label {
            Some(name) => names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| DataError::UnknownAttribute { name: name.clone() })?,
            None => n_columns - 1,
        };

        let mut rows: Vec<Vec<Option<String>>> = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            if record.len() != n_columns {
                return Err(DataError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: n_columns,
                    got: record.len(),
                });
            }
            rows.push(record.iter().map(parse_cell).collect());
        }

        if rows.is_empty() {
            return Err(DataError::EmptyDataset { path: self.path.clone() });
        }

        let columns: Vec<Column> = (0..n_columns)
            .map(|col| Column::infer(&rows, col, col == label_index))
            .collect();

        let records = rows
            .iter()
            .map(|row| {
                Record::new(
                    row.iter()
                        .zip(&columns)
                        .map(|(cell, column)| cell.as_deref().map(|raw| column.encode(raw)))
                        .collect(),
                )
            })
            .collect();

        let schema = Schema::new(
            names
                .into_iter()
                .zip(columns)
                .map(|(name, column)| column.into_attribute(name))
                .collect(),
        );

        let relation = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let label = schema.handles().nth(label_index);
        let dataset = Dataset::new(relation, schema, records, label)?;

        info!(
            n_records = dataset.len(),
            n_attributes = dataset.schema().len(),
            n_classes = dataset.n_classes(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    fn csv_error(&self, e: csv::Error) -> DataError {
        DataError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

/// Convenience for `DatasetReader::new(path).read()`.
///
/// # Errors
///
/// See [`DatasetReader`].
pub fn load(path: &Path) -> Result<Dataset, DataError> {
    DatasetReader::new(path).read()
}

fn parse_cell(raw: &str) -> Option<String> {
    if raw.is_empty() || raw == "?" {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Inferred type of one CSV column.
enum Column {
    Numeric { integral: bool },
    Nominal(Vec<String>),
}

impl Column {
    fn infer(rows: &[Vec<Option<String>>], col: usize, force_nominal: bool) -> Self {
        let present = rows.iter().filter_map(|row| row[col].as_deref());
        if !force_nominal {
            let parsed: Option<Vec<f64>> = present
                .clone()
                .map(|raw| raw.parse::<f64>().ok().filter(|v| v.is_finite()))
                .collect();
            if let Some(values) = parsed {
                return Column::Numeric {
                    integral: values.iter().all(|v| v.fract() == 0.0),
                };
            }
        }
        let categories: BTreeSet<&str> = present.collect();
        Column::Nominal(categories.into_iter().map(String::from).collect())
    }

    fn encode(&self, raw: &str) -> f64 {
        match self {
            // Parsing succeeded during inference.
            Column::Numeric { .. } => raw.parse().unwrap_or(f64::NAN),
            Column::Nominal(categories) => categories
                .binary_search_by(|c| c.as_str().cmp(raw))
                .map_or(f64::NAN, |i| i as f64),
        }
    }

    fn into_attribute(self, name: String) -> Attribute {
        match self {
            Column::Numeric { integral: true } => Attribute::integer(name),
            Column::Numeric { integral: false } => Attribute::numeric(name),
            Column::Nominal(categories) => Attribute::nominal(name, categories),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeHandle, AttributeKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn read_infers_types() {
        let csv = "score,fold,gene,class\n0.5,0,BRCA1,1\n1.25,1,TP53,0\n?,1,BRCA1,1\n";
        let f = write_csv(csv);
        let ds = DatasetReader::new(f.path()).read().unwrap();
        let schema = ds.schema();
        assert_eq!(ds.len(), 3);
        assert_eq!(schema.attributes()[0].kind(), &AttributeKind::Numeric);
        assert_eq!(schema.attributes()[1].kind(), &AttributeKind::Integer);
        assert_eq!(
            schema.attributes()[2].categories().unwrap(),
            &["BRCA1".to_string(), "TP53".to_string()]
        );
        assert_eq!(ds.class_names(), &["0".to_string(), "1".to_string()]);
        assert_eq!(ds.labels().unwrap(), vec![1, 0, 1]);
        assert_eq!(ds.records()[2].values()[0], None);
    }

    #[test]
    fn explicit_label_column() {
        let csv = "class,score\nb,1.0\na,2.0\n";
        let f = write_csv(csv);
        let ds = DatasetReader::new(f.path()).with_label("class").read().unwrap();
        assert_eq!(ds.label().map(AttributeHandle::index), Some(0));
        assert_eq!(ds.labels().unwrap(), vec![1, 0]);
    }

    #[test]
    fn unknown_label_column() {
        let f = write_csv("a,b\n1,2\n");
        let err = DatasetReader::new(f.path()).with_label("class").read().unwrap_err();
        assert!(matches!(err, DataError::UnknownAttribute { .. }));
    }

    #[test]
    fn missing_label_is_allowed_at_load() {
        let f = write_csv("a,class\n1,x\n2,\n");
        let ds = DatasetReader::new(f.path()).read().unwrap();
        assert_eq!(ds.class_counts(), vec![1]);
        assert!(matches!(ds.labels(), Err(DataError::MissingLabel { record: 1 })));
    }

    #[test]
    fn empty_dataset_error() {
        let f = write_csv("a,class\n");
        let err = DatasetReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, DataError::EmptyDataset { .. }));
    }

    #[test]
    fn inconsistent_row_length_error() {
        let f = write_csv("a,b,class\n1,2,x\n1,y\n");
        let err = DatasetReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, DataError::InconsistentRowLength { row_index: 1, .. }));
    }

    #[test]
    fn duplicate_column_error() {
        let f = write_csv("a,a,class\n1,2,x\n");
        let err = DatasetReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, DataError::DuplicateColumn { .. }));
    }

    #[test]
    fn file_not_found_error() {
        let err = load(Path::new("/nonexistent/variants.csv")).unwrap_err();
        assert!(matches!(err, DataError::FileNotFound { .. }));
    }

    #[test]
    fn relation_name_is_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mendelian.csv");
        std::fs::write(&path, "a,class\n1,x\n").unwrap();
        assert_eq!(load(&path).unwrap().name(), "mendelian");
    }
}
