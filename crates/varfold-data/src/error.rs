//! Error types for varfold-data.

use std::path::PathBuf;

/// Errors from dataset loading, schema lookups, and dataset construction.
///
/// Variants fall in two groups: load errors (the file could not be read or
/// parsed) and schema errors (an attribute is absent, mistyped, or a label is
/// missing). [`DataError::is_schema_error`] tells them apart.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when the header contains no columns at all.
    #[error("no columns in header of {path}")]
    NoColumns {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when the same column name appears twice in the header.
    #[error("duplicate column \"{name}\" in {path}")]
    DuplicateColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// The duplicated column name.
        name: String,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a record is built with the wrong number of values.
    #[error("record {record} has {got} values, schema has {expected} attributes")]
    RecordLengthMismatch {
        /// Zero-based record index.
        record: usize,
        /// Number of attributes in the schema.
        expected: usize,
        /// Number of values in the record.
        got: usize,
    },

    /// Returned when a nominal cell holds something other than a category index.
    #[error("record {record}: value {value} is not a valid category of nominal attribute \"{attribute}\"")]
    InvalidCategory {
        /// Zero-based record index.
        record: usize,
        /// Attribute name.
        attribute: String,
        /// The offending raw value.
        value: f64,
    },

    /// Returned when a numeric cell is NaN or infinite.
    #[error("record {record}: non-finite value in attribute \"{attribute}\"")]
    NonFiniteValue {
        /// Zero-based record index.
        record: usize,
        /// Attribute name.
        attribute: String,
    },

    /// Returned when a named attribute is not part of the schema.
    #[error("unknown attribute \"{name}\"")]
    UnknownAttribute {
        /// The attribute name that was looked up.
        name: String,
    },

    /// Returned when an attribute is expected to hold integers but does not.
    #[error("attribute \"{name}\" is not integer-valued")]
    NonIntegerAttribute {
        /// The attribute name.
        name: String,
    },

    /// Returned when the designated label attribute is not nominal.
    #[error("label attribute \"{name}\" must be nominal")]
    LabelNotNominal {
        /// The attribute name.
        name: String,
    },

    /// Returned when an operation needs a label column and none is set.
    #[error("dataset \"{dataset}\" has no label attribute")]
    NoLabel {
        /// Dataset relation name.
        dataset: String,
    },

    /// Returned when a record that must be labeled has a missing label.
    #[error("record {record} has a missing label")]
    MissingLabel {
        /// Zero-based record index.
        record: usize,
    },

    /// Returned when a record index is outside the dataset.
    #[error("record index {index} out of range for dataset of {len} records")]
    RecordOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of records in the dataset.
        len: usize,
    },

    /// Returned when a generator parameter is out of range.
    #[error("invalid synthetic data parameter {name} = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The rejected value.
        value: usize,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },
}

impl DataError {
    /// Return `true` for errors describing a missing or mistyped attribute
    /// rather than an unreadable file.
    #[must_use]
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            DataError::UnknownAttribute { .. }
                | DataError::NonIntegerAttribute { .. }
                | DataError::LabelNotNominal { .. }
                | DataError::NoLabel { .. }
                | DataError::MissingLabel { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::DataError;

    #[test]
    fn schema_errors_are_classified() {
        assert!(DataError::UnknownAttribute { name: "fold".into() }.is_schema_error());
        assert!(DataError::MissingLabel { record: 3 }.is_schema_error());
        assert!(!DataError::EmptyDataset { path: "x.csv".into() }.is_schema_error());
    }
}
