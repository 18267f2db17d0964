//! In-memory labeled datasets and borrowed row subsets.

use tracing::debug;

use crate::DataError;
use crate::schema::{Attribute, AttributeHandle, AttributeKind, Schema};

/// One row of a [`Dataset`].
///
/// `None` marks a missing value. Nominal cells store the zero-based category
/// index as `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<Option<f64>>,
}

impl Record {
    /// Create a record from its cell values in schema order.
    #[must_use]
    pub fn new(values: Vec<Option<f64>>) -> Self {
        Self { values }
    }

    /// Return the value of one attribute.
    #[must_use]
    pub fn get(&self, handle: AttributeHandle) -> Option<f64> {
        self.values.get(handle.index()).copied().flatten()
    }

    /// Return all cell values in schema order.
    #[must_use]
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Return the number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Return `true` if the record has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A table of records sharing one schema, with an optional label column.
///
/// Records are identified by position. The label column, when set, is always
/// nominal; its categories are the class names.
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    schema: Schema,
    records: Vec<Record>,
    label: Option<AttributeHandle>,
}

impl Dataset {
    /// Build a dataset, checking every record against the schema.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DataError::RecordLengthMismatch`] | A record's length differs from the schema |
    /// | [`DataError::NonFiniteValue`] | A present value is NaN or infinite |
    /// | [`DataError::NonIntegerAttribute`] | An integer column holds a fractional value |
    /// | [`DataError::InvalidCategory`] | A nominal cell is not a category index |
    /// | [`DataError::LabelNotNominal`] | `label` points at a non-nominal column |
    pub fn new(
        name: impl Into<String>,
        schema: Schema,
        records: Vec<Record>,
        label: Option<AttributeHandle>,
    ) -> Result<Self, DataError> {
        for (record_index, record) in records.iter().enumerate() {
            if record.len() != schema.len() {
                return Err(DataError::RecordLengthMismatch {
                    record: record_index,
                    expected: schema.len(),
                    got: record.len(),
                });
            }
            for (attribute, value) in schema.attributes().iter().zip(record.values()) {
                if let Some(value) = *value {
                    check_value(record_index, attribute, value)?;
                }
            }
        }

        if let Some(handle) = label {
            let attribute = schema.get(handle);
            if !attribute.kind().is_nominal() {
                return Err(DataError::LabelNotNominal {
                    name: attribute.name().to_string(),
                });
            }
        }

        Ok(Self {
            name: name.into(),
            schema,
            records,
            label,
        })
    }

    /// Return the relation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Return all records in order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Return the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Return `true` if the dataset holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Return the label column, if one is designated.
    #[must_use]
    pub fn label(&self) -> Option<AttributeHandle> {
        self.label
    }

    /// Look up an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<AttributeHandle> {
        self.schema.lookup(name)
    }

    /// Look up an attribute by name, failing when it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::UnknownAttribute`] if no column has this name.
    pub fn require_attribute(&self, name: &str) -> Result<AttributeHandle, DataError> {
        self.attribute(name).ok_or_else(|| DataError::UnknownAttribute {
            name: name.to_string(),
        })
    }

    /// Delete a column from the schema and from every record.
    ///
    /// Removing the label column clears the label designation.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::UnknownAttribute`] if `handle` is past the last
    /// column, e.g. a handle that went stale after an earlier removal.
    pub fn remove_attribute(&mut self, handle: AttributeHandle) -> Result<Attribute, DataError> {
        let removed = self
            .schema
            .remove(handle)
            .ok_or_else(|| DataError::UnknownAttribute {
                name: handle.to_string(),
            })?;
        for record in &mut self.records {
            record.values.remove(handle.index());
        }
        self.label = match self.label {
            Some(label) if label == handle => None,
            Some(label) if label > handle => Some(AttributeHandle::new(label.index() - 1)),
            other => other,
        };
        debug!(attribute = removed.name(), "attribute removed");
        Ok(removed)
    }

    /// Return the class names (categories of the label column).
    ///
    /// Empty when no label is designated.
    #[must_use]
    pub fn class_names(&self) -> &[String] {
        self.label
            .and_then(|h| self.schema.get(h).categories())
            .unwrap_or(&[])
    }

    /// Return the number of label classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.class_names().len()
    }

    /// Return the class index of one record, or `None` if it is unlabeled.
    #[must_use]
    pub fn class_of(&self, record: usize) -> Option<usize> {
        let label = self.label?;
        self.records
            .get(record)
            .and_then(|r| r.get(label))
            .map(|v| v as usize)
    }

    /// Return the class index of every record.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DataError::NoLabel`] | No label column is designated |
    /// | [`DataError::MissingLabel`] | A record has no label value |
    pub fn labels(&self) -> Result<Vec<usize>, DataError> {
        let label = self.label.ok_or_else(|| DataError::NoLabel {
            dataset: self.name.clone(),
        })?;
        self.records
            .iter()
            .enumerate()
            .map(|(record, r)| {
                r.get(label)
                    .map(|v| v as usize)
                    .ok_or(DataError::MissingLabel { record })
            })
            .collect()
    }

    /// Count labeled records per class. Unlabeled records are not counted.
    #[must_use]
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes()];
        for record in 0..self.records.len() {
            if let Some(class) = self.class_of(record) {
                counts[class] += 1;
            }
        }
        counts
    }

    /// Read a column as integers.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::NonIntegerAttribute`] if the column is nominal or
    /// holds a fractional value.
    pub fn integer_values(&self, handle: AttributeHandle) -> Result<Vec<Option<i64>>, DataError> {
        let attribute = self.schema.get(handle);
        let non_integer = || DataError::NonIntegerAttribute {
            name: attribute.name().to_string(),
        };
        if attribute.kind().is_nominal() {
            return Err(non_integer());
        }
        self.records
            .iter()
            .map(|r| match r.get(handle) {
                Some(v) if v.fract() == 0.0 => Ok(Some(v as i64)),
                Some(_) => Err(non_integer()),
                None => Ok(None),
            })
            .collect()
    }

    /// Copy the given records, in the given order, into a new dataset.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::RecordOutOfRange`] if any index is past the end.
    pub fn select(&self, indices: &[usize]) -> Result<Dataset, DataError> {
        let records = indices
            .iter()
            .map(|&index| {
                self.records
                    .get(index)
                    .cloned()
                    .ok_or(DataError::RecordOutOfRange { index, len: self.records.len() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Dataset {
            name: self.name.clone(),
            schema: self.schema.clone(),
            records,
            label: self.label,
        })
    }

    /// Borrow a subset of records as a view.
    #[must_use]
    pub fn view(&self, indices: Vec<usize>) -> DatasetView<'_> {
        DatasetView::new(self, indices)
    }
}

fn check_value(record: usize, attribute: &Attribute, value: f64) -> Result<(), DataError> {
    if !value.is_finite() {
        return Err(DataError::NonFiniteValue {
            record,
            attribute: attribute.name().to_string(),
        });
    }
    match attribute.kind() {
        AttributeKind::Numeric => Ok(()),
        AttributeKind::Integer if value.fract() == 0.0 => Ok(()),
        AttributeKind::Integer => Err(DataError::NonIntegerAttribute {
            name: attribute.name().to_string(),
        }),
        AttributeKind::Nominal(categories) => {
            if value.fract() == 0.0 && value >= 0.0 && (value as usize) < categories.len() {
                Ok(())
            } else {
                Err(DataError::InvalidCategory {
                    record,
                    attribute: attribute.name().to_string(),
                    value,
                })
            }
        }
    }
}

/// A borrowed subset of a dataset's records.
///
/// Views never copy records. Hidden attributes are left out of
/// [`DatasetView::feature_handles`], which is how a fold-id column is kept
/// away from a classifier without mutating the dataset.
#[derive(Debug, Clone)]
pub struct DatasetView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
    hidden: Vec<AttributeHandle>,
}

impl<'a> DatasetView<'a> {
    /// Create a view over `indices` (positions in `dataset`).
    #[must_use]
    pub fn new(dataset: &'a Dataset, indices: Vec<usize>) -> Self {
        Self {
            dataset,
            indices,
            hidden: Vec::new(),
        }
    }

    /// Hide an attribute from the view's feature columns.
    #[must_use]
    pub fn with_hidden(mut self, handle: AttributeHandle) -> Self {
        if !self.hidden.contains(&handle) {
            self.hidden.push(handle);
        }
        self
    }

    /// Return the underlying dataset.
    #[must_use]
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Return the record positions this view covers.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Return the number of records in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Return `true` if the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate over the records in view order.
    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let records = self.dataset.records();
        self.indices.iter().map(move |&i| &records[i])
    }

    /// Return the columns a classifier may use: every attribute except the
    /// label and the hidden ones.
    #[must_use]
    pub fn feature_handles(&self) -> Vec<AttributeHandle> {
        let label = self.dataset.label();
        self.dataset
            .schema()
            .handles()
            .filter(|h| Some(*h) != label && !self.hidden.contains(h))
            .collect()
    }

    /// Return the names of the feature columns.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        let schema = self.dataset.schema();
        self.feature_handles()
            .into_iter()
            .map(|h| schema.get(h).name().to_string())
            .collect()
    }

    /// Return the feature matrix, row-major, with `None` for missing cells.
    #[must_use]
    pub fn features(&self) -> Vec<Vec<Option<f64>>> {
        let handles = self.feature_handles();
        self.records()
            .map(|r| handles.iter().map(|&h| r.get(h)).collect())
            .collect()
    }

    /// Return the class index of every record in the view.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DataError::NoLabel`] | The dataset has no label column |
    /// | [`DataError::MissingLabel`] | A record in the view is unlabeled |
    pub fn labels(&self) -> Result<Vec<usize>, DataError> {
        if self.dataset.label().is_none() {
            return Err(DataError::NoLabel {
                dataset: self.dataset.name().to_string(),
            });
        }
        self.indices
            .iter()
            .map(|&record| {
                self.dataset
                    .class_of(record)
                    .ok_or(DataError::MissingLabel { record })
            })
            .collect()
    }

    /// Return the number of label classes of the underlying dataset.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.dataset.n_classes()
    }
}
