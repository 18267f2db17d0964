//! Typed attribute schema.

use std::fmt;

/// Handle to a column of a [`Schema`].
///
/// Handles are positional. Removing an attribute from a dataset invalidates
/// handles to every column after it; look them up again afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributeHandle(usize);

impl AttributeHandle {
    /// Create a handle from a zero-based column position.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based column position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for AttributeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Value type of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeKind {
    /// Real-valued column.
    Numeric,
    /// Numeric column whose values are all integral.
    Integer,
    /// Categorical column. Cells hold the zero-based category index.
    Nominal(Vec<String>),
}

impl AttributeKind {
    /// Return `true` for [`AttributeKind::Nominal`].
    #[must_use]
    pub fn is_nominal(&self) -> bool {
        matches!(self, AttributeKind::Nominal(_))
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    kind: AttributeKind,
}

impl Attribute {
    /// Create a real-valued attribute.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: AttributeKind::Numeric }
    }

    /// Create an integer-valued attribute.
    pub fn integer(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: AttributeKind::Integer }
    }

    /// Create a nominal attribute with the given categories.
    pub fn nominal(name: impl Into<String>, categories: Vec<String>) -> Self {
        Self { name: name.into(), kind: AttributeKind::Nominal(categories) }
    }

    /// Return the attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the attribute value type.
    #[must_use]
    pub fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    /// Return the categories of a nominal attribute, or `None`.
    #[must_use]
    pub fn categories(&self) -> Option<&[String]> {
        match &self.kind {
            AttributeKind::Nominal(categories) => Some(categories),
            _ => None,
        }
    }
}

/// Ordered list of attributes shared by every record of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    attributes: Vec<Attribute>,
}

impl Schema {
    /// Create a schema from an ordered attribute list.
    #[must_use]
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self { attributes }
    }

    /// Look up an attribute by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<AttributeHandle> {
        self.attributes
            .iter()
            .position(|a| a.name == name)
            .map(AttributeHandle::new)
    }

    /// Return the attribute behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not belong to this schema.
    #[must_use]
    pub fn get(&self, handle: AttributeHandle) -> &Attribute {
        &self.attributes[handle.index()]
    }

    /// Return the attributes in column order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Return handles for every column, in order.
    pub fn handles(&self) -> impl Iterator<Item = AttributeHandle> + '_ {
        (0..self.attributes.len()).map(AttributeHandle::new)
    }

    /// Return the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Return `true` if the schema has no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub(crate) fn remove(&mut self, handle: AttributeHandle) -> Option<Attribute> {
        (handle.index() < self.attributes.len()).then(|| self.attributes.remove(handle.index()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(vec![
            Attribute::numeric("score"),
            Attribute::integer("fold"),
            Attribute::nominal("class", vec!["0".into(), "1".into()]),
        ])
    }

    #[test]
    fn lookup_by_name() {
        let s = schema();
        assert_eq!(s.lookup("fold").map(AttributeHandle::index), Some(1));
        assert!(s.lookup("missing").is_none());
    }

    #[test]
    fn categories_only_for_nominal() {
        let s = schema();
        assert!(s.get(AttributeHandle::new(0)).categories().is_none());
        assert_eq!(s.get(AttributeHandle::new(2)).categories().map(<[String]>::len), Some(2));
    }

    #[test]
    fn remove_shifts_columns() {
        let mut s = schema();
        let removed = s.remove(AttributeHandle::new(1)).unwrap();
        assert_eq!(removed.name(), "fold");
        assert_eq!(s.lookup("class").map(AttributeHandle::index), Some(1));
        assert_eq!(s.len(), 2);
        assert!(s.remove(AttributeHandle::new(2)).is_none());
    }
}
