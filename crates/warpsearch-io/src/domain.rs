//! Domain types for warpsearch-io.

use std::collections::HashMap;

use warpsearch_dtw::TimeSeries;
use warpsearch_search::ClassLabel;

use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bidirectional map between class names and dense [`ClassLabel`]s.
///
/// Labels are assigned in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassIndex {
    names: Vec<String>,
    lookup: HashMap<String, ClassLabel>,
}

impl ClassIndex {
    /// Build an index from names in order of appearance; repeats are ignored.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = Self::default();
        for name in names {
            if !index.lookup.contains_key(name) {
                let label = ClassLabel::new(index.names.len());
                index.lookup.insert(name.to_string(), label);
                index.names.push(name.to_string());
            }
        }
        index
    }

    /// Return the label of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::UnknownClass`] if `name` is not in the index.
    pub fn encode(&self, name: &str) -> Result<ClassLabel, IoError> {
        self.lookup
            .get(name)
            .copied()
            .ok_or_else(|| IoError::UnknownClass {
                name: name.to_string(),
            })
    }

    /// Return the name of `label`, or `None` if it is out of range.
    #[must_use]
    pub fn name(&self, label: ClassLabel) -> Option<&str> {
        self.names.get(label.index()).map(String::as_str)
    }

    /// Return all names, indexed by label.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Return the number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Return true if the index holds no class.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Labelled series read from a file, in row order.
///
/// Produced by [`LabeledReader`](crate::LabeledReader). `class_names[i]` is the
/// raw label of `series[i]`.
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    /// Raw class name of every row.
    pub class_names: Vec<String>,
    /// Validated series in the same order.
    pub series: Vec<TimeSeries>,
}

impl LabeledDataset {
    /// Return the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Return true if the dataset has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Build a class index from this dataset's labels.
    #[must_use]
    pub fn class_index(&self) -> ClassIndex {
        ClassIndex::from_names(self.class_names.iter().map(String::as_str))
    }

    /// Encode every row's class name with `index`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::UnknownClass`] for the first name missing from `index`.
    pub fn labels(&self, index: &ClassIndex) -> Result<Vec<ClassLabel>, IoError> {
        self.class_names.iter().map(|name| index.encode(name)).collect()
    }
}
