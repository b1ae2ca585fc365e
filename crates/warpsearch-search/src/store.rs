//! Labelled training sequences.

use std::fmt;

use warpsearch_dtw::{TimeSeries, TimeSeriesView};

use crate::error::SearchError;

/// A class label. Wraps a zero-based class index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassLabel(usize);

impl ClassLabel {
    /// Create a label from a zero-based class index.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based class index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable training set. Sequence `i` keeps index `i` for the lifetime of the store.
#[derive(Debug, Clone)]
pub struct SequenceStore {
    series: Vec<TimeSeries>,
    labels: Vec<ClassLabel>,
    n_classes: usize,
}

impl SequenceStore {
    /// Pair series with their labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::LabelCountMismatch`] | `series.len() != labels.len()` |
    /// | [`SearchError::TooFewSequences`] | `series` is empty |
    pub fn new(series: Vec<TimeSeries>, labels: Vec<ClassLabel>) -> Result<Self, SearchError> {
        if series.len() != labels.len() {
            return Err(SearchError::LabelCountMismatch {
                n_series: series.len(),
                n_labels: labels.len(),
            });
        }
        if series.is_empty() {
            return Err(SearchError::TooFewSequences {
                found: 0,
                required: 1,
            });
        }
        let n_classes = labels.iter().map(|l| l.index() + 1).max().unwrap_or(0);
        Ok(Self {
            series,
            labels,
            n_classes,
        })
    }

    /// Return the number of sequences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Always `false` for a constructed store.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Borrow sequence `index`.
    #[must_use]
    pub fn view(&self, index: usize) -> TimeSeriesView<'_> {
        self.series[index].as_view()
    }

    /// Return all sequences.
    #[must_use]
    pub fn series(&self) -> &[TimeSeries] {
        &self.series
    }

    /// Return the label of sequence `index`.
    #[must_use]
    pub fn label(&self, index: usize) -> ClassLabel {
        self.labels[index]
    }

    /// Return all labels.
    #[must_use]
    pub fn labels(&self) -> &[ClassLabel] {
        &self.labels
    }

    /// Return the number of classes (largest label index plus one).
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the length of the longest sequence.
    #[must_use]
    pub fn max_len(&self) -> usize {
        self.series.iter().map(TimeSeries::len).max().unwrap_or(0)
    }

    /// Return the first sequence whose length differs from sequence 0, if any.
    #[must_use]
    pub fn first_length_mismatch(&self) -> Option<(usize, usize)> {
        let expected = self.series[0].len();
        self.series
            .iter()
            .enumerate()
            .find(|(_, s)| s.len() != expected)
            .map(|(i, s)| (i, s.len()))
    }

    /// Consume the store and return its series and labels.
    #[must_use]
    pub fn into_parts(self) -> (Vec<TimeSeries>, Vec<ClassLabel>) {
        (self.series, self.labels)
    }
}
