//! Confusion matrix and per-class metrics for held-out evaluation.

use std::fmt;

use crate::error::SearchError;
use crate::store::ClassLabel;

/// Entry `matrix[true][predicted]` counts test sequences of class `true`
/// classified as `predicted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
    n_classes: usize,
}

/// Per-class precision, recall and F1.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    /// The class.
    pub class: ClassLabel,
    /// TP / (TP + FP), or 0.0 when the class was never predicted.
    pub precision: f64,
    /// TP / (TP + FN), or 0.0 when the class never occurs.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Number of test sequences of this class.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Tally true against predicted labels.
    ///
    /// Labels at or beyond `n_classes` grow the matrix to fit.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::LabelCountMismatch`] | the slices differ in length |
    /// | [`SearchError::TooFewSequences`] | no labels were given |
    pub fn from_labels(
        truth: &[ClassLabel],
        predicted: &[ClassLabel],
        n_classes: usize,
    ) -> Result<Self, SearchError> {
        if truth.len() != predicted.len() {
            return Err(SearchError::LabelCountMismatch {
                n_series: truth.len(),
                n_labels: predicted.len(),
            });
        }
        if truth.is_empty() {
            return Err(SearchError::TooFewSequences {
                found: 0,
                required: 1,
            });
        }
        let n_classes = truth
            .iter()
            .chain(predicted)
            .map(|l| l.index() + 1)
            .fold(n_classes, usize::max);
        let mut matrix = vec![vec![0usize; n_classes]; n_classes];
        for (t, p) in truth.iter().zip(predicted) {
            matrix[t.index()][p.index()] += 1;
        }
        Ok(Self { matrix, n_classes })
    }

    /// Proportion of correct predictions.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.n_classes).map(|i| self.matrix[i][i]).sum();
        correct as f64 / self.total() as f64
    }

    /// Number of tallied predictions.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Per-class precision, recall, F1 and support.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        (0..self.n_classes)
            .map(|c| {
                let tp = self.matrix[c][c];
                let predicted: usize = self.matrix.iter().map(|row| row[c]).sum();
                let support: usize = self.matrix[c].iter().sum();
                let precision = if predicted == 0 { 0.0 } else { tp as f64 / predicted as f64 };
                let recall = if support == 0 { 0.0 } else { tp as f64 / support as f64 };
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    class: ClassLabel::new(c),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Return the matrix rows.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", "")?;
        for j in 0..self.n_classes {
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
