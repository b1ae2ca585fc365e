//! Per-window evaluations and search results.

use std::fmt;
use std::time::Duration;

use warpsearch_dtw::Window;

use crate::neighbor::Neighbor;
use crate::store::SequenceStore;

/// Leave-one-out 1-NN outcome at one window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowEvaluation {
    /// The evaluated window.
    pub window: Window,
    /// Number of misclassified training sequences.
    pub errors: usize,
    /// Number of training sequences.
    pub n: usize,
    /// Nearest neighbour of each sequence; `None` when no other sequence is reachable.
    pub neighbors: Vec<Option<Neighbor>>,
}

impl WindowEvaluation {
    /// Score `neighbors` against the store's labels. A missing neighbour is an error.
    #[must_use]
    pub fn from_neighbors(
        window: Window,
        store: &SequenceStore,
        neighbors: Vec<Option<Neighbor>>,
    ) -> Self {
        let errors = neighbors
            .iter()
            .enumerate()
            .filter(|(i, nn)| nn.is_none_or(|nn| store.label(nn.index) != store.label(*i)))
            .count();
        Self {
            window,
            errors,
            n: neighbors.len(),
            neighbors,
        }
    }

    /// Return `errors / n`.
    #[must_use]
    pub fn error_rate(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.errors as f64 / self.n as f64
        }
    }
}

/// Score of one evaluated window, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowScore {
    /// The evaluated window.
    pub window: Window,
    /// Number of misclassified training sequences.
    pub errors: usize,
    /// `errors / n`.
    pub error_rate: f64,
    /// Wall-clock time spent evaluating the window.
    pub elapsed: Duration,
}

/// Why a sweep stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every window in the range was evaluated.
    Exhausted,
    /// Greedy mode saw the error count rise.
    GreedyStop,
    /// The cancel token fired.
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::Exhausted => "exhausted",
            StopReason::GreedyStop => "greedy-stop",
            StopReason::Cancelled => "cancelled",
        })
    }
}

/// Outcome of a window sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// The window with the fewest errors; ties keep the first evaluated.
    pub best_window: Window,
    /// Errors at the best window.
    pub best_errors: usize,
    /// Error rate at the best window.
    pub best_error_rate: f64,
    /// Number of training sequences.
    pub n: usize,
    /// Every evaluated window, in evaluation order.
    pub scores: Vec<WindowScore>,
    /// Whether the sweep ran to its natural end (exhaustion or greedy stop).
    pub completed: bool,
    /// Why the sweep stopped.
    pub stop: StopReason,
}

impl SearchResult {
    /// Return the total time spent evaluating windows.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.scores.iter().map(|s| s.elapsed).sum()
    }
}

#[cfg(test)]
mod tests {
    use warpsearch_dtw::{DtwCost, TimeSeries};

    use super::*;
    use crate::store::ClassLabel;

    #[test]
    fn errors_count_wrong_labels_and_missing_neighbors() {
        let series = (0..4)
            .map(|i| TimeSeries::new(vec![i as f64]).unwrap())
            .collect();
        let labels = [0, 0, 1, 1].map(ClassLabel::new).to_vec();
        let store = SequenceStore::new(series, labels).unwrap();
        let nn = |index| {
            Some(Neighbor {
                index,
                cost: DtwCost::ZERO,
            })
        };

        let evaluation =
            WindowEvaluation::from_neighbors(Window::new(0), &store, vec![nn(1), nn(2), nn(3), None]);
        assert_eq!(evaluation.errors, 2);
        assert_eq!(evaluation.n, 4);
        assert!((evaluation.error_rate() - 0.5).abs() < 1e-12);
    }
}
