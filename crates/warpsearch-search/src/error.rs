use warpsearch_dtw::DtwError;

use crate::strategy::Strategy;

/// Errors from building a search session, sweeping windows, and classifying.
///
/// Configuration problems are reported before the first window is evaluated.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Returned when there are too few training sequences for the operation.
    #[error("need at least {required} training sequences, got {found}")]
    TooFewSequences {
        /// Number of sequences provided.
        found: usize,
        /// Minimum number required.
        required: usize,
    },

    /// Returned when the number of labels differs from the number of series.
    #[error("got {n_series} series but {n_labels} labels")]
    LabelCountMismatch {
        /// Number of series provided.
        n_series: usize,
        /// Number of labels provided.
        n_labels: usize,
    },

    /// Returned when a strategy that relies on envelope bounds meets sequences of different lengths.
    #[error("strategy {strategy} needs equal-length sequences: sequence {index} has length {len}, expected {expected}")]
    LengthMismatch {
        /// The strategy that was requested.
        strategy: Strategy,
        /// Index of the first offending sequence.
        index: usize,
        /// Its length.
        len: usize,
        /// Length of sequence 0.
        expected: usize,
    },

    /// Returned when a window exceeds the session's maximum window.
    #[error("window {window} is outside the searched range [0, {max}]")]
    WindowOutOfRange {
        /// The requested window.
        window: usize,
        /// The largest admissible window.
        max: usize,
    },

    /// Returned when a strategy name cannot be parsed.
    #[error("unknown strategy \"{name}\" (expected naive, cascading, early-abandon or propagation)")]
    UnknownStrategy {
        /// The name that failed to parse.
        name: String,
    },

    /// Returned when a search direction cannot be parsed.
    #[error("unknown search direction \"{name}\" (expected ascending or descending)")]
    UnknownDirection {
        /// The name that failed to parse.
        name: String,
    },

    /// Returned when no training sequence can be aligned with a query under the window.
    #[error("no training sequence is reachable from a query of length {len} at window {window}")]
    NoReachableNeighbor {
        /// Query length.
        len: usize,
        /// The classifier's window.
        window: usize,
    },

    /// Returned by an evaluation interrupted through its cancel token.
    #[error("search was cancelled")]
    Cancelled,

    /// Returned when a sweep is cancelled before any window was evaluated.
    #[error("search was cancelled before any window was evaluated")]
    NothingEvaluated,

    /// Wraps a series validation error.
    #[error("invalid series: {0}")]
    Dtw(#[from] DtwError),
}
