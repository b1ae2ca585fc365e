//! Error types for series validation and preprocessing.

/// Errors from time series validation.
#[derive(Debug, thiserror::Error)]
pub enum DtwError {
    /// Returned when an empty slice is provided as a time series.
    #[error("time series must be non-empty")]
    EmptySeries,

    /// Returned when a time series contains NaN, infinity, or negative infinity.
    #[error("time series contains non-finite value at index {index}")]
    NonFiniteValue {
        /// Position of the first non-finite value found.
        index: usize,
    },
}

/// Errors from z-normalization.
#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    /// Returned when a series has zero variance and cannot be normalized.
    #[error("cannot z-normalize a constant series of length {n} (value {value})")]
    ConstantSeries {
        /// Length of the offending series.
        n: usize,
        /// The repeated value.
        value: f64,
    },
}

/// Errors from the derivative transform.
#[derive(Debug, thiserror::Error)]
pub enum DerivativeError {
    /// Returned when the series is too short to have interior points.
    #[error("derivative needs at least 3 points, got {len}")]
    TooShort {
        /// Length of the offending series.
        len: usize,
    },
}
