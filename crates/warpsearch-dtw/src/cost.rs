//! DTW cost newtype.

use std::cmp::Ordering;
use std::fmt;

/// Accumulated squared-difference cost of an optimal warping path.
///
/// No square root is taken, so costs compare and sum the same way lower bounds do.
/// [`DtwCost::INFINITY`] stands for "abandoned above the threshold" or "no admissible path".
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct DtwCost(f64);

impl DtwCost {
    /// Sentinel for abandoned or unreachable alignments.
    pub const INFINITY: Self = Self(f64::INFINITY);

    /// Cost of aligning two identical series.
    pub const ZERO: Self = Self(0.0);

    pub(crate) fn new(value: f64) -> Self {
        debug_assert!(value >= 0.0, "DTW cost must be non-negative, got {value}");
        Self(value)
    }

    /// Return the raw cost.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Return true unless this is the abandoned/unreachable sentinel.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// Total ordering comparison using [`f64::total_cmp`].
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for DtwCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}
