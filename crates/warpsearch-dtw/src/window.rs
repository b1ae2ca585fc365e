//! Sakoe-Chiba warping window.

use std::fmt;
use std::ops::Range;

/// Half-width of a Sakoe-Chiba band: cell `(i, j)` is admissible iff `|i - j| <= radius`.
///
/// A radius at least as large as the longer series is equivalent to unconstrained DTW.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Window(usize);

impl Window {
    /// Create a window with the given half-width.
    #[must_use]
    pub const fn new(radius: usize) -> Self {
        Self(radius)
    }

    /// Return the half-width.
    #[must_use]
    pub const fn radius(self) -> usize {
        self.0
    }

    /// Return the admissible column range for `row` in a matrix with `n_cols` columns.
    ///
    /// Rows that lie entirely outside the band (possible when the series lengths differ
    /// by more than the radius) yield an empty range.
    #[must_use]
    pub fn column_range(self, row: usize, n_cols: usize) -> Range<usize> {
        let end = (row + self.0 + 1).min(n_cols);
        let start = row.saturating_sub(self.0).min(end);
        start..end
    }

    /// Return the widest row of the band for a matrix with `n_cols` columns.
    #[must_use]
    pub fn band_width(self, n_cols: usize) -> usize {
        (2 * self.0 + 1).min(n_cols)
    }

    /// Return true if the cell `(row, col)` lies inside the band.
    #[must_use]
    pub fn admits(self, row: usize, col: usize) -> bool {
        row.abs_diff(col) <= self.0
    }

    /// Return true if a warping path from `(0, 0)` to `(n - 1, m - 1)` exists inside the band.
    #[must_use]
    pub fn reaches_end(self, n: usize, m: usize) -> bool {
        n.abs_diff(m) <= self.0
    }
}

impl From<usize> for Window {
    fn from(radius: usize) -> Self {
        Self(radius)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w={}", self.0)
    }
}
