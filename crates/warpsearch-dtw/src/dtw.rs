//! Banded DTW kernel.
//!
//! A single rolling-row dynamic program serves exact computation, early abandoning
//! against a cutoff, and PrunedDTW-style propagation from an upper bound. Every
//! finite result is the exact banded DTW cost; pruning only ever discards cells
//! whose accumulated cost already exceeds the threshold.

use tracing::instrument;

use crate::cost::DtwCost;
use crate::series::TimeSeriesView;
use crate::window::Window;

/// Outcome of one banded DTW computation.
///
/// `valid_from` is the largest `|i - j|` visited by the returned optimal path
/// (ties between optimal paths resolved toward the smaller deviation). The cost is
/// therefore also the exact DTW cost for every window in `[valid_from, window]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DtwOutcome {
    cost: DtwCost,
    valid_from: Window,
    window: Window,
    saturated: bool,
}

impl DtwOutcome {
    fn abandoned(window: Window) -> Self {
        Self {
            cost: DtwCost::INFINITY,
            valid_from: window,
            window,
            saturated: false,
        }
    }

    /// Return the cost, or [`DtwCost::INFINITY`] if the computation was abandoned.
    #[must_use]
    pub fn cost(&self) -> DtwCost {
        self.cost
    }

    /// Return the smallest window at which the cost is still exact.
    #[must_use]
    pub fn valid_from(&self) -> Window {
        self.valid_from
    }

    /// Return the window the computation ran at.
    #[must_use]
    pub fn window(&self) -> Window {
        self.window
    }

    /// Return true if the computation ran to completion.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.cost.is_finite()
    }

    /// Return true if the cost is the exact DTW cost at `window`.
    ///
    /// Holds for `valid_from <= window <= self.window()`, and for every larger window
    /// once the band already covered the whole cost matrix.
    #[must_use]
    pub fn holds_at(&self, window: Window) -> bool {
        self.is_exact() && self.valid_from <= window && (window <= self.window || self.saturated)
    }
}

/// Banded DTW calculator for a fixed Sakoe-Chiba window. Copyable and thread-safe.
///
/// The local cost is the squared difference and the returned cost is the plain sum
/// along the optimal path (no square root).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedDtw {
    window: Window,
}

impl BoundedDtw {
    /// Create a calculator for the given window.
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    /// Create a calculator for the Sakoe-Chiba half-width `radius`.
    #[must_use]
    pub fn with_radius(radius: usize) -> Self {
        Self::new(Window::new(radius))
    }

    /// Return the window.
    #[must_use]
    pub fn window(&self) -> Window {
        self.window
    }

    /// Compute the exact banded DTW cost.
    ///
    /// Runs in O(n * bw) time and O(bw) space, where `bw = min(2w + 1, m)`. Returns
    /// [`DtwCost::INFINITY`] only when the band cannot connect both end points
    /// (lengths differing by more than the window).
    #[must_use]
    #[instrument(level = "trace", skip(a, b), fields(w = self.window.radius()))]
    pub fn cost(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>) -> DtwOutcome {
        self.run(a.as_slice(), b.as_slice(), f64::INFINITY)
    }

    /// Compute the banded DTW cost, abandoning once it provably exceeds `cutoff`.
    ///
    /// The result is exact whenever the true cost is `<= cutoff`, ties included.
    /// Otherwise [`DtwCost::INFINITY`] is returned, which means "strictly above
    /// `cutoff`". The check happens per cell and a row with no surviving cell stops
    /// the computation.
    #[must_use]
    #[instrument(level = "trace", skip(a, b), fields(w = self.window.radius()))]
    pub fn cost_with_cutoff(
        &self,
        a: TimeSeriesView<'_>,
        b: TimeSeriesView<'_>,
        cutoff: f64,
    ) -> DtwOutcome {
        self.run(a.as_slice(), b.as_slice(), cutoff)
    }

    /// Compute the banded DTW cost using the exact cost of the same pair at a
    /// smaller-or-equal window as a pruning upper bound.
    ///
    /// Widening the band cannot increase the cost, so `previous` bounds the answer
    /// from above and the result is always exact. Cells whose accumulated cost
    /// exceeds the bound are skipped, as are the columns they shadow on the next row.
    #[must_use]
    #[instrument(level = "trace", skip(a, b, previous), fields(w = self.window.radius()))]
    pub fn cost_seeded(
        &self,
        a: TimeSeriesView<'_>,
        b: TimeSeriesView<'_>,
        previous: &DtwOutcome,
    ) -> DtwOutcome {
        debug_assert!(
            previous.window <= self.window || previous.holds_at(self.window),
            "seed computed at {} cannot bound the cost at {}",
            previous.window,
            self.window
        );
        self.run(a.as_slice(), b.as_slice(), previous.cost.value())
    }

    /// Compute the banded DTW cost, pruning at `min(upper_bound, cutoff)`.
    ///
    /// `upper_bound` must be a true upper bound of the cost at this window (for
    /// example a seed from a smaller window); `cutoff` is the caller's abandoning
    /// threshold. The result is exact if it is `<= cutoff`.
    #[must_use]
    #[instrument(level = "trace", skip(a, b), fields(w = self.window.radius()))]
    pub fn cost_pruned(
        &self,
        a: TimeSeriesView<'_>,
        b: TimeSeriesView<'_>,
        upper_bound: f64,
        cutoff: f64,
    ) -> DtwOutcome {
        self.run(a.as_slice(), b.as_slice(), upper_bound.min(cutoff))
    }

    /// Cost of the diagonal path, i.e. the exact cost at window 0.
    ///
    /// Returns `None` for series of different lengths. Being one admissible path at
    /// every window, it is an upper bound for all of them.
    #[must_use]
    pub fn diagonal(a: TimeSeriesView<'_>, b: TimeSeriesView<'_>) -> Option<DtwOutcome> {
        let (a, b) = (a.as_slice(), b.as_slice());
        if a.len() != b.len() {
            return None;
        }
        let sum = a.iter().zip(b).fold(0.0, |acc, (x, y)| {
            let diff = x - y;
            acc + diff * diff
        });
        Some(DtwOutcome {
            cost: DtwCost::new(sum),
            valid_from: Window::new(0),
            window: Window::new(0),
            saturated: a.len() == 1,
        })
    }

    /// Rolling-row DP with threshold pruning and validity tracking.
    ///
    /// Each row buffer has `bw + 2` slots: index 0 is the left sentinel and index
    /// `bw + 1` the right sentinel, both INF. Column `j` of a row starting at
    /// `start` lives at `j - start + 1`. Every cell carries the largest `|i - j|`
    /// along its chosen predecessor chain.
    ///
    /// A cell whose accumulated cost exceeds `threshold` stays INF. Columns left of
    /// the first live cell of the previous row can only be INF and are skipped; past
    /// the last live cell of the previous row (plus one, for the diagonal) a cell is
    /// fed only from the left, so the row ends at the first dead cell there.
    fn run(&self, a: &[f64], b: &[f64], threshold: f64) -> DtwOutcome {
        let n = a.len();
        let m = b.len();
        let window = self.window;
        if n == 0 || m == 0 || !window.reaches_end(n, m) {
            return DtwOutcome::abandoned(window);
        }

        let buf_width = window.band_width(m) + 2;
        let mut prev = vec![f64::INFINITY; buf_width];
        let mut curr = vec![f64::INFINITY; buf_width];
        let mut prev_valid = vec![0usize; buf_width];
        let mut curr_valid = vec![0usize; buf_width];

        let mut prev_start = 0usize;
        let mut live_first = 0usize;
        let mut live_last = 0usize;

        for i in 0..n {
            curr.fill(f64::INFINITY);

            let cols = window.column_range(i, m);
            let row_start = cols.start;
            let (from, reach) = if i == 0 {
                (0, 0)
            } else {
                (row_start.max(live_first), live_last + 1)
            };

            let mut row_first = None;
            let mut row_last = 0usize;

            for j in from..cols.end {
                let cj = j - row_start + 1;
                let left = (curr[cj - 1], curr_valid[cj - 1]);
                if j > reach && left.0 == f64::INFINITY {
                    break;
                }

                let (best, best_valid) = if i == 0 && j == 0 {
                    (0.0, 0)
                } else {
                    let above = if i > 0 {
                        slot(&prev, &prev_valid, j, prev_start)
                    } else {
                        (f64::INFINITY, 0)
                    };
                    let diag = if i > 0 && j > 0 {
                        slot(&prev, &prev_valid, j - 1, prev_start)
                    } else {
                        (f64::INFINITY, 0)
                    };
                    cheapest([diag, above, left])
                };
                if best == f64::INFINITY {
                    continue;
                }

                let diff = a[i] - b[j];
                let value = best + diff * diff;
                if value > threshold {
                    continue;
                }

                curr[cj] = value;
                curr_valid[cj] = best_valid.max(i.abs_diff(j));
                row_first.get_or_insert(j);
                row_last = j;
            }

            let Some(first) = row_first else {
                return DtwOutcome::abandoned(window);
            };
            live_first = first;
            live_last = row_last;
            prev_start = row_start;
            std::mem::swap(&mut prev, &mut curr);
            std::mem::swap(&mut prev_valid, &mut curr_valid);
        }

        // After the final swap `prev` holds the last row.
        let end = (m - 1) - prev_start + 1;
        let cost = prev[end];
        if cost == f64::INFINITY {
            return DtwOutcome::abandoned(window);
        }

        DtwOutcome {
            cost: DtwCost::new(cost),
            valid_from: Window::new(prev_valid[end]),
            window,
            saturated: window.radius() + 1 >= n.max(m),
        }
    }
}

/// Read column `col` of a row buffer whose first column is `row_start`.
fn slot(row: &[f64], valid: &[usize], col: usize, row_start: usize) -> (f64, usize) {
    let k = col.wrapping_sub(row_start).wrapping_add(1);
    if k < row.len() {
        (row[k], valid[k])
    } else {
        (f64::INFINITY, 0)
    }
}

/// Pick the cheapest predecessor, preferring the smaller validity on equal cost.
fn cheapest(candidates: [(f64, usize); 3]) -> (f64, usize) {
    let mut best = candidates[0];
    for &(cost, valid) in &candidates[1..] {
        if cost < best.0 || (cost == best.0 && valid < best.1) {
            best = (cost, valid);
        }
    }
    best
}
