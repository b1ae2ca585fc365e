//! Sliding min/max envelopes and the LB_Keogh lower bound.

use std::collections::VecDeque;

use crate::series::TimeSeriesView;
use crate::window::Window;

/// Upper and lower envelope of a series for one window.
///
/// `upper[i]` is the maximum and `lower[i]` the minimum of `series[j]` over
/// `|i - j| <= window`, clamped to the series bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    upper: Vec<f64>,
    lower: Vec<f64>,
    window: Window,
}

impl Envelope {
    /// Compute the envelope in O(n) with monotonic deques.
    #[must_use]
    pub fn compute(series: TimeSeriesView<'_>, window: Window) -> Self {
        let data = series.as_slice();
        Self {
            upper: sliding_extreme(data, window.radius(), |incoming, kept| incoming >= kept),
            lower: sliding_extreme(data, window.radius(), |incoming, kept| incoming <= kept),
            window,
        }
    }

    /// Return the upper envelope.
    #[must_use]
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Return the lower envelope.
    #[must_use]
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Return the window the envelope was built for.
    #[must_use]
    pub fn window(&self) -> Window {
        self.window
    }

    /// Return the envelope length (same as the series).
    #[must_use]
    pub fn len(&self) -> usize {
        self.upper.len()
    }

    /// Return true if the envelope is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upper.is_empty()
    }
}

/// Centered sliding-window extreme of radius `radius`.
///
/// `dominates(incoming, kept)` returns true when `incoming` makes `kept` useless
/// (`>=` for a maximum, `<=` for a minimum). Deque indices increase front to back
/// and the front always holds the extreme of the current window.
fn sliding_extreme(data: &[f64], radius: usize, dominates: impl Fn(f64, f64) -> bool) -> Vec<f64> {
    let n = data.len();
    let mut out = Vec::with_capacity(n);
    let mut deque: VecDeque<usize> = VecDeque::new();
    let mut next = 0usize;

    for i in 0..n {
        let hi = (i + radius).min(n - 1);
        while next <= hi {
            while deque.back().is_some_and(|&back| dominates(data[next], data[back])) {
                deque.pop_back();
            }
            deque.push_back(next);
            next += 1;
        }

        let lo = i.saturating_sub(radius);
        while deque.front().is_some_and(|&front| front < lo) {
            deque.pop_front();
        }

        // Index `i` itself is always inside the window.
        out.push(data[*deque.front().expect("window contains at least index i")]);
    }
    out
}

/// Squared LB_Keogh of `series` against `envelope`.
///
/// Sums, in index order, the squared distance of each point to the band it falls
/// outside of. Summing in path order keeps the bound `<=` the floating-point DTW
/// cost, not just the real-valued one.
#[must_use]
pub fn lb_keogh(series: &[f64], envelope: &Envelope) -> f64 {
    let mut progress = KeoghProgress::default();
    progress.advance(series, envelope, |_| false);
    progress.sum()
}

#[inline]
fn keogh_term(value: f64, upper: f64, lower: f64) -> f64 {
    if value > upper {
        let diff = value - upper;
        diff * diff
    } else if value < lower {
        let diff = lower - value;
        diff * diff
    } else {
        0.0
    }
}

/// Resumable LB_Keogh accumulation.
///
/// The running prefix sum is itself a lower bound, so accumulation can stop as
/// soon as it is large enough to prune and pick up at the same index later.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KeoghProgress {
    sum: f64,
    next: usize,
}

impl KeoghProgress {
    /// Return the prefix sum accumulated so far.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Return the number of points accumulated so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.next
    }

    /// Return true once every point of a series of length `len` is accumulated.
    #[must_use]
    pub fn is_complete(&self, len: usize) -> bool {
        self.next >= len
    }

    /// Accumulate terms until the series is exhausted or `stop(sum)` returns true.
    ///
    /// Returns true if the bound is complete.
    pub fn advance(
        &mut self,
        series: &[f64],
        envelope: &Envelope,
        mut stop: impl FnMut(f64) -> bool,
    ) -> bool {
        let n = series.len().min(envelope.len());
        while self.next < n {
            let i = self.next;
            self.sum += keogh_term(series[i], envelope.upper[i], envelope.lower[i]);
            self.next += 1;
            if stop(self.sum) {
                break;
            }
        }
        self.next >= n
    }
}
