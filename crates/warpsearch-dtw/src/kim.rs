//! Summary statistics and the LB_Kim lower bound.

use crate::series::TimeSeriesView;

/// Per-series statistics for the window-independent LB_Kim bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    len: usize,
    first: f64,
    last: f64,
    min: f64,
    max: f64,
    argmin: usize,
    argmax: usize,
}

impl SeriesStats {
    /// Compute statistics in one pass. Extremes report their first occurrence.
    #[must_use]
    pub fn compute(series: TimeSeriesView<'_>) -> Self {
        let data = series.as_slice();
        let mut stats = Self {
            len: data.len(),
            first: data[0],
            last: data[data.len() - 1],
            min: data[0],
            max: data[0],
            argmin: 0,
            argmax: 0,
        };
        for (i, &v) in data.iter().enumerate().skip(1) {
            if v < stats.min {
                stats.min = v;
                stats.argmin = i;
            }
            if v > stats.max {
                stats.max = v;
                stats.argmax = i;
            }
        }
        stats
    }

    /// Return the series length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`; statistics are only computed for validated series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Return the minimum value.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Return the maximum value.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    fn is_interior(&self, index: usize) -> bool {
        index > 0 && index + 1 < self.len
    }

    /// Terms contributed by interior extremes of `self` that the other series cannot reach.
    ///
    /// Every warping path visits each row of `self`, so the row holding the maximum
    /// costs at least `(max - other.max)^2` when `max > other.max`; likewise for the
    /// minimum. Both rows are interior, hence distinct from the corner cells.
    fn extreme_terms(&self, other: &Self) -> [(usize, f64); 2] {
        let mut terms = [(0, 0.0); 2];
        if self.is_interior(self.argmax) && self.max > other.max {
            let diff = self.max - other.max;
            terms[0] = (self.argmax, diff * diff);
        }
        if self.is_interior(self.argmin) && self.min < other.min {
            let diff = other.min - self.min;
            terms[1] = (self.argmin, diff * diff);
        }
        terms.sort_by_key(|&(position, _)| position);
        terms
    }
}

/// Squared LB_Kim of two series.
///
/// Adds the corner cells `(0, 0)` and `(n - 1, m - 1)` to the interior extreme
/// terms. Row terms and column terms may land on the same cell, so only the larger
/// of the two groups is kept. Terms are summed in path order and the bound holds
/// for every window.
#[must_use]
pub fn lb_kim(a: &SeriesStats, b: &SeriesStats) -> f64 {
    let head = {
        let diff = a.first - b.first;
        diff * diff
    };
    let tail = if a.len > 1 || b.len > 1 {
        let diff = a.last - b.last;
        diff * diff
    } else {
        0.0
    };

    let along = |terms: [(usize, f64); 2]| {
        let mut sum = head;
        for (_, term) in terms {
            sum += term;
        }
        sum + tail
    };
    along(a.extreme_terms(b)).max(along(b.extreme_terms(a)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtw::BoundedDtw;
    use crate::series::TimeSeries;

    fn stats(values: &[f64]) -> SeriesStats {
        SeriesStats::compute(TimeSeries::new(values.to_vec()).unwrap().as_view())
    }

    #[test]
    fn stats_track_first_occurrence_of_extremes() {
        let s = stats(&[2.0, 5.0, -1.0, 5.0, -1.0, 0.0]);
        assert_eq!((s.min(), s.argmin), (-1.0, 2));
        assert_eq!((s.max(), s.argmax), (5.0, 1));
        assert_eq!((s.first, s.last, s.len()), (2.0, 0.0, 6));
    }

    #[test]
    fn single_points_count_the_corner_once() {
        assert_eq!(lb_kim(&stats(&[3.0]), &stats(&[1.0])), 4.0);
    }

    #[test]
    fn interior_extremes_add_to_the_corners() {
        // Corners cost 0; the interior peak of `a` is 4 above anything in `b`.
        let a = stats(&[0.0, 6.0, 0.0]);
        let b = stats(&[0.0, 2.0, 1.0, 0.0]);
        assert_eq!(lb_kim(&a, &b), 16.0);
    }

    #[test]
    fn bound_is_symmetric() {
        let a = stats(&[1.0, -3.0, 4.0, 0.0, 2.0]);
        let b = stats(&[0.0, 2.0, 1.0, 5.0, 1.0]);
        assert_eq!(lb_kim(&a, &b), lb_kim(&b, &a));
    }

    #[test]
    fn bound_never_exceeds_dtw() {
        let series: Vec<Vec<f64>> = vec![
            vec![0.0, 5.0, -5.0, 0.0],
            vec![1.0, 1.0, 1.0, 1.0],
            vec![-2.0, 0.0, 7.0, 3.0, -1.0],
            vec![4.0, -4.0],
            vec![0.5, 0.5, 9.0, -9.0, 0.5, 0.5],
        ];
        for a in &series {
            for b in &series {
                let ta = TimeSeries::new(a.clone()).unwrap();
                let tb = TimeSeries::new(b.clone()).unwrap();
                let lb = lb_kim(&SeriesStats::compute(ta.as_view()), &SeriesStats::compute(tb.as_view()));
                let full = a.len().max(b.len());
                let exact = BoundedDtw::with_radius(full).cost(ta.as_view(), tb.as_view());
                assert!(lb <= exact.cost().value(), "lb {lb} > dtw {} for {a:?} vs {b:?}", exact.cost());
            }
        }
    }
}
