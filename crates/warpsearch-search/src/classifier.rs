//! 1-NN DTW classifier at a fixed window.

use rayon::prelude::*;
use tracing::instrument;
use warpsearch_dtw::{BoundedDtw, Envelope, SeriesStats, TimeSeries, TimeSeriesView, Window, lb_keogh, lb_kim};

use crate::error::SearchError;
use crate::neighbor::Neighbor;
use crate::store::{ClassLabel, SequenceStore};

/// Nearest-neighbour classifier under banded DTW.
///
/// Candidates are screened with LB_Kim and, for equal-length pairs, LB_Keogh of
/// the candidate against the query envelope before DTW runs abandoned at the
/// best-so-far. Ties go to the smaller training index.
#[derive(Debug, Clone)]
pub struct NearestNeighbor {
    store: SequenceStore,
    stats: Vec<SeriesStats>,
    window: Window,
}

impl NearestNeighbor {
    /// Build a classifier over `store` at `window`.
    #[must_use]
    pub fn new(store: SequenceStore, window: Window) -> Self {
        let stats = store
            .series()
            .iter()
            .map(|s| SeriesStats::compute(s.as_view()))
            .collect();
        Self {
            store,
            stats,
            window,
        }
    }

    /// Return the window.
    #[must_use]
    pub fn window(&self) -> Window {
        self.window
    }

    /// Return the training store.
    #[must_use]
    pub fn store(&self) -> &SequenceStore {
        &self.store
    }

    /// Return the nearest training sequence to `query`, or `None` when none is
    /// reachable under the window.
    #[must_use]
    #[instrument(level = "trace", skip_all, fields(len = query.len()))]
    pub fn nearest(&self, query: TimeSeriesView<'_>) -> Option<Neighbor> {
        let dtw = BoundedDtw::new(self.window);
        let query_stats = SeriesStats::compute(query);
        let mut envelope: Option<Envelope> = None;
        let mut best: Option<Neighbor> = None;

        for (index, candidate) in self.store.series().iter().enumerate() {
            let threshold = best.map_or(f64::INFINITY, |b| b.cost.value());
            if lb_kim(&query_stats, &self.stats[index]) >= threshold {
                continue;
            }
            if candidate.len() == query.len() {
                let envelope = envelope.get_or_insert_with(|| Envelope::compute(query, self.window));
                if lb_keogh(candidate.as_slice(), envelope) >= threshold {
                    continue;
                }
            }
            let cost = dtw.cost_with_cutoff(query, candidate.as_view(), threshold).cost();
            if cost.value() < threshold {
                best = Some(Neighbor { index, cost });
            }
        }
        best
    }

    /// Predict the label of `query`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::NoReachableNeighbor`] | no training sequence can be aligned with `query` |
    pub fn classify(&self, query: TimeSeriesView<'_>) -> Result<ClassLabel, SearchError> {
        self.nearest(query)
            .map(|nn| self.store.label(nn.index))
            .ok_or(SearchError::NoReachableNeighbor {
                len: query.len(),
                window: self.window.radius(),
            })
    }

    /// Predict labels for a batch of queries in parallel.
    ///
    /// # Errors
    ///
    /// Returns the first [`SearchError::NoReachableNeighbor`] encountered.
    pub fn classify_batch(&self, queries: &[TimeSeries]) -> Result<Vec<ClassLabel>, SearchError> {
        queries
            .par_iter()
            .map(|q| self.classify(q.as_view()))
            .collect()
    }
}
