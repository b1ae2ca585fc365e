use std::time::Instant;

use tracing::{debug, info, instrument};
use warpsearch_dtw::Window;

use crate::assess::{LazyPairAssessor, Refinement};
use crate::cache::EnvelopeCache;
use crate::driver::CancelToken;
use crate::error::SearchError;
use crate::neighbor::{Neighbor, NeighborTable};
use crate::store::SequenceStore;

/// Builds the nearest-neighbour table for every window in one pass, then answers
/// each window by lookup.
///
/// Sequences are added one at a time (`current`), and for each the windows are
/// visited from the largest down. At a window where `current` has no settled
/// neighbour, every earlier sequence is tried as its neighbour (cheapest-looking
/// first) and `current` is tried as theirs. The winner's exact cost holds down to
/// its validity window, and since DTW only grows as the band narrows, it stays
/// the nearest neighbour across that whole range: those entries are settled
/// without further work. At a settled window only the reverse direction is
/// checked.
#[derive(Debug)]
pub(crate) struct Propagation<'a> {
    cache: EnvelopeCache<'a>,
    max_window: Window,
    table: Option<NeighborTable>,
}

impl<'a> Propagation<'a> {
    pub(crate) fn new(store: &'a SequenceStore, max_window: Window) -> Self {
        Self {
            cache: EnvelopeCache::new(store),
            max_window,
            table: None,
        }
    }

    pub(crate) fn neighbors(
        &mut self,
        window: Window,
        cancel: &CancelToken,
    ) -> Result<Vec<Option<Neighbor>>, SearchError> {
        if self.table.is_none() {
            self.table = Some(self.build(cancel)?);
        }
        let table = self.table.as_ref().expect("table was just built");
        Ok(table.neighbors(window))
    }

    #[instrument(level = "debug", skip(self, cancel), fields(n = self.cache.store().len(), max_window = self.max_window.radius()))]
    fn build(&mut self, cancel: &CancelToken) -> Result<NeighborTable, SearchError> {
        let start = Instant::now();
        let store = self.cache.store();
        let n = store.len();
        let len = store.view(0).len();
        let mut table = NeighborTable::new(n, self.max_window);
        let mut assessors: Vec<LazyPairAssessor> =
            (0..n).map(|i| LazyPairAssessor::new(i, i + 1)).collect();
        let mut order: Vec<usize> = Vec::with_capacity(n);

        for current in 1..n {
            cancel.check()?;
            for (previous, assessor) in assessors.iter_mut().enumerate().take(current) {
                assessor.reset(previous, current);
            }

            for w in (0..=self.max_window.radius()).rev() {
                let window = Window::new(w);

                if table.get(window, current).is_settled() {
                    for (previous, assessor) in assessors.iter_mut().enumerate().take(current) {
                        let to_beat = table.get(window, previous).to_beat(current);
                        if let Refinement::NewBest(outcome) =
                            assessor.try_to_beat(to_beat, window, &mut self.cache)
                        {
                            table.replace(window, previous, current, &outcome);
                        }
                    }
                    continue;
                }

                order.clear();
                order.extend(0..current);
                order.sort_by(|&x, &y| {
                    assessors[x]
                        .ranking_key(len)
                        .total_cmp(&assessors[y].ranking_key(len))
                        .then(x.cmp(&y))
                });

                for &previous in &order {
                    let assessor = &mut assessors[previous];

                    let to_beat = table.get(window, current).to_beat(previous);
                    if let Refinement::NewBest(outcome) =
                        assessor.try_to_beat(to_beat, window, &mut self.cache)
                    {
                        table.replace(window, current, previous, &outcome);
                    }

                    let to_beat = table.get(window, previous).to_beat(current);
                    if let Refinement::NewBest(outcome) =
                        assessor.try_to_beat(to_beat, window, &mut self.cache)
                    {
                        table.replace(window, previous, current, &outcome);
                    }
                }

                table.settle_down_from(window, current);
            }
            debug!(current, "sequence added to neighbour table");
        }
        table.settle_all(0);

        info!(
            n,
            windows = self.max_window.radius() + 1,
            envelopes = self.cache.cached_envelopes(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "neighbour table built"
        );
        Ok(table)
    }
}
