use warpsearch_dtw::Window;

use crate::assess::{LazyPairAssessor, Refinement, ToBeat};
use crate::cache::EnvelopeCache;
use crate::driver::CancelToken;
use crate::error::SearchError;
use crate::neighbor::Neighbor;
use crate::store::SequenceStore;

/// UCR-suite cascade per pair: LB_Kim, LB_Keogh both ways, early-abandoned DTW.
///
/// Windows are independent apart from the shared envelope cache.
#[derive(Debug)]
pub(crate) struct EarlyAbandon<'a> {
    cache: EnvelopeCache<'a>,
}

impl<'a> EarlyAbandon<'a> {
    pub(crate) fn new(store: &'a SequenceStore) -> Self {
        Self {
            cache: EnvelopeCache::new(store),
        }
    }

    pub(crate) fn neighbors(
        &mut self,
        window: Window,
        cancel: &CancelToken,
    ) -> Result<Vec<Option<Neighbor>>, SearchError> {
        let n = self.cache.store().len();
        let mut neighbors = Vec::with_capacity(n);

        for query in 0..n {
            cancel.check()?;
            let mut best: Option<Neighbor> = None;
            for candidate in (0..n).filter(|&c| c != query) {
                let to_beat = ToBeat::against(best.map(|b| (b.index, b.cost)), candidate);
                let mut assessor = LazyPairAssessor::new(query, candidate);
                if let Refinement::NewBest(outcome) =
                    assessor.try_to_beat(to_beat, window, &mut self.cache)
                {
                    best = Some(Neighbor {
                        index: candidate,
                        cost: outcome.cost(),
                    });
                }
            }
            neighbors.push(best);
        }
        Ok(neighbors)
    }
}
