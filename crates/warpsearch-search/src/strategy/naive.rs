use rayon::prelude::*;
use warpsearch_dtw::{BoundedDtw, Window};

use crate::driver::CancelToken;
use crate::error::SearchError;
use crate::neighbor::Neighbor;
use crate::store::SequenceStore;

/// Full banded DTW for every ordered pair. Queries run in parallel.
#[derive(Debug)]
pub(crate) struct Naive<'a> {
    store: &'a SequenceStore,
}

impl<'a> Naive<'a> {
    pub(crate) fn new(store: &'a SequenceStore) -> Self {
        Self { store }
    }

    pub(crate) fn neighbors(
        &mut self,
        window: Window,
        cancel: &CancelToken,
    ) -> Result<Vec<Option<Neighbor>>, SearchError> {
        cancel.check()?;
        let store = self.store;
        let dtw = BoundedDtw::new(window);
        let neighbors = (0..store.len())
            .into_par_iter()
            .map(|query| {
                let mut best: Option<Neighbor> = None;
                for candidate in (0..store.len()).filter(|&c| c != query) {
                    let cost = dtw.cost(store.view(query), store.view(candidate)).cost();
                    if cost.is_finite() && best.is_none_or(|b| cost < b.cost) {
                        best = Some(Neighbor {
                            index: candidate,
                            cost,
                        });
                    }
                }
                best
            })
            .collect();
        Ok(neighbors)
    }
}
