use std::collections::HashMap;

use warpsearch_dtw::{BoundedDtw, DtwOutcome, Window, lb_keogh};

use crate::cache::EnvelopeCache;
use crate::driver::CancelToken;
use crate::error::SearchError;
use crate::neighbor::Neighbor;
use crate::store::SequenceStore;

/// LB_Keogh against the query envelope, then DTW pruned at the smaller of the
/// best-so-far and an upper bound on the pair's cost.
///
/// The upper bound is the pair's exact cost at a smaller window when one was
/// computed earlier in the session, else the diagonal (Euclidean) cost.
#[derive(Debug)]
pub(crate) struct Cascading<'a> {
    cache: EnvelopeCache<'a>,
    // Keyed by (smaller index, larger index).
    seeds: HashMap<(usize, usize), DtwOutcome>,
}

impl<'a> Cascading<'a> {
    pub(crate) fn new(store: &'a SequenceStore) -> Self {
        Self {
            cache: EnvelopeCache::new(store),
            seeds: HashMap::new(),
        }
    }

    pub(crate) fn neighbors(
        &mut self,
        window: Window,
        cancel: &CancelToken,
    ) -> Result<Vec<Option<Neighbor>>, SearchError> {
        let store = self.cache.store();
        let dtw = BoundedDtw::new(window);
        let mut neighbors = Vec::with_capacity(store.len());

        for query in 0..store.len() {
            cancel.check()?;
            let mut best: Option<Neighbor> = None;
            for candidate in (0..store.len()).filter(|&c| c != query) {
                let threshold = best.map_or(f64::INFINITY, |b| b.cost.value());
                let key = (query.min(candidate), query.max(candidate));
                let seed = self.seeds.get(&key).copied();

                let cost = match seed.filter(|s| s.holds_at(window)) {
                    Some(known) => known.cost(),
                    None => {
                        let envelope = self.cache.envelope(query, window);
                        if lb_keogh(store.view(candidate).as_slice(), envelope) >= threshold {
                            continue;
                        }
                        let (a, b) = (store.view(query), store.view(candidate));
                        let upper = seed
                            .filter(|s| s.window() <= window)
                            .or_else(|| BoundedDtw::diagonal(a, b))
                            .map_or(f64::INFINITY, |s| s.cost().value());
                        let outcome = dtw.cost_pruned(a, b, upper, threshold);
                        if outcome.is_exact() {
                            self.seeds.insert(key, outcome);
                        }
                        outcome.cost()
                    }
                };

                if cost.value() < threshold {
                    best = Some(Neighbor {
                        index: candidate,
                        cost,
                    });
                }
            }
            neighbors.push(best);
        }
        Ok(neighbors)
    }
}
