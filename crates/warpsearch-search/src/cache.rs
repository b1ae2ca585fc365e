//! Per-session memo of envelopes and summary statistics.

use std::collections::HashMap;

use warpsearch_dtw::{Envelope, SeriesStats, Window};

use crate::store::SequenceStore;

/// Envelopes memoized per `(sequence, window)` plus eagerly computed [`SeriesStats`].
///
/// Lives for one search session. Envelopes of different sequences are independent,
/// so each sequence owns its own map.
#[derive(Debug)]
pub struct EnvelopeCache<'a> {
    store: &'a SequenceStore,
    stats: Vec<SeriesStats>,
    envelopes: Vec<HashMap<Window, Envelope>>,
}

impl<'a> EnvelopeCache<'a> {
    /// Create an empty cache over `store`, computing the statistics of every sequence.
    #[must_use]
    pub fn new(store: &'a SequenceStore) -> Self {
        let stats = (0..store.len())
            .map(|i| SeriesStats::compute(store.view(i)))
            .collect();
        Self {
            store,
            stats,
            envelopes: vec![HashMap::new(); store.len()],
        }
    }

    /// Return the store the cache was built over.
    #[must_use]
    pub fn store(&self) -> &'a SequenceStore {
        self.store
    }

    /// Return the statistics of `sequence`.
    #[must_use]
    pub fn stats(&self, sequence: usize) -> &SeriesStats {
        &self.stats[sequence]
    }

    /// Return the envelope of `sequence` at `window`, computing it on first use.
    pub fn envelope(&mut self, sequence: usize, window: Window) -> &Envelope {
        let store = self.store;
        self.envelopes[sequence]
            .entry(window)
            .or_insert_with(|| Envelope::compute(store.view(sequence), window))
    }

    /// Return true if the envelope of `sequence` at `window` is already memoized.
    #[must_use]
    pub fn contains(&self, sequence: usize, window: Window) -> bool {
        self.envelopes[sequence].contains_key(&window)
    }

    /// Return the number of memoized envelopes.
    #[must_use]
    pub fn cached_envelopes(&self) -> usize {
        self.envelopes.iter().map(HashMap::len).sum()
    }
}
