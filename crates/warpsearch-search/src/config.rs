//! Configuration builder for the window search.

use std::time::Duration;

use tracing::info;
use warpsearch_dtw::Window;

use crate::classifier::NearestNeighbor;
use crate::driver::{CancelToken, Direction, SearchSession};
use crate::error::SearchError;
use crate::result::SearchResult;
use crate::store::SequenceStore;
use crate::strategy::Strategy;

/// Configuration for a best-window search.
///
/// Construct via [`SearchConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter    | Default                      |
/// |--------------|------------------------------|
/// | `strategy`   | `Propagation`                |
/// | `direction`  | `Descending`                 |
/// | `greedy`     | `false`                      |
/// | `max_window` | `None` (longest series length) |
/// | `time_limit` | `None`                       |
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    strategy: Strategy,
    direction: Direction,
    greedy: bool,
    max_window: Option<usize>,
    time_limit: Option<Duration>,
}

/// A finished search together with a classifier at the chosen window.
#[derive(Debug, Clone)]
pub struct FittedSearch {
    /// Scores and the selected window.
    pub result: SearchResult,
    /// 1-NN classifier over the training store at [`SearchResult::best_window`].
    pub classifier: NearestNeighbor,
}

impl SearchConfig {
    /// Create a config with the defaults above.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Setters ---

    /// Set the evaluation strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the order in which windows are visited.
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Stop as soon as a window is strictly worse than the best so far.
    #[must_use]
    pub fn with_greedy(mut self, greedy: bool) -> Self {
        self.greedy = greedy;
        self
    }

    /// Set the largest window to search. `None` searches up to the longest series.
    #[must_use]
    pub fn with_max_window(mut self, max_window: Option<usize>) -> Self {
        self.max_window = max_window;
        self
    }

    /// Cancel the search after `limit`, keeping the best window found so far.
    #[must_use]
    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    // --- Getters ---

    /// Return the strategy.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Return the direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Return true if greedy stopping is enabled.
    #[must_use]
    pub fn greedy(&self) -> bool {
        self.greedy
    }

    /// Return the configured maximum window, if any.
    #[must_use]
    pub fn max_window(&self) -> Option<usize> {
        self.max_window
    }

    /// Return the time limit, if any.
    #[must_use]
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    /// Resolve the maximum window against `store`.
    #[must_use]
    pub fn resolved_max_window(&self, store: &SequenceStore) -> Window {
        Window::new(self.max_window.unwrap_or_else(|| store.max_len()))
    }

    /// Run the search with a token built from the configured time limit.
    ///
    /// # Errors
    ///
    /// See [`SearchConfig::search_with_cancel`].
    pub fn search(&self, store: &SequenceStore) -> Result<SearchResult, SearchError> {
        let cancel = match self.time_limit {
            Some(limit) => CancelToken::with_time_limit(limit),
            None => CancelToken::new(),
        };
        self.search_with_cancel(store, &cancel)
    }

    /// Run the search, stopping early if `cancel` fires.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::TooFewSequences`] | fewer than 2 sequences |
    /// | [`SearchError::LengthMismatch`] | unequal lengths with a strategy other than naive |
    /// | [`SearchError::WindowOutOfRange`] | `max_window` exceeds the longest sequence |
    /// | [`SearchError::NothingEvaluated`] | cancelled before any window completed |
    pub fn search_with_cancel(
        &self,
        store: &SequenceStore,
        cancel: &CancelToken,
    ) -> Result<SearchResult, SearchError> {
        let max_window = self.resolved_max_window(store);
        info!(
            n = store.len(),
            strategy = %self.strategy,
            direction = %self.direction,
            greedy = self.greedy,
            max_window = max_window.radius(),
            "starting window search"
        );
        let mut session = SearchSession::new(store, self.strategy, max_window)?;
        session.search(self.direction, self.greedy, cancel)
    }

    /// Search for the best window, then build a classifier at it over `store`.
    ///
    /// # Errors
    ///
    /// See [`SearchConfig::search_with_cancel`].
    pub fn fit(&self, store: SequenceStore) -> Result<FittedSearch, SearchError> {
        let result = self.search(&store)?;
        let classifier = NearestNeighbor::new(store, result.best_window);
        Ok(FittedSearch { result, classifier })
    }
}

#[cfg(test)]
mod tests {
    use warpsearch_dtw::TimeSeries;

    use super::*;
    use crate::store::ClassLabel;

    fn store() -> SequenceStore {
        let series = vec![
            TimeSeries::new(vec![0.0, 1.0, 0.0, 0.0]).unwrap(),
            TimeSeries::new(vec![0.0, 0.0, 1.0, 0.0]).unwrap(),
            TimeSeries::new(vec![5.0, 4.0, 5.0, 4.0]).unwrap(),
            TimeSeries::new(vec![4.0, 5.0, 4.0, 5.0]).unwrap(),
        ];
        let labels = [0, 0, 1, 1].map(ClassLabel::new).to_vec();
        SequenceStore::new(series, labels).unwrap()
    }

    #[test]
    fn defaults() {
        let config = SearchConfig::new();
        assert_eq!(config.strategy(), Strategy::Propagation);
        assert_eq!(config.direction(), Direction::Descending);
        assert!(!config.greedy());
        assert_eq!(config.max_window(), None);
        assert_eq!(config.time_limit(), None);
    }

    #[test]
    fn max_window_defaults_to_longest_series() {
        let store = store();
        assert_eq!(SearchConfig::new().resolved_max_window(&store), Window::new(4));
        let config = SearchConfig::new().with_max_window(Some(2));
        assert_eq!(config.resolved_max_window(&store), Window::new(2));
    }

    #[test]
    fn fit_returns_classifier_at_best_window() {
        let fitted = SearchConfig::new()
            .with_strategy(Strategy::EarlyAbandon)
            .with_direction(Direction::Ascending)
            .fit(store())
            .unwrap();
        assert_eq!(fitted.result.best_errors, 0);
        assert_eq!(fitted.classifier.window(), fitted.result.best_window);
        assert_eq!(fitted.result.scores.len(), 5);
    }

    #[test]
    fn oversized_window_is_rejected() {
        let err = SearchConfig::new()
            .with_max_window(Some(9))
            .search(&store())
            .unwrap_err();
        assert!(matches!(err, SearchError::WindowOutOfRange { window: 9, max: 4 }));
    }
}
