//! Search sessions and the window sweep.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};
use warpsearch_dtw::Window;

use crate::error::SearchError;
use crate::result::{SearchResult, StopReason, WindowEvaluation, WindowScore};
use crate::store::SequenceStore;
use crate::strategy::{Evaluator, Strategy};

// ── Cancellation ───────────────────────────────────────────────────────────

/// Cooperative cancellation shared between a running search and its owner.
///
/// Fires when [`CancelToken::cancel`] is called on any clone or once the
/// optional deadline passes. Checked before each window and between sequences
/// inside a window.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Create a token that only fires when cancelled explicitly.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token that also fires `limit` from now.
    #[must_use]
    pub fn with_time_limit(limit: Duration) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Some(Instant::now() + limit),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Return true once cancellation was requested or the deadline passed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Return [`SearchError::Cancelled`] if the token fired.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::Cancelled`] | the token fired |
    pub fn check(&self) -> Result<(), SearchError> {
        if self.is_cancelled() {
            Err(SearchError::Cancelled)
        } else {
            Ok(())
        }
    }
}

// ── Direction ──────────────────────────────────────────────────────────────

/// Order in which windows are visited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// From window 0 up to the maximum.
    Ascending,
    /// From the maximum down to window 0.
    #[default]
    Descending,
}

impl Direction {
    /// Return the command-line name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Direction::Ascending => "ascending",
            Direction::Descending => "descending",
        }
    }

    fn windows(self, max_window: Window) -> Box<dyn Iterator<Item = Window>> {
        let range = 0..=max_window.radius();
        match self {
            Direction::Ascending => Box::new(range.map(Window::new)),
            Direction::Descending => Box::new(range.rev().map(Window::new)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Direction {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Direction::Ascending),
            "desc" | "descending" => Ok(Direction::Descending),
            _ => Err(SearchError::UnknownDirection { name: s.to_string() }),
        }
    }
}

// ── Evaluation seam ────────────────────────────────────────────────────────

/// Anything that can score a window. The sweep only sees this trait.
pub trait Evaluate {
    /// Leave-one-out 1-NN evaluation at `window`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Cancelled`] when `cancel` fires mid-evaluation, or
    /// any other error the evaluator reports.
    fn evaluate(
        &mut self,
        window: Window,
        cancel: &CancelToken,
    ) -> Result<WindowEvaluation, SearchError>;
}

/// Visit windows in `direction`, keeping the one with the fewest errors.
///
/// Error counts are compared as integers and a later window replaces the best
/// only when strictly better. In greedy mode the sweep stops at the first window
/// whose count is strictly worse than the best so far.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`SearchError::NothingEvaluated`] | cancelled before any window completed |
/// | any other | propagated from the evaluator |
#[instrument(level = "debug", skip(evaluator, cancel))]
pub fn sweep<E: Evaluate + ?Sized>(
    evaluator: &mut E,
    max_window: Window,
    direction: Direction,
    greedy: bool,
    cancel: &CancelToken,
) -> Result<SearchResult, SearchError> {
    let mut scores: Vec<WindowScore> = Vec::new();
    let mut best: Option<(Window, usize, f64)> = None;
    let mut n = 0;
    let mut stop = StopReason::Exhausted;

    for window in direction.windows(max_window) {
        if cancel.is_cancelled() {
            stop = StopReason::Cancelled;
            break;
        }
        let start = Instant::now();
        let evaluation = match evaluator.evaluate(window, cancel) {
            Ok(evaluation) => evaluation,
            Err(SearchError::Cancelled) => {
                stop = StopReason::Cancelled;
                break;
            }
            Err(e) => return Err(e),
        };
        let score = WindowScore {
            window,
            errors: evaluation.errors,
            error_rate: evaluation.error_rate(),
            elapsed: start.elapsed(),
        };
        n = evaluation.n;
        debug!(
            %window,
            errors = score.errors,
            error_rate = score.error_rate,
            elapsed_ms = score.elapsed.as_millis() as u64,
            "window evaluated"
        );
        scores.push(score);

        let best_errors = best.map(|(_, errors, _)| errors);
        if best_errors.is_none_or(|errors| score.errors < errors) {
            best = Some((window, score.errors, score.error_rate));
        } else if greedy && best_errors.is_some_and(|errors| score.errors > errors) {
            stop = StopReason::GreedyStop;
            break;
        }
    }

    let Some((best_window, best_errors, best_error_rate)) = best else {
        warn!("search cancelled before any window was evaluated");
        return Err(SearchError::NothingEvaluated);
    };
    if stop == StopReason::Cancelled {
        warn!(evaluated = scores.len(), "search cancelled, returning best so far");
    }
    info!(
        best_window = best_window.radius(),
        best_errors,
        best_error_rate,
        evaluated = scores.len(),
        stop = %stop,
        "window search finished"
    );

    Ok(SearchResult {
        best_window,
        best_errors,
        best_error_rate,
        n,
        scores,
        completed: stop != StopReason::Cancelled,
        stop,
    })
}

// ── Session ────────────────────────────────────────────────────────────────

/// A training store bound to a strategy and a window range.
///
/// Owns the strategy's caches, so repeated evaluations (in any order) reuse
/// envelopes and, for the propagation strategy, the whole neighbour table.
#[derive(Debug)]
pub struct SearchSession<'a> {
    store: &'a SequenceStore,
    strategy: Strategy,
    max_window: Window,
    evaluator: Evaluator<'a>,
}

impl<'a> SearchSession<'a> {
    /// Bind `store` to `strategy` for windows `0..=max_window`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::TooFewSequences`] | fewer than 2 sequences |
    /// | [`SearchError::LengthMismatch`] | unequal lengths with a strategy other than naive |
    /// | [`SearchError::WindowOutOfRange`] | `max_window` exceeds the longest sequence |
    pub fn new(
        store: &'a SequenceStore,
        strategy: Strategy,
        max_window: Window,
    ) -> Result<Self, SearchError> {
        if store.len() < 2 {
            return Err(SearchError::TooFewSequences {
                found: store.len(),
                required: 2,
            });
        }
        if strategy.needs_equal_lengths()
            && let Some((index, len)) = store.first_length_mismatch()
        {
            return Err(SearchError::LengthMismatch {
                strategy,
                index,
                len,
                expected: store.view(0).len(),
            });
        }
        if max_window.radius() > store.max_len() {
            return Err(SearchError::WindowOutOfRange {
                window: max_window.radius(),
                max: store.max_len(),
            });
        }
        debug!(n = store.len(), %strategy, max_window = max_window.radius(), "search session created");
        Ok(Self {
            store,
            strategy,
            max_window,
            evaluator: Evaluator::new(strategy, store, max_window),
        })
    }

    /// Return the strategy.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Return the largest window of the session.
    #[must_use]
    pub fn max_window(&self) -> Window {
        self.max_window
    }

    /// Return the training store.
    #[must_use]
    pub fn store(&self) -> &'a SequenceStore {
        self.store
    }

    /// Evaluate one window without a cancel token.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::WindowOutOfRange`] | `window > max_window` |
    pub fn evaluate_window(&mut self, window: Window) -> Result<WindowEvaluation, SearchError> {
        self.evaluate(window, &CancelToken::new())
    }

    /// Sweep every window in `direction`.
    ///
    /// # Errors
    ///
    /// See [`sweep`].
    pub fn search(
        &mut self,
        direction: Direction,
        greedy: bool,
        cancel: &CancelToken,
    ) -> Result<SearchResult, SearchError> {
        let max_window = self.max_window;
        sweep(self, max_window, direction, greedy, cancel)
    }
}

impl Evaluate for SearchSession<'_> {
    fn evaluate(
        &mut self,
        window: Window,
        cancel: &CancelToken,
    ) -> Result<WindowEvaluation, SearchError> {
        if window > self.max_window {
            return Err(SearchError::WindowOutOfRange {
                window: window.radius(),
                max: self.max_window.radius(),
            });
        }
        let neighbors = self.evaluator.neighbors(window, cancel)?;
        Ok(WindowEvaluation::from_neighbors(window, self.store, neighbors))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    /// Returns scripted error counts and records the visiting order.
    struct Scripted {
        errors: HashMap<usize, usize>,
        visited: Vec<usize>,
        cancel_after: Option<(usize, CancelToken)>,
    }

    impl Scripted {
        fn new(errors: &[(usize, usize)]) -> Self {
            Self {
                errors: errors.iter().copied().collect(),
                visited: Vec::new(),
                cancel_after: None,
            }
        }
    }

    impl Evaluate for Scripted {
        fn evaluate(
            &mut self,
            window: Window,
            _cancel: &CancelToken,
        ) -> Result<WindowEvaluation, SearchError> {
            self.visited.push(window.radius());
            if let Some((count, token)) = &self.cancel_after
                && self.visited.len() >= *count
            {
                token.cancel();
            }
            Ok(WindowEvaluation {
                window,
                errors: self.errors[&window.radius()],
                n: 10,
                neighbors: Vec::new(),
            })
        }
    }

    #[test]
    fn descending_keeps_first_of_tied_windows() {
        let mut eval = Scripted::new(&[(0, 5), (1, 2), (2, 2), (3, 4)]);
        let result = sweep(&mut eval, Window::new(3), Direction::Descending, false, &CancelToken::new()).unwrap();
        assert_eq!(result.best_window, Window::new(2));
        assert_eq!(result.best_errors, 2);
        assert_eq!(eval.visited, vec![3, 2, 1, 0]);
        assert_eq!(result.stop, StopReason::Exhausted);
        assert!(result.completed);
    }

    #[test]
    fn ascending_keeps_first_of_tied_windows() {
        let mut eval = Scripted::new(&[(0, 5), (1, 2), (2, 2), (3, 4)]);
        let result = sweep(&mut eval, Window::new(3), Direction::Ascending, false, &CancelToken::new()).unwrap();
        assert_eq!(result.best_window, Window::new(1));
        assert_eq!(result.scores.len(), 4);
        assert!((result.best_error_rate - 0.2).abs() < 1e-12);
    }

    #[test]
    fn greedy_stops_when_errors_rise() {
        let mut eval = Scripted::new(&[(0, 1), (1, 3), (2, 3), (3, 2), (4, 6)]);
        let result = sweep(&mut eval, Window::new(4), Direction::Ascending, true, &CancelToken::new()).unwrap();
        assert_eq!(result.best_window, Window::new(0));
        assert_eq!(eval.visited, vec![0, 1]);
        assert_eq!(result.stop, StopReason::GreedyStop);
        assert!(result.completed);
    }

    #[test]
    fn greedy_continues_through_plateaus() {
        let mut eval = Scripted::new(&[(0, 4), (1, 4), (2, 4), (3, 1)]);
        let result = sweep(&mut eval, Window::new(3), Direction::Ascending, true, &CancelToken::new()).unwrap();
        assert_eq!(result.best_window, Window::new(3));
        assert_eq!(result.stop, StopReason::Exhausted);
    }

    #[test]
    fn cancellation_returns_best_so_far() {
        let token = CancelToken::new();
        let mut eval = Scripted::new(&[(0, 4), (1, 1), (2, 3), (3, 0)]);
        eval.cancel_after = Some((2, token.clone()));
        let result = sweep(&mut eval, Window::new(3), Direction::Ascending, false, &token).unwrap();
        assert_eq!(result.best_window, Window::new(1));
        assert_eq!(result.scores.len(), 2);
        assert_eq!(result.stop, StopReason::Cancelled);
        assert!(!result.completed);
    }

    #[test]
    fn cancelling_before_the_first_window_evaluates_nothing() {
        let token = CancelToken::new();
        token.cancel();
        let mut eval = Scripted::new(&[(0, 0)]);
        let err = sweep(&mut eval, Window::new(0), Direction::Ascending, false, &token).unwrap_err();
        assert!(matches!(err, SearchError::NothingEvaluated));
        assert!(eval.visited.is_empty());
    }

    #[test]
    fn expired_deadline_cancels() {
        let token = CancelToken::with_time_limit(Duration::ZERO);
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(SearchError::Cancelled)));
        assert!(CancelToken::new().check().is_ok());
    }

    #[test]
    fn direction_parses_short_and_long_names() {
        assert_eq!("asc".parse::<Direction>().unwrap(), Direction::Ascending);
        assert_eq!("Descending".parse::<Direction>().unwrap(), Direction::Descending);
        assert!(matches!(
            "sideways".parse::<Direction>(),
            Err(SearchError::UnknownDirection { .. })
        ));
    }
}
