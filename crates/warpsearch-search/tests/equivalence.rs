//! Cross-strategy regression tests for warpsearch-search.
//!
//! Every strategy must return the same nearest neighbour (index and exact cost)
//! for every sequence at every window, whatever order windows are evaluated in.
//! Scenario tests pin down the sweep's tie-breaking and stopping rules.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use warpsearch_dtw::{BoundedDtw, TimeSeries, Window};
use warpsearch_search::{
    CancelToken, ClassLabel, Direction, Evaluate, SearchConfig, SearchError, SearchSession,
    SequenceStore, StopReason, Strategy, WindowEvaluation, sweep,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ts(values: Vec<f64>) -> TimeSeries {
    TimeSeries::new(values).expect("valid test series")
}

fn store(series: Vec<TimeSeries>, labels: &[usize]) -> SequenceStore {
    let labels = labels.iter().copied().map(ClassLabel::new).collect();
    SequenceStore::new(series, labels).expect("valid store")
}

/// Noisy, randomly shifted bumps whose position depends on the class.
fn bumps(seed: u64, n: usize, len: usize, n_classes: usize) -> SequenceStore {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut series = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let class = i % n_classes;
        let centre = (class + 1) * len / (n_classes + 1);
        let shift: i64 = rng.gen_range(-3..=3);
        let centre = (centre as i64 + shift).clamp(0, len as i64 - 1) as f64;
        let values = (0..len)
            .map(|t| {
                let d = (t as f64 - centre) / 2.0;
                (-d * d).exp() + rng.gen_range(-0.15..0.15)
            })
            .collect();
        series.push(ts(values));
        labels.push(class);
    }
    store(series, &labels)
}

fn all_windows(store: &SequenceStore, strategy: Strategy, windows: &[usize]) -> Vec<WindowEvaluation> {
    let max = *windows.iter().max().expect("at least one window");
    let mut session = SearchSession::new(store, strategy, Window::new(max)).expect("valid session");
    windows
        .iter()
        .map(|&w| session.evaluate_window(Window::new(w)).expect("evaluation"))
        .collect()
}

fn assert_same(expected: &[WindowEvaluation], got: &[WindowEvaluation], strategy: Strategy) {
    for (e, g) in expected.iter().zip(got) {
        assert_eq!(e.window, g.window);
        assert_eq!(e.errors, g.errors, "{strategy} errors at {}", e.window);
        for (i, (a, b)) in e.neighbors.iter().zip(&g.neighbors).enumerate() {
            assert_eq!(a, b, "{strategy}: neighbour of {i} at {}", e.window);
        }
    }
}

// ---------------------------------------------------------------------------
// a) strategy equivalence
// ---------------------------------------------------------------------------

#[test]
fn strategies_agree_on_every_window() {
    for seed in [1, 2, 3] {
        let store = bumps(seed, 15, 20, 3);
        let windows: Vec<usize> = (0..=20).collect();
        let naive = all_windows(&store, Strategy::Naive, &windows);
        for strategy in [Strategy::Cascading, Strategy::EarlyAbandon, Strategy::Propagation] {
            assert_same(&naive, &all_windows(&store, strategy, &windows), strategy);
        }
    }
}

#[test]
fn strategies_agree_in_any_window_order() {
    let store = bumps(5, 12, 16, 2);
    let mut windows: Vec<usize> = (0..=16).collect();
    windows.shuffle(&mut ChaCha8Rng::seed_from_u64(99));
    let naive = all_windows(&store, Strategy::Naive, &windows);
    for strategy in Strategy::ALL {
        assert_same(&naive, &all_windows(&store, strategy, &windows), strategy);
    }
}

#[test]
fn neighbour_costs_are_exact() {
    let store = bumps(8, 10, 14, 2);
    for evaluation in all_windows(&store, Strategy::Propagation, &[0, 2, 5, 14]) {
        let dtw = BoundedDtw::new(evaluation.window);
        for (i, nn) in evaluation.neighbors.iter().enumerate() {
            let nn = nn.expect("equal lengths always have a neighbour");
            let cost = dtw.cost(store.view(i), store.view(nn.index)).cost();
            assert_eq!(cost, nn.cost, "sequence {i} at {}", evaluation.window);
        }
    }
}

#[test]
fn ties_resolve_to_the_smaller_index() {
    // Sequences 1, 2 and 4 are copies: each copy's nearest is the other copy with the smallest index.
    let base = vec![0.0, 1.0, 3.0, 1.0, 0.0, -1.0];
    let other = vec![2.0, 2.0, 0.0, 0.0, 2.0, 2.0];
    let series = vec![
        ts(other.clone()),
        ts(base.clone()),
        ts(base.clone()),
        ts(other.iter().map(|v| v + 0.5).collect()),
        ts(base),
    ];
    let store = store(series, &[0, 1, 1, 0, 1]);
    let windows: Vec<usize> = (0..=6).collect();
    for strategy in Strategy::ALL {
        for evaluation in all_windows(&store, strategy, &windows) {
            let index = |i: usize| evaluation.neighbors[i].map(|n| n.index);
            assert_eq!(index(1), Some(2), "{strategy} at {}", evaluation.window);
            assert_eq!(index(2), Some(1), "{strategy} at {}", evaluation.window);
            assert_eq!(index(4), Some(1), "{strategy} at {}", evaluation.window);
        }
    }
}

#[test]
fn repeated_evaluation_is_idempotent() {
    let store = bumps(13, 10, 12, 2);
    for strategy in Strategy::ALL {
        let mut session = SearchSession::new(&store, strategy, Window::new(12)).unwrap();
        let first = session.evaluate_window(Window::new(4)).unwrap();
        session.evaluate_window(Window::new(9)).unwrap();
        let again = session.evaluate_window(Window::new(4)).unwrap();
        assert_eq!(first, again, "{strategy}");
    }
}

// ---------------------------------------------------------------------------
// b) scenarios
// ---------------------------------------------------------------------------

#[test]
fn naive_and_propagation_report_the_same_error_rates() {
    let series = vec![
        ts(vec![0.0, 0.0, 1.0, 2.0, 1.0, 0.0, 0.0, 0.0]),
        ts(vec![0.0, 1.0, 2.0, 1.0, 0.0, 0.0, 0.0, 0.0]),
        ts(vec![0.0, 0.0, 0.0, 0.0, 1.0, -2.0, 1.0, 0.0]),
        ts(vec![0.0, 0.0, 0.0, 1.0, -2.0, 1.0, 0.0, 0.0]),
    ];
    let store = store(series, &[0, 0, 1, 1]);
    let windows = [0, 1, 2, 3];
    let naive = all_windows(&store, Strategy::Naive, &windows);
    let propagation = all_windows(&store, Strategy::Propagation, &windows);
    for (a, b) in naive.iter().zip(&propagation) {
        assert_eq!(a.error_rate(), b.error_rate(), "at {}", a.window);
    }
}

#[test]
fn ascending_search_keeps_window_zero_when_all_windows_tie() {
    let same = vec![0.0, 1.0, 0.5, -1.0, 0.0];
    let mut series: Vec<TimeSeries> = (0..5).map(|_| ts(same.clone())).collect();
    series.push(ts(vec![4.0, -3.0, 6.0, 2.0, -5.0]));
    let store = store(series, &[0, 0, 0, 0, 0, 1]);

    for strategy in Strategy::ALL {
        let result = SearchConfig::new()
            .with_strategy(strategy)
            .with_direction(Direction::Ascending)
            .search(&store)
            .unwrap();
        assert_eq!(result.best_window, Window::new(0), "{strategy}");
        assert_eq!(result.best_errors, 1, "{strategy}");
        assert_eq!(result.scores.len(), 6);
    }
}

#[test]
fn window_zero_is_the_diagonal() {
    let a = ts(vec![1.0, 2.0, 3.0, 4.0]);
    let b = ts(vec![4.0, 3.0, 2.0, 1.0]);
    let cost = BoundedDtw::with_radius(0).cost(a.as_view(), b.as_view()).cost();
    assert_eq!(cost.value(), 9.0 + 1.0 + 1.0 + 9.0);
}

/// Error counts rise monotonically after window 2.
struct Rising {
    visited: Vec<usize>,
}

impl Evaluate for Rising {
    fn evaluate(&mut self, window: Window, _cancel: &CancelToken) -> Result<WindowEvaluation, SearchError> {
        let w = window.radius();
        self.visited.push(w);
        let errors = if w <= 2 { 3 - w } else { w };
        Ok(WindowEvaluation {
            window,
            errors,
            n: 10,
            neighbors: Vec::new(),
        })
    }
}

#[test]
fn greedy_sweep_halts_after_the_first_worse_window() {
    let mut rising = Rising { visited: Vec::new() };
    let result = sweep(&mut rising, Window::new(8), Direction::Ascending, true, &CancelToken::new()).unwrap();
    assert_eq!(result.best_window, Window::new(2));
    assert_eq!(rising.visited, vec![0, 1, 2, 3]);
    assert_eq!(result.stop, StopReason::GreedyStop);
}

// ---------------------------------------------------------------------------
// c) configuration errors and cancellation
// ---------------------------------------------------------------------------

#[test]
fn unequal_lengths_need_the_naive_strategy() {
    let series = vec![
        ts(vec![0.0, 1.0, 2.0, 1.0]),
        ts(vec![0.0, 1.0, 2.0]),
        ts(vec![5.0, 5.0, 5.0, 5.0]),
    ];
    let store = store(series, &[0, 0, 1]);
    for strategy in [Strategy::Cascading, Strategy::EarlyAbandon, Strategy::Propagation] {
        let err = SearchSession::new(&store, strategy, Window::new(2)).unwrap_err();
        assert!(
            matches!(err, SearchError::LengthMismatch { index: 1, len: 3, expected: 4, .. }),
            "{strategy}: {err}"
        );
    }

    let mut session = SearchSession::new(&store, Strategy::Naive, Window::new(2)).unwrap();
    let at_zero = session.evaluate_window(Window::new(0)).unwrap();
    // Sequence 1 only reaches sequence 0 once the band absorbs the length gap.
    assert_eq!(at_zero.neighbors[1], None);
    let at_one = session.evaluate_window(Window::new(1)).unwrap();
    assert_eq!(at_one.neighbors[1].map(|n| n.index), Some(0));
}

#[test]
fn single_sequence_is_rejected() {
    let store = store(vec![ts(vec![1.0, 2.0])], &[0]);
    let err = SearchSession::new(&store, Strategy::Naive, Window::new(1)).unwrap_err();
    assert!(matches!(err, SearchError::TooFewSequences { found: 1, required: 2 }));
}

#[test]
fn window_beyond_the_session_is_rejected() {
    let store = bumps(3, 4, 6, 2);
    let mut session = SearchSession::new(&store, Strategy::EarlyAbandon, Window::new(3)).unwrap();
    let err = session.evaluate_window(Window::new(4)).unwrap_err();
    assert!(matches!(err, SearchError::WindowOutOfRange { window: 4, max: 3 }));
}

#[test]
fn cancelled_search_evaluates_nothing() {
    let store = bumps(4, 6, 8, 2);
    let token = CancelToken::new();
    token.cancel();
    for strategy in Strategy::ALL {
        let err = SearchConfig::new()
            .with_strategy(strategy)
            .search_with_cancel(&store, &token)
            .unwrap_err();
        assert!(matches!(err, SearchError::NothingEvaluated), "{strategy}");
    }
}

#[test]
fn elapsed_time_limit_cancels_the_search() {
    let store = bumps(6, 6, 8, 2);
    let err = SearchConfig::new()
        .with_time_limit(Some(std::time::Duration::ZERO))
        .search(&store)
        .unwrap_err();
    assert!(matches!(err, SearchError::NothingEvaluated));
}
