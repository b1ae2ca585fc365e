//! Incremental, lower-bound-first comparison of one pair of training sequences.
//!
//! A [`LazyPairAssessor`] answers "does this pair beat the current threshold at
//! this window?" doing as little work as possible: LB_Kim first, then LB_Keogh in
//! each direction (resumable, stopping as soon as the partial sum prunes), then
//! banded DTW abandoned at the threshold. Everything learned survives between
//! calls, and a result computed at one window is reused at every window where it
//! provably still holds.

use warpsearch_dtw::{BoundedDtw, DtwCost, DtwOutcome, KeoghProgress, Window, lb_kim};

use crate::cache::EnvelopeCache;

/// Work units charged to an LB_Kim bound when ranking challengers.
const KIM_WORK: f64 = 4.0;

/// Discount applied to an exact cost inherited from a wider window when ranking.
const INHERITED_DTW_DISCOUNT: f64 = 0.8;

// ── Thresholds ─────────────────────────────────────────────────────────────

/// The value a challenger has to beat to replace an incumbent nearest neighbour.
///
/// Neighbours are ordered by `(cost, index)`: an equal cost wins only when the
/// challenger has the smaller index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToBeat {
    cost: f64,
    ties_win: bool,
}

impl ToBeat {
    /// No incumbent: any finite cost wins.
    pub const UNBEATEN: Self = Self {
        cost: f64::INFINITY,
        ties_win: false,
    };

    /// Threshold for challenger `challenger` against an incumbent `(index, cost)`.
    #[must_use]
    pub fn against(incumbent: Option<(usize, DtwCost)>, challenger: usize) -> Self {
        match incumbent {
            None => Self::UNBEATEN,
            Some((index, cost)) => Self {
                cost: cost.value(),
                ties_win: challenger < index,
            },
        }
    }

    /// Return the incumbent cost.
    #[must_use]
    pub fn cost(self) -> f64 {
        self.cost
    }

    /// Return true if an exact cost `value` replaces the incumbent.
    #[must_use]
    pub fn beats(self, value: f64) -> bool {
        value.is_finite() && (value < self.cost || (self.ties_win && value == self.cost))
    }

    /// Return true if a lower bound `bound` proves the challenger cannot win.
    #[must_use]
    pub fn prunes(self, bound: f64) -> bool {
        !(bound < self.cost || (self.ties_win && bound == self.cost))
    }
}

// ── Outcomes ───────────────────────────────────────────────────────────────

/// Why a challenger was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneReason {
    /// A lower bound reached the threshold.
    LowerBound,
    /// DTW was computed (or abandoned) and did not beat the threshold.
    Dtw,
}

/// Result of [`LazyPairAssessor::try_to_beat`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Refinement {
    /// The pair beats the threshold; carries the exact outcome at the window.
    NewBest(DtwOutcome),
    /// The pair cannot beat the threshold.
    Pruned(PruneReason),
}

/// Coarse view of how much is known about a pair at its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AssessState {
    /// Nothing computed yet.
    Unassessed,
    /// LB_Kim (and any bound inherited from another window) is known.
    CoarseBounded,
    /// LB_Keogh of the first sequence against the second's envelope is complete.
    OneSidedEnvelope,
    /// LB_Keogh is complete in both directions, or DTW was abandoned.
    TwoSidedEnvelope,
    /// The exact DTW cost at the window is known.
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Unassessed,
    Kim,
    FirstEnvelope,
    BothEnvelopes,
    Exact,
}

/// Knowledge carried over from a wider window that has not been refined since.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inherited {
    Nothing,
    Bound { work: usize },
    Dtw,
}

// ── Assessor ───────────────────────────────────────────────────────────────

/// Lazy, stateful comparison of training sequences `first < second`.
///
/// The pair is unordered: DTW and both LB_Keogh directions are symmetric in use,
/// so the assessor always stores the smaller index first.
#[derive(Debug, Clone)]
pub struct LazyPairAssessor {
    first: usize,
    second: usize,
    window: Option<Window>,
    stage: Stage,
    bound: f64,
    kim: Option<f64>,
    keogh_first: KeoghProgress,
    keogh_second: KeoghProgress,
    exact: Option<DtwOutcome>,
    inherited: Inherited,
}

impl LazyPairAssessor {
    /// Create an assessor for the pair `{a, b}`.
    #[must_use]
    pub fn new(a: usize, b: usize) -> Self {
        debug_assert_ne!(a, b, "a sequence is never its own neighbour");
        Self {
            first: a.min(b),
            second: a.max(b),
            window: None,
            stage: Stage::Unassessed,
            bound: 0.0,
            kim: None,
            keogh_first: KeoghProgress::default(),
            keogh_second: KeoghProgress::default(),
            exact: None,
            inherited: Inherited::Nothing,
        }
    }

    /// Forget everything and start over on the pair `{a, b}`.
    pub fn reset(&mut self, a: usize, b: usize) {
        *self = Self::new(a, b);
    }

    /// Return the pair, smaller index first.
    #[must_use]
    pub fn pair(&self) -> (usize, usize) {
        (self.first, self.second)
    }

    /// Return the best lower bound known at the current window.
    #[must_use]
    pub fn lower_bound(&self) -> f64 {
        self.bound
    }

    /// Return the coarse state at the current window.
    #[must_use]
    pub fn state(&self) -> AssessState {
        match self.stage {
            Stage::Unassessed => AssessState::Unassessed,
            Stage::Kim => AssessState::CoarseBounded,
            Stage::FirstEnvelope => AssessState::OneSidedEnvelope,
            Stage::BothEnvelopes => AssessState::TwoSidedEnvelope,
            Stage::Exact => AssessState::Exact,
        }
    }

    /// Return the exact cost at `window` if an earlier computation proves it.
    #[must_use]
    pub fn exact_cost(&self, window: Window) -> Option<DtwCost> {
        self.exact
            .filter(|outcome| outcome.holds_at(window))
            .map(|outcome| outcome.cost())
    }

    /// Key used to order challengers: small means "cheap to dismiss or likely to win".
    ///
    /// The bound is divided by the work spent obtaining it, so a bound reached after
    /// a few LB_Keogh terms ranks behind an equal bound that needed the full sum.
    #[must_use]
    pub fn ranking_key(&self, len: usize) -> f64 {
        let len = len.max(1) as f64;
        match (self.stage, self.inherited) {
            (Stage::Unassessed, _) => 0.0,
            (Stage::Exact | Stage::FirstEnvelope | Stage::BothEnvelopes, _) => {
                let position = self.keogh_second.position();
                if self.stage == Stage::FirstEnvelope && position > 0 {
                    self.bound / position as f64
                } else {
                    self.bound / len
                }
            }
            (Stage::Kim, Inherited::Dtw) => INHERITED_DTW_DISCOUNT * self.bound / len,
            (Stage::Kim, Inherited::Bound { work }) if work > 0 => self.bound / work as f64,
            (Stage::Kim, _) => match self.keogh_first.position() {
                0 => self.bound / KIM_WORK,
                position => self.bound / position as f64,
            },
        }
    }

    /// Decide whether the pair beats `to_beat` at `window`, refining lazily.
    ///
    /// Returns [`Refinement::NewBest`] with the exact outcome when it does. Work done
    /// here is kept: a later call with a looser threshold resumes where this one
    /// stopped.
    pub fn try_to_beat(
        &mut self,
        to_beat: ToBeat,
        window: Window,
        cache: &mut EnvelopeCache<'_>,
    ) -> Refinement {
        self.move_to(window);
        loop {
            match self.stage {
                Stage::Exact => {
                    let outcome = self.exact.expect("exact stage holds an outcome");
                    return if to_beat.beats(outcome.cost().value()) {
                        Refinement::NewBest(outcome)
                    } else {
                        Refinement::Pruned(PruneReason::Dtw)
                    };
                }
                _ if to_beat.prunes(self.bound) => {
                    return Refinement::Pruned(PruneReason::LowerBound);
                }
                Stage::Unassessed => {
                    let kim = match self.kim {
                        Some(kim) => kim,
                        None => lb_kim(cache.stats(self.first), cache.stats(self.second)),
                    };
                    self.kim = Some(kim);
                    self.raise(kim);
                    self.stage = Stage::Kim;
                }
                Stage::Kim | Stage::FirstEnvelope if !self.has_equal_lengths(cache) => {
                    self.stage = Stage::BothEnvelopes;
                }
                Stage::Kim => {
                    if self.advance_keogh(true, to_beat, window, cache) {
                        self.stage = Stage::FirstEnvelope;
                    }
                    if to_beat.prunes(self.bound) {
                        return Refinement::Pruned(PruneReason::LowerBound);
                    }
                }
                Stage::FirstEnvelope => {
                    if self.advance_keogh(false, to_beat, window, cache) {
                        self.stage = Stage::BothEnvelopes;
                    }
                    if to_beat.prunes(self.bound) {
                        return Refinement::Pruned(PruneReason::LowerBound);
                    }
                }
                Stage::BothEnvelopes => {
                    if let Some(rejected) = self.run_dtw(to_beat, window, cache) {
                        return rejected;
                    }
                }
            }
        }
    }

    fn raise(&mut self, bound: f64) {
        if bound > self.bound {
            self.bound = bound;
        }
    }

    fn has_equal_lengths(&self, cache: &EnvelopeCache<'_>) -> bool {
        cache.stats(self.first).len() == cache.stats(self.second).len()
    }

    /// Accumulate LB_Keogh of one sequence against the other's envelope until it
    /// prunes or completes. Returns true once complete.
    fn advance_keogh(
        &mut self,
        first_against_second: bool,
        to_beat: ToBeat,
        window: Window,
        cache: &mut EnvelopeCache<'_>,
    ) -> bool {
        let store = cache.store();
        let (series, owner) = if first_against_second {
            (self.first, self.second)
        } else {
            (self.second, self.first)
        };
        let envelope = cache.envelope(owner, window);
        let progress = if first_against_second {
            &mut self.keogh_first
        } else {
            &mut self.keogh_second
        };
        let complete = progress.advance(store.view(series).as_slice(), envelope, |sum| {
            to_beat.prunes(sum)
        });
        let sum = progress.sum();
        self.inherited = Inherited::Nothing;
        self.raise(sum);
        complete
    }

    /// Run banded DTW abandoned at the threshold. Returns `None` once the exact cost
    /// is stored, or the rejection when the run was abandoned.
    fn run_dtw(
        &mut self,
        to_beat: ToBeat,
        window: Window,
        cache: &EnvelopeCache<'_>,
    ) -> Option<Refinement> {
        let store = cache.store();
        let seed = self
            .exact
            .filter(|outcome| outcome.window() <= window)
            .map_or(f64::INFINITY, |outcome| outcome.cost().value());
        let outcome = BoundedDtw::new(window).cost_pruned(
            store.view(self.first),
            store.view(self.second),
            seed,
            to_beat.cost(),
        );
        self.inherited = Inherited::Nothing;
        if outcome.is_exact() {
            debug_assert!(
                self.bound <= outcome.cost().value() * (1.0 + 1e-9) + 1e-12,
                "lower bound {} exceeds exact cost {}",
                self.bound,
                outcome.cost()
            );
            self.exact = Some(outcome);
            self.bound = outcome.cost().value();
            self.stage = Stage::Exact;
            None
        } else {
            // Abandoned: the cost is strictly above the threshold.
            self.raise(to_beat.cost());
            Some(Refinement::Pruned(PruneReason::Dtw))
        }
    }

    /// Re-target the assessor at `window`, keeping whatever still holds there.
    fn move_to(&mut self, window: Window) {
        let Some(current) = self.window.replace(window) else {
            return;
        };
        if current == window {
            return;
        }
        let work = match self.stage {
            Stage::FirstEnvelope | Stage::BothEnvelopes => self.keogh_second.position(),
            _ => self.keogh_first.position(),
        };
        self.keogh_first = KeoghProgress::default();
        self.keogh_second = KeoghProgress::default();

        if let Some(outcome) = self.exact
            && outcome.holds_at(window)
        {
            self.stage = Stage::Exact;
            self.bound = outcome.cost().value();
            self.inherited = Inherited::Nothing;
            return;
        }

        if window < current {
            // A narrower band cannot lower the cost: every bound still holds.
            self.inherited = if self.stage == Stage::Exact {
                Inherited::Dtw
            } else {
                Inherited::Bound { work }
            };
        } else {
            // Envelope bounds were for a narrower band; only LB_Kim survives.
            self.bound = self.kim.unwrap_or(0.0);
            self.inherited = Inherited::Nothing;
            if let Some(outcome) = self.exact
                && outcome.is_exact()
                && outcome.window() >= window
            {
                self.raise(outcome.cost().value());
                self.inherited = Inherited::Dtw;
            }
        }
        self.stage = if self.kim.is_some() {
            Stage::Kim
        } else {
            Stage::Unassessed
        };
    }
}
