//! Nearest-neighbour evaluation strategies.
//!
//! Every strategy returns, for each training sequence, its leave-one-out nearest
//! neighbour at a window: the minimum of `(cost, index)` over all other sequences.
//! They differ only in how much work they avoid.

mod cascading;
mod early_abandon;
mod naive;
mod propagation;

use std::fmt;
use std::str::FromStr;

use warpsearch_dtw::Window;

use crate::driver::CancelToken;
use crate::error::SearchError;
use crate::neighbor::Neighbor;
use crate::store::SequenceStore;

use cascading::Cascading;
use early_abandon::EarlyAbandon;
use naive::Naive;
use propagation::Propagation;

/// How nearest neighbours are found for each window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Full DTW against every other sequence.
    Naive,
    /// LB_Keogh prefilter, then DTW pruned by the best-so-far and by the pair's
    /// cost at a smaller window.
    Cascading,
    /// Per pair: LB_Kim, LB_Keogh both ways, then early-abandoned DTW.
    EarlyAbandon,
    /// Build neighbours for all windows at once, largest first, reusing each
    /// exact cost across the windows where it provably holds.
    #[default]
    Propagation,
}

impl Strategy {
    /// All strategies, cheapest to implement first.
    pub const ALL: [Strategy; 4] = [
        Strategy::Naive,
        Strategy::Cascading,
        Strategy::EarlyAbandon,
        Strategy::Propagation,
    ];

    /// Return the command-line name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Naive => "naive",
            Strategy::Cascading => "cascading",
            Strategy::EarlyAbandon => "early-abandon",
            Strategy::Propagation => "propagation",
        }
    }

    /// Return true if the strategy's envelope bounds need equal-length sequences.
    #[must_use]
    pub fn needs_equal_lengths(self) -> bool {
        !matches!(self, Strategy::Naive)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "naive" => Ok(Strategy::Naive),
            "cascading" => Ok(Strategy::Cascading),
            "early-abandon" | "ucr" => Ok(Strategy::EarlyAbandon),
            "propagation" | "fastwws" => Ok(Strategy::Propagation),
            _ => Err(SearchError::UnknownStrategy { name: s.to_string() }),
        }
    }
}

/// Per-session state of the selected strategy.
#[derive(Debug)]
pub(crate) enum Evaluator<'a> {
    Naive(Naive<'a>),
    Cascading(Cascading<'a>),
    EarlyAbandon(EarlyAbandon<'a>),
    Propagation(Propagation<'a>),
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(strategy: Strategy, store: &'a SequenceStore, max_window: Window) -> Self {
        match strategy {
            Strategy::Naive => Evaluator::Naive(Naive::new(store)),
            Strategy::Cascading => Evaluator::Cascading(Cascading::new(store)),
            Strategy::EarlyAbandon => Evaluator::EarlyAbandon(EarlyAbandon::new(store)),
            Strategy::Propagation => Evaluator::Propagation(Propagation::new(store, max_window)),
        }
    }

    /// Leave-one-out nearest neighbour of every sequence at `window`.
    pub(crate) fn neighbors(
        &mut self,
        window: Window,
        cancel: &CancelToken,
    ) -> Result<Vec<Option<Neighbor>>, SearchError> {
        match self {
            Evaluator::Naive(naive) => naive.neighbors(window, cancel),
            Evaluator::Cascading(cascading) => cascading.neighbors(window, cancel),
            Evaluator::EarlyAbandon(early) => early.neighbors(window, cancel),
            Evaluator::Propagation(propagation) => propagation.neighbors(window, cancel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.name().parse::<Strategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn parsing_accepts_aliases_and_case() {
        assert_eq!("EARLY_ABANDON".parse::<Strategy>().unwrap(), Strategy::EarlyAbandon);
        assert_eq!("FastWWS".parse::<Strategy>().unwrap(), Strategy::Propagation);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "quantum".parse::<Strategy>().unwrap_err();
        assert!(matches!(err, SearchError::UnknownStrategy { ref name } if name == "quantum"));
    }

    #[test]
    fn only_naive_accepts_unequal_lengths() {
        assert!(!Strategy::Naive.needs_equal_lengths());
        assert!(Strategy::Propagation.needs_equal_lengths());
        assert_eq!(Strategy::default(), Strategy::Propagation);
    }
}
