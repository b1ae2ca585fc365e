//! Nearest-neighbour records and the per-window neighbour table.

use warpsearch_dtw::{DtwCost, DtwOutcome, Window};

use crate::assess::ToBeat;

/// A nearest neighbour: training index and exact DTW cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index of the neighbour in the training store.
    pub index: usize,
    /// Exact DTW cost to the neighbour at the evaluated window.
    pub cost: DtwCost,
}

/// Whether a table entry is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborStatus {
    /// Every sequence processed so far has been compared against the owner.
    Settled,
    /// The owner is still being compared; the neighbour may change.
    Candidate,
}

/// Best neighbour of one sequence at one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestNeighbor {
    neighbor: Option<Neighbor>,
    valid_from: Window,
    status: NeighborStatus,
}

impl BestNeighbor {
    const EMPTY: Self = Self {
        neighbor: None,
        valid_from: Window::new(0),
        status: NeighborStatus::Candidate,
    };

    /// Return the neighbour, if any sequence has been found yet.
    #[must_use]
    pub fn neighbor(&self) -> Option<Neighbor> {
        self.neighbor
    }

    /// Return the smallest window at which the neighbour's cost is unchanged.
    #[must_use]
    pub fn valid_from(&self) -> Window {
        self.valid_from
    }

    /// Return the entry's status.
    #[must_use]
    pub fn status(&self) -> NeighborStatus {
        self.status
    }

    /// Return true once the entry is final.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.status == NeighborStatus::Settled
    }

    /// Threshold `challenger` has to beat to replace this neighbour.
    #[must_use]
    pub fn to_beat(&self, challenger: usize) -> ToBeat {
        ToBeat::against(self.neighbor.map(|n| (n.index, n.cost)), challenger)
    }

    fn replace(&mut self, index: usize, outcome: &DtwOutcome) {
        self.neighbor = Some(Neighbor {
            index,
            cost: outcome.cost(),
        });
        self.valid_from = outcome.valid_from();
    }
}

/// Best neighbours for every window in `[0, max_window]` and every sequence.
///
/// Stored as one flat arena indexed by `window * n + sequence`.
#[derive(Debug, Clone)]
pub struct NeighborTable {
    n: usize,
    max_window: Window,
    entries: Vec<BestNeighbor>,
}

impl NeighborTable {
    /// Create a table of empty candidate entries.
    #[must_use]
    pub fn new(n: usize, max_window: Window) -> Self {
        Self {
            n,
            max_window,
            entries: vec![BestNeighbor::EMPTY; n * (max_window.radius() + 1)],
        }
    }

    /// Return the number of sequences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.n
    }

    /// Return true if the table holds no sequence.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Return the largest window in the table.
    #[must_use]
    pub fn max_window(&self) -> Window {
        self.max_window
    }

    /// Return the entry of `sequence` at `window`.
    #[must_use]
    pub fn get(&self, window: Window, sequence: usize) -> &BestNeighbor {
        &self.entries[self.slot(window, sequence)]
    }

    /// Return the neighbours of every sequence at `window`.
    #[must_use]
    pub fn neighbors(&self, window: Window) -> Vec<Option<Neighbor>> {
        let start = self.slot(window, 0);
        self.entries[start..start + self.n]
            .iter()
            .map(BestNeighbor::neighbor)
            .collect()
    }

    /// Replace the neighbour of `sequence` at `window`, keeping its status.
    pub(crate) fn replace(
        &mut self,
        window: Window,
        sequence: usize,
        neighbor: usize,
        outcome: &DtwOutcome,
    ) {
        let slot = self.slot(window, sequence);
        self.entries[slot].replace(neighbor, outcome);
    }

    /// Copy the entry of `sequence` at `window` down to every window in
    /// `[valid_from, window]` and mark all of them settled.
    pub(crate) fn settle_down_from(&mut self, window: Window, sequence: usize) {
        let best = *self.get(window, sequence);
        let lowest = if best.neighbor.is_some() {
            best.valid_from.radius()
        } else {
            window.radius()
        };
        for w in lowest..=window.radius() {
            let slot = self.slot(Window::new(w), sequence);
            self.entries[slot] = BestNeighbor {
                status: NeighborStatus::Settled,
                ..best
            };
        }
    }

    /// Mark every entry of `sequence` settled.
    pub(crate) fn settle_all(&mut self, sequence: usize) {
        for w in 0..=self.max_window.radius() {
            let slot = self.slot(Window::new(w), sequence);
            self.entries[slot].status = NeighborStatus::Settled;
        }
    }

    fn slot(&self, window: Window, sequence: usize) -> usize {
        debug_assert!(window <= self.max_window && sequence < self.n);
        window.radius() * self.n + sequence
    }
}
