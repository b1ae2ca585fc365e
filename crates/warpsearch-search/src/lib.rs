//! Best warping window search for 1-NN DTW classification.
//!
//! Given a labelled training set, find the Sakoe-Chiba window that minimizes the
//! leave-one-out 1-NN error. Four interchangeable [`Strategy`] values compute the
//! same per-window neighbours with increasing amounts of work avoided; the
//! [`SearchSession`] sweeps windows in either direction, optionally stopping
//! greedily or on a [`CancelToken`].
//!
//! # Example
//!
//! ```
//! use warpsearch_dtw::TimeSeries;
//! use warpsearch_search::{ClassLabel, SearchConfig, SequenceStore, Strategy};
//!
//! let series = vec![
//!     TimeSeries::new(vec![0.0, 1.0, 0.0, 0.0]).unwrap(),
//!     TimeSeries::new(vec![0.0, 0.0, 1.0, 0.0]).unwrap(),
//!     TimeSeries::new(vec![4.0, 5.0, 4.0, 5.0]).unwrap(),
//!     TimeSeries::new(vec![5.0, 4.0, 5.0, 4.0]).unwrap(),
//! ];
//! let labels = [0, 0, 1, 1].map(ClassLabel::new).to_vec();
//! let store = SequenceStore::new(series, labels).unwrap();
//!
//! let fitted = SearchConfig::new()
//!     .with_strategy(Strategy::Propagation)
//!     .fit(store)
//!     .unwrap();
//! assert_eq!(fitted.result.best_errors, 0);
//! ```

mod assess;
mod cache;
mod classifier;
mod config;
mod confusion;
mod driver;
mod error;
mod neighbor;
mod result;
mod store;
mod strategy;

pub use assess::{AssessState, LazyPairAssessor, PruneReason, Refinement, ToBeat};
pub use cache::EnvelopeCache;
pub use classifier::NearestNeighbor;
pub use config::{FittedSearch, SearchConfig};
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use driver::{CancelToken, Direction, Evaluate, SearchSession, sweep};
pub use error::SearchError;
pub use neighbor::{BestNeighbor, Neighbor, NeighborStatus, NeighborTable};
pub use result::{SearchResult, StopReason, WindowEvaluation, WindowScore};
pub use store::{ClassLabel, SequenceStore};
pub use strategy::Strategy;
