//! Banded DTW and its lower bounds.
//!
//! Pure math library with zero I/O. Provides validated series, the Sakoe-Chiba
//! [`Window`], a rolling-row [`BoundedDtw`] kernel with early abandoning, seeded
//! pruning and window-validity tracking, the LB_Kim and LB_Keogh lower bounds, and
//! z-normalization / derivative preprocessing.
//!
//! Costs are sums of squared differences throughout; no square root is taken, so
//! every lower bound compares directly against a [`DtwCost`].

mod cost;
mod dtw;
mod envelope;
mod error;
mod kim;
mod preprocess;
mod series;
mod window;

pub use cost::DtwCost;
pub use dtw::{BoundedDtw, DtwOutcome};
pub use envelope::{Envelope, KeoghProgress, lb_keogh};
pub use error::{DerivativeError, DtwError, PreprocessError};
pub use kim::{SeriesStats, lb_kim};
pub use preprocess::{derivative, derivative_batch, z_normalize, z_normalize_batch};
pub use series::{TimeSeries, TimeSeriesView};
pub use window::Window;
