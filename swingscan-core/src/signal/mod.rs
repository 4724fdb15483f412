//! Signal detection: timeframe alignment, crossover predicates, and the
//! dual-timeframe setup detector.

pub mod align;
pub mod crossover;
pub mod detector;

pub use align::{align_timeframes, AlignedPoint};
pub use crossover::{
    crossed_above, crossed_above_threshold, crossed_below, crossed_below_threshold,
};
pub use detector::{
    detect_all, evaluate_point, evaluate_today, Detection, Evaluation, SignalError,
    TimeframeSeries,
};
