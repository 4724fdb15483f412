//! Backtesting: cursor-driven historical replay plus performance metrics.

pub mod engine;
pub mod metrics;

pub use engine::{replay, run, BacktestError, BacktestRun};
pub use metrics::{summarize, BacktestResult};
