//! SwingScan Core — dual-timeframe momentum scanner and backtester.
//!
//! The pipeline, in order:
//! - Indicator engine: Slow Stochastic, RSI, MACD as NaN-warm-up series
//! - Signal detector: trend-timeframe bias plus trigger-timeframe crossover
//!   entries, price-located against Fibonacci retracement zones
//! - Pattern analysis: simplified Elliott Wave read of the trend structure,
//!   attached to reports as context
//! - Risk sizer: per-trade and portfolio caps, whole-share floors
//! - Backtest engine: cursor replay with next-bar-open entries and
//!   stop/target touch exits, metrics with `Option`-encoded undefined values
//!
//! Everything here is pure and synchronous; IO, parallelism, and reporting
//! live in the runner crate.

pub mod backtest;
pub mod config;
pub mod domain;
pub mod fib;
pub mod indicators;
pub mod pattern;
pub mod risk;
pub mod signal;

pub use backtest::{BacktestError, BacktestResult, BacktestRun};
pub use config::{ScanConfig, Window};
pub use domain::{Direction, PriceBar, SeriesError, Setup, Trade, TradeOutcome};
pub use fib::{RollingExtremes, Swing, SwingSource};
pub use indicators::{IndicatorError, IndicatorSnapshot};
pub use pattern::{PatternAnalysis, PatternKind, WavePhase};
pub use risk::{PositionSize, RiskError};
pub use signal::{Detection, SignalError};
