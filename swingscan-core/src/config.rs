//! Typed configuration surface consumed by the core.
//!
//! Every field has a documented default matching the 14-3-3 / 14 / 12-26-9
//! convention of the methodology; the runner deserializes these sections
//! from TOML and passes the whole `ScanConfig` into the core.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Slow Stochastic Oscillator parameters (14-3-3 by default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StochasticConfig {
    /// %K lookback period.
    pub period: usize,
    /// Smoothing applied to raw %K (the "slow" stochastic).
    pub smooth_k: usize,
    /// SMA period for %D over the slow %K.
    pub smooth_d: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for StochasticConfig {
    fn default() -> Self {
        Self {
            period: 14,
            smooth_k: 3,
            smooth_d: 3,
            overbought: 80.0,
            oversold: 20.0,
        }
    }
}

/// RSI parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiConfig {
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            period: 14,
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

/// MACD parameters (12-26-9 by default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdConfig {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

/// Per-trade and portfolio-wide risk limits, as fractions of account size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub max_risk_per_trade: f64,
    pub max_total_risk: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_risk_per_trade: 0.03,
            max_total_risk: 0.06,
        }
    }
}

/// Fibonacci retracement/extension parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FibonacciConfig {
    /// Shallow edge of the retracement zone (fraction of the swing range).
    pub support_zone_low: f64,
    /// Deep edge of the retracement zone.
    pub support_zone_high: f64,
    /// Extension ratio used for the profit target (1.0 = 100% of the swing).
    pub extension_target: f64,
    /// Bars of trend-timeframe history the default swing source scans for
    /// the most recent swing extremes.
    pub swing_window: usize,
    /// Stop buffer beyond the swing extreme, as a fraction of its price.
    pub stop_buffer_pct: f64,
}

impl Default for FibonacciConfig {
    fn default() -> Self {
        Self {
            support_zone_low: 0.50,
            support_zone_high: 0.618,
            extension_target: 1.0,
            swing_window: 20,
            stop_buffer_pct: 0.001,
        }
    }
}

/// Backtest replay parameters. The window itself is passed to `validate`
/// as an explicit [`Window`]; this section carries the knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BacktestConfig {
    /// Sharpe annualization factor. When absent it is derived from the
    /// average number of trades per year over the replay window.
    pub annualization_factor: Option<f64>,
}

/// The full configuration surface recognized by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScanConfig {
    pub stochastic: StochasticConfig,
    pub rsi: RsiConfig,
    pub macd: MacdConfig,
    pub risk: RiskConfig,
    pub fibonacci: FibonacciConfig,
    pub backtest: BacktestConfig,
}

impl ScanConfig {
    /// Bars required before the first complete indicator snapshot exists.
    ///
    /// MACD dominates: its signal line needs `slow + signal` bars of history.
    pub fn min_history(&self) -> usize {
        let macd = self.macd.slow + self.macd.signal;
        let stoch = self.stochastic.period + self.stochastic.smooth_k + self.stochastic.smooth_d;
        let rsi = self.rsi.period + 1;
        macd.max(stoch).max(rsi)
    }
}

/// Replay window on the trigger timeframe, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t <= self.end
    }

    /// Window length in calendar years, used to derive trades-per-year.
    pub fn years(&self) -> f64 {
        let secs = (self.end - self.start).num_seconds().max(0) as f64;
        secs / (365.25 * 24.0 * 3600.0)
    }
}
