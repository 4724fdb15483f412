//! Indicator engine — pure functions from a bar series to derived series.
//!
//! Each indicator lives in its own module and produces a `Vec<f64>` that is
//! index-aligned with the input bars, NaN during warm-up. `compute` zips
//! them into one `IndicatorSnapshot` per bar; a snapshot whose fields are
//! all finite is "complete" and usable by the signal detector.
//!
//! # Look-ahead guard
//! No indicator value at bar t may depend on price data from bar t+1 or
//! later. This is what lets the backtester precompute the full series once
//! and index into it as the replay cursor advances.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod stochastic;

pub use ema::{ema_of_series, sma_of_series};
pub use macd::macd;
pub use rsi::rsi;
pub use stochastic::{raw_percent_k, stochastic};

use crate::config::ScanConfig;
use crate::domain::PriceBar;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All derived indicator values for one bar.
///
/// Warm-up snapshots exist (the vector is index-aligned with the bars) but
/// carry NaN fields — undefined, never zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub timestamp: NaiveDateTime,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub rsi: f64,
    pub macd_line: f64,
    pub macd_signal: f64,
}

impl IndicatorSnapshot {
    /// True once every indicator has cleared its warm-up at this index.
    pub fn is_complete(&self) -> bool {
        !(self.stoch_k.is_nan()
            || self.stoch_d.is_nan()
            || self.rsi.is_nan()
            || self.macd_line.is_nan()
            || self.macd_signal.is_nan())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum IndicatorError {
    #[error("insufficient data: {got} bars supplied, {required} required for indicator warm-up")]
    InsufficientData { required: usize, got: usize },
}

/// Compute one snapshot per bar. Fails when the series is shorter than the
/// longest warm-up (`ScanConfig::min_history`); the caller must supply more
/// history rather than retry.
pub fn compute(
    bars: &[PriceBar],
    cfg: &ScanConfig,
) -> Result<Vec<IndicatorSnapshot>, IndicatorError> {
    let required = cfg.min_history();
    if bars.len() < required {
        return Err(IndicatorError::InsufficientData {
            required,
            got: bars.len(),
        });
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let (stoch_k, stoch_d) = stochastic(bars, &cfg.stochastic);
    let rsi_series = rsi(&closes, cfg.rsi.period);
    let (macd_line, macd_signal) = macd(&closes, &cfg.macd);

    Ok(bars
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorSnapshot {
            timestamp: bar.timestamp,
            stoch_k: stoch_k[i],
            stoch_d: stoch_d[i],
            rsi: rsi_series[i],
            macd_line: macd_line[i],
            macd_signal: macd_signal[i],
        })
        .collect())
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev close (or close for the first bar),
/// high = max(open, close) + 1.0, low = min(open, close) - 1.0. Daily bars
/// are spaced one hour apart so the same helper serves trigger-timeframe
/// tests.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                symbol: "TEST".to_string(),
                timestamp: base + chrono::Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Create synthetic bars from explicit (high, low, close) triples.
#[cfg(test)]
pub fn make_bars_hlc(hlc: &[(f64, f64, f64)]) -> Vec<PriceBar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    hlc.iter()
        .enumerate()
        .map(|(i, &(high, low, close))| PriceBar {
            symbol: "TEST".to_string(),
            timestamp: base + chrono::Duration::hours(i as i64),
            open: close,
            high,
            low,
            close,
            volume: 1000,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
