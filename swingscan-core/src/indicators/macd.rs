//! MACD (Moving Average Convergence Divergence).
//!
//! MACD line = EMA(fast) - EMA(slow); signal = EMA(signal) of the MACD line.
//! EMAs are SMA-seeded (see `ema_of_series`), so with 12-26-9 defaults the
//! line is valid from index 25 and the signal from index 33.

use super::ema::ema_of_series;
use crate::config::MacdConfig;

/// Compute `(macd_line, signal_line)` over close prices, index-aligned with
/// the input and NaN during warm-up.
pub fn macd(closes: &[f64], cfg: &MacdConfig) -> (Vec<f64>, Vec<f64>) {
    let fast = ema_of_series(closes, cfg.fast);
    let slow = ema_of_series(closes, cfg.slow);

    let line: Vec<f64> = fast
        .iter()
        .zip(&slow)
        .map(|(f, s)| {
            if f.is_nan() || s.is_nan() {
                f64::NAN
            } else {
                f - s
            }
        })
        .collect();

    let signal = ema_of_series(&line, cfg.signal);
    (line, signal)
}
