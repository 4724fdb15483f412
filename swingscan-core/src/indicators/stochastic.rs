//! Slow Stochastic Oscillator (14-3-3 convention).
//!
//! Raw %K = 100 * (close - lowest_low(P)) / (highest_high(P) - lowest_low(P)).
//! Slow %K = SMA(raw %K, smooth_k); %D = SMA(slow %K, smooth_d).
//! Zero range (highest_high == lowest_low) → %K = 50, neutral, so a halted
//! or limit-locked stretch never divides by zero.

use super::ema::sma_of_series;
use crate::config::StochasticConfig;
use crate::domain::PriceBar;

/// Compute the slow stochastic. Returns `(slow_k, d)`, both index-aligned
/// with `bars` and NaN during warm-up.
pub fn stochastic(bars: &[PriceBar], cfg: &StochasticConfig) -> (Vec<f64>, Vec<f64>) {
    let raw_k = raw_percent_k(bars, cfg.period);
    let slow_k = sma_of_series(&raw_k, cfg.smooth_k);
    let d = sma_of_series(&slow_k, cfg.smooth_d);
    (slow_k, d)
}

/// Raw %K over the rolling high/low window.
pub fn raw_percent_k(bars: &[PriceBar], period: usize) -> Vec<f64> {
    let n = bars.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &bars[i + 1 - period..=i];
        let mut highest = f64::NEG_INFINITY;
        let mut lowest = f64::INFINITY;
        let mut tainted = false;
        for bar in window {
            if bar.high.is_nan() || bar.low.is_nan() {
                tainted = true;
                break;
            }
            highest = highest.max(bar.high);
            lowest = lowest.min(bar.low);
        }
        if tainted || bars[i].close.is_nan() {
            continue;
        }

        let range = highest - lowest;
        result[i] = if range == 0.0 {
            50.0
        } else {
            100.0 * (bars[i].close - lowest) / range
        };
    }

    result
}
