//! Fibonacci price levels and the swing-detection collaborator seam.
//!
//! The detector treats swing detection as an opaque oracle behind the
//! `SwingSource` trait: given a bar prefix (history up to the evaluation
//! point, never beyond it), return the most recent significant swing.
//! `RollingExtremes` is the default oracle — highest high / lowest low over
//! a trailing window — so the engine runs standalone; a smarter pivot
//! detector can be swapped in without touching the detector.

use crate::config::FibonacciConfig;
use crate::domain::{Direction, PriceBar};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The most recent significant swing: a local high/low pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Swing {
    pub high: f64,
    pub high_time: NaiveDateTime,
    pub low: f64,
    pub low_time: NaiveDateTime,
}

impl Swing {
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Swing-detection oracle. `bars` is always a history prefix ending at the
/// evaluation point.
pub trait SwingSource: Send + Sync {
    fn recent_swing(&self, bars: &[PriceBar]) -> Option<Swing>;
}

/// Default oracle: swing extremes are the highest high and lowest low over
/// the trailing `window` bars.
#[derive(Debug, Clone)]
pub struct RollingExtremes {
    window: usize,
}

impl RollingExtremes {
    pub fn new(window: usize) -> Self {
        assert!(window >= 2, "swing window must span at least 2 bars");
        Self { window }
    }
}

impl SwingSource for RollingExtremes {
    fn recent_swing(&self, bars: &[PriceBar]) -> Option<Swing> {
        if bars.len() < self.window {
            return None;
        }
        let window = &bars[bars.len() - self.window..];

        let mut high = f64::NEG_INFINITY;
        let mut high_time = window[0].timestamp;
        let mut low = f64::INFINITY;
        let mut low_time = window[0].timestamp;

        for bar in window {
            if bar.high.is_nan() || bar.low.is_nan() {
                return None;
            }
            if bar.high > high {
                high = bar.high;
                high_time = bar.timestamp;
            }
            if bar.low < low {
                low = bar.low;
                low_time = bar.timestamp;
            }
        }
        if high > low {
            Some(Swing {
                high,
                high_time,
                low,
                low_time,
            })
        } else {
            None
        }
    }
}

/// Retracement/extension levels derived from a swing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibLevels {
    pub swing: Swing,
    /// (ratio, price) pairs measured back from the swing high.
    pub retracements: Vec<(f64, f64)>,
    /// (ratio, price) pairs projected from the swing low.
    pub projections: Vec<(f64, f64)>,
}

/// Standard retracement ratios reported alongside the trading zone.
pub const RETRACEMENT_RATIOS: [f64; 5] = [0.382, 0.50, 0.618, 0.786, 1.0];

/// Standard projection ratios.
pub const PROJECTION_RATIOS: [f64; 3] = [1.0, 1.272, 1.618];

impl FibLevels {
    pub fn from_swing(swing: Swing) -> Self {
        let range = swing.range();
        let retracements = RETRACEMENT_RATIOS
            .iter()
            .map(|&r| (r, swing.high - range * r))
            .collect();
        let projections = PROJECTION_RATIOS
            .iter()
            .map(|&r| (r, swing.low + range * r))
            .collect();
        Self {
            swing,
            retracements,
            projections,
        }
    }

    /// Price zones where several levels cluster within `tolerance`
    /// (fraction of price). Stronger zones first.
    pub fn confluence_zones(&self, tolerance: f64) -> Vec<(f64, usize)> {
        let mut all: Vec<f64> = self
            .retracements
            .iter()
            .chain(&self.projections)
            .map(|&(_, p)| p)
            .collect();
        all.sort_by(|a, b| a.total_cmp(b));

        let mut zones: Vec<(f64, usize)> = Vec::new();
        for &price in &all {
            let nearby: Vec<f64> = all
                .iter()
                .copied()
                .filter(|p| price != 0.0 && ((p - price) / price).abs() <= tolerance)
                .collect();
            if nearby.len() >= 2 {
                let avg = nearby.iter().sum::<f64>() / nearby.len() as f64;
                let duplicate = zones
                    .iter()
                    .any(|(z, _)| *z != 0.0 && ((avg - z) / z).abs() < tolerance);
                if !duplicate {
                    zones.push((avg, nearby.len()));
                }
            }
        }
        zones.sort_by(|a, b| b.1.cmp(&a.1));
        zones
    }
}

/// The retracement zone treated as support (Long) or resistance (Short),
/// returned as (zone_low, zone_high).
pub fn trade_zone(swing: &Swing, direction: Direction, cfg: &FibonacciConfig) -> (f64, f64) {
    let range = swing.range();
    match direction {
        // Pullback in an uptrend: measured down from the swing high.
        Direction::Long => (
            swing.high - range * cfg.support_zone_high,
            swing.high - range * cfg.support_zone_low,
        ),
        // Bounce in a downtrend: measured up from the swing low.
        Direction::Short => (
            swing.low + range * cfg.support_zone_low,
            swing.low + range * cfg.support_zone_high,
        ),
    }
}

/// Profit target at the configured extension of the swing.
pub fn extension_target(swing: &Swing, direction: Direction, cfg: &FibonacciConfig) -> f64 {
    let range = swing.range();
    match direction {
        Direction::Long => swing.low + range * cfg.extension_target,
        Direction::Short => swing.high - range * cfg.extension_target,
    }
}

/// Protective stop beyond the swing extreme that anchors the zone.
pub fn protective_stop(swing: &Swing, direction: Direction, cfg: &FibonacciConfig) -> f64 {
    match direction {
        Direction::Long => swing.low * (1.0 - cfg.stop_buffer_pct),
        Direction::Short => swing.high * (1.0 + cfg.stop_buffer_pct),
    }
}
