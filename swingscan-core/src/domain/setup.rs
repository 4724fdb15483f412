//! Setup — an immutable trade setup emitted by the signal detector.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directional intent of a setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

/// Raised when the entry/stop/target prices of a candidate setup are not
/// ordered for its direction (degenerate swing geometry).
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{direction:?} setup prices not ordered: stop={stop} entry={entry} target={target}")]
pub struct PriceOrderingError {
    pub direction: Direction,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
}

/// A trade setup detected on the trigger timeframe with trend-timeframe
/// confirmation. Immutable once created.
///
/// Invariant (enforced by `Setup::new`):
/// - Long:  stop < entry < target
/// - Short: target < entry < stop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setup {
    pub symbol: String,
    pub direction: Direction,
    /// Timestamp of the trigger-timeframe bar that fired the setup.
    pub detected_at: NaiveDateTime,
    /// Timestamp of the trend-timeframe bar that confirmed momentum.
    /// Never later than `detected_at`.
    pub trend_confirmed_at: NaiveDateTime,
    pub entry_price: f64,
    pub stop_price: f64,
    pub target_price: f64,
    /// Fibonacci retracement zone (low, high) the entry price sat inside.
    pub fib_zone: (f64, f64),
}

impl Setup {
    /// Construct a setup, enforcing the price-ordering invariant.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        direction: Direction,
        detected_at: NaiveDateTime,
        trend_confirmed_at: NaiveDateTime,
        entry_price: f64,
        stop_price: f64,
        target_price: f64,
        fib_zone: (f64, f64),
    ) -> Result<Self, PriceOrderingError> {
        let ordered = match direction {
            Direction::Long => stop_price < entry_price && entry_price < target_price,
            Direction::Short => target_price < entry_price && entry_price < stop_price,
        };
        if !ordered {
            return Err(PriceOrderingError {
                direction,
                entry: entry_price,
                stop: stop_price,
                target: target_price,
            });
        }
        Ok(Self {
            symbol: symbol.into(),
            direction,
            detected_at,
            trend_confirmed_at,
            entry_price,
            stop_price,
            target_price,
            fib_zone,
        })
    }

    /// Distance between entry and stop — the risk basis for position sizing.
    pub fn risk_per_share(&self) -> f64 {
        (self.entry_price - self.stop_price).abs()
    }
}
