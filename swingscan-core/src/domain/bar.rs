//! PriceBar — the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for a single symbol at a single timestamp.
///
/// Bars arrive pre-adjusted for splits/dividends from the data collaborator.
/// The trigger timeframe is intraday (60-minute), so timestamps carry a time
/// component; daily bars use the session date at midnight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub symbol: String,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// Basic OHLC sanity check: high is the top of the range, low the bottom,
    /// and prices are positive.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// Data-integrity fault in a bar series.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SeriesError {
    #[error("malformed series for '{symbol}': {detail} at index {index}")]
    MalformedSeries {
        symbol: String,
        index: usize,
        detail: String,
    },
}

/// Validate that a bar series has strictly increasing timestamps.
///
/// The data contract promises no duplicate or out-of-order timestamps; the
/// engine trusts but verifies, failing with `MalformedSeries` so one
/// instrument's bad data never silently misaligns a scan.
pub fn validate_series(bars: &[PriceBar]) -> Result<(), SeriesError> {
    for (i, pair) in bars.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            let detail = if pair[1].timestamp == pair[0].timestamp {
                format!("duplicate timestamp {}", pair[1].timestamp)
            } else {
                format!(
                    "out-of-order timestamp {} after {}",
                    pair[1].timestamp, pair[0].timestamp
                )
            };
            return Err(SeriesError::MalformedSeries {
                symbol: pair[1].symbol.clone(),
                index: i + 1,
                detail,
            });
        }
    }
    Ok(())
}
