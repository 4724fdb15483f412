//! CSV bar loading for both timeframes.
//!
//! Layout: one file per symbol and timeframe under the data directory,
//! `<SYMBOL>_daily.csv` and `<SYMBOL>_hourly.csv`, columns
//! `timestamp,open,high,low,close,volume`. Daily rows may carry a bare date;
//! it is read as midnight. Loaded series are validated (strictly increasing
//! timestamps, sane OHLC) before anything downstream sees them.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;

use swingscan_core::domain::{validate_series, PriceBar, SeriesError};

/// The two bar resolutions the scanner consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    /// Trend timeframe.
    Daily,
    /// Trigger timeframe.
    Hourly,
}

impl Timeframe {
    fn file_suffix(self) -> &'static str {
        match self {
            Timeframe::Daily => "daily",
            Timeframe::Hourly => "hourly",
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no bar file for {symbol} at {path}")]
    MissingFile { symbol: String, path: PathBuf },
    #[error("bad CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    #[error("bad timestamp {value:?} in {path} row {row}")]
    BadTimestamp {
        path: PathBuf,
        row: usize,
        value: String,
    },
    #[error(transparent)]
    Series(#[from] SeriesError),
}

#[derive(Debug, Deserialize)]
struct BarRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(ts);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Path of the bar file for one symbol and timeframe.
pub fn bar_file(data_dir: &Path, symbol: &str, timeframe: Timeframe) -> PathBuf {
    data_dir.join(format!("{}_{}.csv", symbol, timeframe.file_suffix()))
}

/// Load and validate the bar series for one symbol and timeframe.
pub fn load_bars(
    data_dir: &Path,
    symbol: &str,
    timeframe: Timeframe,
) -> Result<Vec<PriceBar>, LoadError> {
    let path = bar_file(data_dir, symbol, timeframe);
    if !path.exists() {
        return Err(LoadError::MissingFile {
            symbol: symbol.to_string(),
            path,
        });
    }

    let mut reader = csv::Reader::from_path(&path).map_err(|source| LoadError::Csv {
        path: path.clone(),
        source,
    })?;

    let mut bars = Vec::new();
    for (row_index, record) in reader.deserialize::<BarRow>().enumerate() {
        let row = record.map_err(|source| LoadError::Csv {
            path: path.clone(),
            source,
        })?;
        let timestamp =
            parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::BadTimestamp {
                path: path.clone(),
                row: row_index + 1,
                value: row.timestamp.clone(),
            })?;
        bars.push(PriceBar {
            symbol: symbol.to_string(),
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    validate_series(&bars)?;
    Ok(bars)
}
