//! Scanner configuration file handling.
//!
//! One TOML file drives a run. The `[scanner]` table holds runner-level
//! settings; the indicator/risk/fibonacci/backtest tables are the core's
//! `ScanConfig` sections, flattened in so users see a single flat file:
//!
//! ```toml
//! [scanner]
//! account_size = 250000.0
//! data_dir = "data"
//!
//! [risk]
//! max_risk_per_trade = 0.02
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use swingscan_core::config::{ScanConfig, Window};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("backtest_end {end} precedes backtest_start {start}")]
    BackwardsWindow { start: NaiveDate, end: NaiveDate },
}

/// Runner-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSection {
    /// Account equity the risk sizer works against.
    pub account_size: f64,
    /// Directory holding `<SYMBOL>_daily.csv` / `<SYMBOL>_hourly.csv` files.
    pub data_dir: PathBuf,
    /// CSV with a `symbol` column. Absent means the built-in universe.
    pub universe_file: Option<PathBuf>,
    /// Report at most this many setups per direction.
    pub max_setups_per_direction: usize,
    /// Backtest window, inclusive dates. Both absent skips backtesting.
    pub backtest_start: Option<NaiveDate>,
    pub backtest_end: Option<NaiveDate>,
}

impl Default for ScannerSection {
    fn default() -> Self {
        Self {
            account_size: 100_000.0,
            data_dir: PathBuf::from("data"),
            universe_file: None,
            max_setups_per_direction: 5,
            backtest_start: None,
            backtest_end: None,
        }
    }
}

/// The full configuration surface of a scan run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub scanner: ScannerSection,
    #[serde(flatten)]
    pub core: ScanConfig,
}

impl ScannerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ScannerConfig =
            toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let (Some(start), Some(end)) =
            (self.scanner.backtest_start, self.scanner.backtest_end)
        {
            if end < start {
                return Err(ConfigError::BackwardsWindow { start, end });
            }
        }
        Ok(())
    }

    /// Replay window from the configured dates; None unless both are set.
    /// The end date is inclusive, so the window runs to its last second.
    pub fn backtest_window(&self) -> Option<Window> {
        match (self.scanner.backtest_start, self.scanner.backtest_end) {
            (Some(start), Some(end)) => Some(Window {
                start: start.and_hms_opt(0, 0, 0)?,
                end: end.and_hms_opt(23, 59, 59)?,
            }),
            _ => None,
        }
    }
}
