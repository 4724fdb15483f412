//! SwingScan Runner — everything around the core engine:
//! - Config file loading (one TOML file per scan)
//! - CSV bar loading for both timeframes
//! - Universe handling
//! - Parallel scan orchestration with per-instrument fault isolation
//! - Ranking, sizing, and report rendering

pub mod config;
pub mod data;
pub mod report;
pub mod scan;
pub mod universe;

pub use config::{ConfigError, ScannerConfig};
pub use data::{load_bars, LoadError, Timeframe};
pub use report::{render_text, write_csv, write_json, ReportRow};
pub use scan::{run_scan, scan_universe, InstrumentData, InstrumentScan, ScanReport, ScanStatus};
pub use universe::{load_universe, UniverseError, DEFAULT_UNIVERSE};
