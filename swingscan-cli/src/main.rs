//! SwingScan CLI — scan and validate commands.
//!
//! Commands:
//! - `scan` — run the configured universe through the detector, rank and
//!   size the results, print a table and optionally write CSV or JSON
//! - `validate` — load and sanity-check the bar data for one symbol

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use swingscan_runner::{
    load_bars, render_text, run_scan, write_csv, write_json, ScanStatus, ScannerConfig, Timeframe,
};

#[derive(Parser)]
#[command(
    name = "swingscan",
    about = "SwingScan CLI — dual-timeframe momentum scanner"
)]
struct Cli {
    /// Log filter (overridden by RUST_LOG).
    #[arg(long, default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the universe for setups, rank, size, and report.
    Scan {
        /// Path to the scan config TOML.
        #[arg(long, default_value = "swingscan.toml")]
        config: PathBuf,

        /// Also write the report rows to this path (.json gets JSON,
        /// anything else CSV).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Load and sanity-check the bar files for one symbol.
    Validate {
        /// Symbol to check.
        symbol: String,

        /// Data directory holding the bar files.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Scan { config, out } => cmd_scan(&config, out.as_deref()),
        Commands::Validate { symbol, data_dir } => cmd_validate(&symbol, &data_dir),
    }
}

fn cmd_scan(config_path: &std::path::Path, out: Option<&std::path::Path>) -> Result<()> {
    let config = ScannerConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let report = run_scan(&config)?;

    let skipped = report
        .scans
        .iter()
        .filter(|s| s.status != ScanStatus::Complete)
        .count();
    if skipped > 0 {
        info!(skipped, "some instruments were skipped; see warnings above");
    }

    print!("{}", render_text(&report.rows));

    if let Some(path) = out {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => write_json(&report.rows, file)?,
            _ => write_csv(&report.rows, file)?,
        }
        info!(path = %path.display(), rows = report.rows.len(), "wrote report");
    }
    Ok(())
}

fn cmd_validate(symbol: &str, data_dir: &std::path::Path) -> Result<()> {
    for timeframe in [Timeframe::Daily, Timeframe::Hourly] {
        let bars = load_bars(data_dir, symbol, timeframe)?;
        let first = bars.first().map(|b| b.timestamp.to_string());
        let last = bars.last().map(|b| b.timestamp.to_string());
        println!(
            "{symbol} {timeframe:?}: {} bars, {} to {}",
            bars.len(),
            first.as_deref().unwrap_or("-"),
            last.as_deref().unwrap_or("-"),
        );
    }
    println!("{symbol}: both series well-formed");
    Ok(())
}
