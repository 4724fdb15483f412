//! Report rendering: plain-text table for the terminal, CSV and JSON for
//! everything downstream.

use std::io::Write;

use chrono::NaiveDateTime;
use serde::Serialize;

use swingscan_core::domain::Direction;
use swingscan_core::pattern::{PatternKind, WavePhase};

/// One ranked, sized setup as it appears in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub symbol: String,
    pub direction: Direction,
    pub detected_at: NaiveDateTime,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub zone_low: f64,
    pub zone_high: f64,
    pub shares: u64,
    /// Dollar risk actually committed (shares times risk per share).
    pub risk_amount: f64,
    pub reward_risk: f64,
    /// False when the account cannot buy a single share at the risk budget.
    pub tradable: bool,
    pub total_trades: Option<usize>,
    pub win_rate: Option<f64>,
    pub sharpe: Option<f64>,
    /// Wave read of the trend structure, when the scan produced one.
    pub pattern: Option<PatternKind>,
    pub wave_phase: Option<WavePhase>,
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

fn fmt_pattern(kind: Option<PatternKind>) -> &'static str {
    match kind {
        Some(PatternKind::FiveWaveTrend) => "5-wave",
        Some(PatternKind::Trend) => "trend",
        Some(PatternKind::AbcCorrection) => "abc-corr",
        Some(PatternKind::Unclear) => "unclear",
        Some(PatternKind::InsufficientData) | None => "-",
    }
}

/// Fixed-width table for terminal output.
pub fn render_text(rows: &[ReportRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<8} {:<5} {:<16} {:>9} {:>9} {:>9} {:>7} {:>11} {:>5} {:>7} {:>7} {:>8}\n",
        "symbol", "dir", "detected", "entry", "stop", "target", "shares", "risk $", "r:r", "win%", "sharpe", "pattern"
    ));
    for row in rows {
        let dir = match row.direction {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        };
        let flag = if row.tradable { "" } else { "  [zero size]" };
        out.push_str(&format!(
            "{:<8} {:<5} {:<16} {:>9.2} {:>9.2} {:>9.2} {:>7} {:>11.2} {:>5.2} {:>7} {:>7} {:>8}{}\n",
            row.symbol,
            dir,
            row.detected_at.format("%Y-%m-%d %H:%M"),
            row.entry,
            row.stop,
            row.target,
            row.shares,
            row.risk_amount,
            row.reward_risk,
            fmt_opt(row.win_rate.map(|w| w * 100.0)),
            fmt_opt(row.sharpe),
            fmt_pattern(row.pattern),
            flag,
        ));
    }
    if rows.is_empty() {
        out.push_str("no setups detected\n");
    }
    out
}

/// Serialize rows as CSV with a header.
pub fn write_csv<W: Write>(rows: &[ReportRow], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Serialize rows as a JSON array.
pub fn write_json<W: Write>(rows: &[ReportRow], writer: W) -> Result<(), serde_json::Error> {
    serde_json::to_writer_pretty(writer, rows)
}
