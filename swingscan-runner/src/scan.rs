//! Scan orchestration: fan the universe out over a rayon pool, collect
//! per-instrument results, then rank and size the survivors.
//!
//! One bad instrument never kills a run. Loading, detection, and backtest
//! failures are recorded on that instrument's result and logged; the scan
//! carries on.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use swingscan_core::backtest::{self, BacktestRun};
use swingscan_core::config::{ScanConfig, Window};
use swingscan_core::domain::{Direction, PriceBar, Setup};
use swingscan_core::pattern::{self, PatternAnalysis};
use swingscan_core::risk::{self, PositionSize};
use swingscan_core::signal::{evaluate_today, Detection, SignalError};
use swingscan_core::{IndicatorError, RollingExtremes};

use crate::config::ScannerConfig;
use crate::data::{self, Timeframe};
use crate::report::ReportRow;
use crate::universe;

/// Both bar series for one instrument, ready to scan.
#[derive(Debug, Clone)]
pub struct InstrumentData {
    pub symbol: String,
    pub trend: Vec<PriceBar>,
    pub trigger: Vec<PriceBar>,
}

/// How far one instrument got.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScanStatus {
    Complete,
    /// Not enough bars for indicator warm-up. Expected for recent listings.
    InsufficientHistory { required: usize, got: usize },
    /// Data or series problem; the reason is the error's display form.
    Failed { reason: String },
}

/// Everything the scan produced for one instrument.
#[derive(Debug, Clone)]
pub struct InstrumentScan {
    pub symbol: String,
    pub status: ScanStatus,
    pub detection: Detection,
    pub backtest: Option<BacktestRun>,
    /// Wave read of the trend structure; context for the report, never a
    /// filter. None when the scan did not complete.
    pub pattern: Option<PatternAnalysis>,
}

/// A full scan: per-instrument outcomes plus the ranked, sized report rows.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub scans: Vec<InstrumentScan>,
    pub rows: Vec<ReportRow>,
}

/// Load data and scan the configured universe end to end.
pub fn run_scan(config: &ScannerConfig) -> anyhow::Result<ScanReport> {
    let symbols = universe::load_universe(config.scanner.universe_file.as_deref())?;
    info!(universe = symbols.len(), "starting scan");

    let mut instruments = Vec::new();
    let mut failed: Vec<InstrumentScan> = Vec::new();
    for symbol in &symbols {
        let trend = data::load_bars(&config.scanner.data_dir, symbol, Timeframe::Daily);
        let trigger = data::load_bars(&config.scanner.data_dir, symbol, Timeframe::Hourly);
        match (trend, trigger) {
            (Ok(trend), Ok(trigger)) => instruments.push(InstrumentData {
                symbol: symbol.clone(),
                trend,
                trigger,
            }),
            (Err(e), _) | (_, Err(e)) => {
                warn!(symbol = %symbol, error = %e, "skipping instrument, data unavailable");
                failed.push(InstrumentScan {
                    symbol: symbol.clone(),
                    status: ScanStatus::Failed {
                        reason: e.to_string(),
                    },
                    detection: Detection::default(),
                    backtest: None,
                    pattern: None,
                });
            }
        }
    }

    let mut scans = scan_universe(&instruments, config.backtest_window(), &config.core);
    scans.extend(failed);
    scans.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    let rows = rank_and_size(
        &scans,
        config.scanner.account_size,
        &config.core,
        config.scanner.max_setups_per_direction,
    );
    info!(
        scanned = scans.len(),
        setups = rows.len(),
        "scan finished"
    );
    Ok(ScanReport { scans, rows })
}

/// Scan loaded instruments in parallel.
pub fn scan_universe(
    instruments: &[InstrumentData],
    window: Option<Window>,
    cfg: &ScanConfig,
) -> Vec<InstrumentScan> {
    let swings = RollingExtremes::new(cfg.fibonacci.swing_window);
    instruments
        .par_iter()
        .map(|instrument| scan_one(instrument, window, &swings, cfg))
        .collect()
}

fn scan_one(
    instrument: &InstrumentData,
    window: Option<Window>,
    swings: &RollingExtremes,
    cfg: &ScanConfig,
) -> InstrumentScan {
    let symbol = instrument.symbol.clone();

    let detection = match evaluate_today(&instrument.trend, &instrument.trigger, swings, cfg) {
        Ok(detection) => detection,
        Err(SignalError::Indicator(IndicatorError::InsufficientData { required, got })) => {
            debug!(symbol = %symbol, required, got, "not enough history");
            return InstrumentScan {
                symbol,
                status: ScanStatus::InsufficientHistory { required, got },
                detection: Detection::default(),
                backtest: None,
                pattern: None,
            };
        }
        Err(e) => {
            warn!(symbol = %symbol, error = %e, "detection failed");
            return InstrumentScan {
                symbol,
                status: ScanStatus::Failed {
                    reason: e.to_string(),
                },
                detection: Detection::default(),
                backtest: None,
                pattern: None,
            };
        }
    };

    for t in &detection.inconclusive_at {
        warn!(symbol = %symbol, at = %t, "contradictory signals, emitting nothing");
    }

    let backtest = match window {
        Some(window) => {
            match backtest::run(&instrument.trend, &instrument.trigger, window, swings, cfg) {
                Ok(run) => Some(run),
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "backtest failed");
                    None
                }
            }
        }
        None => None,
    };

    let analysis = pattern::analyze(&instrument.trend, pattern::DEFAULT_LOOKBACK);

    InstrumentScan {
        symbol,
        status: ScanStatus::Complete,
        detection,
        backtest,
        pattern: Some(analysis),
    }
}

/// Rank detected setups and size them against the account.
///
/// Order is historical Sharpe descending (setups without one come last),
/// symbol as the tiebreak so runs are reproducible. Sizing walks that order
/// accumulating committed risk, so the portfolio cap bites the weakest
/// candidates first. Zero-share sizings are kept in the report, flagged.
pub fn rank_and_size(
    scans: &[InstrumentScan],
    account_size: f64,
    cfg: &ScanConfig,
    max_per_direction: usize,
) -> Vec<ReportRow> {
    struct Candidate<'a> {
        setup: &'a Setup,
        sharpe: Option<f64>,
        run: Option<&'a BacktestRun>,
        pattern: Option<&'a PatternAnalysis>,
    }

    let mut candidates: Vec<Candidate<'_>> = Vec::new();
    for scan in scans {
        for setup in &scan.detection.setups {
            let sharpe = scan
                .backtest
                .as_ref()
                .and_then(|b| b.metrics.sharpe_ratio);
            candidates.push(Candidate {
                setup,
                sharpe,
                run: scan.backtest.as_ref(),
                pattern: scan.pattern.as_ref(),
            });
        }
    }

    candidates.sort_by(|a, b| match (a.sharpe, b.sharpe) {
        (Some(x), Some(y)) => y
            .total_cmp(&x)
            .then_with(|| a.setup.symbol.cmp(&b.setup.symbol)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.setup.symbol.cmp(&b.setup.symbol),
    });

    let mut rows = Vec::new();
    let mut open_risk = 0.0;
    let mut longs = 0usize;
    let mut shorts = 0usize;

    for candidate in candidates {
        let setup = candidate.setup;
        let taken = match setup.direction {
            Direction::Long => &mut longs,
            Direction::Short => &mut shorts,
        };
        if *taken >= max_per_direction {
            continue;
        }

        let size = match risk::size(
            account_size,
            setup.entry_price,
            setup.stop_price,
            cfg.risk.max_risk_per_trade,
            open_risk,
            cfg.risk.max_total_risk,
        ) {
            Ok(size) => size,
            Err(e) => {
                warn!(symbol = %setup.symbol, error = %e, "cannot size setup");
                continue;
            }
        };

        if !size.is_tradable() {
            warn!(
                symbol = %setup.symbol,
                entry = setup.entry_price,
                stop = setup.stop_price,
                "setup sizes to zero shares at this account size"
            );
        } else {
            open_risk += size.shares as f64 * setup.risk_per_share();
        }

        *taken += 1;
        rows.push(build_row(
            setup,
            &size,
            candidate.sharpe,
            candidate.run,
            candidate.pattern,
        ));
    }

    rows
}

fn build_row(
    setup: &Setup,
    size: &PositionSize,
    sharpe: Option<f64>,
    run: Option<&BacktestRun>,
    pattern: Option<&PatternAnalysis>,
) -> ReportRow {
    ReportRow {
        symbol: setup.symbol.clone(),
        direction: setup.direction,
        detected_at: setup.detected_at,
        entry: setup.entry_price,
        stop: setup.stop_price,
        target: setup.target_price,
        zone_low: setup.fib_zone.0,
        zone_high: setup.fib_zone.1,
        shares: size.shares,
        risk_amount: size.shares as f64 * setup.risk_per_share(),
        reward_risk: risk::reward_risk_ratio(
            setup.entry_price,
            setup.stop_price,
            setup.target_price,
        ),
        tradable: size.is_tradable(),
        total_trades: run.map(|r| r.metrics.total_trades),
        win_rate: run.and_then(|r| r.metrics.win_rate),
        sharpe,
        pattern: pattern.map(|p| p.kind),
        wave_phase: pattern.map(|p| p.phase),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn setup(symbol: &str, direction: Direction) -> Setup {
        let (entry, stop, target) = match direction {
            Direction::Long => (109.0, 99.9, 120.0),
            Direction::Short => (111.0, 120.1, 100.0),
        };
        Setup::new(
            symbol,
            direction,
            ts(14, 11),
            ts(14, 0),
            entry,
            stop,
            target,
            (107.64, 110.0),
        )
        .unwrap()
    }

    fn scan_with(symbol: &str, setups: Vec<Setup>) -> InstrumentScan {
        InstrumentScan {
            symbol: symbol.to_string(),
            status: ScanStatus::Complete,
            detection: Detection {
                setups,
                inconclusive_at: Vec::new(),
            },
            backtest: None,
            pattern: None,
        }
    }

    fn sine_bars(symbol: &str, n: usize, spacing_hours: i64) -> Vec<PriceBar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| {
                let close = 200.0 + (i as f64 * 0.11).sin() * 25.0;
                let open = close - 0.2;
                PriceBar {
                    symbol: symbol.to_string(),
                    timestamp: base + chrono::Duration::hours(i as i64 * spacing_hours),
                    open,
                    high: open.max(close) + 1.0,
                    low: open.min(close) - 1.0,
                    close,
                    volume: 100_000,
                }
            })
            .collect()
    }

    #[test]
    fn short_history_reports_insufficient() {
        let cfg = ScanConfig::default();
        let instruments = vec![InstrumentData {
            symbol: "NEW".to_string(),
            trend: sine_bars("NEW", 10, 24),
            trigger: sine_bars("NEW", 10, 1),
        }];
        let scans = scan_universe(&instruments, None, &cfg);
        assert_eq!(scans.len(), 1);
        assert!(matches!(
            scans[0].status,
            ScanStatus::InsufficientHistory { required: 35, got: 10 }
        ));
    }

    #[test]
    fn healthy_instrument_completes() {
        let cfg = ScanConfig::default();
        let instruments = vec![InstrumentData {
            symbol: "OK".to_string(),
            trend: sine_bars("OK", 120, 24),
            trigger: sine_bars("OK", 400, 4),
        }];
        let scans = scan_universe(&instruments, None, &cfg);
        assert_eq!(scans[0].status, ScanStatus::Complete);
        assert!(scans[0].backtest.is_none());
    }

    #[test]
    fn one_bad_instrument_does_not_poison_the_rest() {
        let cfg = ScanConfig::default();
        let mut bad_trigger = sine_bars("BAD", 400, 4);
        bad_trigger[5].timestamp = bad_trigger[4].timestamp; // duplicate
        let instruments = vec![
            InstrumentData {
                symbol: "BAD".to_string(),
                trend: sine_bars("BAD", 120, 24),
                trigger: bad_trigger,
            },
            InstrumentData {
                symbol: "OK".to_string(),
                trend: sine_bars("OK", 120, 24),
                trigger: sine_bars("OK", 400, 4),
            },
        ];
        let mut scans = scan_universe(&instruments, None, &cfg);
        scans.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        assert!(matches!(scans[0].status, ScanStatus::Failed { .. }));
        assert_eq!(scans[1].status, ScanStatus::Complete);
    }

    #[test]
    fn sizing_accumulates_portfolio_risk() {
        let cfg = ScanConfig::default();
        let scans = vec![
            scan_with("AAA", vec![setup("AAA", Direction::Long)]),
            scan_with("BBB", vec![setup("BBB", Direction::Long)]),
            scan_with("CCC", vec![setup("CCC", Direction::Long)]),
        ];
        // 3% per trade, 6% total: the third setup gets almost nothing.
        let rows = rank_and_size(&scans, 100_000.0, &cfg, 5);
        assert_eq!(rows.len(), 3);
        let committed: f64 = rows.iter().map(|r| r.risk_amount).sum();
        assert!(committed <= 100_000.0 * cfg.risk.max_total_risk + 1e-6);
        assert!(rows[0].risk_amount > rows[2].risk_amount);
    }

    #[test]
    fn per_direction_cap_applies() {
        let cfg = ScanConfig::default();
        let scans: Vec<InstrumentScan> = (0..4)
            .map(|i| {
                let symbol = format!("L{i}");
                scan_with(&symbol, vec![setup(&symbol, Direction::Long)])
            })
            .chain(std::iter::once(scan_with(
                "SSS",
                vec![setup("SSS", Direction::Short)],
            )))
            .collect();

        let rows = rank_and_size(&scans, 1_000_000.0, &cfg, 2);
        let longs = rows.iter().filter(|r| r.direction == Direction::Long).count();
        let shorts = rows.iter().filter(|r| r.direction == Direction::Short).count();
        assert_eq!(longs, 2);
        assert_eq!(shorts, 1);
    }

    #[test]
    fn untradable_rows_are_kept_and_flagged() {
        let cfg = ScanConfig::default();
        let scans = vec![scan_with("TINY", vec![setup("TINY", Direction::Long)])];
        // 3% of 200 cannot buy one share against a 9.1-point stop.
        let rows = rank_and_size(&scans, 200.0, &cfg, 5);
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].tradable);
        assert_eq!(rows[0].shares, 0);
    }

    #[test]
    fn completed_scans_carry_a_pattern_read() {
        let cfg = ScanConfig::default();
        let instruments = vec![InstrumentData {
            symbol: "OK".to_string(),
            trend: sine_bars("OK", 120, 24),
            trigger: sine_bars("OK", 400, 4),
        }];
        let scans = scan_universe(&instruments, None, &cfg);
        assert_eq!(scans[0].status, ScanStatus::Complete);
        assert!(scans[0].pattern.is_some());
    }

    #[test]
    fn pattern_context_reaches_report_rows() {
        use swingscan_core::pattern::{PatternKind, WavePhase};

        let cfg = ScanConfig::default();
        let mut scan = scan_with("ACME", vec![setup("ACME", Direction::Long)]);
        scan.pattern = Some(PatternAnalysis {
            kind: PatternKind::Trend,
            confidence: 0.6,
            phase: WavePhase::Developing,
            swings: Vec::new(),
        });

        let rows = rank_and_size(&[scan], 100_000.0, &cfg, 5);
        assert_eq!(rows[0].pattern, Some(PatternKind::Trend));
        assert_eq!(rows[0].wave_phase, Some(WavePhase::Developing));
    }

    #[test]
    fn ranking_prefers_higher_sharpe() {
        let cfg = ScanConfig::default();
        let mut low = scan_with("LOW", vec![setup("LOW", Direction::Long)]);
        let mut high = scan_with("HIGH", vec![setup("HIGH", Direction::Long)]);
        low.backtest = Some(run_with_sharpe(0.4));
        high.backtest = Some(run_with_sharpe(1.9));

        let rows = rank_and_size(&[low, high], 1_000_000.0, &cfg, 5);
        assert_eq!(rows[0].symbol, "HIGH");
        assert_eq!(rows[1].symbol, "LOW");
    }

    fn run_with_sharpe(sharpe: f64) -> BacktestRun {
        let mut run = BacktestRun {
            trades: Vec::new(),
            metrics: swingscan_core::backtest::summarize(&[], 1.0, None),
            inconclusive_points: 0,
        };
        run.metrics.sharpe_ratio = Some(sharpe);
        run
    }
}
