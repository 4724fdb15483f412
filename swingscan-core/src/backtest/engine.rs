//! Historical replay of the detector over a trigger-timeframe window.
//!
//! # Replay discipline
//! A cursor walks the in-window trigger bars in order. At each bar:
//! 1. an open trade is checked for a stop or target touch (stop first when
//!    both sides are touched inside one bar);
//! 2. an entry scheduled on the previous bar is filled at this bar's open;
//! 3. the detector is evaluated at this bar, and a setup schedules an entry
//!    for the next bar.
//! The detector only ever sees series prefixes ending at the cursor, so no
//! decision can use data from a later bar. A setup firing on the final
//! in-window bar has no next bar to enter on and is dropped. A trade still
//! open when the window ends is force-closed at the final bar's close.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::metrics::{summarize, BacktestResult};
use crate::config::{ScanConfig, Window};
use crate::domain::{Direction, PriceBar, SeriesError, Setup, Trade, TradeOutcome};
use crate::fib::SwingSource;
use crate::indicators::{compute, IndicatorError};
use crate::signal::{align_timeframes, evaluate_point, AlignedPoint, Evaluation, TimeframeSeries};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BacktestError {
    #[error("replay window {start} to {end} contains no trigger bars")]
    EmptyWindow {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    #[error("indicator warm-up extends past window start {start}; more history is needed before the window")]
    InsufficientLookback { start: NaiveDateTime },
    #[error(transparent)]
    Series(#[from] SeriesError),
    #[error(transparent)]
    Indicator(#[from] IndicatorError),
}

/// Everything a replay produces: the closed trades in entry order, the
/// aggregate metrics, and how many evaluation points were contradictory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRun {
    pub trades: Vec<Trade>,
    pub metrics: BacktestResult,
    pub inconclusive_points: usize,
}

struct OpenTrade {
    setup: Setup,
    entry_index: usize,
    entry_time: NaiveDateTime,
    entry_price: f64,
}

/// Backtest one instrument over `window`.
///
/// Validates both series, computes indicator snapshots, aligns the
/// timeframes, and replays the detector bar by bar. Both series must carry
/// enough history before `window.start` that the indicators are already
/// warm at the first in-window bar; a window reaching into the warm-up
/// would silently skip its early bars instead of evaluating them.
pub fn run(
    trend_bars: &[PriceBar],
    trigger_bars: &[PriceBar],
    window: Window,
    swings: &dyn SwingSource,
    cfg: &ScanConfig,
) -> Result<BacktestRun, BacktestError> {
    let trend_snapshots = compute(trend_bars, cfg)?;
    let trigger_snapshots = compute(trigger_bars, cfg)?;
    let points = align_timeframes(trend_bars, trigger_bars)?;

    replay(
        TimeframeSeries {
            bars: trend_bars,
            snapshots: &trend_snapshots,
        },
        TimeframeSeries {
            bars: trigger_bars,
            snapshots: &trigger_snapshots,
        },
        &points,
        window,
        swings,
        cfg,
    )
}

/// Replay precomputed series over a window. `run` is the usual entry point;
/// this layer exists so the cursor discipline can be exercised directly
/// against handcrafted snapshots.
pub fn replay(
    trend: TimeframeSeries<'_>,
    trigger: TimeframeSeries<'_>,
    points: &[AlignedPoint],
    window: Window,
    swings: &dyn SwingSource,
    cfg: &ScanConfig,
) -> Result<BacktestRun, BacktestError> {
    let in_window: Vec<AlignedPoint> = points
        .iter()
        .copied()
        .filter(|p| window.contains(trigger.bars[p.trigger_index].timestamp))
        .collect();
    if in_window.is_empty() {
        return Err(BacktestError::EmptyWindow {
            start: window.start,
            end: window.end,
        });
    }

    // The first in-window point must already be evaluable on both
    // timeframes; otherwise the window covers bars the detector never saw.
    let first = in_window[0];
    if !trigger.snapshots[first.trigger_index].is_complete()
        || !trend.snapshots[first.trend_index].is_complete()
    {
        return Err(BacktestError::InsufficientLookback {
            start: window.start,
        });
    }

    let mut trades: Vec<Trade> = Vec::new();
    let mut open: Option<OpenTrade> = None;
    let mut pending: Option<Setup> = None;
    let mut inconclusive_points = 0usize;

    for &point in &in_window {
        let index = point.trigger_index;
        let bar = &trigger.bars[index];

        // Exit check. The entry bar itself is never checked: the fill is at
        // its open and the intrabar path after the open is unknown.
        if let Some(trade) = &open {
            if index > trade.entry_index {
                if let Some(exit_price) = exit_touch(bar, &trade.setup) {
                    trades.push(close_trade(trade, index, bar.timestamp, exit_price, false));
                    open = None;
                }
            }
        }

        // Fill an entry scheduled on the previous bar.
        if open.is_none() {
            if let Some(setup) = pending.take() {
                open = Some(OpenTrade {
                    setup,
                    entry_index: index,
                    entry_time: bar.timestamp,
                    entry_price: bar.open,
                });
            }
        }

        // One position at a time: while in a trade (or waiting on a fill)
        // new signals are ignored, not queued.
        if open.is_none() && pending.is_none() {
            match evaluate_point(trend, trigger, point, swings, cfg) {
                Evaluation::Setup(setup) => pending = Some(setup),
                Evaluation::Inconclusive => inconclusive_points += 1,
                Evaluation::None => {}
            }
        }
    }

    if let Some(trade) = &open {
        let last_index = in_window[in_window.len() - 1].trigger_index;
        let last_bar = &trigger.bars[last_index];
        trades.push(forced_close(trade, last_index, last_bar));
    }

    let metrics = summarize(&trades, window.years(), cfg.backtest.annualization_factor);
    Ok(BacktestRun {
        trades,
        metrics,
        inconclusive_points,
    })
}

/// Exit fill for one bar, or None when neither side was touched.
///
/// The stop is checked first: when a single bar spans both levels the
/// intrabar path is unknown and the losing resolution is assumed. An open
/// gapping through a level fills at the open, not at the level.
fn exit_touch(bar: &PriceBar, setup: &Setup) -> Option<f64> {
    match setup.direction {
        Direction::Long => {
            if bar.open <= setup.stop_price {
                Some(bar.open)
            } else if bar.low <= setup.stop_price {
                Some(setup.stop_price)
            } else if bar.open >= setup.target_price {
                Some(bar.open)
            } else if bar.high >= setup.target_price {
                Some(setup.target_price)
            } else {
                None
            }
        }
        Direction::Short => {
            if bar.open >= setup.stop_price {
                Some(bar.open)
            } else if bar.high >= setup.stop_price {
                Some(setup.stop_price)
            } else if bar.open <= setup.target_price {
                Some(bar.open)
            } else if bar.low <= setup.target_price {
                Some(setup.target_price)
            } else {
                None
            }
        }
    }
}

fn close_trade(
    open: &OpenTrade,
    exit_index: usize,
    exit_time: NaiveDateTime,
    exit_price: f64,
    forced: bool,
) -> Trade {
    let pnl_pct = Trade::pnl_pct_for(open.setup.direction, open.entry_price, exit_price);
    Trade {
        direction: open.setup.direction,
        entry_index: open.entry_index,
        entry_time: open.entry_time,
        entry_price: open.entry_price,
        exit_index,
        exit_time,
        exit_price,
        outcome: Trade::outcome_from_pnl(pnl_pct),
        pnl_pct,
        holding_period: exit_index - open.entry_index,
        forced_close: forced,
    }
}

/// Close at the final in-window bar's close. The outcome is classified by
/// which exit level the close sits nearer to, so a trade drifting toward
/// its stop counts against the strategy even before the touch.
fn forced_close(open: &OpenTrade, exit_index: usize, bar: &PriceBar) -> Trade {
    let mut trade = close_trade(open, exit_index, bar.timestamp, bar.close, true);
    let to_stop = (bar.close - open.setup.stop_price).abs();
    let to_target = (bar.close - open.setup.target_price).abs();
    if to_stop < to_target {
        trade.outcome = TradeOutcome::Loss;
    } else if to_target < to_stop {
        trade.outcome = TradeOutcome::Win;
    }
    trade
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fib::Swing;
    use crate::indicators::IndicatorSnapshot;
    use chrono::{NaiveDate, NaiveDateTime};

    struct FixedSwing(Swing);

    impl SwingSource for FixedSwing {
        fn recent_swing(&self, _bars: &[PriceBar]) -> Option<Swing> {
            Some(self.0)
        }
    }

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn bar_ohlc(t: NaiveDateTime, open: f64, high: f64, low: f64, close: f64) -> PriceBar {
        PriceBar {
            symbol: "TEST".into(),
            timestamp: t,
            open,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    fn snap(
        t: NaiveDateTime,
        stoch_k: f64,
        stoch_d: f64,
        rsi: f64,
        macd_line: f64,
        macd_signal: f64,
    ) -> IndicatorSnapshot {
        IndicatorSnapshot {
            timestamp: t,
            stoch_k,
            stoch_d,
            rsi,
            macd_line,
            macd_signal,
        }
    }

    fn swing_100_120() -> Swing {
        Swing {
            high: 120.0,
            high_time: ts(1, 0),
            low: 100.0,
            low_time: ts(1, 0),
        }
    }

    /// Replay fixture with one bullish trend bar and scripted trigger bars.
    ///
    /// The detector fires LONG at trigger index 1 (stochastic and MACD both
    /// cross up, close 109 inside the 107.64-110.0 zone of the 100/120
    /// swing); every later snapshot is complete but non-firing. Stop 99.9,
    /// target 120.
    struct Harness {
        trend_bars: Vec<PriceBar>,
        trend_snaps: Vec<IndicatorSnapshot>,
        trigger_bars: Vec<PriceBar>,
        trigger_snaps: Vec<IndicatorSnapshot>,
    }

    impl Harness {
        fn new(tail: &[(f64, f64, f64, f64)]) -> Self {
            let trend_bars = vec![bar_ohlc(ts(14, 0), 110.0, 111.0, 109.0, 110.0)];
            let trend_snaps = vec![snap(ts(14, 0), 62.0, 60.0, 55.0, 1.2, 1.0)];

            let mut trigger_bars = vec![
                bar_ohlc(ts(14, 9), 108.0, 108.5, 107.5, 108.0),
                bar_ohlc(ts(14, 10), 108.5, 109.2, 108.0, 109.0),
            ];
            let mut trigger_snaps = vec![
                snap(ts(14, 9), 18.0, 22.0, 45.0, -0.1, 0.0),
                snap(ts(14, 10), 22.0, 21.0, 48.0, 0.1, 0.0),
            ];
            for (i, &(open, high, low, close)) in tail.iter().enumerate() {
                let t = ts(14, 11 + i as u32);
                trigger_bars.push(bar_ohlc(t, open, high, low, close));
                trigger_snaps.push(snap(t, 40.0, 40.0, 55.0, 0.1, 0.0));
            }
            Self {
                trend_bars,
                trend_snaps,
                trigger_bars,
                trigger_snaps,
            }
        }

        fn replay(&self) -> Result<BacktestRun, BacktestError> {
            let cfg = ScanConfig::default();
            let trend = TimeframeSeries {
                bars: &self.trend_bars,
                snapshots: &self.trend_snaps,
            };
            let trigger = TimeframeSeries {
                bars: &self.trigger_bars,
                snapshots: &self.trigger_snaps,
            };
            let points: Vec<AlignedPoint> = (0..self.trigger_bars.len())
                .map(|trigger_index| AlignedPoint {
                    trigger_index,
                    trend_index: 0,
                })
                .collect();
            let window = Window {
                start: ts(14, 0),
                end: ts(15, 0),
            };
            replay(
                trend,
                trigger,
                &points,
                window,
                &FixedSwing(swing_100_120()),
                &cfg,
            )
        }
    }

    #[test]
    fn entry_fills_at_next_bar_open() {
        let harness = Harness::new(&[
            (109.5, 110.0, 108.5, 109.5),
            (110.0, 121.0, 109.0, 119.0), // target touch
        ]);
        let run = harness.replay().unwrap();
        assert_eq!(run.trades.len(), 1);
        let trade = &run.trades[0];
        // Signal at index 1, fill at index 2's open.
        assert_eq!(trade.entry_index, 2);
        assert!((trade.entry_price - 109.5).abs() < 1e-12);
    }

    #[test]
    fn target_touch_exits_at_target() {
        let harness = Harness::new(&[
            (109.5, 110.0, 108.5, 109.5),
            (110.0, 121.0, 109.0, 119.0),
        ]);
        let run = harness.replay().unwrap();
        let trade = &run.trades[0];
        assert!((trade.exit_price - 120.0).abs() < 1e-12);
        assert_eq!(trade.outcome, TradeOutcome::Win);
        assert!(!trade.forced_close);
        assert_eq!(trade.holding_period, 1);
    }

    #[test]
    fn stop_touch_exits_at_stop() {
        let harness = Harness::new(&[
            (109.5, 110.0, 108.5, 109.5),
            (108.0, 108.5, 99.0, 100.0),
        ]);
        let run = harness.replay().unwrap();
        let trade = &run.trades[0];
        assert!((trade.exit_price - 99.9).abs() < 1e-12);
        assert_eq!(trade.outcome, TradeOutcome::Loss);
    }

    #[test]
    fn stop_checked_before_target_within_one_bar() {
        let harness = Harness::new(&[
            (109.5, 110.0, 108.5, 109.5),
            (110.0, 121.0, 99.0, 115.0), // spans both levels
        ]);
        let run = harness.replay().unwrap();
        let trade = &run.trades[0];
        assert!((trade.exit_price - 99.9).abs() < 1e-12);
        assert_eq!(trade.outcome, TradeOutcome::Loss);
    }

    #[test]
    fn entry_bar_is_not_exit_checked() {
        // The fill bar itself touches the target; the exit must wait for the
        // following bar.
        let harness = Harness::new(&[
            (109.5, 121.0, 108.5, 112.0),
            (112.0, 120.5, 111.0, 118.0),
        ]);
        let run = harness.replay().unwrap();
        let trade = &run.trades[0];
        assert_eq!(trade.entry_index, 2);
        assert_eq!(trade.exit_index, 3);
    }

    #[test]
    fn gap_through_stop_fills_at_open() {
        let harness = Harness::new(&[
            (109.5, 110.0, 108.5, 109.5),
            (98.0, 99.0, 97.0, 98.5), // opens below the stop
        ]);
        let run = harness.replay().unwrap();
        let trade = &run.trades[0];
        assert!((trade.exit_price - 98.0).abs() < 1e-12);
        assert_eq!(trade.outcome, TradeOutcome::Loss);
    }

    #[test]
    fn open_trade_is_force_closed_at_window_end() {
        let harness = Harness::new(&[
            (109.5, 110.0, 108.5, 109.5),
            (110.0, 118.0, 109.0, 117.0), // drifts toward the target, no touch
        ]);
        let run = harness.replay().unwrap();
        let trade = &run.trades[0];
        assert!(trade.forced_close);
        assert!((trade.exit_price - 117.0).abs() < 1e-12);
        // 117 is nearer the 120 target than the 99.9 stop.
        assert_eq!(trade.outcome, TradeOutcome::Win);
    }

    #[test]
    fn forced_close_near_stop_counts_as_loss() {
        let harness = Harness::new(&[
            (109.5, 110.0, 108.5, 109.5),
            (108.0, 108.5, 100.5, 101.0), // near the stop, no touch
        ]);
        let run = harness.replay().unwrap();
        let trade = &run.trades[0];
        assert!(trade.forced_close);
        assert_eq!(trade.outcome, TradeOutcome::Loss);
    }

    #[test]
    fn setup_on_final_bar_never_enters() {
        // Only the signal bars: the setup fires on the last in-window bar,
        // so there is no next open to fill at.
        let harness = Harness::new(&[]);
        let run = harness.replay().unwrap();
        assert!(run.trades.is_empty());
        assert_eq!(run.metrics.total_trades, 0);
        assert_eq!(run.metrics.win_rate, None);
    }

    #[test]
    fn signals_are_ignored_while_position_open() {
        // Re-fire the trigger crossover while the first trade is still open;
        // only one trade may come out.
        let mut harness = Harness::new(&[
            (109.5, 110.0, 108.5, 109.5),
            (109.0, 109.5, 108.0, 109.0),
            (110.0, 121.0, 109.0, 119.0),
        ]);
        harness.trigger_snaps[3] = snap(ts(14, 12), 18.0, 22.0, 45.0, -0.1, 0.0);
        harness.trigger_snaps[4] = snap(ts(14, 13), 22.0, 21.0, 48.0, 0.1, 0.0);
        let run = harness.replay().unwrap();
        assert_eq!(run.trades.len(), 1);
    }

    #[test]
    fn empty_window_is_an_error() {
        let harness = Harness::new(&[(109.5, 110.0, 108.5, 109.5)]);
        let cfg = ScanConfig::default();
        let trend = TimeframeSeries {
            bars: &harness.trend_bars,
            snapshots: &harness.trend_snaps,
        };
        let trigger = TimeframeSeries {
            bars: &harness.trigger_bars,
            snapshots: &harness.trigger_snaps,
        };
        let points = vec![AlignedPoint {
            trigger_index: 0,
            trend_index: 0,
        }];
        let window = Window {
            start: ts(20, 0),
            end: ts(21, 0),
        };
        let err = replay(
            trend,
            trigger,
            &points,
            window,
            &FixedSwing(swing_100_120()),
            &cfg,
        )
        .unwrap_err();
        assert!(matches!(err, BacktestError::EmptyWindow { .. }));
    }

    #[test]
    fn incomplete_first_snapshot_is_rejected() {
        // Warm-up NaNs reaching into the window mean the early in-window
        // bars were never evaluable; that must be an error, not a silent
        // zero-trade pass.
        let mut harness = Harness::new(&[(109.5, 110.0, 108.5, 109.5)]);
        harness.trigger_snaps[0] = snap(
            ts(14, 9),
            f64::NAN,
            f64::NAN,
            f64::NAN,
            f64::NAN,
            f64::NAN,
        );
        let err = harness.replay().unwrap_err();
        assert!(matches!(err, BacktestError::InsufficientLookback { .. }));
    }

    #[test]
    fn window_starting_inside_warmup_is_rejected() {
        // 40 bars clear the minimum-history check, but a window spanning
        // the whole series leaves no lookback before its start.
        let cfg = ScanConfig::default();
        let base = ts(1, 9);
        let trend: Vec<PriceBar> = (0..40)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.3).sin() * 5.0;
                bar_ohlc(
                    base + chrono::Duration::days(i as i64),
                    close - 0.2,
                    close + 1.0,
                    close - 1.0,
                    close,
                )
            })
            .collect();
        let trigger: Vec<PriceBar> = (0..40)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.15).sin() * 5.0;
                bar_ohlc(
                    base + chrono::Duration::hours(i as i64),
                    close - 0.1,
                    close + 0.5,
                    close - 0.5,
                    close,
                )
            })
            .collect();
        let window = Window {
            start: trigger[0].timestamp,
            end: trigger[39].timestamp,
        };
        let err = run(&trend, &trigger, window, &FixedSwing(swing_100_120()), &cfg).unwrap_err();
        assert!(matches!(err, BacktestError::InsufficientLookback { .. }));
    }

    #[test]
    fn replay_is_deterministic() {
        let harness = Harness::new(&[
            (109.5, 110.0, 108.5, 109.5),
            (110.0, 121.0, 109.0, 119.0),
        ]);
        let first = harness.replay().unwrap();
        let second = harness.replay().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn run_validates_history_length() {
        let cfg = ScanConfig::default();
        let bars: Vec<PriceBar> = (0..10)
            .map(|i| bar_ohlc(ts(1, i), 100.0, 101.0, 99.0, 100.0))
            .collect();
        let window = Window {
            start: ts(1, 0),
            end: ts(2, 0),
        };
        let err = run(&bars, &bars, window, &FixedSwing(swing_100_120()), &cfg).unwrap_err();
        assert!(matches!(err, BacktestError::Indicator(_)));
    }
}
