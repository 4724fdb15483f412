//! Dual-timeframe setup detection.
//!
//! The trend timeframe (daily) establishes directional bias; the trigger
//! timeframe (60-minute) times the entry. All rules for a direction must
//! hold at the same aligned evaluation point:
//!
//! Long: trend %D > 50, RSI > 50, MACD above signal, %D below overbought;
//! trigger %K crossing up out of oversold plus a bullish MACD cross; close
//! inside the retracement support zone of the most recent swing.
//! Short is the mirror.
//!
//! If both directions somehow hold at once the point is contradictory:
//! emit neither, report it as inconclusive, never guess.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::align::{align_timeframes, AlignedPoint};
use super::crossover::{
    crossed_above, crossed_above_threshold, crossed_below, crossed_below_threshold,
};
use crate::config::ScanConfig;
use crate::domain::{Direction, PriceBar, SeriesError, Setup};
use crate::fib::{extension_target, protective_stop, trade_zone, SwingSource};
use crate::indicators::{compute, IndicatorError, IndicatorSnapshot};

/// Bars plus their precomputed snapshots for one timeframe.
#[derive(Debug, Clone, Copy)]
pub struct TimeframeSeries<'a> {
    pub bars: &'a [PriceBar],
    pub snapshots: &'a [IndicatorSnapshot],
}

/// Outcome of evaluating one aligned point.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Rules not satisfied; nothing to report.
    None,
    Setup(Setup),
    /// Long and short rules held simultaneously — indicator contradiction.
    Inconclusive,
}

/// Every setup found over a run of aligned points, plus the points that
/// evaluated as contradictory (the caller decides how loudly to log them).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub setups: Vec<Setup>,
    pub inconclusive_at: Vec<NaiveDateTime>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SignalError {
    #[error(transparent)]
    Series(#[from] SeriesError),
    #[error(transparent)]
    Indicator(#[from] IndicatorError),
}

/// Evaluate the detection rules at one aligned point.
///
/// Pure over its inputs: the swing oracle only ever sees the trend-bar
/// prefix ending at the matched trend index, so nothing here can peek past
/// the evaluation point.
pub fn evaluate_point(
    trend: TimeframeSeries<'_>,
    trigger: TimeframeSeries<'_>,
    point: AlignedPoint,
    swings: &dyn SwingSource,
    cfg: &ScanConfig,
) -> Evaluation {
    // Crossovers need a prior trigger point.
    if point.trigger_index == 0 {
        return Evaluation::None;
    }

    let trend_snap = &trend.snapshots[point.trend_index];
    if !trend_snap.is_complete() {
        return Evaluation::None;
    }

    let prev = &trigger.snapshots[point.trigger_index - 1];
    let curr = &trigger.snapshots[point.trigger_index];

    // Trend momentum direction, with the exhaustion filter: momentum up but
    // not already overbought (mirror for shorts).
    let trend_bull = trend_snap.stoch_d > 50.0
        && trend_snap.rsi > 50.0
        && trend_snap.macd_line > trend_snap.macd_signal
        && trend_snap.stoch_d < cfg.stochastic.overbought;
    let trend_bear = trend_snap.stoch_d < 50.0
        && trend_snap.rsi < 50.0
        && trend_snap.macd_line < trend_snap.macd_signal
        && trend_snap.stoch_d > cfg.stochastic.oversold;

    if !trend_bull && !trend_bear {
        return Evaluation::None;
    }

    let trigger_long = crossed_above_threshold(prev.stoch_k, curr.stoch_k, cfg.stochastic.oversold)
        && crossed_above(
            prev.macd_line,
            prev.macd_signal,
            curr.macd_line,
            curr.macd_signal,
        );
    let trigger_short =
        crossed_below_threshold(prev.stoch_k, curr.stoch_k, cfg.stochastic.overbought)
            && crossed_below(
                prev.macd_line,
                prev.macd_signal,
                curr.macd_line,
                curr.macd_signal,
            );

    let long_armed = trend_bull && trigger_long;
    let short_armed = trend_bear && trigger_short;
    if !long_armed && !short_armed {
        return Evaluation::None;
    }
    if long_armed && short_armed {
        return Evaluation::Inconclusive;
    }

    let direction = if long_armed {
        Direction::Long
    } else {
        Direction::Short
    };

    // Swing from the trend-bar prefix up to the confirmed trend bar.
    let swing = match swings.recent_swing(&trend.bars[..=point.trend_index]) {
        Some(s) => s,
        None => return Evaluation::None,
    };

    let close = trigger.bars[point.trigger_index].close;
    let zone = trade_zone(&swing, direction, &cfg.fibonacci);
    if close < zone.0 || close > zone.1 {
        return Evaluation::None;
    }

    let stop = protective_stop(&swing, direction, &cfg.fibonacci);
    let target = extension_target(&swing, direction, &cfg.fibonacci);

    match Setup::new(
        trigger.bars[point.trigger_index].symbol.clone(),
        direction,
        trigger.bars[point.trigger_index].timestamp,
        trend.bars[point.trend_index].timestamp,
        close,
        stop,
        target,
        zone,
    ) {
        Ok(setup) => Evaluation::Setup(setup),
        // Degenerate swing geometry (e.g. entry beyond the target): the
        // price-ordering invariant failed, so there is no valid setup here.
        Err(_) => Evaluation::None,
    }
}

/// Run the detector over every aligned point (historical mode, used by the
/// backtester).
pub fn detect_all(
    trend: TimeframeSeries<'_>,
    trigger: TimeframeSeries<'_>,
    points: &[AlignedPoint],
    swings: &dyn SwingSource,
    cfg: &ScanConfig,
) -> Detection {
    let mut detection = Detection::default();
    for &point in points {
        match evaluate_point(trend, trigger, point, swings, cfg) {
            Evaluation::Setup(setup) => detection.setups.push(setup),
            Evaluation::Inconclusive => detection
                .inconclusive_at
                .push(trigger.bars[point.trigger_index].timestamp),
            Evaluation::None => {}
        }
    }
    detection
}

/// Evaluate only the latest aligned point — the "is there a setup right
/// now" entry point the orchestrator calls per instrument.
///
/// Validates both series, computes snapshots and alignment internally.
pub fn evaluate_today(
    trend_bars: &[PriceBar],
    trigger_bars: &[PriceBar],
    swings: &dyn SwingSource,
    cfg: &ScanConfig,
) -> Result<Detection, SignalError> {
    let trend_snapshots = compute(trend_bars, cfg)?;
    let trigger_snapshots = compute(trigger_bars, cfg)?;
    let points = align_timeframes(trend_bars, trigger_bars)?;

    let mut detection = Detection::default();
    let last = match points.last() {
        Some(&p) => p,
        None => return Ok(detection),
    };

    let trend = TimeframeSeries {
        bars: trend_bars,
        snapshots: &trend_snapshots,
    };
    let trigger = TimeframeSeries {
        bars: trigger_bars,
        snapshots: &trigger_snapshots,
    };

    match evaluate_point(trend, trigger, last, swings, cfg) {
        Evaluation::Setup(setup) => detection.setups.push(setup),
        Evaluation::Inconclusive => detection
            .inconclusive_at
            .push(trigger_bars[last.trigger_index].timestamp),
        Evaluation::None => {}
    }
    Ok(detection)
}
