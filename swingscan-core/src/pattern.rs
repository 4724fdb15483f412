//! Simplified Elliott Wave pattern analysis on the trend timeframe.
//!
//! Classifies the recent price structure from pivot swings: a structure
//! whose recent lows are progressively higher (or highs progressively
//! lower) reads as a trend, with a clean five-swing count upgrading it to
//! an impulse; overlapping swings read as an A-B-C correction. The
//! classification is advisory context attached to report rows; it never
//! gates a setup.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;

/// Bars of history the analysis looks at.
pub const DEFAULT_LOOKBACK: usize = 50;

/// Bars on each side a pivot must dominate.
pub const PIVOT_WINDOW: usize = 5;

/// Ratios used to project the last swing's duration forward in time.
pub const TIME_RATIOS: [f64; 5] = [0.382, 0.5, 0.618, 1.0, 1.618];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwingKind {
    High,
    Low,
}

/// One pivot extreme inside the analyzed slice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingPoint {
    /// Index into the analyzed slice, not the full series.
    pub index: usize,
    pub kind: SwingKind,
    pub price: f64,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternKind {
    /// Directional structure with a full five-swing count.
    FiveWaveTrend,
    /// Directional structure short of a clean five-swing count.
    Trend,
    /// Overlapping swings, read as an A-B-C correction.
    AbcCorrection,
    /// Too few pivots to classify.
    Unclear,
    /// Fewer bars than the lookback.
    InsufficientData,
}

/// Where the structure currently sits within its pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WavePhase {
    Wave3Or5Top,
    Wave2Or4Bottom,
    WaveBTop,
    WaveCBottom,
    Developing,
    Unknown,
}

/// Pattern classification with the pivots that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAnalysis {
    pub kind: PatternKind,
    /// Heuristic confidence in [0, 1].
    pub confidence: f64,
    pub phase: WavePhase,
    pub swings: Vec<SwingPoint>,
}

impl PatternAnalysis {
    fn bare(kind: PatternKind) -> Self {
        Self {
            kind,
            confidence: 0.0,
            phase: WavePhase::Unknown,
            swings: Vec::new(),
        }
    }
}

/// Classify the last `lookback` bars.
pub fn analyze(bars: &[PriceBar], lookback: usize) -> PatternAnalysis {
    if bars.len() < lookback {
        return PatternAnalysis::bare(PatternKind::InsufficientData);
    }
    let recent = &bars[bars.len() - lookback..];
    let swings = identify_swings(recent, PIVOT_WINDOW);
    if swings.len() < 3 {
        return PatternAnalysis::bare(PatternKind::Unclear);
    }

    let (kind, confidence) = if is_trending(&swings) {
        if wave_count(&swings) == 5 {
            (PatternKind::FiveWaveTrend, 0.8)
        } else {
            (PatternKind::Trend, 0.6)
        }
    } else {
        (PatternKind::AbcCorrection, 0.7)
    };
    let phase = phase_of(&swings, kind);

    PatternAnalysis {
        kind,
        confidence,
        phase,
        swings,
    }
}

/// Pivot highs and lows: a bar whose high (low) is the extreme of the
/// `window` bars on each side, in chronological order.
pub fn identify_swings(bars: &[PriceBar], window: usize) -> Vec<SwingPoint> {
    let mut swings = Vec::new();
    if bars.len() <= 2 * window {
        return swings;
    }
    for i in window..bars.len() - window {
        let neighborhood = &bars[i - window..=i + window];
        let bar = &bars[i];
        if neighborhood.iter().all(|b| b.high <= bar.high) {
            swings.push(SwingPoint {
                index: i,
                kind: SwingKind::High,
                price: bar.high,
                timestamp: bar.timestamp,
            });
        }
        if neighborhood.iter().all(|b| b.low >= bar.low) {
            swings.push(SwingPoint {
                index: i,
                kind: SwingKind::Low,
                price: bar.low,
                timestamp: bar.timestamp,
            });
        }
    }
    swings
}

/// Forward time projections: the duration between the last two pivots,
/// scaled by each Fibonacci ratio and projected from the later pivot.
/// Empty with fewer than two pivots.
pub fn time_projections(swings: &[SwingPoint]) -> Vec<(f64, NaiveDateTime)> {
    if swings.len() < 2 {
        return Vec::new();
    }
    let prev = &swings[swings.len() - 2];
    let last = &swings[swings.len() - 1];
    let span_seconds = (last.timestamp - prev.timestamp).num_seconds();
    TIME_RATIOS
        .iter()
        .map(|&ratio| {
            let forward = chrono::Duration::seconds((span_seconds as f64 * ratio) as i64);
            (ratio, last.timestamp + forward)
        })
        .collect()
}

/// Overlap rule, simplified: the structure is trending when its recent
/// lows are progressively higher (uptrend) or its recent highs
/// progressively lower (downtrend). Overlap reads as correction.
fn is_trending(swings: &[SwingPoint]) -> bool {
    if swings.len() < 5 {
        return false;
    }
    let highs: Vec<f64> = swings
        .iter()
        .filter(|s| s.kind == SwingKind::High)
        .map(|s| s.price)
        .collect();
    let lows: Vec<f64> = swings
        .iter()
        .filter(|s| s.kind == SwingKind::Low)
        .map(|s| s.price)
        .collect();
    if highs.len() < 3 || lows.len() < 2 {
        return false;
    }
    ascending(tail(&lows, 3)) || descending(tail(&highs, 3))
}

/// Number of waves: alternations between pivot highs and lows.
fn wave_count(swings: &[SwingPoint]) -> usize {
    let mut count = 0;
    let mut last: Option<SwingKind> = None;
    for swing in swings {
        if last != Some(swing.kind) {
            count += 1;
            last = Some(swing.kind);
        }
    }
    count
}

fn phase_of(swings: &[SwingPoint], kind: PatternKind) -> WavePhase {
    let last = match swings.last() {
        Some(s) => s,
        None => return WavePhase::Unknown,
    };
    match kind {
        PatternKind::FiveWaveTrend => match last.kind {
            SwingKind::High => WavePhase::Wave3Or5Top,
            SwingKind::Low => WavePhase::Wave2Or4Bottom,
        },
        PatternKind::AbcCorrection => match last.kind {
            SwingKind::Low => WavePhase::WaveCBottom,
            SwingKind::High => WavePhase::WaveBTop,
        },
        _ => WavePhase::Developing,
    }
}

fn tail(values: &[f64], n: usize) -> &[f64] {
    &values[values.len().saturating_sub(n)..]
}

fn ascending(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}

fn descending(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] > w[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars_hlc;

    /// Rising zigzag: a triangle wave of the given period on top of a
    /// linear drift, wide enough that every peak and trough is a pivot.
    fn zigzag(len: usize, period: usize, drift: f64) -> Vec<PriceBar> {
        let hlc: Vec<(f64, f64, f64)> = (0..len)
            .map(|i| {
                let cycle = i % period;
                let tri = cycle.min(period - cycle) as f64;
                let close = 100.0 + i as f64 * drift + tri * 3.0;
                (close + 0.5, close - 0.5, close)
            })
            .collect();
        make_bars_hlc(&hlc)
    }

    #[test]
    fn short_history_is_insufficient() {
        let bars = zigzag(10, 12, 0.5);
        let analysis = analyze(&bars, DEFAULT_LOOKBACK);
        assert_eq!(analysis.kind, PatternKind::InsufficientData);
        assert_eq!(analysis.phase, WavePhase::Unknown);
        assert!(analysis.swings.is_empty());
    }

    #[test]
    fn monotone_ramp_has_no_pivots() {
        let hlc: Vec<(f64, f64, f64)> = (0..50)
            .map(|i| {
                let c = 100.0 + i as f64;
                (c + 0.5, c - 0.5, c)
            })
            .collect();
        let bars = make_bars_hlc(&hlc);
        assert!(identify_swings(&bars, PIVOT_WINDOW).is_empty());
        assert_eq!(analyze(&bars, DEFAULT_LOOKBACK).kind, PatternKind::Unclear);
    }

    #[test]
    fn rising_zigzag_reads_as_trend() {
        // Period 12 over 50 bars: pivots at 6H 12L 18H 24L 30H 36L 42H,
        // seven alternations with strictly rising lows.
        let bars = zigzag(50, 12, 0.5);
        let analysis = analyze(&bars, DEFAULT_LOOKBACK);
        assert_eq!(analysis.kind, PatternKind::Trend);
        assert!((analysis.confidence - 0.6).abs() < 1e-12);
        assert_eq!(analysis.phase, WavePhase::Developing);
        assert_eq!(analysis.swings.len(), 7);
    }

    #[test]
    fn five_swing_impulse_is_a_five_wave_trend() {
        // Period 16 over 50 bars: pivots at 8H 16L 24H 32L 40H, exactly
        // five waves ending on a high.
        let bars = zigzag(50, 16, 0.5);
        let analysis = analyze(&bars, DEFAULT_LOOKBACK);
        assert_eq!(analysis.kind, PatternKind::FiveWaveTrend);
        assert!((analysis.confidence - 0.8).abs() < 1e-12);
        assert_eq!(analysis.phase, WavePhase::Wave3Or5Top);
    }

    #[test]
    fn flat_zigzag_reads_as_correction() {
        // No drift: lows are equal, highs are equal, so the overlap rule
        // fails both directions.
        let bars = zigzag(50, 12, 0.0);
        let analysis = analyze(&bars, DEFAULT_LOOKBACK);
        assert_eq!(analysis.kind, PatternKind::AbcCorrection);
        assert_eq!(analysis.phase, WavePhase::WaveBTop);
    }

    #[test]
    fn time_projections_scale_the_last_swing_duration() {
        let bars = zigzag(50, 12, 0.5);
        let swings = identify_swings(&bars, PIVOT_WINDOW);
        let projections = time_projections(&swings);
        assert_eq!(projections.len(), TIME_RATIOS.len());

        // The last two pivots (36L at +36h, 42H at +42h) are six hours
        // apart; the 100% projection lands six hours after the last pivot.
        let last = swings[swings.len() - 1];
        let (ratio, at) = projections[3];
        assert!((ratio - 1.0).abs() < 1e-12);
        assert_eq!(at, last.timestamp + chrono::Duration::hours(6));
    }

    #[test]
    fn fewer_than_two_pivots_project_nothing() {
        assert!(time_projections(&[]).is_empty());
    }
}
