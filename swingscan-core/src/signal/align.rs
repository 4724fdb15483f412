//! Cross-timeframe alignment: merge-join of trigger bars onto trend bars.
//!
//! Each trigger-timeframe point maps to the most recent trend-timeframe
//! point whose timestamp is <= the trigger timestamp. Trigger bars earlier
//! than the first trend bar have no match and are dropped. A trend bar can
//! therefore never be matched forward in time — the no-look-ahead property
//! the detector and backtester depend on.

use crate::domain::{validate_series, PriceBar, SeriesError};

/// One aligned evaluation point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedPoint {
    pub trigger_index: usize,
    pub trend_index: usize,
}

/// Merge-join trigger timestamps onto trend timestamps.
///
/// Both series must be strictly increasing in time; either series failing
/// that precondition surfaces as `MalformedSeries` rather than a silent
/// misalignment.
pub fn align_timeframes(
    trend: &[PriceBar],
    trigger: &[PriceBar],
) -> Result<Vec<AlignedPoint>, SeriesError> {
    validate_series(trend)?;
    validate_series(trigger)?;

    let mut points = Vec::with_capacity(trigger.len());
    let mut trend_index = 0usize;

    for (trigger_index, trigger_bar) in trigger.iter().enumerate() {
        if trend.is_empty() || trend[0].timestamp > trigger_bar.timestamp {
            continue; // no trend history yet for this trigger point
        }
        while trend_index + 1 < trend.len()
            && trend[trend_index + 1].timestamp <= trigger_bar.timestamp
        {
            trend_index += 1;
        }
        points.push(AlignedPoint {
            trigger_index,
            trend_index,
        });
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn bar(ts: NaiveDateTime, close: f64) -> PriceBar {
        PriceBar {
            symbol: "TEST".into(),
            timestamp: ts,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        }
    }

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn hour(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn trigger_maps_to_most_recent_trend_bar() {
        let trend = vec![bar(day(1), 100.0), bar(day(2), 101.0), bar(day(3), 102.0)];
        let trigger = vec![
            bar(hour(2, 10), 100.5),
            bar(hour(2, 11), 100.6),
            bar(hour(3, 10), 101.5),
        ];

        let points = align_timeframes(&trend, &trigger).unwrap();
        assert_eq!(points.len(), 3);
        // Both hour-bars on day 2 map to the day-2 trend bar (index 1).
        assert_eq!(points[0].trend_index, 1);
        assert_eq!(points[1].trend_index, 1);
        // Day-3 hour-bar maps to the day-3 trend bar.
        assert_eq!(points[2].trend_index, 2);
    }

    #[test]
    fn no_look_ahead_matched_trend_never_later() {
        let trend = vec![bar(day(1), 100.0), bar(day(5), 101.0)];
        let trigger = vec![
            bar(hour(2, 10), 100.0),
            bar(hour(4, 10), 100.0),
            bar(hour(6, 10), 100.0),
        ];

        let points = align_timeframes(&trend, &trigger).unwrap();
        for p in &points {
            assert!(trend[p.trend_index].timestamp <= trigger[p.trigger_index].timestamp);
        }
        // Trigger bars on days 2 and 4 must map to day 1, not forward to day 5.
        assert_eq!(points[0].trend_index, 0);
        assert_eq!(points[1].trend_index, 0);
        assert_eq!(points[2].trend_index, 1);
    }

    #[test]
    fn trigger_before_first_trend_bar_is_dropped() {
        let trend = vec![bar(day(5), 100.0)];
        let trigger = vec![bar(hour(3, 10), 99.0), bar(hour(5, 10), 100.5)];

        let points = align_timeframes(&trend, &trigger).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].trigger_index, 1);
    }

    #[test]
    fn malformed_trend_series_rejected() {
        let trend = vec![bar(day(3), 100.0), bar(day(2), 101.0)];
        let trigger = vec![bar(hour(3, 10), 100.0)];
        assert!(align_timeframes(&trend, &trigger).is_err());
    }

    #[test]
    fn malformed_trigger_series_rejected() {
        let trend = vec![bar(day(1), 100.0)];
        let trigger = vec![bar(hour(3, 10), 100.0), bar(hour(3, 10), 100.1)];
        assert!(align_timeframes(&trend, &trigger).is_err());
    }

    #[test]
    fn empty_inputs_align_to_nothing() {
        assert!(align_timeframes(&[], &[]).unwrap().is_empty());
        let trigger = vec![bar(hour(3, 10), 100.0)];
        assert!(align_timeframes(&[], &trigger).unwrap().is_empty());
    }
}
