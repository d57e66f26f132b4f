//! Data quality report for a single candle series.
//!
//! Accepts candles in the order they will be replayed and reports:
//! - duplicate timestamps
//! - monotonicity violations (timestamp not strictly after its predecessor)
//! - gaps larger than the interval step
//! - OHLC sanity violations (non-finite values, high/low not bracketing
//!   open/close, negative volume)
//!
//! The simulator assumes a gap-free series; this report is how callers find
//! out whether that assumption holds before they run it.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Candle, Interval};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateIssue {
    pub timestamp: DateTime<Utc>,
    /// Always >= 2.
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonotonicityIssue {
    /// Input position of the offending candle.
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub prev_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GapIssue {
    pub prev_timestamp: DateTime<Utc>,
    pub next_timestamp: DateTime<Utc>,
    pub delta_secs: i64,
    pub expected_step_secs: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OhlcIssue {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub interval: Interval,
    pub total_candles: usize,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    pub duplicates: Vec<DuplicateIssue>,
    pub monotonicity_violations: Vec<MonotonicityIssue>,
    pub gaps: Vec<GapIssue>,
    pub ohlc_violations: Vec<OhlcIssue>,
}

impl QualityReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty()
            && self.monotonicity_violations.is_empty()
            && self.gaps.is_empty()
            && self.ohlc_violations.is_empty()
    }
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "interval={} candles={} duplicates={} non_monotonic={} gaps={} ohlc_violations={} clean={}",
            self.interval,
            self.total_candles,
            self.duplicates.len(),
            self.monotonicity_violations.len(),
            self.gaps.len(),
            self.ohlc_violations.len(),
            self.is_clean()
        )
    }
}

pub fn build_quality_report(candles: &[Candle], interval: Interval) -> QualityReport {
    let step = interval.step_secs();

    let mut counts: BTreeMap<DateTime<Utc>, usize> = BTreeMap::new();
    for c in candles {
        *counts.entry(c.timestamp).or_insert(0) += 1;
    }
    let duplicates: Vec<DuplicateIssue> = counts
        .iter()
        .filter(|(_, &n)| n >= 2)
        .map(|(&timestamp, &count)| DuplicateIssue { timestamp, count })
        .collect();

    let mut monotonicity_violations = Vec::new();
    let mut gaps = Vec::new();
    for (i, w) in candles.windows(2).enumerate() {
        let prev = w[0].timestamp;
        let next = w[1].timestamp;
        if next <= prev {
            monotonicity_violations.push(MonotonicityIssue {
                index: i + 1,
                timestamp: next,
                prev_timestamp: prev,
            });
            continue;
        }
        let delta = (next - prev).num_seconds();
        if delta > step {
            gaps.push(GapIssue {
                prev_timestamp: prev,
                next_timestamp: next,
                delta_secs: delta,
                expected_step_secs: step,
            });
        }
    }

    let ohlc_violations = candles
        .iter()
        .enumerate()
        .filter_map(|(index, c)| {
            ohlc_problem(c).map(|reason| OhlcIssue {
                index,
                timestamp: c.timestamp,
                reason,
            })
        })
        .collect();

    QualityReport {
        interval,
        total_candles: candles.len(),
        earliest: counts.keys().next().copied(),
        latest: counts.keys().next_back().copied(),
        duplicates,
        monotonicity_violations,
        gaps,
        ohlc_violations,
    }
}

fn ohlc_problem(c: &Candle) -> Option<String> {
    let vals = [c.open, c.high, c.low, c.close, c.volume];
    if vals.iter().any(|v| !v.is_finite()) {
        return Some("non-finite value".to_string());
    }
    if c.high < c.open.max(c.close) || c.high < c.low {
        return Some(format!("high {} below open/close/low", c.high));
    }
    if c.low > c.open.min(c.close) {
        return Some(format!("low {} above open/close", c.low));
    }
    if c.volume < 0.0 {
        return Some(format!("negative volume {}", c.volume));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
    }

    fn candle(hours: i64) -> Candle {
        Candle::new(at(hours), 100.0, 105.0, 99.0, 103.0, 1_000.0)
    }

    #[test]
    fn empty_input_is_clean() {
        let report = build_quality_report(&[], Interval::H1);
        assert_eq!(report.total_candles, 0);
        assert!(report.earliest.is_none());
        assert!(report.is_clean());
    }

    #[test]
    fn contiguous_series_is_clean() {
        let candles: Vec<Candle> = (0..5).map(candle).collect();
        let report = build_quality_report(&candles, Interval::H1);
        assert!(report.is_clean(), "{report}");
        assert_eq!(report.earliest, Some(at(0)));
        assert_eq!(report.latest, Some(at(4)));
    }

    #[test]
    fn gap_detected_with_delta() {
        let candles = vec![candle(0), candle(1), candle(4)];
        let report = build_quality_report(&candles, Interval::H1);
        assert_eq!(report.gaps.len(), 1);
        assert_eq!(report.gaps[0].delta_secs, 3 * 3_600);
        assert_eq!(report.gaps[0].prev_timestamp, at(1));
    }

    #[test]
    fn four_hour_interval_tolerates_four_hour_steps() {
        let candles = vec![candle(0), candle(4), candle(8)];
        assert!(build_quality_report(&candles, Interval::H4).is_clean());
    }

    #[test]
    fn duplicate_and_out_of_order_flagged() {
        let candles = vec![candle(0), candle(2), candle(1), candle(1)];
        let report = build_quality_report(&candles, Interval::H1);
        assert_eq!(report.duplicates.len(), 1);
        assert_eq!(report.duplicates[0].count, 2);
        assert_eq!(report.monotonicity_violations.len(), 2);
        assert_eq!(report.monotonicity_violations[0].index, 2);
    }

    #[test]
    fn ohlc_sanity() {
        let mut bad = candle(0);
        bad.high = 90.0;
        let mut nan = candle(1);
        nan.close = f64::NAN;
        let report = build_quality_report(&[bad, nan, candle(2)], Interval::H1);
        assert_eq!(report.ohlc_violations.len(), 2);
        assert_eq!(report.ohlc_violations[1].reason, "non-finite value");
    }
}
