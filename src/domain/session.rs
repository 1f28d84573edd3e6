//! Per-calendar-day segmentation of a bar series.
//!
//! A session is the run of bars sharing one calendar date. Segmentation is a
//! pure partition on the date component of each timestamp: no exchange
//! calendar, no holiday knowledge.

use crate::domain::bar::{Bar, BarSeries};
use chrono::{NaiveDate, NaiveTime};
use std::ops::Range;

pub const MARKET_OPEN: NaiveTime = match NaiveTime::from_hms_opt(9, 30, 0) {
    Some(t) => t,
    None => panic!("invalid market open"),
};

pub const MARKET_CLOSE: NaiveTime = match NaiveTime::from_hms_opt(16, 0, 0) {
    Some(t) => t,
    None => panic!("invalid market close"),
};

#[derive(Debug, Clone, Copy)]
pub struct Session<'a> {
    pub date: NaiveDate,
    /// Index of the session's first bar within the parent series.
    pub offset: usize,
    pub bars: &'a [Bar],
}

impl Session<'_> {
    /// Position of this session's bars in the parent series.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.bars.len()
    }

    /// Parent-series range covering at most the first `n` bars.
    pub fn head(&self, n: usize) -> Range<usize> {
        self.offset..self.offset + self.bars.len().min(n)
    }
}

/// Splits `series` into sessions in date order, preserving intraday order.
pub fn segment(series: &BarSeries) -> Vec<Session<'_>> {
    segment_bars(series.bars())
}

pub fn segment_bars(bars: &[Bar]) -> Vec<Session<'_>> {
    let mut sessions = Vec::new();
    let mut start = 0;
    for i in 1..=bars.len() {
        if i == bars.len() || bars[i].date() != bars[start].date() {
            sessions.push(Session {
                date: bars[start].date(),
                offset: start,
                bars: &bars[start..i],
            });
            start = i;
        }
    }
    sessions
}

/// True when `time` falls inside 09:30-16:00 inclusive.
pub fn is_regular_hours(time: NaiveTime) -> bool {
    (MARKET_OPEN..=MARKET_CLOSE).contains(&time)
}

/// Drops extended-hours bars from sub-daily series. Daily and longer
/// intervals are left untouched.
pub fn truncate_regular_hours(series: &mut BarSeries) {
    if series.interval.is_intraday() {
        series.retain(|b| is_regular_hours(b.timestamp.time()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn bar(s: &str) -> Bar {
        Bar {
            timestamp: NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1,
        }
    }

    fn series(interval: &str, stamps: &[&str]) -> BarSeries {
        BarSeries::new(
            "TEST",
            "7d".parse().unwrap(),
            interval.parse().unwrap(),
            stamps.iter().map(|s| bar(s)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn empty_series_has_no_sessions() {
        let s = series("1m", &[]);
        assert!(segment(&s).is_empty());
    }

    #[test]
    fn groups_by_calendar_date() {
        let s = series(
            "1h",
            &[
                "2024-01-02 09:30:00",
                "2024-01-02 10:30:00",
                "2024-01-03 09:30:00",
                "2024-01-05 09:30:00",
                "2024-01-05 10:30:00",
            ],
        );
        let sessions = segment(&s);
        assert_eq!(sessions.len(), 3);
        assert_eq!(sessions[0].bars.len(), 2);
        assert_eq!(sessions[1].range(), 2..3);
        assert_eq!(sessions[2].date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(sessions[2].head(1), 3..4);
        assert_eq!(sessions[2].head(10), 3..5);
    }

    #[test]
    fn regular_hours_bounds_inclusive() {
        assert!(is_regular_hours(MARKET_OPEN));
        assert!(is_regular_hours(MARKET_CLOSE));
        assert!(!is_regular_hours(NaiveTime::from_hms_opt(9, 29, 0).unwrap()));
        assert!(!is_regular_hours(NaiveTime::from_hms_opt(16, 1, 0).unwrap()));
    }

    #[test]
    fn truncates_extended_hours_intraday() {
        let mut s = series(
            "1m",
            &[
                "2024-01-02 04:00:00",
                "2024-01-02 09:30:00",
                "2024-01-02 16:00:00",
                "2024-01-02 19:00:00",
            ],
        );
        truncate_regular_hours(&mut s);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn daily_series_not_truncated() {
        let mut s = series("1d", &["2024-01-02 00:00:00", "2024-01-03 00:00:00"]);
        truncate_regular_hours(&mut s);
        assert_eq!(s.len(), 2);
    }
}
