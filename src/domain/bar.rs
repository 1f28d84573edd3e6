//! OHLCV bar and bar series representation.

use crate::domain::error::ScreenerError;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::period::{Interval, Period};
use chrono::{NaiveDate, NaiveDateTime};

/// One OHLCV observation. `low` is the canonical price for all change math.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// True when every price field is a finite number.
    pub fn is_complete(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite())
    }
}

/// Ordered bars for one (symbol, period, interval) triple, optionally
/// carrying an oscillator column aligned one-to-one with the bars.
#[derive(Debug, Clone)]
pub struct BarSeries {
    pub symbol: String,
    pub period: Period,
    pub interval: Interval,
    bars: Vec<Bar>,
    rsi: Option<IndicatorSeries>,
}

impl BarSeries {
    /// Builds a series, rejecting unordered or duplicate timestamps.
    pub fn new(
        symbol: impl Into<String>,
        period: Period,
        interval: Interval,
        bars: Vec<Bar>,
    ) -> Result<Self, ScreenerError> {
        let symbol = symbol.into();
        if let Some(w) = bars.windows(2).find(|w| w[0].timestamp >= w[1].timestamp) {
            return Err(ScreenerError::invalid(
                "bar series",
                &symbol,
                format!(
                    "timestamps must be strictly increasing ({} then {})",
                    w[0].timestamp, w[1].timestamp
                ),
            ));
        }
        Ok(Self {
            symbol,
            period,
            interval,
            bars,
            rsi: None,
        })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn rsi(&self) -> Option<&IndicatorSeries> {
        self.rsi.as_ref()
    }

    /// Oscillator value at bar `idx`, if the column is attached and defined.
    pub fn rsi_at(&self, idx: usize) -> Option<f64> {
        self.rsi
            .as_ref()
            .and_then(|s| s.values.get(idx))
            .and_then(|p| p.value)
    }

    /// Attaches an oscillator column. Misaligned columns are rejected.
    pub fn attach_rsi(&mut self, series: IndicatorSeries) -> Result<(), ScreenerError> {
        if series.values.len() != self.bars.len() {
            return Err(ScreenerError::invalid(
                "indicator",
                &series.indicator_type.to_string(),
                format!(
                    "has {} values for {} bars",
                    series.values.len(),
                    self.bars.len()
                ),
            ));
        }
        self.rsi = Some(series);
        Ok(())
    }

    /// Keeps only bars matching `keep`, carrying the oscillator column along.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Bar) -> bool,
    {
        let mask: Vec<bool> = self.bars.iter().map(&mut keep).collect();
        let mut it = mask.iter();
        self.bars.retain(|_| *it.next().unwrap_or(&false));
        if let Some(rsi) = self.rsi.as_mut() {
            let mut it = mask.iter();
            rsi.values.retain(|_| *it.next().unwrap_or(&false));
        }
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(Bar::date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::{IndicatorPoint, IndicatorType};

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn bar(s: &str, low: f64) -> Bar {
        Bar {
            timestamp: ts(s),
            open: low,
            high: low + 1.0,
            low,
            close: low,
            volume: 100,
        }
    }

    fn series(bars: Vec<Bar>) -> Result<BarSeries, ScreenerError> {
        BarSeries::new("TEST", "60d".parse()?, "1m".parse()?, bars)
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        let bars = vec![
            bar("2024-01-02 09:30:00", 1.0),
            bar("2024-01-02 09:30:00", 2.0),
        ];
        assert!(series(bars).is_err());
    }

    #[test]
    fn rejects_decreasing_timestamps() {
        let bars = vec![
            bar("2024-01-02 09:31:00", 1.0),
            bar("2024-01-02 09:30:00", 2.0),
        ];
        assert!(series(bars).is_err());
    }

    #[test]
    fn incomplete_bar_detected() {
        let mut b = bar("2024-01-02 09:30:00", 1.0);
        assert!(b.is_complete());
        b.close = f64::NAN;
        assert!(!b.is_complete());
    }

    #[test]
    fn retain_keeps_rsi_aligned() {
        let mut s = series(vec![
            bar("2024-01-02 09:30:00", 1.0),
            bar("2024-01-02 09:31:00", 2.0),
            bar("2024-01-02 09:32:00", 3.0),
        ])
        .unwrap();
        let values = s
            .bars()
            .iter()
            .map(|b| IndicatorPoint {
                timestamp: b.timestamp,
                value: Some(b.low * 10.0),
            })
            .collect();
        s.attach_rsi(IndicatorSeries {
            indicator_type: IndicatorType::Rsi(2),
            values,
        })
        .unwrap();

        s.retain(|b| b.low != 2.0);

        assert_eq!(s.len(), 2);
        assert_eq!(s.rsi_at(0), Some(10.0));
        assert_eq!(s.rsi_at(1), Some(30.0));
    }

    #[test]
    fn attach_rejects_misaligned_column() {
        let mut s = series(vec![bar("2024-01-02 09:30:00", 1.0)]).unwrap();
        let err = s.attach_rsi(IndicatorSeries {
            indicator_type: IndicatorType::Rsi(2),
            values: vec![],
        });
        assert!(err.is_err());
        assert!(s.rsi().is_none());
    }
}
