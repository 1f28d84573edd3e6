#![allow(dead_code)]

use barscreen::domain::bar::Bar;
use barscreen::domain::error::ScreenerError;
use barscreen::ports::history_port::{HistoryPort, HistoryRequest};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

/// History keyed by (symbol, interval). Periods are ignored.
pub struct MockHistoryPort {
    pub data: HashMap<(String, String), Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockHistoryPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, interval: &str, bars: Vec<Bar>) -> Self {
        self.data
            .insert((symbol.to_string(), interval.to_string()), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl HistoryPort for MockHistoryPort {
    fn fetch(&self, request: &HistoryRequest) -> Result<Vec<Bar>, ScreenerError> {
        if let Some(reason) = self.errors.get(&request.symbol) {
            return Err(ScreenerError::DataSource {
                reason: reason.clone(),
            });
        }
        let key = (request.symbol.clone(), request.interval.to_string());
        Ok(self.data.get(&key).cloned().unwrap_or_default())
    }
}

pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn make_bar(timestamp: NaiveDateTime, low: f64, high: f64, volume: u64) -> Bar {
    Bar {
        timestamp,
        open: low,
        high,
        low,
        close: low,
        volume,
    }
}

/// Bars `step_minutes` apart from 09:30 on `date`, one per low.
pub fn intraday(date: &str, step_minutes: i64, lows: &[f64], volume: u64) -> Vec<Bar> {
    let open = ts(&format!("{} 09:30:00", date));
    lows.iter()
        .enumerate()
        .map(|(i, &low)| {
            make_bar(
                open + Duration::minutes(step_minutes * i as i64),
                low,
                low + 0.5,
                volume,
            )
        })
        .collect()
}

/// Midnight bars `step_days` apart from `start`, one per low.
pub fn daily(start: &str, step_days: i64, lows: &[f64]) -> Vec<Bar> {
    let first = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    lows.iter()
        .enumerate()
        .map(|(i, &low)| make_bar(first + Duration::days(step_days * i as i64), low, low + 1.0, 10_000))
        .collect()
}

/// 91 two-minute lows whose hourly ranges are about 3%, 1.49% and 0.92%.
pub fn big_wave_lows() -> Vec<f64> {
    let mut lows: Vec<f64> = (0..=30).map(|i| 100.0 + i as f64 * 0.1).collect();
    lows.extend((31..=60).map(|i| 103.0 + (i - 30) as f64 * 0.05));
    lows.extend((61..=90).map(|i| 104.5 + (i - 60) as f64 / 30.0));
    lows
}

/// Hourly bars for one session: morning lows from 100, afternoon highs
/// from 105.
pub fn am_pm_session(date: &str) -> Vec<Bar> {
    vec![
        make_bar(ts(&format!("{} 09:30:00", date)), 100.0, 101.0, 5_000),
        make_bar(ts(&format!("{} 10:30:00", date)), 101.0, 102.0, 5_000),
        make_bar(ts(&format!("{} 11:30:00", date)), 102.0, 103.0, 5_000),
        make_bar(ts(&format!("{} 13:30:00", date)), 104.0, 105.0, 5_000),
        make_bar(ts(&format!("{} 14:30:00", date)), 105.0, 106.0, 5_000),
    ]
}

/// A symbol that satisfies every Default predicate.
pub fn with_default_winner(port: MockHistoryPort, symbol: &str) -> MockHistoryPort {
    let mut hourly = am_pm_session("2024-03-04");
    hourly.extend(am_pm_session("2024-03-05"));
    port.with_bars(symbol, "1mo", daily("2020-01-01", 31, &[10.0, 11.0, 12.0, 13.0]))
        .with_bars(symbol, "1wk", daily("2024-01-01", 7, &[20.0, 21.0, 21.5]))
        .with_bars(symbol, "1d", daily("2024-03-01", 1, &[30.0, 30.5, 31.0]))
        .with_bars(symbol, "60m", hourly)
}
